//! Sentence embedder using Candle.
//!
//! Uses sentence-transformers/all-MiniLM-L6-v2:
//! - 384 dimensions
//! - 512 max tokens
//! - BERT architecture, mean pooling, L2-normalized output

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use grounder_core::{EmbedError, Embedder};
use hf_hub::{api::tokio::Api, Repo, RepoType};
use std::sync::Arc;
use tokenizers::Tokenizer;
use tracing::{debug, info};

/// Model identifier on HuggingFace Hub.
const MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Embedding dimension for all-MiniLM-L6-v2.
const EMBEDDING_DIM: usize = 384;

/// Maximum sequence length.
const MAX_TOKENS: usize = 512;

struct Inner {
    device: Device,
    model: BertModel,
    tokenizer: Tokenizer,
}

/// Sentence embedder running locally through Candle.
///
/// Weights are downloaded from HuggingFace Hub on first load and cached by
/// hf-hub. The loaded instance is immutable and shared; the same model
/// embeds documents at indexing time and queries at retrieval time.
pub struct CandleEmbedder {
    inner: Arc<Inner>,
    backend: String,
    batch_size: usize,
}

impl CandleEmbedder {
    /// Download (if needed) and load the model, selecting CUDA when
    /// available and falling back to CPU.
    pub async fn load(batch_size: usize) -> Result<Self, EmbedError> {
        let device = Device::cuda_if_available(0).unwrap_or(Device::Cpu);
        Self::load_on(device, batch_size).await
    }

    /// Load the model onto a specific device.
    pub async fn load_on(device: Device, batch_size: usize) -> Result<Self, EmbedError> {
        let backend = match &device {
            Device::Cuda(_) => "cuda",
            Device::Metal(_) => "metal",
            Device::Cpu => "cpu",
        }
        .to_string();
        info!(model = MODEL_ID, backend = %backend, "loading embedding model");

        let api = Api::new()
            .map_err(|e| EmbedError::ModelLoad(format!("failed to create HF API: {e}")))?;
        let repo = api.repo(Repo::new(MODEL_ID.to_string(), RepoType::Model));

        debug!("fetching tokenizer");
        let tokenizer_path = repo
            .get("tokenizer.json")
            .await
            .map_err(|e| EmbedError::ModelLoad(format!("failed to fetch tokenizer: {e}")))?;

        debug!("fetching config");
        let config_path = repo
            .get("config.json")
            .await
            .map_err(|e| EmbedError::ModelLoad(format!("failed to fetch config: {e}")))?;

        debug!("fetching weights");
        let weights_path = repo
            .get("model.safetensors")
            .await
            .map_err(|e| EmbedError::ModelLoad(format!("failed to fetch weights: {e}")))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| EmbedError::ModelLoad(format!("failed to load tokenizer: {e}")))?;

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| EmbedError::ModelLoad(format!("failed to read config: {e}")))?;
        let config: Config = serde_json::from_str(&config_str)
            .map_err(|e| EmbedError::ModelLoad(format!("failed to parse config: {e}")))?;

        // SAFETY: read-only mmap of a fetched safetensors file.
        #[allow(unsafe_code)]
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .map_err(|e| EmbedError::ModelLoad(format!("failed to map weights: {e}")))?
        };

        let model = BertModel::load(vb, &config)
            .map_err(|e| EmbedError::ModelLoad(format!("failed to build BERT model: {e}")))?;

        info!(model = MODEL_ID, backend = %backend, "embedding model ready");

        Ok(Self {
            inner: Arc::new(Inner {
                device,
                model,
                tokenizer,
            }),
            backend,
            batch_size: batch_size.max(1),
        })
    }
}

impl Inner {
    fn encode_batch(&self, texts: &[String], normalize: bool) -> Result<Vec<Vec<f32>>, EmbedError> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbedError::Inference(format!("tokenization failed: {e}")))?;

        let max_len = encodings
            .iter()
            .map(tokenizers::Encoding::len)
            .max()
            .unwrap_or(0)
            .min(MAX_TOKENS);

        let batch_size = texts.len();
        let mut input_ids = Vec::with_capacity(batch_size * max_len);
        let mut attention_mask = Vec::with_capacity(batch_size * max_len);
        let mut token_type_ids = Vec::with_capacity(batch_size * max_len);

        for encoding in &encodings {
            let ids = encoding.get_ids();
            let len = ids.len().min(max_len);
            for i in 0..max_len {
                if i < len {
                    input_ids.push(ids[i]);
                    attention_mask.push(1u32);
                } else {
                    input_ids.push(0);
                    attention_mask.push(0);
                }
                token_type_ids.push(0u32);
            }
        }

        let input_ids = Tensor::from_vec(input_ids, (batch_size, max_len), &self.device)
            .map_err(|e| EmbedError::Inference(format!("input_ids tensor: {e}")))?;
        let attention = Tensor::from_vec(attention_mask, (batch_size, max_len), &self.device)
            .map_err(|e| EmbedError::Inference(format!("attention_mask tensor: {e}")))?;
        let token_types = Tensor::from_vec(token_type_ids, (batch_size, max_len), &self.device)
            .map_err(|e| EmbedError::Inference(format!("token_type_ids tensor: {e}")))?;

        let hidden = self
            .model
            .forward(&input_ids, &token_types, Some(&attention))
            .map_err(|e| EmbedError::Inference(format!("model forward failed: {e}")))?;

        let pooled = mean_pooling(&hidden, &attention)?;
        let vectors = if normalize {
            l2_normalize(&pooled)?
        } else {
            pooled
        };

        let mut out = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let row = vectors
                .get(i)
                .map_err(|e| EmbedError::Inference(format!("row {i} missing: {e}")))?
                .to_vec1::<f32>()
                .map_err(|e| EmbedError::Inference(format!("row {i} to vec: {e}")))?;
            out.push(row);
        }
        Ok(out)
    }
}

/// Mean pooling over token embeddings, weighted by the attention mask.
fn mean_pooling(token_embeddings: &Tensor, attention_mask: &Tensor) -> Result<Tensor, EmbedError> {
    let mask = attention_mask
        .unsqueeze(2)
        .and_then(|m| m.broadcast_as(token_embeddings.shape()))
        .and_then(|m| m.to_dtype(DType::F32))
        .map_err(|e| EmbedError::Inference(format!("mask expansion failed: {e}")))?;

    let summed = token_embeddings
        .mul(&mask)
        .and_then(|t| t.sum(1))
        .map_err(|e| EmbedError::Inference(format!("masked sum failed: {e}")))?;

    let counts = mask
        .sum(1)
        .and_then(|c| c.clamp(1e-9, f64::MAX))
        .map_err(|e| EmbedError::Inference(format!("mask count failed: {e}")))?;

    summed
        .div(&counts)
        .map_err(|e| EmbedError::Inference(format!("mean failed: {e}")))
}

/// L2-normalize each row.
fn l2_normalize(embeddings: &Tensor) -> Result<Tensor, EmbedError> {
    let norm = embeddings
        .sqr()
        .and_then(|t| t.sum_keepdim(1))
        .and_then(|t| t.sqrt())
        .and_then(|t| t.clamp(1e-12, f64::MAX))
        .map_err(|e| EmbedError::Inference(format!("norm failed: {e}")))?;

    embeddings
        .broadcast_div(&norm)
        .map_err(|e| EmbedError::Inference(format!("normalize failed: {e}")))
}

#[async_trait]
impl Embedder for CandleEmbedder {
    fn model_name(&self) -> &str {
        MODEL_ID
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    fn backend(&self) -> &str {
        &self.backend
    }

    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = texts.len(), batch_size = self.batch_size, "embedding texts");

        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let owned: Vec<String> = batch.iter().map(|t| (*t).to_string()).collect();
            let inner = Arc::clone(&self.inner);

            // Inference is CPU/GPU-bound; keep it off the async executor.
            let vectors = tokio::task::spawn_blocking(move || inner.encode_batch(&owned, true))
                .await
                .map_err(|e| EmbedError::Inference(format!("task join error: {e}")))??;
            results.extend(vectors);
        }

        Ok(results)
    }
}
