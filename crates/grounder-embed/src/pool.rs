//! Embedder pool bounding concurrent inference.

use grounder_core::{EmbedError, Embedder};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Concurrency-bounded wrapper around a shared embedder.
///
/// Model weights load once; the semaphore caps in-flight inference so
/// concurrent retrieval requests and a running indexing job share one
/// instance without oversubscribing the device.
pub struct EmbedderPool {
    embedder: Arc<dyn Embedder>,
    semaphore: Semaphore,
    max_concurrent: usize,
}

impl EmbedderPool {
    /// Create a pool over a shared embedder.
    pub fn new(embedder: Arc<dyn Embedder>, max_concurrent: usize) -> Self {
        Self {
            embedder,
            semaphore: Semaphore::new(max_concurrent.max(1)),
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// The wrapped embedder.
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        Arc::clone(&self.embedder)
    }

    /// Model identifier of the wrapped embedder.
    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    /// Embedding dimension of the wrapped embedder.
    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    /// Compute backend of the wrapped embedder.
    pub fn backend(&self) -> &str {
        self.embedder.backend()
    }

    /// Maximum concurrent embed operations.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Currently available permits.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Embed a batch of texts under a concurrency permit.
    pub async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| EmbedError::Inference(format!("semaphore error: {e}")))?;
        self.embedder.embed(texts).await
    }

    /// Embed a single query under a concurrency permit.
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>, EmbedError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| EmbedError::Inference(format!("semaphore error: {e}")))?;
        self.embedder.embed_query(query).await
    }
}
