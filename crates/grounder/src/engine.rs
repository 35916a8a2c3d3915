//! Engine wiring: one embedder, one store, shared lexicon.

use grounder_chunker::SlidingChunker;
use grounder_core::{
    CollectionStats, Embedder, Error, Lexicon, MetadataFilter, Result, VectorStore,
};
use grounder_embed::EmbedderPool;
use grounder_extract::ExtractorRegistry;
use grounder_index::{FileChangeCache, IndexReport, Indexer, IndexerConfig, MutationLocks};
use grounder_retrieve::{RetrievedPassage, Retriever, RetrieverConfig};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::EngineConfig;

/// The assembled retrieval engine for one collection.
///
/// One embedder instance serves both indexing and retrieval; giving the two
/// paths different models would silently degrade similarity scores, so the
/// constructor makes that mistake unrepresentable. Construct one engine per
/// process per collection and share it behind an `Arc`; retrievals may run
/// concurrently, and index mutation is serialized internally.
pub struct RetrievalEngine {
    store: Arc<dyn VectorStore>,
    embedder: Arc<EmbedderPool>,
    indexer: Indexer,
    retriever: Retriever,
}

impl RetrievalEngine {
    /// Assemble an engine from an explicit store and embedder.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        config: &EngineConfig,
    ) -> Result<Self> {
        let chunker = SlidingChunker::new(config.chunking)?;
        let pool = Arc::new(EmbedderPool::new(embedder, config.embedding.max_concurrent));
        let lexicon = Arc::new(Lexicon::new());
        let locks = Arc::new(MutationLocks::new());
        let cache = FileChangeCache::load(config.cache_path());

        let indexer = Indexer::new(
            Arc::clone(&store),
            Arc::clone(&pool),
            Arc::new(ExtractorRegistry::with_defaults()),
            chunker,
            cache,
            locks,
            IndexerConfig {
                lock_timeout: Duration::from_secs(config.indexing.lock_timeout_secs),
            },
        )
        .with_lexicon(Arc::clone(&lexicon));

        let retriever = Retriever::new(
            Arc::clone(&store),
            Arc::clone(&pool),
            lexicon,
            RetrieverConfig {
                overfetch_factor: config.retrieval.overfetch_factor,
                min_candidates: config.retrieval.min_candidates,
            },
        );

        info!(
            collection = store.collection(),
            model = pool.model_name(),
            backend = pool.backend(),
            "retrieval engine assembled"
        );

        Ok(Self {
            store,
            embedder: pool,
            indexer,
            retriever,
        })
    }

    /// Open an engine on the configured LanceDB store with the local
    /// Candle embedding model.
    #[cfg(feature = "candle")]
    pub async fn open(config: &EngineConfig) -> Result<Self> {
        let embedder = grounder_embed::CandleEmbedder::load(config.embedding.batch_size)
            .await
            .map_err(Error::Embedding)?;
        let store = Arc::new(grounder_store::LanceStore::new(
            config.db_path(),
            config.collection.clone(),
            embedder.dimension(),
        ));
        Self::new(store, Arc::new(embedder), config)
    }

    /// Index every document under `root` into this engine's collection.
    pub async fn index_folder(&self, root: &Path, force_rebuild: bool) -> Result<IndexReport> {
        self.indexer.index_folder(root, force_rebuild).await
    }

    /// Retrieve up to `max_results` passages relevant to `query`.
    pub async fn retrieve(&self, query: &str, max_results: usize) -> Result<Vec<RetrievedPassage>> {
        self.retriever.retrieve(query, max_results).await
    }

    /// Retrieve with an explicit candidate count and/or metadata filter.
    pub async fn retrieve_with_options(
        &self,
        query: &str,
        max_results: usize,
        top_k: Option<usize>,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievedPassage>> {
        self.retriever
            .retrieve_with_options(query, max_results, top_k, filter)
            .await
    }

    /// Statistics for this engine's collection.
    pub async fn stats(&self) -> Result<CollectionStats> {
        self.store.stats().await.map_err(Error::Store)
    }

    /// Name of the collection this engine operates on.
    pub fn collection(&self) -> &str {
        self.store.collection()
    }

    /// Embedding model identifier.
    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    /// Embedding compute backend, for diagnostics.
    pub fn backend(&self) -> &str {
        self.embedder.backend()
    }
}
