//! Component traits for the Grounder pipeline.
//!
//! - [`DocumentExtractor`]: turn file bytes into plain text
//! - [`Embedder`]: turn text into fixed-width vectors
//! - [`VectorStore`]: store and search embedded chunks in a named collection
//!
//! These traits form the seams between pipeline stages so that backends can
//! be swapped (e.g. the in-memory store in tests for the `LanceDB` store in
//! production) without touching the orchestration code. Instances are
//! explicitly constructed and dependency-injected; each is expected to be a
//! single, shared, thread-safe handle per process.

use async_trait::async_trait;
use std::path::Path;
use uuid::Uuid;

use crate::error::{EmbedError, ExtractError, StoreError};
use crate::types::{Chunk, ChunkMetadata, CollectionStats, MetadataFilter, ScoredChunk};

// ============================================================================
// Document Extraction
// ============================================================================

/// Trait for extracting plain text from documents.
///
/// Extraction failures are recoverable by contract: the orchestrator catches
/// them at the per-file boundary, logs, and skips the file.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Lowercased extensions (with leading dot) this extractor handles.
    fn supported_extensions(&self) -> &[&str];

    /// Check whether this extractor can handle the given file.
    fn can_extract(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .is_some_and(|ext| self.supported_extensions().contains(&ext.as_str()))
    }

    /// Extract plain UTF-8 text from a file.
    ///
    /// An `Ok` result may be empty (e.g. a PDF with no text layer); empty
    /// content is not an error.
    async fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

// ============================================================================
// Embedding
// ============================================================================

/// Trait for generating embeddings.
///
/// Implementations must be deterministic for identical input text and model
/// version. One instance serves both the indexing and the query path; mixing
/// embedding spaces silently degrades retrieval quality.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model name/identifier.
    fn model_name(&self) -> &str;

    /// Embedding dimension.
    fn dimension(&self) -> usize;

    /// Compute backend name for diagnostics (e.g. `"cuda"`, `"cpu"`).
    fn backend(&self) -> &str;

    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError>;

    /// Embed a single query string.
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, EmbedError> {
        let results = self.embed(&[query]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::Inference("empty embedding result".to_string()))
    }
}

// ============================================================================
// Vector Storage
// ============================================================================

/// Trait for vector storage and similarity search over one named collection.
///
/// Collections are tenant- or corpus-scoped and created lazily on first use.
/// Implementations recover once from a collection deleted out-of-band by
/// recreating it and retrying before surfacing an error.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Name of the collection this handle is scoped to.
    fn collection(&self) -> &str;

    /// Initialize the store, creating the collection if missing.
    async fn init(&self) -> Result<(), StoreError>;

    /// Idempotent upsert of embedded chunks by chunk id.
    async fn add_chunks(&self, chunks: &[Chunk]) -> Result<(), StoreError>;

    /// Similarity search: the `k` nearest chunks to `embedding`, ordered by
    /// decreasing similarity (`score = 1 - distance`), optionally filtered
    /// by metadata.
    async fn similarity_search(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<ScoredChunk>, StoreError>;

    /// Replace one chunk's text, embedding, and metadata in place.
    async fn update_chunk(
        &self,
        id: Uuid,
        text: &str,
        embedding: Vec<f32>,
        metadata: ChunkMetadata,
    ) -> Result<(), StoreError>;

    /// Delete chunks by id. Returns the number deleted where the backend
    /// reports it.
    async fn delete_chunks(&self, ids: &[Uuid]) -> Result<u64, StoreError>;

    /// Delete all chunks originating from the given source-relative path.
    async fn delete_by_source(&self, relative_path: &Path) -> Result<u64, StoreError>;

    /// Destroy and recreate the collection empty.
    async fn reset(&self) -> Result<(), StoreError>;

    /// Drop the collection entirely.
    async fn delete_collection(&self) -> Result<(), StoreError>;

    /// Collection statistics.
    async fn stats(&self) -> Result<CollectionStats, StoreError>;
}
