//! In-memory store for testing without `LanceDB`.
//!
//! Brute-force cosine similarity over a `HashMap` keyed by chunk id. Not
//! suitable for production corpora, but it exercises the same trait surface
//! as the Lance backend, including the recreate-on-missing semantics.

use async_trait::async_trait;
use grounder_core::{
    Chunk, ChunkMetadata, CollectionStats, MetadataFilter, ScoredChunk, StoreError, VectorStore,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// In-memory vector store scoped to one named collection.
///
/// The collection is modeled as `Option<HashMap>` so that out-of-band
/// deletion (`delete_collection`) and the transparent recreate path behave
/// like the real backend.
pub struct MemoryStore {
    collection: String,
    dimension: usize,
    chunks: Arc<RwLock<Option<HashMap<Uuid, Chunk>>>>,
}

impl MemoryStore {
    /// Create a new in-memory store for a named collection.
    #[must_use]
    pub fn new(collection: impl Into<String>, dimension: usize) -> Self {
        Self {
            collection: collection.into(),
            dimension,
            chunks: Arc::new(RwLock::new(None)),
        }
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot / (norm_a * norm_b)
    }

    fn matches(filter: &MetadataFilter, metadata: &ChunkMetadata) -> bool {
        match filter {
            MetadataFilter::Extension(ext) => metadata.extension == *ext,
            MetadataFilter::FileName(name) => metadata.file_name == *name,
            MetadataFilter::PathPrefix(prefix) => metadata.relative_path.starts_with(prefix),
        }
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn init(&self) -> Result<(), StoreError> {
        let mut chunks = self.chunks.write().await;
        if chunks.is_none() {
            *chunks = Some(HashMap::new());
            debug!(
                collection = %self.collection,
                dimension = self.dimension,
                "created in-memory collection"
            );
        }
        Ok(())
    }

    async fn add_chunks(&self, to_add: &[Chunk]) -> Result<(), StoreError> {
        let mut chunks = self.chunks.write().await;
        // Collection deleted out-of-band: recreate and carry on
        let map = chunks.get_or_insert_with(HashMap::new);
        for chunk in to_add {
            map.insert(chunk.id, chunk.clone());
        }
        debug!(collection = %self.collection, count = to_add.len(), "upserted chunks");
        Ok(())
    }

    async fn similarity_search(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<ScoredChunk>, StoreError> {
        let mut chunks = self.chunks.write().await;
        let map = chunks.get_or_insert_with(HashMap::new);

        let mut scored: Vec<ScoredChunk> = map
            .values()
            .filter(|c| filter.map_or(true, |f| Self::matches(f, &c.metadata)))
            .filter_map(|c| {
                c.embedding.as_ref().map(|e| ScoredChunk {
                    id: c.id,
                    text: c.text.clone(),
                    metadata: c.metadata.clone(),
                    score: Self::cosine_similarity(embedding, e),
                })
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn update_chunk(
        &self,
        id: Uuid,
        text: &str,
        embedding: Vec<f32>,
        metadata: ChunkMetadata,
    ) -> Result<(), StoreError> {
        let mut chunks = self.chunks.write().await;
        let map = chunks.get_or_insert_with(HashMap::new);
        let chunk = map
            .get_mut(&id)
            .ok_or_else(|| StoreError::Insert(format!("chunk {id} not found")))?;
        chunk.text = text.to_string();
        chunk.embedding = Some(embedding);
        chunk.metadata = metadata;
        Ok(())
    }

    async fn delete_chunks(&self, ids: &[Uuid]) -> Result<u64, StoreError> {
        let mut chunks = self.chunks.write().await;
        let map = chunks.get_or_insert_with(HashMap::new);
        let mut deleted = 0;
        for id in ids {
            if map.remove(id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn delete_by_source(&self, relative_path: &Path) -> Result<u64, StoreError> {
        let path = relative_path.to_string_lossy();
        let mut chunks = self.chunks.write().await;
        let map = chunks.get_or_insert_with(HashMap::new);

        let before = map.len();
        map.retain(|_, c| c.metadata.relative_path != path);
        let deleted = (before - map.len()) as u64;
        debug!(collection = %self.collection, %path, deleted, "deleted chunks by source");
        Ok(deleted)
    }

    async fn reset(&self) -> Result<(), StoreError> {
        let mut chunks = self.chunks.write().await;
        *chunks = Some(HashMap::new());
        debug!(collection = %self.collection, "reset collection");
        Ok(())
    }

    async fn delete_collection(&self) -> Result<(), StoreError> {
        let mut chunks = self.chunks.write().await;
        *chunks = None;
        debug!(collection = %self.collection, "dropped collection");
        Ok(())
    }

    async fn stats(&self) -> Result<CollectionStats, StoreError> {
        let chunks = self.chunks.read().await;
        Ok(CollectionStats {
            collection: self.collection.clone(),
            document_count: chunks.as_ref().map_or(0, HashMap::len) as u64,
            embedding_dimension: self.dimension,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grounder_core::{chunk_id, document_id};
    use std::path::PathBuf;

    fn test_chunk(path: &str, ordinal: u32, embedding: Vec<f32>) -> Chunk {
        let doc = document_id(&PathBuf::from(path));
        Chunk {
            id: chunk_id(doc, ordinal),
            document_id: doc,
            text: format!("chunk {ordinal} of {path}"),
            embedding: Some(embedding),
            metadata: ChunkMetadata {
                file_name: path.rsplit('/').next().unwrap().to_string(),
                relative_path: path.to_string(),
                extension: ".txt".to_string(),
                size: 10,
                chunk_index: ordinal,
                total_chunks: 1,
                content_hash: "hash".to_string(),
                extra: HashMap::new(),
            },
        }
    }

    #[tokio::test]
    async fn test_init_and_empty_stats() {
        let store = MemoryStore::new("docs", 3);
        store.init().await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.collection, "docs");
        assert_eq!(stats.document_count, 0);
        assert_eq!(stats.embedding_dimension, 3);
    }

    #[tokio::test]
    async fn test_add_and_search() {
        let store = MemoryStore::new("docs", 3);
        store.init().await.unwrap();

        store
            .add_chunks(&[
                test_chunk("a.txt", 0, vec![1.0, 0.0, 0.0]),
                test_chunk("b.txt", 0, vec![0.0, 1.0, 0.0]),
                test_chunk("c.txt", 0, vec![0.0, 0.0, 1.0]),
            ])
            .await
            .unwrap();

        let hits = store
            .similarity_search(&[1.0, 0.0, 0.0], 2, None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].metadata.relative_path, "a.txt");
        assert!((hits[0].score - 1.0).abs() < 1e-5);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_by_id() {
        let store = MemoryStore::new("docs", 3);
        store.init().await.unwrap();

        let chunk = test_chunk("a.txt", 0, vec![1.0, 0.0, 0.0]);
        store.add_chunks(&[chunk.clone()]).await.unwrap();
        store.add_chunks(&[chunk]).await.unwrap();

        assert_eq!(store.stats().await.unwrap().document_count, 1);
    }

    #[tokio::test]
    async fn test_search_with_extension_filter() {
        let store = MemoryStore::new("docs", 3);
        store.init().await.unwrap();

        let mut pdf_chunk = test_chunk("a.pdf", 0, vec![1.0, 0.0, 0.0]);
        pdf_chunk.metadata.extension = ".pdf".to_string();
        store
            .add_chunks(&[pdf_chunk, test_chunk("b.txt", 0, vec![1.0, 0.0, 0.0])])
            .await
            .unwrap();

        let filter = MetadataFilter::Extension(".pdf".to_string());
        let hits = store
            .similarity_search(&[1.0, 0.0, 0.0], 10, Some(&filter))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.extension, ".pdf");
    }

    #[tokio::test]
    async fn test_search_empty_collection_returns_empty() {
        let store = MemoryStore::new("docs", 3);
        store.init().await.unwrap();

        let hits = store
            .similarity_search(&[1.0, 0.0, 0.0], 5, None)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_search_after_out_of_band_delete_recreates() {
        let store = MemoryStore::new("docs", 3);
        store.init().await.unwrap();
        store.delete_collection().await.unwrap();

        // Recreated transparently, no error
        let hits = store
            .similarity_search(&[1.0, 0.0, 0.0], 5, None)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_add_after_out_of_band_delete_recreates() {
        let store = MemoryStore::new("docs", 3);
        store.init().await.unwrap();
        store.delete_collection().await.unwrap();

        store
            .add_chunks(&[test_chunk("a.txt", 0, vec![1.0, 0.0, 0.0])])
            .await
            .unwrap();
        assert_eq!(store.stats().await.unwrap().document_count, 1);
    }

    #[tokio::test]
    async fn test_delete_by_source() {
        let store = MemoryStore::new("docs", 3);
        store.init().await.unwrap();

        store
            .add_chunks(&[
                test_chunk("a.txt", 0, vec![1.0, 0.0, 0.0]),
                test_chunk("a.txt", 1, vec![0.9, 0.1, 0.0]),
                test_chunk("b.txt", 0, vec![0.0, 1.0, 0.0]),
            ])
            .await
            .unwrap();

        let deleted = store.delete_by_source(Path::new("a.txt")).await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.stats().await.unwrap().document_count, 1);
    }

    #[tokio::test]
    async fn test_delete_chunks_by_id() {
        let store = MemoryStore::new("docs", 3);
        store.init().await.unwrap();

        let chunk = test_chunk("a.txt", 0, vec![1.0, 0.0, 0.0]);
        let id = chunk.id;
        store.add_chunks(&[chunk]).await.unwrap();

        assert_eq!(store.delete_chunks(&[id]).await.unwrap(), 1);
        assert_eq!(store.delete_chunks(&[id]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_chunk() {
        let store = MemoryStore::new("docs", 3);
        store.init().await.unwrap();

        let chunk = test_chunk("a.txt", 0, vec![1.0, 0.0, 0.0]);
        let id = chunk.id;
        let meta = chunk.metadata.clone();
        store.add_chunks(&[chunk]).await.unwrap();

        store
            .update_chunk(id, "revised text", vec![0.0, 1.0, 0.0], meta)
            .await
            .unwrap();

        let hits = store
            .similarity_search(&[0.0, 1.0, 0.0], 1, None)
            .await
            .unwrap();
        assert_eq!(hits[0].text, "revised text");
    }

    #[tokio::test]
    async fn test_update_missing_chunk_fails() {
        let store = MemoryStore::new("docs", 3);
        store.init().await.unwrap();

        let result = store
            .update_chunk(
                Uuid::new_v4(),
                "text",
                vec![0.0, 1.0, 0.0],
                ChunkMetadata::default(),
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_reset_empties_collection() {
        let store = MemoryStore::new("docs", 3);
        store.init().await.unwrap();

        store
            .add_chunks(&[test_chunk("a.txt", 0, vec![1.0, 0.0, 0.0])])
            .await
            .unwrap();
        store.reset().await.unwrap();

        assert_eq!(store.stats().await.unwrap().document_count, 0);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((MemoryStore::cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(MemoryStore::cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!(
            (MemoryStore::cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6
        );
        assert_eq!(MemoryStore::cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(MemoryStore::cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
