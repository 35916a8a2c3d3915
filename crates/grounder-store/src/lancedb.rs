//! `LanceDB` implementation of `VectorStore`.
//!
//! One Lance table per named collection (one collection per tenant).
//! Collections are created lazily on first use; if a collection is deleted
//! out-of-band the store recreates it once and retries before surfacing the
//! error.

use arrow_array::builder::{FixedSizeListBuilder, Float32Builder};
use arrow_array::{Array, ArrayRef, Float32Array, RecordBatch, RecordBatchIterator, StringArray, UInt32Array, UInt64Array};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use grounder_core::{
    document_id, Chunk, ChunkMetadata, CollectionStats, MetadataFilter, ScoredChunk, StoreError,
    VectorStore,
};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, DistanceType, Table};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::schema::collection_schema;

/// LanceDB-backed vector store scoped to one named collection.
pub struct LanceStore {
    /// Path to the LanceDB database directory
    db_path: PathBuf,
    /// Collection (table) name, e.g. `user_42`
    collection: String,
    /// Embedding dimension
    embedding_dim: usize,
    /// Database connection (lazy)
    connection: RwLock<Option<Connection>>,
    /// Collection table handle (lazy)
    table: RwLock<Option<Table>>,
}

impl LanceStore {
    /// Create a new store handle for a named collection.
    #[must_use]
    pub fn new(db_path: PathBuf, collection: String, embedding_dim: usize) -> Self {
        Self {
            db_path,
            collection,
            embedding_dim,
            connection: RwLock::new(None),
            table: RwLock::new(None),
        }
    }

    /// The database path.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// The embedding dimension.
    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    async fn get_connection(&self) -> Result<Connection, StoreError> {
        {
            let conn = self.connection.read().await;
            if let Some(ref c) = *conn {
                return Ok(c.clone());
            }
        }

        let mut conn = self.connection.write().await;
        if conn.is_none() {
            if let Some(parent) = self.db_path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::Init(format!("failed to create db directory: {e}")))?;
            }
            let db_path_str = self.db_path.to_string_lossy().to_string();
            let new_conn = connect(&db_path_str)
                .execute()
                .await
                .map_err(|e| StoreError::Init(format!("failed to connect to LanceDB: {e}")))?;
            *conn = Some(new_conn);
        }
        Ok(conn.as_ref().unwrap().clone())
    }

    /// Get the cached table handle, opening or lazily creating the
    /// collection if needed.
    async fn get_table(&self) -> Result<Table, StoreError> {
        {
            let table = self.table.read().await;
            if let Some(ref t) = *table {
                return Ok(t.clone());
            }
        }

        let conn = self.get_connection().await?;
        let mut table_lock = self.table.write().await;
        if table_lock.is_none() {
            let names = conn
                .table_names()
                .execute()
                .await
                .map_err(|e| StoreError::Init(format!("failed to list collections: {e}")))?;

            let t = if names.contains(&self.collection) {
                conn.open_table(&self.collection)
                    .execute()
                    .await
                    .map_err(|e| {
                        StoreError::Init(format!(
                            "failed to open collection '{}': {e}",
                            self.collection
                        ))
                    })?
            } else {
                info!(collection = %self.collection, "creating collection");
                self.create_table(&conn).await?
            };
            *table_lock = Some(t);
        }

        Ok(table_lock.as_ref().unwrap().clone())
    }

    async fn create_table(&self, conn: &Connection) -> Result<Table, StoreError> {
        let schema = Arc::new(collection_schema(self.embedding_dim));
        conn.create_empty_table(&self.collection, schema)
            .execute()
            .await
            .map_err(|e| {
                StoreError::Init(format!(
                    "failed to create collection '{}': {e}",
                    self.collection
                ))
            })
    }

    /// Drop the cached handle and recreate the collection. Used on the
    /// missing-collection recovery path.
    async fn recreate_table(&self) -> Result<(), StoreError> {
        let conn = self.get_connection().await?;
        let mut table_lock = self.table.write().await;
        *table_lock = None;

        warn!(collection = %self.collection, "collection missing, recreating");
        let t = self.create_table(&conn).await?;
        *table_lock = Some(t);
        Ok(())
    }

    fn chunks_to_batch(&self, chunks: &[Chunk]) -> Result<RecordBatch, StoreError> {
        let chunk_ids: Vec<String> = chunks.iter().map(|c| c.id.to_string()).collect();
        let document_ids: Vec<String> = chunks.iter().map(|c| c.document_id.to_string()).collect();
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let file_names: Vec<String> = chunks.iter().map(|c| c.metadata.file_name.clone()).collect();
        let relative_paths: Vec<String> = chunks
            .iter()
            .map(|c| c.metadata.relative_path.clone())
            .collect();
        let extensions: Vec<String> = chunks.iter().map(|c| c.metadata.extension.clone()).collect();
        let sizes: Vec<u64> = chunks.iter().map(|c| c.metadata.size as u64).collect();
        let chunk_indices: Vec<u32> = chunks.iter().map(|c| c.metadata.chunk_index).collect();
        let total_chunks: Vec<u32> = chunks.iter().map(|c| c.metadata.total_chunks).collect();
        let content_hashes: Vec<String> = chunks
            .iter()
            .map(|c| c.metadata.content_hash.clone())
            .collect();
        let extras: Vec<Option<String>> = chunks
            .iter()
            .map(|c| {
                if c.metadata.extra.is_empty() {
                    None
                } else {
                    serde_json::to_string(&c.metadata.extra).ok()
                }
            })
            .collect();
        let indexed_ats: Vec<String> = chunks.iter().map(|_| Utc::now().to_rfc3339()).collect();

        let mut vectors = FixedSizeListBuilder::new(Float32Builder::new(), self.embedding_dim as i32);
        for chunk in chunks {
            let embedding = chunk.embedding.as_ref().ok_or_else(|| {
                StoreError::Insert(format!("chunk {} has no embedding", chunk.id))
            })?;
            if embedding.len() != self.embedding_dim {
                return Err(StoreError::Insert(format!(
                    "chunk {} embedding dimension {} != collection dimension {}",
                    chunk.id,
                    embedding.len(),
                    self.embedding_dim
                )));
            }
            for &v in embedding {
                vectors.values().append_value(v);
            }
            vectors.append(true);
        }
        let vector_array: ArrayRef = Arc::new(vectors.finish());

        let schema = Arc::new(collection_schema(self.embedding_dim));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(chunk_ids)),
                Arc::new(StringArray::from(document_ids)),
                Arc::new(StringArray::from(texts)),
                vector_array,
                Arc::new(StringArray::from(file_names)),
                Arc::new(StringArray::from(relative_paths)),
                Arc::new(StringArray::from(extensions)),
                Arc::new(UInt64Array::from(sizes)),
                Arc::new(UInt32Array::from(chunk_indices)),
                Arc::new(UInt32Array::from(total_chunks)),
                Arc::new(StringArray::from(content_hashes)),
                Arc::new(StringArray::from(extras)),
                Arc::new(StringArray::from(indexed_ats)),
            ],
        )
        .map_err(|e| StoreError::Insert(format!("failed to build record batch: {e}")))
    }

    async fn try_search(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<ScoredChunk>, StoreError> {
        let table = self.get_table().await?;

        let mut query = table
            .query()
            .nearest_to(embedding.to_vec())
            .map_err(|e| StoreError::Query(format!("failed to build search: {e}")))?
            .column("embedding")
            .distance_type(DistanceType::Cosine)
            .limit(k);
        if let Some(f) = filter {
            query = query.only_if(filter_predicate(f));
        }

        let mut stream = query
            .execute()
            .await
            .map_err(|e| StoreError::Query(format!("failed to execute search: {e}")))?;

        let mut results = Vec::new();
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| StoreError::Query(format!("failed to fetch results: {e}")))?
        {
            results.extend(batch_to_scored_chunks(&batch)?);
        }
        Ok(results)
    }

    async fn try_add(&self, chunks: &[Chunk]) -> Result<(), StoreError> {
        let table = self.get_table().await?;

        // Upsert semantics: drop any rows with the same ids first
        let predicate = ids_predicate(chunks.iter().map(|c| c.id));
        table
            .delete(&predicate)
            .await
            .map_err(|e| StoreError::Delete(format!("failed to clear existing ids: {e}")))?;

        let batch = self.chunks_to_batch(chunks)?;
        let schema = batch.schema();
        let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);

        table
            .add(Box::new(batches))
            .execute()
            .await
            .map_err(|e| StoreError::Insert(format!("failed to insert chunks: {e}")))?;
        Ok(())
    }
}

/// SQL predicate matching any of the given chunk ids.
fn ids_predicate(ids: impl Iterator<Item = Uuid>) -> String {
    let quoted: Vec<String> = ids.map(|id| format!("'{id}'")).collect();
    format!("chunk_id IN ({})", quoted.join(", "))
}

/// Escape a string literal for a Lance SQL predicate.
fn escape(value: &str) -> String {
    value.replace('\'', "''")
}

/// Compile a metadata filter to a Lance SQL predicate.
fn filter_predicate(filter: &MetadataFilter) -> String {
    match filter {
        MetadataFilter::Extension(ext) => format!("extension = '{}'", escape(ext)),
        MetadataFilter::FileName(name) => format!("file_name = '{}'", escape(name)),
        MetadataFilter::PathPrefix(prefix) => {
            format!("relative_path LIKE '{}%'", escape(prefix))
        }
    }
}

fn batch_to_scored_chunks(batch: &RecordBatch) -> Result<Vec<ScoredChunk>, StoreError> {
    let get_str = |name: &str| {
        batch
            .column_by_name(name)
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
    };
    let get_u32 = |name: &str| {
        batch
            .column_by_name(name)
            .and_then(|c| c.as_any().downcast_ref::<UInt32Array>())
    };

    let (Some(chunk_ids), Some(texts), Some(file_names), Some(relative_paths), Some(extensions)) = (
        get_str("chunk_id"),
        get_str("text"),
        get_str("file_name"),
        get_str("relative_path"),
        get_str("extension"),
    ) else {
        return Err(StoreError::Query("missing required columns".to_string()));
    };

    let sizes = batch
        .column_by_name("size")
        .and_then(|c| c.as_any().downcast_ref::<UInt64Array>());
    let chunk_indices = get_u32("chunk_index");
    let total_chunks = get_u32("total_chunks");
    let content_hashes = get_str("content_hash");
    let extras = get_str("extra_json");
    let distances = batch
        .column_by_name("_distance")
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

    let mut results = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let extra: HashMap<String, String> = extras
            .filter(|a| !a.is_null(i))
            .and_then(|a| serde_json::from_str(a.value(i)).ok())
            .unwrap_or_default();

        let metadata = ChunkMetadata {
            file_name: file_names.value(i).to_string(),
            relative_path: relative_paths.value(i).to_string(),
            extension: extensions.value(i).to_string(),
            size: sizes.map_or(0, |a| a.value(i) as usize),
            chunk_index: chunk_indices.map_or(0, |a| a.value(i)),
            total_chunks: total_chunks.map_or(0, |a| a.value(i)),
            content_hash: content_hashes.map_or_else(String::new, |a| a.value(i).to_string()),
            extra,
        };

        results.push(ScoredChunk {
            id: Uuid::parse_str(chunk_ids.value(i)).unwrap_or_default(),
            text: texts.value(i).to_string(),
            metadata,
            score: distances.map_or(0.0, |d| 1.0 - d.value(i)),
        });
    }

    Ok(results)
}

#[async_trait]
impl VectorStore for LanceStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn init(&self) -> Result<(), StoreError> {
        info!(db = ?self.db_path, collection = %self.collection, "initializing LanceDB store");
        self.get_table().await?;
        Ok(())
    }

    async fn add_chunks(&self, chunks: &[Chunk]) -> Result<(), StoreError> {
        if chunks.is_empty() {
            return Ok(());
        }

        debug!(collection = %self.collection, count = chunks.len(), "upserting chunks");

        // One recreate-and-retry if the collection vanished out-of-band
        match self.try_add(chunks).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_collection_missing() => {
                self.recreate_table().await?;
                self.try_add(chunks).await
            }
            Err(e) => Err(e),
        }
    }

    async fn similarity_search(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<ScoredChunk>, StoreError> {
        match self.try_search(embedding, k, filter).await {
            Ok(results) => {
                debug!(collection = %self.collection, hits = results.len(), "similarity search");
                Ok(results)
            }
            Err(e) if e.is_collection_missing() => {
                self.recreate_table().await?;
                self.try_search(embedding, k, filter).await
            }
            Err(e) => Err(e),
        }
    }

    async fn update_chunk(
        &self,
        id: Uuid,
        text: &str,
        embedding: Vec<f32>,
        metadata: ChunkMetadata,
    ) -> Result<(), StoreError> {
        let chunk = Chunk {
            id,
            document_id: document_id(Path::new(&metadata.relative_path)),
            text: text.to_string(),
            embedding: Some(embedding),
            metadata,
        };
        self.add_chunks(&[chunk]).await
    }

    async fn delete_chunks(&self, ids: &[Uuid]) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let table = self.get_table().await?;
        table
            .delete(&ids_predicate(ids.iter().copied()))
            .await
            .map_err(|e| StoreError::Delete(format!("failed to delete chunks: {e}")))?;

        // Lance doesn't report affected rows; assume all ids existed
        Ok(ids.len() as u64)
    }

    async fn delete_by_source(&self, relative_path: &Path) -> Result<u64, StoreError> {
        let path = relative_path.to_string_lossy();
        debug!(collection = %self.collection, %path, "deleting chunks by source");

        let table = self.get_table().await?;
        table
            .delete(&format!("relative_path = '{}'", escape(&path)))
            .await
            .map_err(|e| StoreError::Delete(format!("failed to delete by source: {e}")))?;
        Ok(0)
    }

    async fn reset(&self) -> Result<(), StoreError> {
        info!(collection = %self.collection, "resetting collection");

        let conn = self.get_connection().await?;
        let mut table_lock = self.table.write().await;
        *table_lock = None;

        // Dropping a collection that never existed is not an error
        if let Err(e) = conn.drop_table(&self.collection).await {
            debug!(collection = %self.collection, "drop before reset: {e}");
        }

        let t = self.create_table(&conn).await?;
        *table_lock = Some(t);
        Ok(())
    }

    async fn delete_collection(&self) -> Result<(), StoreError> {
        info!(collection = %self.collection, "dropping collection");

        let conn = self.get_connection().await?;
        let mut table_lock = self.table.write().await;
        *table_lock = None;

        conn.drop_table(&self.collection)
            .await
            .map_err(|e| StoreError::Delete(format!("failed to drop collection: {e}")))
    }

    async fn stats(&self) -> Result<CollectionStats, StoreError> {
        let table = self.get_table().await?;

        let mut count = 0u64;
        let mut stream = table
            .query()
            .only_if("chunk_id LIKE '%'")
            .execute()
            .await
            .map_err(|e| StoreError::Query(format!("failed to scan collection: {e}")))?;

        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| StoreError::Query(format!("failed to count chunks: {e}")))?
        {
            count += batch.num_rows() as u64;
        }

        Ok(CollectionStats {
            collection: self.collection.clone(),
            document_count: count,
            embedding_dimension: self.embedding_dim,
        })
    }
}
