//! Core types shared across the Grounder pipeline.
//!
//! ## Documents and Chunks
//! - [`SourceDocument`]: a file presented to the indexing pipeline
//! - [`Chunk`]: an embedded span of extracted text
//! - [`ChunkMetadata`]: named, typed metadata attached to every chunk
//!
//! ## Search
//! - [`ScoredChunk`]: a similarity-search hit
//! - [`MetadataFilter`]: optional metadata predicate for searches
//! - [`CollectionStats`]: collection-level statistics
//!
//! ## Identity
//!
//! Document and chunk ids are deterministic UUIDv5 values derived from the
//! document's relative path and the chunk ordinal, so re-indexing the same
//! file yields the same ids and upserts replace rather than duplicate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Namespace for deterministic document and chunk ids.
const ID_NAMESPACE: Uuid = Uuid::from_u128(0x5e1f_8a42_9c3d_4b76_a2e9_d017_c8b5_63f4);

/// Deterministic id for a document, derived from its source-relative path.
#[must_use]
pub fn document_id(relative_path: &Path) -> Uuid {
    Uuid::new_v5(
        &ID_NAMESPACE,
        relative_path.to_string_lossy().as_bytes(),
    )
}

/// Deterministic id for a chunk, derived from its document id and ordinal.
#[must_use]
pub fn chunk_id(document: Uuid, ordinal: u32) -> Uuid {
    Uuid::new_v5(&document, &ordinal.to_be_bytes())
}

// ============================================================================
// Documents
// ============================================================================

/// A file presented to the indexing pipeline by the ingestion source.
///
/// The engine reads the file transiently during indexing; ownership of the
/// bytes stays with the storage collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Absolute path to the file on disk
    pub path: PathBuf,
    /// Path relative to the indexing root
    pub relative_path: PathBuf,
    /// File name including extension
    pub file_name: String,
    /// Lowercased extension with leading dot (e.g. `".pdf"`), empty if none
    pub extension: String,
    /// File size in bytes
    pub size_bytes: u64,
    /// Last modification time
    pub modified_at: DateTime<Utc>,
}

impl SourceDocument {
    /// Deterministic id for this document.
    #[must_use]
    pub fn id(&self) -> Uuid {
        document_id(&self.relative_path)
    }
}

// ============================================================================
// Chunks
// ============================================================================

/// Metadata attached to every chunk.
///
/// Fields mirror what the chat orchestrator needs to cite sources. Provider
/// adapters may attach extension fields via `extra` without touching the
/// typed schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source file name including extension
    pub file_name: String,
    /// Source path relative to the indexing root
    pub relative_path: String,
    /// Lowercased source extension with leading dot
    pub extension: String,
    /// Chunk text length in characters
    pub size: usize,
    /// Ordinal of this chunk within its document (0-based)
    pub chunk_index: u32,
    /// Total chunks produced from the document
    pub total_chunks: u32,
    /// Content hash of the source file at indexing time; a secondary dedup
    /// signal, never part of chunk identity
    pub content_hash: String,
    /// Provider-specific extension fields
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, String>,
}

/// A bounded span of extracted text with its embedding.
///
/// Immutable once embedded; superseded (deleted and replaced) when the
/// source file's content hash changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic chunk id (`chunk_id(document_id, ordinal)`)
    pub id: Uuid,
    /// Deterministic id of the source document
    pub document_id: Uuid,
    /// The chunk text
    pub text: String,
    /// Embedding vector (present once the chunk has been embedded)
    pub embedding: Option<Vec<f32>>,
    /// Chunk metadata
    pub metadata: ChunkMetadata,
}

// ============================================================================
// Search
// ============================================================================

/// Optional metadata predicate applied during similarity search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataFilter {
    /// Match chunks whose source extension equals the given value
    Extension(String),
    /// Match chunks from the given source file name
    FileName(String),
    /// Match chunks whose relative path starts with the given prefix
    PathPrefix(String),
}

/// A similarity-search hit.
///
/// `score` is `1 - distance` as reported by the index; no score is
/// guaranteed positive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// Chunk id
    pub id: Uuid,
    /// Chunk text
    pub text: String,
    /// Chunk metadata
    pub metadata: ChunkMetadata,
    /// Similarity score (`1 - distance`)
    pub score: f32,
}

/// Collection-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Collection name
    pub collection: String,
    /// Number of stored chunks
    pub document_count: u64,
    /// Embedding dimension of the collection
    pub embedding_dimension: usize,
}
