//! # grounder-core
//!
//! Core types and traits for the Grounder retrieval engine.
//!
//! Grounder turns heterogeneous user documents into searchable, embedded
//! chunks and answers query-time retrieval requests with ranked passages.
//! This crate provides the foundational abstractions shared by every stage
//! of that pipeline:
//!
//! - **Document Extraction**: [`DocumentExtractor`] trait for turning file
//!   bytes into plain text
//! - **Embedding Generation**: [`Embedder`] trait for converting text to
//!   fixed-width vectors
//! - **Vector Storage**: [`VectorStore`] trait over a named, per-tenant
//!   collection of embedded chunks
//! - **Spell Lexicon**: [`Lexicon`], the corpus vocabulary consulted by the
//!   query-time spell corrector
//!
//! ## Architecture
//!
//! ```text
//! Folder → DocumentExtractor → Chunker → Embedder → VectorStore
//!                                                       ↓
//!                                     query → Retriever → ranked passages
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SourceDocument`] | Metadata about a file handed to the indexing pipeline |
//! | [`Chunk`] | A bounded span of extracted text plus its embedding |
//! | [`ChunkMetadata`] | Named, typed per-chunk metadata fields |
//! | [`ScoredChunk`] | A search hit with its similarity score |
//! | [`CollectionStats`] | Document count and dimension of a collection |
//!
//! ## Related Crates
//!
//! - `grounder-extract`: format-specific text extraction
//! - `grounder-chunker`: sliding-window chunking
//! - `grounder-embed`: embedding backends
//! - `grounder-store`: `LanceDB` and in-memory vector stores
//! - `grounder-index`: change cache, mutation lock, orchestrator
//! - `grounder-retrieve`: spell correction and ranked retrieval

pub mod error;
pub mod lexicon;
pub mod traits;
pub mod types;

pub use error::{ChunkError, EmbedError, Error, ExtractError, Result, StoreError};
pub use lexicon::Lexicon;
pub use traits::*;
pub use types::*;
