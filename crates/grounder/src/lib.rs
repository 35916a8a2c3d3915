//! # grounder
//!
//! A retrieval engine that grounds AI chat in a user's own documents.
//!
//! Grounder ingests heterogeneous documents (text, Markdown, PDF, Office
//! formats), splits them into overlapping chunks, embeds them with a
//! sentence-embedding model, and stores them in a per-tenant vector
//! collection. At chat time it spell-corrects the query, over-fetches
//! candidates, re-ranks them by similarity and keyword overlap, and hands
//! ranked passages to the chat orchestrator.
//!
//! This crate is a library; HTTP routing, authentication, billing, OAuth,
//! and the LLM call itself live in the surrounding service.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use grounder::{EngineConfig, RetrievalEngine};
//!
//! let config = EngineConfig::default();
//! let engine = RetrievalEngine::open(&config).await?;
//!
//! let report = engine.index_folder("/data/user_42/docs".as_ref(), false).await?;
//! println!("indexed {} files", report.indexed_count());
//!
//! let passages = engine.retrieve("what did revenue do in Q3?", 5).await?;
//! let context = grounder::grounding_context(&passages);
//! ```
//!
//! ## Crates
//!
//! | Crate | Concern |
//! |-------|---------|
//! | `grounder-core` | Types, traits, errors, corpus lexicon |
//! | `grounder-extract` | Format-specific text extraction |
//! | `grounder-chunker` | Sliding-window chunking |
//! | `grounder-embed` | Embedding backends and concurrency pool |
//! | `grounder-store` | `LanceDB` and in-memory vector stores |
//! | `grounder-index` | Change cache, mutation lock, orchestrator |
//! | `grounder-retrieve` | Spell correction and ranked retrieval |

pub mod config;
pub mod engine;

pub use config::{tenant_collection, EngineConfig};
pub use engine::RetrievalEngine;

pub use grounder_core::{
    Chunk, ChunkMetadata, CollectionStats, Error, Lexicon, MetadataFilter, Result, ScoredChunk,
};
pub use grounder_index::{IndexReport, IndexedFile, SkipReason, SkippedFile};
pub use grounder_retrieve::{grounding_context, RetrievedPassage, NO_CONTEXT_NOTICE};
