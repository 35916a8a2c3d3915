//! # grounder-index
//!
//! Incremental indexing for the Grounder retrieval engine.
//!
//! - [`FileChangeCache`]: content-hash ledger deciding which files need
//!   re-embedding, persisted as a flat JSON map
//! - [`MutationLocks`]: per-collection mutual exclusion with a bounded
//!   acquisition timeout
//! - [`Indexer`]: the orchestrator walking a folder through
//!   extract → chunk → embed → store, with per-file failure isolation and a
//!   structured [`IndexReport`] for the status collaborator
//!
//! ## Job lifecycle
//!
//! ```text
//! Idle → AcquireLock → (forced reset?) → Walking
//!      → PerFile { hash → cache rule → extract → chunk → embed → store }
//!      → ReleaseLock → Done | Failed
//! ```
//!
//! A job fails only when the root path is invalid, the chunker config is
//! invalid, or the lock cannot be acquired in time. Everything that goes
//! wrong with a single file is logged and recorded as a skip.

pub mod cache;
pub mod indexer;
pub mod lock;

pub use cache::FileChangeCache;
pub use indexer::{IndexReport, IndexedFile, Indexer, IndexerConfig, SkipReason, SkippedFile};
pub use lock::MutationLocks;
