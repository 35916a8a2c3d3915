//! Vector storage layer for the Grounder retrieval engine.
//!
//! Implements the [`VectorStore`](grounder_core::VectorStore) trait over two
//! backends:
//!
//! - [`LanceStore`]: production backend on `LanceDB`, one table per named
//!   collection (e.g. one collection per tenant). Collections are created
//!   lazily, recreated transparently if deleted out-of-band, and reset on
//!   forced rebuilds.
//! - [`MemoryStore`]: brute-force cosine search over an in-memory map, for
//!   tests and development builds.
//!
//! # Example
//!
//! ```rust,ignore
//! use grounder_store::LanceStore;
//! use grounder_core::VectorStore;
//!
//! let store = LanceStore::new("data/index".into(), "user_42".to_string(), 384);
//! store.init().await?;
//! store.add_chunks(&chunks).await?;
//! let hits = store.similarity_search(&query_vec, 10, None).await?;
//! ```

pub mod lancedb;
pub mod memory;
pub mod schema;

pub use crate::lancedb::LanceStore;
pub use memory::MemoryStore;
