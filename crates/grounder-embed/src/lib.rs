//! # grounder-embed
//!
//! Embedding backends for the Grounder retrieval engine.
//!
//! One embedder instance serves both the indexing and the query path; model
//! weights load once per process and the instance is shared behind an `Arc`.
//!
//! ## Backends
//!
//! | Type | Availability | Purpose |
//! |------|--------------|---------|
//! | [`CandleEmbedder`] | `candle` feature (default) | Sentence embeddings via BERT all-MiniLM-L6-v2, CUDA when available |
//! | [`HashingEmbedder`] | always | Deterministic token-bucket bag-of-words; tests and development |
//! | [`DisabledEmbedder`] | always | Explicit capability-off backend returning a clear error |
//! | [`EmbedderPool`] | always | Semaphore-bounded concurrency wrapper around any backend |
//!
//! The backend in use is reported through [`Embedder::backend`] for
//! diagnostics (e.g. `"cuda"`, `"cpu"`, `"hashing"`).
//!
//! [`Embedder::backend`]: grounder_core::Embedder::backend

#[cfg(feature = "candle")]
pub mod candle;

pub mod disabled;
pub mod hashing;
pub mod pool;

#[cfg(feature = "candle")]
pub use candle::CandleEmbedder;
pub use disabled::DisabledEmbedder;
pub use hashing::HashingEmbedder;
pub use pool::EmbedderPool;
