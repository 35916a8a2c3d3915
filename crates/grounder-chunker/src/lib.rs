//! # grounder-chunker
//!
//! Sliding-window chunking for the Grounder indexing pipeline.
//!
//! Documents are split into overlapping, bounded-size passages suitable for
//! embedding: a window of `chunk_size` whitespace tokens advances by
//! `chunk_size - overlap` tokens per step, so consecutive chunks share
//! exactly `overlap` tokens (except possibly the last partial window) and
//! the whole document is covered with no gaps.
//!
//! ```rust
//! use grounder_chunker::{ChunkerConfig, SlidingChunker};
//!
//! let chunker = SlidingChunker::new(ChunkerConfig::default()).unwrap();
//! let chunks = chunker.chunk("alpha beta gamma delta");
//! assert_eq!(chunks.len(), 1);
//! ```

pub mod sliding;

pub use sliding::{ChunkerConfig, SlidingChunker};
