//! Fixed-size sliding window over whitespace tokens.

use grounder_core::ChunkError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the sliding-window chunker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Window size in whitespace tokens
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Tokens shared between consecutive chunks
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

fn default_chunk_size() -> usize {
    500
}

fn default_overlap() -> usize {
    100
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

impl ChunkerConfig {
    /// Validate the configuration.
    ///
    /// `overlap >= chunk_size` would make the window advance by zero or less
    /// and loop forever, so it is rejected up front as a configuration
    /// error rather than clamped silently.
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.chunk_size == 0 {
            return Err(ChunkError::InvalidConfig(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(ChunkError::InvalidConfig(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Tokens the window advances per step. Validated configs never return
    /// less than 1, but the clamp guards against infinite loops regardless.
    #[must_use]
    pub fn advance(&self) -> usize {
        self.chunk_size.saturating_sub(self.overlap).max(1)
    }
}

/// Sliding-window chunker over whitespace tokens.
pub struct SlidingChunker {
    config: ChunkerConfig,
}

impl SlidingChunker {
    /// Create a chunker with a validated configuration.
    pub fn new(config: ChunkerConfig) -> Result<Self, ChunkError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split `text` into ordered, overlapping chunks.
    ///
    /// Zero-length (or whitespace-only) input yields zero chunks. The final
    /// window is included even when partial.
    #[must_use]
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            return Vec::new();
        }

        let advance = self.config.advance();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < tokens.len() {
            let end = (start + self.config.chunk_size).min(tokens.len());
            chunks.push(tokens[start..end].join(" "));
            if end == tokens.len() {
                break;
            }
            start += advance;
        }

        debug!(
            tokens = tokens.len(),
            chunks = chunks.len(),
            chunk_size = self.config.chunk_size,
            overlap = self.config.overlap,
            "chunked document"
        );

        chunks
    }
}
