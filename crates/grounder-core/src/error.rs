//! Error types for the Grounder pipeline.

use std::time::Duration;
use thiserror::Error;

/// Main error type for Grounder operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Content extraction failed
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractError),

    /// Chunking failed
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkError),

    /// Embedding generation failed
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbedError),

    /// Vector store operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error, reported before any work is attempted
    #[error("config error: {0}")]
    Config(String),

    /// The index mutation lock could not be acquired within the timeout
    #[error("timed out after {waited:?} waiting for mutation lock on collection '{collection}'")]
    LockTimeout {
        collection: String,
        waited: Duration,
    },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Content extraction errors.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("extraction failed: {0}")]
    Failed(String),
}

/// Chunking errors.
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Embedding errors.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("model loading failed: {0}")]
    ModelLoad(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("embedding backend is disabled: {0}")]
    Disabled(String),
}

/// Vector store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store initialization failed: {0}")]
    Init(String),

    #[error("collection '{0}' not found")]
    CollectionMissing(String),

    #[error("insert failed: {0}")]
    Insert(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("delete failed: {0}")]
    Delete(String),

    #[error("schema error: {0}")]
    Schema(String),
}

impl StoreError {
    /// Whether this error indicates the collection vanished out-of-band and
    /// a recreate-and-retry is worth attempting.
    #[must_use]
    pub fn is_collection_missing(&self) -> bool {
        match self {
            StoreError::CollectionMissing(_) => true,
            StoreError::Init(msg)
            | StoreError::Insert(msg)
            | StoreError::Query(msg)
            | StoreError::Delete(msg) => {
                let msg = msg.to_ascii_lowercase();
                msg.contains("not found") || msg.contains("does not exist")
            }
            StoreError::Schema(_) => false,
        }
    }
}

/// Result type alias for Grounder operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_display() {
        let err = ExtractError::UnsupportedType(".xyz".to_string());
        assert_eq!(err.to_string(), "unsupported file type: .xyz");
    }

    #[test]
    fn test_chunk_error_display() {
        let err = ChunkError::InvalidConfig("overlap must be < chunk_size".to_string());
        assert_eq!(
            err.to_string(),
            "invalid configuration: overlap must be < chunk_size"
        );
    }

    #[test]
    fn test_embed_error_display() {
        let err = EmbedError::Inference("CUDA out of memory".to_string());
        assert_eq!(err.to_string(), "inference failed: CUDA out of memory");

        let err = EmbedError::Disabled("no backend configured".to_string());
        assert!(err.to_string().contains("disabled"));
    }

    #[test]
    fn test_lock_timeout_display() {
        let err = Error::LockTimeout {
            collection: "user_42".to_string(),
            waited: Duration::from_secs(600),
        };
        let msg = err.to_string();
        assert!(msg.contains("user_42"));
        assert!(msg.contains("600"));
    }

    #[test]
    fn test_collection_missing_detection() {
        assert!(StoreError::CollectionMissing("docs".to_string()).is_collection_missing());
        assert!(StoreError::Insert("table docs does not exist".to_string())
            .is_collection_missing());
        assert!(StoreError::Query("Table 'docs' was not found".to_string())
            .is_collection_missing());
        assert!(!StoreError::Insert("dimension mismatch".to_string()).is_collection_missing());
        assert!(!StoreError::Schema("missing column".to_string()).is_collection_missing());
    }

    #[test]
    fn test_error_from_extract_error() {
        let err: Error = ExtractError::Parse("bad xml".to_string()).into();
        assert!(matches!(err, Error::Extraction(_)));
        assert!(err.to_string().contains("bad xml"));
    }

    #[test]
    fn test_error_from_store_error() {
        let err: Error = StoreError::Query("timeout".to_string()).into();
        assert!(matches!(err, Error::Store(_)));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn ok_fn() -> Result<u32> {
            Ok(7)
        }
        fn err_fn() -> Result<u32> {
            Err(Error::Config("bad root".to_string()))
        }

        assert!(ok_fn().is_ok());
        assert!(err_fn().is_err());
    }
}
