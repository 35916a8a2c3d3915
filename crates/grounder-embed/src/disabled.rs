//! Capability-off embedding backend.

use async_trait::async_trait;
use grounder_core::{EmbedError, Embedder};

/// Embedder used when no embedding backend is configured.
///
/// Every call fails with a clear error instead of silently degrading, so a
/// deployment without an embedding model reports "not available" rather than
/// indexing garbage vectors.
pub struct DisabledEmbedder;

#[async_trait]
impl Embedder for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }

    fn dimension(&self) -> usize {
        0
    }

    fn backend(&self) -> &str {
        "disabled"
    }

    async fn embed(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Err(EmbedError::Disabled(
            "no embedding backend configured for this deployment".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_embed_fails_with_clear_error() {
        let err = DisabledEmbedder.embed(&["hello"]).await.unwrap_err();
        assert!(matches!(err, EmbedError::Disabled(_)));
        assert!(err.to_string().contains("disabled"));
    }

    #[tokio::test]
    async fn test_embed_query_fails_too() {
        assert!(DisabledEmbedder.embed_query("hello").await.is_err());
    }

    #[test]
    fn test_diagnostics() {
        assert_eq!(DisabledEmbedder.model_name(), "disabled");
        assert_eq!(DisabledEmbedder.backend(), "disabled");
        assert_eq!(DisabledEmbedder.dimension(), 0);
    }
}
