//! Plain text, code, and markup extractor.

use async_trait::async_trait;
use grounder_core::{DocumentExtractor, ExtractError};
use std::path::Path;
use tokio::fs;

/// Extractor for text-based files.
///
/// Reads bytes and decodes them as UTF-8, substituting invalid sequences so
/// that files with mixed or broken encodings still index instead of failing.
pub struct TextExtractor;

impl TextExtractor {
    /// Create a new text extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentExtractor for TextExtractor {
    fn supported_extensions(&self) -> &[&str] {
        &[
            ".txt", ".md", ".markdown", ".py", ".js", ".ts", ".tsx", ".jsx", ".json", ".csv",
            ".html", ".htm", ".css", ".xml", ".yaml", ".yml", ".toml", ".rs", ".go", ".java",
            ".rb", ".sh", ".sql",
        ]
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = fs::read(path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_extract_simple_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "Hello, world!").unwrap();

        let content = TextExtractor::new().extract(&path).await.unwrap();
        assert_eq!(content, "Hello, world!");
    }

    #[tokio::test]
    async fn test_extract_tolerates_invalid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.txt");
        std::fs::write(&path, [b'o', b'k', 0xff, 0xfe, b'!', b' ', b'e', b'n', b'd']).unwrap();

        let content = TextExtractor::new().extract(&path).await.unwrap();
        assert!(content.starts_with("ok"));
        assert!(content.ends_with("! end"));
        assert!(content.contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn test_extract_binary_garbage_does_not_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.txt");
        std::fs::write(&path, [0u8, 159, 146, 150, 255, 0, 7]).unwrap();

        // Corrupted bytes behind a .txt extension degrade to replacement
        // characters, never to a raised fault.
        let result = TextExtractor::new().extract(&path).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_extract_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.md");
        std::fs::write(&path, "").unwrap();

        let content = TextExtractor::new().extract(&path).await.unwrap();
        assert!(content.is_empty());
    }

    #[tokio::test]
    async fn test_extract_missing_file_fails() {
        let result = TextExtractor::new()
            .extract(Path::new("/nonexistent/file.txt"))
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_can_extract_by_extension() {
        let ex = TextExtractor::new();
        assert!(ex.can_extract(Path::new("a.txt")));
        assert!(ex.can_extract(Path::new("b.MD")));
        assert!(ex.can_extract(Path::new("data.csv")));
        assert!(ex.can_extract(Path::new("page.html")));
        assert!(!ex.can_extract(Path::new("image.png")));
        assert!(!ex.can_extract(Path::new("slides.pptx")));
    }

    #[test]
    fn test_supported_extensions_cover_common_formats() {
        let ex = TextExtractor::new();
        for ext in [
            ".txt", ".md", ".py", ".js", ".ts", ".json", ".csv", ".html", ".css", ".xml",
        ] {
            assert!(
                ex.supported_extensions().contains(&ext),
                "missing {ext}"
            );
        }
    }
}
