//! Extractor registry: routes files to extractors by extension.

use grounder_core::{DocumentExtractor, ExtractError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Legacy binary formats with no supported parser. These are explicit skips
/// with a reason, not errors.
const LEGACY_EXTENSIONS: &[&str] = &[".doc", ".ppt", ".xls"];

/// Registry of document extractors keyed by file extension.
pub struct ExtractorRegistry {
    extractors: HashMap<String, Arc<dyn DocumentExtractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Create a registry with every built-in extractor registered.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(crate::TextExtractor::new());
        registry.register(crate::PdfExtractor::new());
        registry.register(crate::DocxExtractor::new());
        registry.register(crate::XlsxExtractor::new());
        registry.register(crate::PptxExtractor::new());
        registry
    }

    /// Register an extractor for all of its supported extensions.
    pub fn register<E: DocumentExtractor + 'static>(&mut self, extractor: E) {
        let extractor = Arc::new(extractor);
        for ext in extractor.supported_extensions() {
            self.extractors
                .insert((*ext).to_string(), Arc::clone(&extractor) as Arc<dyn DocumentExtractor>);
        }
    }

    /// Get the extractor responsible for a file, if any.
    #[must_use]
    pub fn get_for_path(&self, path: &Path) -> Option<Arc<dyn DocumentExtractor>> {
        self.extractors.get(&extension_of(path)).cloned()
    }

    /// Whether the file is a known legacy format to skip explicitly.
    #[must_use]
    pub fn is_legacy(&self, path: &Path) -> bool {
        LEGACY_EXTENSIONS.contains(&extension_of(path).as_str())
    }

    /// Extract plain text from a file via the responsible extractor.
    pub async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let extractor = self
            .get_for_path(path)
            .ok_or_else(|| ExtractError::UnsupportedType(extension_of(path)))?;
        extractor.extract(path).await
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Lowercased extension with leading dot, empty string if none.
#[must_use]
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_registry_has_no_extractors() {
        let registry = ExtractorRegistry::new();
        assert!(registry.get_for_path(Path::new("a.txt")).is_none());
    }

    #[test]
    fn test_defaults_cover_supported_formats() {
        let registry = ExtractorRegistry::with_defaults();
        for file in ["a.txt", "b.md", "c.pdf", "d.docx", "e.xlsx", "f.pptx", "g.csv"] {
            assert!(
                registry.get_for_path(Path::new(file)).is_some(),
                "no extractor for {file}"
            );
        }
    }

    #[test]
    fn test_unknown_extension_unhandled() {
        let registry = ExtractorRegistry::with_defaults();
        assert!(registry.get_for_path(Path::new("archive.tar.gz")).is_none());
        assert!(registry.get_for_path(Path::new("binary.exe")).is_none());
        assert!(registry.get_for_path(Path::new("no_extension")).is_none());
    }

    #[test]
    fn test_legacy_formats_flagged() {
        let registry = ExtractorRegistry::with_defaults();
        assert!(registry.is_legacy(Path::new("old.doc")));
        assert!(registry.is_legacy(Path::new("old.ppt")));
        assert!(registry.is_legacy(Path::new("old.xls")));
        assert!(!registry.is_legacy(Path::new("new.docx")));
        // Legacy formats have no extractor either
        assert!(registry.get_for_path(Path::new("old.doc")).is_none());
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("a/b/FILE.TXT")), ".txt");
        assert_eq!(extension_of(Path::new("deck.pptx")), ".pptx");
        assert_eq!(extension_of(Path::new("no_extension")), "");
    }

    #[tokio::test]
    async fn test_extract_routes_to_text_extractor() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("note.md");
        std::fs::write(&path, "# Heading").unwrap();

        let registry = ExtractorRegistry::with_defaults();
        let text = registry.extract(&path).await.unwrap();
        assert_eq!(text, "# Heading");
    }

    #[tokio::test]
    async fn test_extract_unsupported_type() {
        let registry = ExtractorRegistry::with_defaults();
        let err = registry.extract(Path::new("x.bin")).await.unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedType(_)));
        assert!(err.to_string().contains(".bin"));
    }
}
