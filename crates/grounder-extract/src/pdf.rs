//! PDF text extractor built on lopdf.

use async_trait::async_trait;
use grounder_core::{DocumentExtractor, ExtractError};
use lopdf::Document;
use std::path::Path;
use tracing::debug;

/// Extractor for PDF files.
///
/// Extracts text page by page and joins pages with blank lines. Pages that
/// yield no text (scanned images, vector art) contribute nothing; they are
/// not errors.
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create a new PDF extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    fn supported_extensions(&self) -> &[&str] {
        &[".pdf"]
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        debug!("Extracting PDF: {:?}", path);

        let bytes = tokio::fs::read(path).await?;

        // lopdf parsing is CPU-bound
        tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
            .await
            .map_err(|e| ExtractError::Failed(format!("task join error: {e}")))?
    }
}

/// Extract per-page text from PDF bytes, joined with blank lines.
fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| ExtractError::Parse(format!("failed to load PDF: {e}")))?;

    let mut pages = Vec::new();
    for page_num in doc.get_pages().keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(text) => {
                let text = text.trim().to_string();
                if !text.is_empty() {
                    pages.push(text);
                }
            }
            Err(e) => {
                // A single unreadable page doesn't fail the document
                debug!("no text on page {}: {}", page_num, e);
            }
        }
    }

    Ok(pages.join("\n\n"))
}
