//! Word document (.docx) extractor.
//!
//! A `.docx` file is a ZIP archive; paragraph text lives in
//! `word/document.xml` as `<w:t>` runs grouped under `<w:p>` paragraphs.

use async_trait::async_trait;
use grounder_core::{DocumentExtractor, ExtractError};
use quick_xml::events::Event;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Decompressed size cap for a single archive entry.
pub(crate) const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extractor for Word `.docx` documents.
///
/// Concatenates paragraph text in document order, one line per paragraph.
pub struct DocxExtractor;

impl DocxExtractor {
    /// Create a new docx extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentExtractor for DocxExtractor {
    fn supported_extensions(&self) -> &[&str] {
        &[".docx"]
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        debug!("Extracting DOCX: {:?}", path);

        let bytes = tokio::fs::read(path).await?;

        tokio::task::spawn_blocking(move || extract_docx_text(&bytes))
            .await
            .map_err(|e| ExtractError::Failed(format!("task join error: {e}")))?
    }
}

/// Read one archive entry fully, bounded against zip bombs.
pub(crate) fn read_zip_entry(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
) -> Result<Vec<u8>, ExtractError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Parse(format!("missing {name}: {e}")))?;

    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Parse(format!("failed to read {name}: {e}")))?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Parse(format!(
            "{name} exceeds {MAX_XML_ENTRY_BYTES} byte limit"
        )));
    }
    Ok(out)
}

fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Parse(format!("not a docx archive: {e}")))?;

    let doc_xml = read_zip_entry(&mut archive, "word/document.xml")?;
    collect_paragraph_text(&doc_xml)
}

/// Collect `<w:t>` run text, one output line per `<w:p>` paragraph.
fn collect_paragraph_text(xml: &[u8]) -> Result<String, ExtractError> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut out = String::new();
    let mut buf = Vec::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text_run = true,
            Ok(Event::Text(t)) if in_text_run => {
                out.push_str(t.unescape().unwrap_or_default().as_ref());
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Parse(format!("malformed document.xml: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    Ok(out.trim_end().to_string())
}
