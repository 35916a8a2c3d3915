//! Presentation (.pptx) extractor.
//!
//! Slide text lives in `ppt/slides/slideN.xml` as `<a:t>` runs inside
//! text-bearing shapes. All runs across all slides are concatenated in
//! slide order.

use async_trait::async_trait;
use grounder_core::{DocumentExtractor, ExtractError};
use quick_xml::events::Event;
use std::path::Path;
use tracing::debug;

use crate::office::read_zip_entry;

/// Extractor for PowerPoint `.pptx` presentations.
pub struct PptxExtractor;

impl PptxExtractor {
    /// Create a new pptx extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for PptxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentExtractor for PptxExtractor {
    fn supported_extensions(&self) -> &[&str] {
        &[".pptx"]
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        debug!("Extracting PPTX: {:?}", path);

        let bytes = tokio::fs::read(path).await?;

        tokio::task::spawn_blocking(move || extract_pptx_text(&bytes))
            .await
            .map_err(|e| ExtractError::Failed(format!("task join error: {e}")))?
    }
}

fn extract_pptx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Parse(format!("not a pptx archive: {e}")))?;

    let mut slide_entries: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .map(str::to_string)
        .collect();
    slide_entries.sort_by_key(|name| {
        name.trim_start_matches("ppt/slides/slide")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });

    let mut lines = Vec::new();
    for entry in slide_entries {
        let xml = read_zip_entry(&mut archive, &entry)?;
        collect_text_runs(&xml, &mut lines)?;
    }

    Ok(lines.join("\n"))
}

/// Collect `<a:t>` run text from one slide.
fn collect_text_runs(xml: &[u8], out: &mut Vec<String>) -> Result<(), ExtractError> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text_run = true,
            Ok(Event::Text(t)) if in_text_run => {
                let text = t.unescape().unwrap_or_default().into_owned();
                if !text.is_empty() {
                    out.push(text);
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"t" => in_text_run = false,
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Parse(format!("malformed slide xml: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}
