//! Spreadsheet (.xlsx) extractor.
//!
//! Renders each worksheet as a Markdown pipe table (header row, separator,
//! data rows), values stringified and empty cells left blank, one table
//! block per sheet. Tables embed naturally in chunked text and keep row
//! context close to its header for retrieval.

use async_trait::async_trait;
use grounder_core::{DocumentExtractor, ExtractError};
use quick_xml::events::Event;
use std::path::Path;
use tracing::debug;

use crate::office::read_zip_entry;

/// Sheets processed per workbook before truncating.
const MAX_SHEETS: usize = 100;

/// Extractor for Excel `.xlsx` workbooks.
pub struct XlsxExtractor;

impl XlsxExtractor {
    /// Create a new xlsx extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for XlsxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentExtractor for XlsxExtractor {
    fn supported_extensions(&self) -> &[&str] {
        &[".xlsx"]
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        debug!("Extracting XLSX: {:?}", path);

        let bytes = tokio::fs::read(path).await?;

        tokio::task::spawn_blocking(move || extract_xlsx_text(&bytes))
            .await
            .map_err(|e| ExtractError::Failed(format!("task join error: {e}")))?
    }
}

fn extract_xlsx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Parse(format!("not an xlsx archive: {e}")))?;

    // sharedStrings.xml is optional; a workbook of pure numbers has none
    let has_shared_strings = archive.by_name("xl/sharedStrings.xml").is_ok();
    let shared_strings = if has_shared_strings {
        let xml = read_zip_entry(&mut archive, "xl/sharedStrings.xml")?;
        parse_shared_strings(&xml)?
    } else {
        Vec::new()
    };

    let sheet_names = parse_sheet_names(&mut archive);

    let mut worksheet_entries: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .map(str::to_string)
        .collect();
    worksheet_entries.sort_by_key(|name| {
        name.trim_start_matches("xl/worksheets/sheet")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });

    let mut blocks = Vec::new();
    for (idx, entry) in worksheet_entries.into_iter().take(MAX_SHEETS).enumerate() {
        let xml = read_zip_entry(&mut archive, &entry)?;
        let rows = parse_sheet_rows(&xml, &shared_strings)?;
        if rows.is_empty() {
            continue;
        }

        let name = sheet_names
            .get(idx)
            .cloned()
            .unwrap_or_else(|| format!("Sheet{}", idx + 1));
        blocks.push(format!("Sheet: {name}\n{}", render_pipe_table(&rows)));
    }

    Ok(blocks.join("\n\n"))
}

/// Sheet names from `xl/workbook.xml`, in workbook order.
fn parse_sheet_names(archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>) -> Vec<String> {
    let Ok(xml) = read_zip_entry(archive, "xl/workbook.xml") else {
        return Vec::new();
    };

    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    let mut names = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"name" {
                        if let Ok(v) = attr.unescape_value() {
                            names.push(v.into_owned());
                        }
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    names
}

/// Shared string table: one entry per `<si>`, runs concatenated.
fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>, ExtractError> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut strings = Vec::new();
    let mut buf = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" if current.is_some() => in_text = true,
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                if let Some(s) = current.as_mut() {
                    s.push_str(t.unescape().unwrap_or_default().as_ref());
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"si" => {
                    if let Some(s) = current.take() {
                        strings.push(s);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::Parse(format!(
                    "malformed sharedStrings.xml: {e}"
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// One worksheet as rows of stringified cell values, positioned by the
/// cell's column reference so blanks stay blank.
fn parse_sheet_rows(
    xml: &[u8],
    shared_strings: &[String],
) -> Result<Vec<Vec<String>>, ExtractError> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut buf = Vec::new();

    let mut current_row: Vec<String> = Vec::new();
    let mut in_row = false;
    let mut in_value = false;
    let mut cell_column: usize = 0;
    let mut cell_type: Vec<u8> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    in_row = true;
                    current_row.clear();
                }
                b"c" if in_row => {
                    cell_column = current_row.len();
                    cell_type.clear();
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"r" => {
                                if let Some(col) = column_index(&attr.value) {
                                    cell_column = col;
                                }
                            }
                            b"t" => cell_type = attr.value.to_vec(),
                            _ => {}
                        }
                    }
                }
                b"v" | b"t" if in_row => in_value = true,
                _ => {}
            },
            Ok(Event::Text(t)) if in_value => {
                let raw = t.unescape().unwrap_or_default().into_owned();
                let value = if cell_type.as_slice() == b"s" {
                    raw.trim()
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| shared_strings.get(i).cloned())
                        .unwrap_or_default()
                } else {
                    raw
                };

                while current_row.len() < cell_column {
                    current_row.push(String::new());
                }
                current_row.push(value);
                in_value = false;
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"row" => {
                    in_row = false;
                    if current_row.iter().any(|c| !c.is_empty()) {
                        rows.push(std::mem::take(&mut current_row));
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Parse(format!("malformed worksheet: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    Ok(rows)
}

/// 0-based column index from a cell reference like `B3`.
fn column_index(cell_ref: &[u8]) -> Option<usize> {
    let letters: Vec<u8> = cell_ref
        .iter()
        .copied()
        .take_while(u8::is_ascii_uppercase)
        .collect();
    if letters.is_empty() {
        return None;
    }

    let mut col = 0usize;
    for c in letters {
        col = col * 26 + (c - b'A' + 1) as usize;
    }
    Some(col - 1)
}

/// Render rows as a Markdown pipe table: header, separator, data rows.
fn render_pipe_table(rows: &[Vec<String>]) -> String {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);

    let render_row = |row: &[String]| {
        let mut cells: Vec<&str> = row.iter().map(String::as_str).collect();
        cells.resize(width, "");
        format!("| {} |", cells.join(" | "))
    };

    let mut lines = vec![render_row(&rows[0])];
    lines.push(format!("| {} |", vec!["---"; width].join(" | ")));
    for row in &rows[1..] {
        lines.push(render_row(row));
    }
    lines.join("\n")
}
