//! # grounder-extract
//!
//! Content extraction from user document formats for the Grounder indexing
//! pipeline. Each extractor turns a file into plain UTF-8 text; downstream
//! stages chunk and embed that text.
//!
//! ## Supported Formats
//!
//! | Extractor | Formats | Behavior |
//! |-----------|---------|----------|
//! | [`TextExtractor`] | `.txt`, `.md`, `.py`, `.js`, `.ts`, `.json`, `.csv`, `.html`, `.css`, `.xml`, and kin | Lossy UTF-8 read (invalid sequences substituted) |
//! | [`PdfExtractor`] | `.pdf` | Per-page text joined with blank lines; textless pages contribute nothing |
//! | [`DocxExtractor`] | `.docx` | Paragraph text concatenated in order |
//! | [`XlsxExtractor`] | `.xlsx` | One Markdown pipe table per sheet |
//! | [`PptxExtractor`] | `.pptx` | Text of all text-bearing shapes across slides |
//!
//! Legacy binary formats (`.doc`, `.ppt`, `.xls`) are classified by the
//! [`ExtractorRegistry`] as explicit skips rather than errors.
//!
//! Extraction failures are recoverable by contract: the orchestrator logs
//! them and treats the file as having no content, never aborting the batch.

pub mod office;
pub mod pdf;
pub mod registry;
pub mod sheet;
pub mod slides;
pub mod text;

pub use office::DocxExtractor;
pub use pdf::PdfExtractor;
pub use registry::ExtractorRegistry;
pub use sheet::XlsxExtractor;
pub use slides::PptxExtractor;
pub use text::TextExtractor;
