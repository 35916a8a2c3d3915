//! Indexing orchestrator.
//!
//! Walks a folder, applies the change-cache skip rule, and runs every
//! changed file through extract → chunk → embed → store under the
//! collection's mutation lock. One bad file never unwinds the batch; the
//! job fails only on an invalid root, an invalid chunker config, or a lock
//! acquisition timeout.

use chrono::{DateTime, Utc};
use grounder_chunker::SlidingChunker;
use grounder_core::{
    chunk_id, Chunk, ChunkMetadata, Error, Lexicon, Result, SourceDocument, VectorStore,
};
use grounder_embed::EmbedderPool;
use grounder_extract::registry::extension_of;
use grounder_extract::ExtractorRegistry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::cache::FileChangeCache;
use crate::lock::MutationLocks;

/// Why a file was not (re-)embedded during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Content hash matches the cache; nothing to do
    Unchanged,
    /// No extractor handles this extension
    UnsupportedFormat(String),
    /// Legacy binary format with no supported parser
    LegacyFormat(String),
    /// Extraction produced no text
    EmptyContent,
    /// The file could not be read or hashed
    Unreadable(String),
    /// Extraction raised an error
    ExtractionFailed(String),
    /// The embedding backend failed for this file
    EmbeddingFailed(String),
    /// The vector store rejected this file's chunks
    StoreFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Unchanged => write!(f, "content unchanged since last indexing"),
            SkipReason::UnsupportedFormat(ext) => write!(f, "unsupported format '{ext}'"),
            SkipReason::LegacyFormat(ext) => write!(f, "legacy format '{ext}' is not supported"),
            SkipReason::EmptyContent => write!(f, "no extractable text"),
            SkipReason::Unreadable(e) => write!(f, "unreadable: {e}"),
            SkipReason::ExtractionFailed(e) => write!(f, "extraction failed: {e}"),
            SkipReason::EmbeddingFailed(e) => write!(f, "embedding failed: {e}"),
            SkipReason::StoreFailed(e) => write!(f, "store rejected chunks: {e}"),
        }
    }
}

/// A file embedded (or re-embedded) during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFile {
    pub relative_path: PathBuf,
    pub chunk_count: u32,
}

/// A file skipped during a run, with its reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub relative_path: PathBuf,
    pub reason: SkipReason,
}

/// Structured result of one indexing job, for the status collaborator.
#[derive(Debug, Clone)]
pub struct IndexReport {
    /// Collection the job mutated
    pub collection: String,
    /// Files seen by the walk
    pub files_discovered: usize,
    /// Files embedded this run
    pub indexed: Vec<IndexedFile>,
    /// Files skipped this run, each with a reason
    pub skipped: Vec<SkippedFile>,
    /// Wall-clock duration of the job
    pub elapsed: Duration,
}

impl IndexReport {
    /// Number of files embedded this run.
    #[must_use]
    pub fn indexed_count(&self) -> usize {
        self.indexed.len()
    }

    /// Number of files skipped this run.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Total chunks written this run.
    #[must_use]
    pub fn chunk_total(&self) -> u64 {
        self.indexed.iter().map(|f| u64::from(f.chunk_count)).sum()
    }
}

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Bound on waiting for the collection's mutation lock
    pub lock_timeout: Duration,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(600),
        }
    }
}

enum Outcome {
    Indexed(u32),
    Skipped(SkipReason),
}

/// The indexing orchestrator.
///
/// Holds shared handles to the pipeline components; one instance per
/// collection is typical, but instances are cheap and stateless apart from
/// the change cache.
pub struct Indexer {
    store: Arc<dyn VectorStore>,
    embedder: Arc<EmbedderPool>,
    extractors: Arc<ExtractorRegistry>,
    chunker: SlidingChunker,
    cache: Mutex<FileChangeCache>,
    locks: Arc<MutationLocks>,
    lexicon: Option<Arc<Lexicon>>,
    config: IndexerConfig,
}

impl Indexer {
    /// Create a new orchestrator.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<EmbedderPool>,
        extractors: Arc<ExtractorRegistry>,
        chunker: SlidingChunker,
        cache: FileChangeCache,
        locks: Arc<MutationLocks>,
        config: IndexerConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            extractors,
            chunker,
            cache: Mutex::new(cache),
            locks,
            lexicon: None,
            config,
        }
    }

    /// Feed indexed text into a shared spell lexicon.
    #[must_use]
    pub fn with_lexicon(mut self, lexicon: Arc<Lexicon>) -> Self {
        self.lexicon = Some(lexicon);
        self
    }

    /// Index every file under `root` into the store's collection.
    ///
    /// With `force_rebuild` the collection is reset and the change cache
    /// cleared before walking, so the store afterwards reflects exactly the
    /// current file set.
    pub async fn index_folder(&self, root: &Path, force_rebuild: bool) -> Result<IndexReport> {
        let started = Instant::now();

        if !root.is_dir() {
            return Err(Error::Config(format!(
                "indexing root is not a directory: {}",
                root.display()
            )));
        }

        info!(
            root = ?root,
            force_rebuild,
            collection = %self.store.collection(),
            backend = self.embedder.backend(),
            model = self.embedder.model_name(),
            "starting indexing job"
        );

        // Serializes every store mutation of this run, including a forced
        // reset. Timeout here fails the job with the store untouched.
        let _guard = self
            .locks
            .acquire(self.store.collection(), self.config.lock_timeout)
            .await?;

        self.store.init().await.map_err(Error::Store)?;

        let mut cache = self.cache.lock().await;

        if force_rebuild {
            self.store.reset().await.map_err(Error::Store)?;
            cache.clear();
            if let Err(e) = cache.save() {
                warn!("failed to persist cleared file cache: {e}");
            }
            if let Some(lexicon) = &self.lexicon {
                lexicon.clear();
            }
        }

        let root_buf = root.to_path_buf();
        let files = tokio::task::spawn_blocking(move || collect_files(&root_buf))
            .await
            .map_err(|e| Error::Other(format!("walk task failed: {e}")))?;

        let mut report = IndexReport {
            collection: self.store.collection().to_string(),
            files_discovered: files.len(),
            indexed: Vec::new(),
            skipped: Vec::new(),
            elapsed: Duration::ZERO,
        };

        for path in files {
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            match self
                .process_file(&path, &relative, force_rebuild, &mut cache)
                .await
            {
                Outcome::Indexed(chunk_count) => report.indexed.push(IndexedFile {
                    relative_path: relative,
                    chunk_count,
                }),
                Outcome::Skipped(reason) => report.skipped.push(SkippedFile {
                    relative_path: relative,
                    reason,
                }),
            }
        }

        report.elapsed = started.elapsed();
        info!(
            collection = %report.collection,
            discovered = report.files_discovered,
            indexed = report.indexed_count(),
            skipped = report.skipped_count(),
            chunks = report.chunk_total(),
            elapsed = ?report.elapsed,
            "indexing job finished"
        );

        Ok(report)
    }

    /// Run one file through the pipeline. Every failure is caught here and
    /// returned as a skip; nothing a single file does can fail the job.
    async fn process_file(
        &self,
        path: &Path,
        relative: &Path,
        force_rebuild: bool,
        cache: &mut FileChangeCache,
    ) -> Outcome {
        let cache_key = path.to_string_lossy().to_string();

        let hash = {
            let path = path.to_path_buf();
            match tokio::task::spawn_blocking(move || FileChangeCache::compute_hash(&path)).await {
                Ok(Ok(hash)) => hash,
                Ok(Err(e)) => {
                    warn!(file = ?relative, "could not hash file: {e}");
                    return Outcome::Skipped(SkipReason::Unreadable(e.to_string()));
                }
                Err(e) => {
                    warn!(file = ?relative, "hash task failed: {e}");
                    return Outcome::Skipped(SkipReason::Unreadable(e.to_string()));
                }
            }
        };

        // Skip rule: unchanged content on a non-forced run
        if !force_rebuild && cache.get_hash(&cache_key) == Some(hash.as_str()) {
            debug!(file = ?relative, "skipping unchanged file");
            return Outcome::Skipped(SkipReason::Unchanged);
        }

        let extension = extension_of(path);
        if self.extractors.is_legacy(path) {
            warn!(file = ?relative, "legacy format not supported");
            return Outcome::Skipped(SkipReason::LegacyFormat(extension));
        }
        let Some(extractor) = self.extractors.get_for_path(path) else {
            debug!(file = ?relative, "skipping unsupported file type");
            return Outcome::Skipped(SkipReason::UnsupportedFormat(extension));
        };

        let text = match extractor.extract(path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(file = ?relative, "could not extract file: {e}");
                return Outcome::Skipped(SkipReason::ExtractionFailed(e.to_string()));
            }
        };
        if text.trim().is_empty() {
            debug!(file = ?relative, "no extractable text");
            return Outcome::Skipped(SkipReason::EmptyContent);
        }

        let pieces = self.chunker.chunk(&text);
        if pieces.is_empty() {
            return Outcome::Skipped(SkipReason::EmptyContent);
        }

        let document = source_document(path, relative);
        let doc_id = document.id();
        let total_chunks = pieces.len() as u32;

        let mut chunks: Vec<Chunk> = pieces
            .into_iter()
            .enumerate()
            .map(|(ordinal, piece)| {
                let ordinal = ordinal as u32;
                Chunk {
                    id: chunk_id(doc_id, ordinal),
                    document_id: doc_id,
                    metadata: ChunkMetadata {
                        file_name: document.file_name.clone(),
                        relative_path: relative.to_string_lossy().into_owned(),
                        extension: document.extension.clone(),
                        size: piece.chars().count(),
                        chunk_index: ordinal,
                        total_chunks,
                        content_hash: hash.clone(),
                        extra: HashMap::new(),
                    },
                    text: piece,
                    embedding: None,
                }
            })
            .collect();

        let embed_started = Instant::now();
        let embeddings = {
            let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
            match self.embedder.embed_batch(&texts).await {
                Ok(embeddings) => embeddings,
                Err(e) => {
                    error!(file = ?relative, "embedding failed: {e}");
                    return Outcome::Skipped(SkipReason::EmbeddingFailed(e.to_string()));
                }
            }
        };
        debug!(
            file = ?relative,
            chunks = chunks.len(),
            elapsed = ?embed_started.elapsed(),
            "embedded file"
        );

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = Some(embedding);
        }

        // Supersede chunks from the previous content of this file so
        // shrinking files leave no stale chunks behind
        if let Err(e) = self.store.delete_by_source(relative).await {
            warn!(file = ?relative, "could not clear superseded chunks: {e}");
        }

        if let Err(e) = self.store.add_chunks(&chunks).await {
            error!(file = ?relative, "store rejected chunks: {e}");
            return Outcome::Skipped(SkipReason::StoreFailed(e.to_string()));
        }

        if let Some(lexicon) = &self.lexicon {
            lexicon.add_text(&text);
        }

        cache.update(&cache_key, hash, total_chunks);
        if let Err(e) = cache.save() {
            warn!("failed to persist file cache: {e}");
        }

        info!(file = ?relative, chunks = total_chunks, "indexed file");
        Outcome::Indexed(total_chunks)
    }
}

/// Recursively enumerate files under `root`, in walk order. Unreadable
/// directories are logged and skipped.
fn collect_files(root: &Path) -> Vec<PathBuf> {
    fn visit(dir: &Path, out: &mut Vec<PathBuf>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = ?dir, "cannot read directory: {e}");
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                visit(&path, out);
            } else if path.is_file() {
                out.push(path);
            }
        }
    }

    let mut files = Vec::new();
    visit(root, &mut files);
    files
}

/// Best-effort filesystem metadata for a file.
fn source_document(path: &Path, relative: &Path) -> SourceDocument {
    let metadata = std::fs::metadata(path).ok();
    let size_bytes = metadata.as_ref().map_or(0, std::fs::Metadata::len);
    let modified_at = metadata
        .and_then(|m| m.modified().ok())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(Utc::now);

    SourceDocument {
        path: path.to_path_buf(),
        relative_path: relative.to_path_buf(),
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        extension: extension_of(path),
        size_bytes,
        modified_at,
    }
}
