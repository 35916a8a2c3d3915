//! Content-hash ledger for incremental re-indexing.
//!
//! Maps each file path to the content hash and chunk count recorded after
//! its last successful embedding. A file whose freshly computed hash matches
//! the cached one is skipped on non-forced runs. Entries never expire; only
//! a forced rebuild clears the ledger.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Block size for streaming file hashing.
const HASH_BLOCK_SIZE: usize = 8192;

/// Cached state of one indexed file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileHashEntry {
    /// Content hash at the time of the last successful embedding
    pub hash: String,
    /// Chunks produced from that content
    pub chunk_count: u32,
}

/// On-disk ledger of file content hashes, keyed by file path.
#[derive(Debug)]
pub struct FileChangeCache {
    cache_path: PathBuf,
    entries: HashMap<String, FileHashEntry>,
}

impl FileChangeCache {
    /// Load the ledger from `cache_path`.
    ///
    /// A missing or unreadable ledger is not an error: indexing proceeds
    /// from an empty one and re-embeds everything.
    #[must_use]
    pub fn load(cache_path: PathBuf) -> Self {
        let entries = match std::fs::read(&cache_path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = ?cache_path, "discarding corrupt file cache: {e}");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(path = ?cache_path, "failed to read file cache: {e}");
                HashMap::new()
            }
        };

        debug!(path = ?cache_path, entries = entries.len(), "loaded file cache");
        Self {
            cache_path,
            entries,
        }
    }

    /// Persist the ledger atomically (write to a temp file, then rename),
    /// so a racing reader never observes a truncated ledger.
    pub fn save(&self) -> std::io::Result<()> {
        if let Some(parent) = self.cache_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = self.cache_path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(&self.entries)?;
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.cache_path)?;
        Ok(())
    }

    /// Cached hash for a file path, if any.
    #[must_use]
    pub fn get_hash(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(|e| e.hash.as_str())
    }

    /// Cached chunk count for a file path, if any.
    #[must_use]
    pub fn get_chunk_count(&self, path: &str) -> Option<u32> {
        self.entries.get(path).map(|e| e.chunk_count)
    }

    /// Record a file's hash and chunk count after successful embedding.
    pub fn update(&mut self, path: &str, hash: String, chunk_count: u32) {
        self.entries
            .insert(path.to_string(), FileHashEntry { hash, chunk_count });
    }

    /// Drop every entry (forced rebuild).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of tracked files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compute the content hash of a file by streaming it in fixed-size
    /// blocks. Blocking; call through `spawn_blocking` from async code.
    pub fn compute_hash(path: &Path) -> std::io::Result<String> {
        let mut file = std::fs::File::open(path)?;
        let mut hasher = blake3::Hasher::new();
        let mut block = [0u8; HASH_BLOCK_SIZE];

        loop {
            let read = file.read(&mut block)?;
            if read == 0 {
                break;
            }
            hasher.update(&block[..read]);
        }

        Ok(hasher.finalize().to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_cache_is_empty() {
        let dir = tempdir().unwrap();
        let cache = FileChangeCache::load(dir.path().join("cache.json"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_load_corrupt_cache_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{not json").unwrap();

        let cache = FileChangeCache::load(path);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_update_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let mut cache = FileChangeCache::load(path.clone());
        cache.update("docs/a.txt", "hash_a".to_string(), 3);
        cache.update("docs/b.pdf", "hash_b".to_string(), 7);
        cache.save().unwrap();

        let reloaded = FileChangeCache::load(path);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get_hash("docs/a.txt"), Some("hash_a"));
        assert_eq!(reloaded.get_chunk_count("docs/b.pdf"), Some(7));
        assert_eq!(reloaded.get_hash("docs/missing.txt"), None);
    }

    #[test]
    fn test_update_overwrites() {
        let dir = tempdir().unwrap();
        let mut cache = FileChangeCache::load(dir.path().join("cache.json"));

        cache.update("a.txt", "old".to_string(), 1);
        cache.update("a.txt", "new".to_string(), 2);
        assert_eq!(cache.get_hash("a.txt"), Some("new"));
        assert_eq!(cache.get_chunk_count("a.txt"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let dir = tempdir().unwrap();
        let mut cache = FileChangeCache::load(dir.path().join("cache.json"));
        cache.update("a.txt", "h".to_string(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/dir/cache.json");

        let mut cache = FileChangeCache::load(path.clone());
        cache.update("a.txt", "h".to_string(), 1);
        cache.save().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let mut cache = FileChangeCache::load(path.clone());
        cache.update("a.txt", "h".to_string(), 1);
        cache.save().unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_compute_hash_stable_and_content_sensitive() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        std::fs::write(&a, "content one").unwrap();
        std::fs::write(&b, "content two").unwrap();

        let hash_a1 = FileChangeCache::compute_hash(&a).unwrap();
        let hash_a2 = FileChangeCache::compute_hash(&a).unwrap();
        let hash_b = FileChangeCache::compute_hash(&b).unwrap();

        assert_eq!(hash_a1, hash_a2);
        assert_ne!(hash_a1, hash_b);
        assert_eq!(hash_a1.len(), 64);
    }

    #[test]
    fn test_compute_hash_streams_large_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("large.bin");
        // Larger than several hash blocks
        std::fs::write(&path, vec![0xabu8; HASH_BLOCK_SIZE * 3 + 17]).unwrap();

        let hash = FileChangeCache::compute_hash(&path).unwrap();
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_compute_hash_missing_file_errors() {
        assert!(FileChangeCache::compute_hash(Path::new("/nonexistent")).is_err());
    }
}
