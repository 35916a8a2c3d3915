//! Engine configuration.

use directories::ProjectDirs;
use grounder_chunker::ChunkerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Collection name for a tenant, matching the service's per-user scoping.
#[must_use]
pub fn tenant_collection(user_id: &str) -> String {
    format!("user_{user_id}")
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding the vector database and the file change cache
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Collection this engine instance operates on
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkerConfig,

    /// Embedding configuration
    #[serde(default)]
    pub embedding: EmbeddingSettings,

    /// Indexing configuration
    #[serde(default)]
    pub indexing: IndexingSettings,

    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalSettings,
}

/// Embedding-related settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Texts per inference batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Max concurrent embed operations sharing the model
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

/// Indexing-related settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingSettings {
    /// Bound on waiting for a collection's mutation lock, in seconds
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,
}

/// Retrieval-related settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Candidates fetched per requested result before re-ranking
    #[serde(default = "default_overfetch_factor")]
    pub overfetch_factor: usize,

    /// Floor on the candidate count
    #[serde(default = "default_min_candidates")]
    pub min_candidates: usize,
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "grounder")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn default_collection() -> String {
    "documents".to_string()
}

fn default_batch_size() -> usize {
    32
}

fn default_max_concurrent() -> usize {
    4
}

fn default_lock_timeout_secs() -> u64 {
    600
}

fn default_overfetch_factor() -> usize {
    4
}

fn default_min_candidates() -> usize {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            collection: default_collection(),
            chunking: ChunkerConfig::default(),
            embedding: EmbeddingSettings::default(),
            indexing: IndexingSettings::default(),
            retrieval: RetrievalSettings::default(),
        }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            lock_timeout_secs: default_lock_timeout_secs(),
        }
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            overfetch_factor: default_overfetch_factor(),
            min_candidates: default_min_candidates(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> grounder_core::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| {
            grounder_core::Error::Config(format!("invalid config {}: {e}", path.display()))
        })
    }

    /// Path of the LanceDB database directory.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("index")
    }

    /// Path of the file change cache ledger.
    #[must_use]
    pub fn cache_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("indexed_files_{}.json", self.collection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.collection, "documents");
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.overlap, 100);
        assert_eq!(config.embedding.batch_size, 32);
        assert_eq!(config.indexing.lock_timeout_secs, 600);
        assert_eq!(config.retrieval.overfetch_factor, 4);
        assert_eq!(config.retrieval.min_candidates, 10);
    }

    #[test]
    fn test_tenant_collection() {
        assert_eq!(tenant_collection("42"), "user_42");
    }

    #[test]
    fn test_cache_path_scoped_to_collection() {
        let mut config = EngineConfig::default();
        config.collection = "user_7".to_string();
        assert!(config
            .cache_path()
            .to_string_lossy()
            .ends_with("indexed_files_user_7.json"));
    }

    #[test]
    fn test_load_partial_toml_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grounder.toml");
        std::fs::write(
            &path,
            r#"
                collection = "user_9"

                [chunking]
                chunk_size = 256
            "#,
        )
        .unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.collection, "user_9");
        assert_eq!(config.chunking.chunk_size, 256);
        // Unspecified fields fall back to defaults
        assert_eq!(config.chunking.overlap, 100);
        assert_eq!(config.embedding.batch_size, 32);
    }

    #[test]
    fn test_load_invalid_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "chunking = not toml").unwrap();

        let err = EngineConfig::load(&path).unwrap_err();
        assert!(matches!(err, grounder_core::Error::Config(_)));
    }
}
