//! Runtime configuration for the diff core.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{Result, SemError};

/// Matching-engine tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum Jaccard token similarity for a phase-3 fuzzy match.
    pub fuzzy_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.80,
        }
    }
}

/// Per-format plugin tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Nesting depth at which the JSON plugin stops descending into
    /// container values and emits a single `chunk` entity instead.
    pub json_walk_depth: usize,

    /// Nesting depth at which the YAML plugin stops descending.
    pub yaml_walk_depth: usize,

    /// Line count per `chunk` entity emitted by the fallback plugin.
    pub fallback_chunk_size: usize,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            json_walk_depth: 3,
            yaml_walk_depth: 4,
            fallback_chunk_size: 20,
        }
    }
}

/// Embedded-store tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite `journal_mode` pragma.
    pub journal_mode: String,

    /// SQLite `synchronous` pragma.
    pub synchronous: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            journal_mode: "WAL".to_string(),
            synchronous: "NORMAL".to_string(),
        }
    }
}

/// Concurrency tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Worker-pool size for the per-file fan-out; `0` means "use
    /// `std::thread::available_parallelism()`".
    pub worker_threads: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self { worker_threads: 0 }
    }
}

/// Top-level configuration for the diff core, loaded from `.sem/config.yml`
/// when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SemConfig {
    pub matching: MatchingConfig,
    pub plugins: PluginConfig,
    pub store: StoreConfig,
    pub performance: PerformanceConfig,
}

impl SemConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SemError::io(format!("failed to read config file: {}", path.display()), e))?;
        serde_yaml::from_str(&content).map_err(Into::into)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)
            .map_err(|e| SemError::io(format!("failed to write config file: {}", path.display()), e))
    }

    /// Load `.sem/config.yml` relative to `repo_root` if it exists,
    /// otherwise fall back to defaults.
    pub fn load_or_default(repo_root: impl AsRef<Path>) -> Result<Self> {
        let candidate: PathBuf = repo_root.as_ref().join(".sem").join("config.yml");
        if candidate.is_file() {
            Self::from_yaml_file(candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve `worker_threads` to a concrete count.
    pub fn resolved_worker_threads(&self) -> usize {
        if self.performance.worker_threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            self.performance.worker_threads
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_constants() {
        let config = SemConfig::default();
        assert_eq!(config.matching.fuzzy_threshold, 0.80);
        assert_eq!(config.plugins.json_walk_depth, 3);
        assert_eq!(config.plugins.yaml_walk_depth, 4);
        assert_eq!(config.plugins.fallback_chunk_size, 20);
    }

    #[test]
    fn roundtrips_through_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");

        let mut config = SemConfig::default();
        config.matching.fuzzy_threshold = 0.75;
        config.to_yaml_file(&path).unwrap();

        let loaded = SemConfig::from_yaml_file(&path).unwrap();
        assert_eq!(loaded.matching.fuzzy_threshold, 0.75);
    }

    #[test]
    fn load_or_default_falls_back_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = SemConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config.matching.fuzzy_threshold, 0.80);
    }

    #[test]
    fn resolved_worker_threads_is_never_zero() {
        let config = SemConfig::default();
        assert!(config.resolved_worker_threads() >= 1);
    }
}
