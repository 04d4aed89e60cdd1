//! Engine configuration

use std::path::{Path, PathBuf};

use kiosk_errors::{KioskError, Result};
use kiosk_profile_repository::RepositoryConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// History settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryConfig {
    /// Record a full snapshot instead of a diff once this many diff
    /// commits follow the newest snapshot. `0` disables periodic snapshots.
    pub snapshot_interval: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: 50,
        }
    }
}

/// Top-level engine configuration.
///
/// ```json
/// {
///   "repository": { "backend": { "type": "file", "dir": "kiosk-data" }, "maxCommits": 100 },
///   "history": { "snapshotInterval": 50 },
///   "source": "profile.json",
///   "defaultAuthor": "kiosk"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Commit store settings
    pub repository: RepositoryConfig,
    /// History settings
    pub history: HistoryConfig,
    /// Canonical profile file used when nothing is stored yet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    /// Author recorded on commits that do not name one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_author: Option<String>,
}

impl EngineConfig {
    /// Read a configuration file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `Json` if it does not parse.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = ?path, "Loading engine configuration");
        let text = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&text).map_err(KioskError::from)
    }

    /// Builder: use `source` as the canonical profile file.
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Builder: replace the repository settings.
    pub fn with_repository(mut self, repository: RepositoryConfig) -> Self {
        self.repository = repository;
        self
    }

    /// Builder: record `author` on commits that do not name one.
    pub fn with_default_author(mut self, author: impl Into<String>) -> Self {
        self.default_author = Some(author.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_profile_repository::StorageBackend;
    use kiosk_test_helpers::prelude::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.history.snapshot_interval, 50);
        assert_eq!(config.repository.backend, StorageBackend::Memory);
        assert!(config.source.is_none());
    }

    #[tokio::test]
    async fn test_load_partial_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("engine.json");
        write_json(
            &path,
            &serde_json::json!({
                "repository": {"backend": {"type": "file", "dir": "data"}, "maxCommits": 10},
                "source": "profile.json"
            }),
        )?;

        let config = EngineConfig::load(&path).await?;
        assert_eq!(config.repository.max_commits, 10);
        assert_eq!(
            config.repository.backend,
            StorageBackend::File { dir: "data".into() }
        );
        assert_eq!(config.source, Some(PathBuf::from("profile.json")));
        assert_eq!(config.history, HistoryConfig::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = EngineConfig::load("/nonexistent/engine.json").await.err();
        assert!(matches!(err, Some(KioskError::Io(_))));
    }
}
