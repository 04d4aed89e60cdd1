//! Canonical profile sources

use std::path::PathBuf;

use async_trait::async_trait;
use kiosk_errors::{KioskError, Result};
use serde_json::Value;
use tracing::debug;

/// Source of the canonical profile document.
///
/// Loaders return untyped JSON; the engine validates it before use.
#[async_trait]
pub trait ProfileLoader: Send + Sync {
    /// Human-readable description of the source, for logs.
    fn describe(&self) -> String;

    /// Fetch the document.
    async fn load_profile(&self) -> Result<Value>;
}

/// Loads the profile from a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileLoader {
    path: PathBuf,
}

impl JsonFileLoader {
    /// Create a loader for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ProfileLoader for JsonFileLoader {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    async fn load_profile(&self) -> Result<Value> {
        debug!(path = ?self.path, "Loading profile source");
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| KioskError::loader(format!("{}: {e}", self.path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| KioskError::loader(format!("{}: invalid JSON: {e}", self.path.display())))
    }
}

/// Serves a fixed in-memory document.
#[derive(Debug, Clone)]
pub struct StaticLoader {
    doc: Value,
}

impl StaticLoader {
    /// Create a loader returning `doc`.
    pub fn new(doc: Value) -> Self {
        Self { doc }
    }
}

#[async_trait]
impl ProfileLoader for StaticLoader {
    fn describe(&self) -> String {
        "static document".to_string()
    }

    async fn load_profile(&self) -> Result<Value> {
        Ok(self.doc.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_errors::ErrorCategory;
    use kiosk_test_helpers::prelude::*;

    #[tokio::test]
    async fn test_file_loader_reads_document() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("profile.json");
        write_json(&path, &sample_profile_json())?;

        let doc = JsonFileLoader::new(&path).load_profile().await?;
        assert_eq!(doc, sample_profile_json());
        Ok(())
    }

    #[tokio::test]
    async fn test_file_loader_failures_are_loader_errors() -> TestResult {
        let dir = tempfile::tempdir()?;
        let missing = JsonFileLoader::new(dir.path().join("missing.json"));
        let err = missing.load_profile().await.err();
        assert_eq!(err.map(|e| e.category()), Some(ErrorCategory::Loader));

        let garbled = dir.path().join("garbled.json");
        std::fs::write(&garbled, "{ not json")?;
        let err = JsonFileLoader::new(&garbled).load_profile().await.err();
        assert!(err.is_some_and(|e| e.to_string().contains("invalid JSON")));
        Ok(())
    }

    #[tokio::test]
    async fn test_static_loader() -> TestResult {
        let loader = StaticLoader::new(minimal_profile_json());
        assert_eq!(loader.load_profile().await?, minimal_profile_json());
        assert_eq!(loader.describe(), "static document");
        Ok(())
    }
}
