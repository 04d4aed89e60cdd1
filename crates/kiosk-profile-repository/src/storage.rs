//! File helpers with atomic writes

use anyhow::Context;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tracing::debug;

/// Directory-rooted file access used by the durable commit store.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    /// Create the storage rooted at `base_dir`, creating the directory.
    pub async fn new(base_dir: &Path) -> anyhow::Result<Self> {
        async_fs::create_dir_all(base_dir)
            .await
            .with_context(|| format!("Failed to create storage directory: {:?}", base_dir))?;

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
        })
    }

    /// Root directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of `name` below the root.
    pub fn path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.base_dir.join(name)
    }

    /// Create a subdirectory below the root.
    pub async fn ensure_dir(&self, name: &str) -> anyhow::Result<PathBuf> {
        let dir = self.path(name);
        async_fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create directory: {:?}", dir))?;
        Ok(dir)
    }

    /// Write `content` to `path` via a temporary file and a rename.
    ///
    /// A failed write leaves any previous file at `path` intact.
    pub async fn write_atomic(&self, path: &Path, content: &str) -> anyhow::Result<()> {
        debug!(path = ?path, bytes = content.len(), "Writing file atomically");

        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        async_fs::write(&temp_path, content)
            .await
            .with_context(|| format!("Failed to write temp file: {:?}", temp_path))?;

        async_fs::rename(&temp_path, path)
            .await
            .with_context(|| format!("Failed to rename temp file to target: {:?}", path))?;

        Ok(())
    }

    /// Read a file, returning `None` when it does not exist.
    pub async fn read_optional(&self, path: &Path) -> anyhow::Result<Option<String>> {
        debug!(path = ?path, "Reading file");

        match async_fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read file: {:?}", path)),
        }
    }

    /// Delete a file. Returns whether it existed.
    pub async fn delete(&self, path: &Path) -> anyhow::Result<bool> {
        match async_fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to delete file: {:?}", path)),
        }
    }

    /// Delete a directory and everything below it, if present.
    pub async fn remove_dir(&self, name: &str) -> anyhow::Result<()> {
        let dir = self.path(name);
        match async_fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove directory: {:?}", dir)),
        }
    }
}
