//! Durable commit store backed by JSON files
//!
//! Layout below the store root:
//!
//! ```text
//! commits/<commit-id>.json   one file per commit
//! index.json                 commit ids and timestamps in append order
//! profile.json               latest saved profile snapshot
//! ```
//!
//! Every file is replaced atomically. A commit file is written before the
//! index that lists it, so a commit missing from the index is invisible.

use std::path::PathBuf;

use async_trait::async_trait;
use kiosk_errors::{CorruptionError, KioskError, Result};
use kiosk_schemas::Profile;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::commit::{Commit, CommitId};
use crate::storage::FileStorage;
use crate::store::{CommitStore, IndexEntry, time_ordered};

const COMMITS_DIR: &str = "commits";
const INDEX_FILE: &str = "index.json";
const SNAPSHOT_FILE: &str = "profile.json";
const INDEX_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexFile {
    version: u32,
    entries: Vec<IndexEntry>,
}

#[derive(Debug, Default)]
struct FileState {
    storage: Option<FileStorage>,
    index: Vec<IndexEntry>,
}

impl FileState {
    fn storage(&self) -> Result<&FileStorage> {
        self.storage
            .as_ref()
            .ok_or_else(|| KioskError::storage("file commit store is not open"))
    }

    fn contains(&self, id: &CommitId) -> bool {
        self.index.iter().any(|entry| &entry.id == id)
    }

    async fn write_index(&self) -> Result<()> {
        let storage = self.storage()?;
        let file = IndexFile {
            version: INDEX_VERSION,
            entries: self.index.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        storage
            .write_atomic(&storage.path(INDEX_FILE), &json)
            .await
            .map_err(storage_error)
    }
}

fn storage_error(e: anyhow::Error) -> KioskError {
    KioskError::storage(format!("{e:#}"))
}

fn commit_file(id: &CommitId) -> PathBuf {
    PathBuf::from(COMMITS_DIR).join(format!("{id}.json"))
}

/// Commit store persisting to a directory.
#[derive(Debug)]
pub struct FileCommitStore {
    root: PathBuf,
    state: RwLock<FileState>,
}

impl FileCommitStore {
    /// Create a store rooted at `root`. Nothing touches the disk until
    /// [`CommitStore::open`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            state: RwLock::new(FileState::default()),
        }
    }

    /// Store root directory.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

#[async_trait]
impl CommitStore for FileCommitStore {
    fn kind(&self) -> &'static str {
        "file"
    }

    async fn open(&self) -> Result<()> {
        let storage = FileStorage::new(&self.root).await.map_err(storage_error)?;
        storage.ensure_dir(COMMITS_DIR).await.map_err(storage_error)?;

        let index = match storage
            .read_optional(&storage.path(INDEX_FILE))
            .await
            .map_err(storage_error)?
        {
            Some(text) => {
                let file: IndexFile = serde_json::from_str(&text)
                    .map_err(|e| CorruptionError::undecodable(INDEX_FILE, e.to_string()))?;
                if file.version != INDEX_VERSION {
                    warn!(version = file.version, "Unexpected commit index version");
                }
                file.entries
            }
            None => Vec::new(),
        };

        info!(root = ?self.root, commits = index.len(), "File commit store opened");
        let mut state = self.state.write().await;
        state.storage = Some(storage);
        state.index = index;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.storage = None;
        state.index.clear();
        debug!(root = ?self.root, "File commit store closed");
        Ok(())
    }

    async fn put_commit(&self, commit: &Commit) -> Result<()> {
        let mut state = self.state.write().await;
        if state.contains(&commit.id) {
            return Err(KioskError::DuplicateCommit(commit.id.to_string()));
        }

        let storage = state.storage()?.clone();
        let path = storage.path(commit_file(&commit.id));
        let json = serde_json::to_string_pretty(commit)?;
        storage.write_atomic(&path, &json).await.map_err(storage_error)?;

        state.index.push(IndexEntry::from(commit));
        if let Err(e) = state.write_index().await {
            state.index.pop();
            if let Err(cleanup) = storage.delete(&path).await {
                warn!(commit_id = %commit.id, error = %cleanup, "Failed to remove unindexed commit file");
            }
            return Err(e);
        }

        debug!(commit_id = %commit.id, snapshot = commit.is_snapshot(), "Commit stored");
        Ok(())
    }

    async fn get_commit(&self, id: &CommitId) -> Result<Option<Commit>> {
        let state = self.state.read().await;
        if !state.contains(id) {
            return Ok(None);
        }
        let storage = state.storage()?;
        let source = format!("commit {id}");
        let text = storage
            .read_optional(&storage.path(commit_file(id)))
            .await
            .map_err(storage_error)?
            .ok_or_else(|| CorruptionError::undecodable(source.clone(), "indexed commit file is missing"))?;
        let commit = serde_json::from_str(&text)
            .map_err(|e| CorruptionError::undecodable(source, e.to_string()))?;
        Ok(Some(commit))
    }

    async fn delete_commit(&self, id: &CommitId) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(position) = state.index.iter().position(|entry| &entry.id == id) else {
            return Ok(false);
        };
        let removed = state.index.remove(position);
        if let Err(e) = state.write_index().await {
            state.index.insert(position, removed);
            return Err(e);
        }
        let storage = state.storage()?;
        storage
            .delete(&storage.path(commit_file(id)))
            .await
            .map_err(storage_error)?;
        Ok(true)
    }

    async fn entries(&self) -> Result<Vec<IndexEntry>> {
        let state = self.state.read().await;
        state.storage()?;
        Ok(time_ordered(state.index.clone()))
    }

    async fn clear(&self) -> Result<()> {
        let mut state = self.state.write().await;
        let previous = std::mem::take(&mut state.index);
        if let Err(e) = state.write_index().await {
            state.index = previous;
            return Err(e);
        }
        let storage = state.storage()?;
        storage.remove_dir(COMMITS_DIR).await.map_err(storage_error)?;
        storage.ensure_dir(COMMITS_DIR).await.map_err(storage_error)?;
        info!(removed = previous.len(), "Commit history cleared");
        Ok(())
    }

    async fn put_snapshot(&self, profile: &Profile) -> Result<()> {
        let state = self.state.read().await;
        let storage = state.storage()?;
        let json = serde_json::to_string_pretty(profile)?;
        storage
            .write_atomic(&storage.path(SNAPSHOT_FILE), &json)
            .await
            .map_err(storage_error)
    }

    async fn get_snapshot(&self) -> Result<Option<Profile>> {
        let state = self.state.read().await;
        let storage = state.storage()?;
        let Some(text) = storage
            .read_optional(&storage.path(SNAPSHOT_FILE))
            .await
            .map_err(storage_error)?
        else {
            return Ok(None);
        };
        let profile = serde_json::from_str(&text)
            .map_err(|e| CorruptionError::undecodable(SNAPSHOT_FILE, e.to_string()))?;
        Ok(Some(profile))
    }
}
