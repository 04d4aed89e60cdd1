//! Profile repository core implementation

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use kiosk_errors::{CorruptionError, EntityKind, KioskError, Result};
use kiosk_schemas::Profile;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::commit::{Commit, CommitId, replay_chain};
use crate::file_store::FileCommitStore;
use crate::loader::ProfileLoader;
use crate::store::{CommitStore, MemoryCommitStore};

/// Which commit store backend to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageBackend {
    /// Durable JSON files below `dir`
    File {
        /// Store root directory
        dir: PathBuf,
    },
    /// Process memory only
    Memory,
}

/// Repository configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepositoryConfig {
    /// Commit store backend
    pub backend: StorageBackend,
    /// Number of newest commits always kept by
    /// [`prune_old_commits`](ProfileRepository::prune_old_commits)
    pub max_commits: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            max_commits: 100,
        }
    }
}

impl RepositoryConfig {
    /// Durable configuration rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: StorageBackend::File { dir: dir.into() },
            ..Default::default()
        }
    }

    /// In-memory configuration.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Set the retention count.
    pub fn with_max_commits(mut self, max_commits: usize) -> Self {
        self.max_commits = max_commits;
        self
    }
}

/// Build and open the configured commit store.
///
/// If the durable store cannot be opened the in-memory store is returned
/// instead and a warning is logged.
pub async fn open_commit_store(config: &RepositoryConfig) -> Arc<dyn CommitStore> {
    match &config.backend {
        StorageBackend::Memory => Arc::new(MemoryCommitStore::new()),
        StorageBackend::File { dir } => {
            let store = FileCommitStore::new(dir);
            match store.open().await {
                Ok(()) => Arc::new(store),
                Err(e) => {
                    warn!(dir = ?dir, error = %e, "Durable store unavailable, falling back to memory");
                    Arc::new(MemoryCommitStore::new())
                }
            }
        }
    }
}

/// Commit history and profile persistence.
pub struct ProfileRepository {
    config: RepositoryConfig,
    store: Arc<dyn CommitStore>,
    loader: Option<Arc<dyn ProfileLoader>>,
    initialized: AtomicBool,
}

impl std::fmt::Debug for ProfileRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileRepository")
            .field("config", &self.config)
            .field("store", &self.store.kind())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl ProfileRepository {
    /// Create a repository over an existing store.
    pub fn new(
        config: RepositoryConfig,
        store: Arc<dyn CommitStore>,
        loader: Option<Arc<dyn ProfileLoader>>,
    ) -> Self {
        Self {
            config,
            store,
            loader,
            initialized: AtomicBool::new(false),
        }
    }

    /// Create a repository with the store selected by `config`.
    pub async fn open(config: RepositoryConfig, loader: Option<Arc<dyn ProfileLoader>>) -> Self {
        let store = open_commit_store(&config).await;
        Self::new(config, store, loader)
    }

    /// Configuration in use.
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Name of the active backend.
    pub fn backend(&self) -> &'static str {
        self.store.kind()
    }

    /// Whether [`initialize`](Self::initialize) has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(KioskError::NotInitialized)
        }
    }

    /// Open the backend.
    pub async fn initialize(&self) -> Result<()> {
        self.store.open().await?;
        self.initialized.store(true, Ordering::Release);
        info!(backend = self.backend(), "Profile repository initialized");
        Ok(())
    }

    /// Close the backend. The repository must be initialized again before use.
    pub async fn destroy(&self) -> Result<()> {
        self.initialized.store(false, Ordering::Release);
        self.store.close().await?;
        debug!("Profile repository closed");
        Ok(())
    }

    /// Fetch the document from the external source.
    pub async fn load_profile(&self) -> Result<Value> {
        self.ensure_initialized()?;
        let loader = self
            .loader
            .as_ref()
            .ok_or_else(|| KioskError::loader("no profile source configured"))?;
        info!(source = %loader.describe(), "Loading profile from source");
        loader.load_profile().await
    }

    /// Persist `profile` as the latest snapshot.
    pub async fn save_profile(&self, profile: &Profile) -> Result<()> {
        self.ensure_initialized()?;
        self.store.put_snapshot(profile).await?;
        debug!(profile_id = %profile.id, "Profile snapshot saved");
        Ok(())
    }

    /// The last saved snapshot, if any.
    pub async fn get_stored_profile(&self) -> Result<Option<Profile>> {
        self.ensure_initialized()?;
        self.store.get_snapshot().await
    }

    /// Rebuild the document at the latest commit.
    pub async fn reconstruct_profile_from_commits(&self) -> Result<Option<Profile>> {
        let Some(latest) = self.get_latest_commit().await? else {
            return Ok(None);
        };
        let chain = self.snapshot_chain(&latest.id).await?;
        replay_chain(&chain).map(Some)
    }

    /// Append a commit. History is never trimmed here; pruning only runs
    /// through [`prune_old_commits`](Self::prune_old_commits).
    pub async fn save_commit(&self, commit: &Commit) -> Result<()> {
        self.ensure_initialized()?;
        self.store.put_commit(commit).await?;
        info!(
            commit_id = %commit.id,
            parent = ?commit.parent_commit_id.as_ref().map(CommitId::as_str),
            snapshot = commit.is_snapshot(),
            "Commit saved"
        );
        Ok(())
    }

    /// Fetch a commit.
    pub async fn get_commit(&self, id: &CommitId) -> Result<Option<Commit>> {
        self.ensure_initialized()?;
        self.store.get_commit(id).await
    }

    async fn require_commit(&self, id: &CommitId) -> Result<Commit> {
        self.get_commit(id)
            .await?
            .ok_or_else(|| KioskError::not_found(EntityKind::Commit, id.as_str()))
    }

    /// Commits newest first, skipping `offset` and returning at most `limit`.
    pub async fn get_commits(&self, limit: usize, offset: usize) -> Result<Vec<Commit>> {
        self.ensure_initialized()?;
        let entries = self.store.entries().await?;
        let mut commits = Vec::new();
        for entry in entries.iter().rev().skip(offset).take(limit) {
            commits.push(self.require_commit(&entry.id).await?);
        }
        Ok(commits)
    }

    /// The newest commit.
    pub async fn get_latest_commit(&self) -> Result<Option<Commit>> {
        self.ensure_initialized()?;
        match self.store.entries().await?.last() {
            Some(entry) => self.get_commit(&entry.id).await,
            None => Ok(None),
        }
    }

    /// Commits from `from` (or the root) to `to`, oldest first.
    ///
    /// `from` is included when reached. A snapshot commit whose parent was
    /// pruned also ends the walk.
    ///
    /// # Errors
    ///
    /// `NotFound` if `to` is unknown; corruption if a diff commit's parent is
    /// missing or the parent links loop.
    pub async fn get_commit_chain(
        &self,
        from: Option<&CommitId>,
        to: &CommitId,
    ) -> Result<Vec<Commit>> {
        self.walk_back(to, |commit| Some(&commit.id) == from).await
    }

    /// Commits from the nearest snapshot at or before `to`, oldest first.
    pub async fn snapshot_chain(&self, to: &CommitId) -> Result<Vec<Commit>> {
        self.walk_back(to, Commit::is_snapshot).await
    }

    async fn walk_back<F>(&self, to: &CommitId, stop: F) -> Result<Vec<Commit>>
    where
        F: Fn(&Commit) -> bool,
    {
        let mut chain = vec![self.require_commit(to).await?];
        let mut seen = HashSet::from([to.clone()]);

        loop {
            let Some(current) = chain.last() else {
                break;
            };
            if stop(current) {
                break;
            }
            let Some(parent_id) = current.parent_commit_id.clone() else {
                break;
            };
            if !seen.insert(parent_id.clone()) {
                return Err(CorruptionError::Cycle {
                    commit_id: parent_id.to_string(),
                }
                .into());
            }
            match self.get_commit(&parent_id).await? {
                Some(parent) => chain.push(parent),
                None if current.is_snapshot() => {
                    debug!(commit_id = %current.id, "Chain ends at snapshot with pruned parent");
                    break;
                }
                None => {
                    return Err(CorruptionError::broken_chain(
                        current.id.as_str(),
                        parent_id.as_str(),
                    )
                    .into());
                }
            }
        }

        chain.reverse();
        Ok(chain)
    }

    /// Number of stored commits.
    pub async fn get_commit_count(&self) -> Result<usize> {
        self.ensure_initialized()?;
        Ok(self.store.entries().await?.len())
    }

    /// Number of diff commits appended since the newest snapshot commit.
    pub async fn diffs_since_snapshot(&self) -> Result<usize> {
        self.ensure_initialized()?;
        let entries = self.store.entries().await?;
        Ok(entries.iter().rev().take_while(|entry| !entry.snapshot).count())
    }

    /// The oldest snapshot commit still stored.
    pub async fn get_oldest_snapshot(&self) -> Result<Option<Commit>> {
        self.ensure_initialized()?;
        match self.store.entries().await?.iter().find(|entry| entry.snapshot) {
            Some(entry) => self.get_commit(&entry.id).await,
            None => Ok(None),
        }
    }

    /// Delete every commit.
    pub async fn clear_history(&self) -> Result<()> {
        self.ensure_initialized()?;
        self.store.clear().await?;
        info!("Commit history cleared");
        Ok(())
    }

    /// Delete old diff commits no longer needed for reconstruction.
    ///
    /// The newest `max_commits` commits are kept. Older commits are deleted
    /// only when they are diff commits older than the snapshot that anchors
    /// the oldest kept commit. Snapshot commits are never deleted.
    /// Returns the number of deleted commits.
    pub async fn prune_old_commits(&self) -> Result<usize> {
        self.ensure_initialized()?;
        let entries = self.store.entries().await?;
        let Some(window_start) = entries.len().checked_sub(self.config.max_commits) else {
            return Ok(0);
        };
        let anchor = entries
            .iter()
            .take(window_start + 1)
            .rposition(|entry| entry.snapshot)
            .unwrap_or(0);

        let mut deleted = 0;
        for entry in entries.iter().take(anchor).filter(|entry| !entry.snapshot) {
            if self.store.delete_commit(&entry.id).await? {
                deleted += 1;
            }
        }
        if deleted > 0 {
            info!(deleted, kept = entries.len() - deleted, "Pruned old commits");
        }
        Ok(deleted)
    }
}
