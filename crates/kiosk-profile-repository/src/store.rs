//! Commit store port and the in-memory backend

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kiosk_errors::{KioskError, Result};
use kiosk_schemas::Profile;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::commit::{Commit, CommitId};

/// Time-ordered index record for one stored commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// Commit id
    pub id: CommitId,
    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
    /// Whether the commit carries a full snapshot
    #[serde(default)]
    pub snapshot: bool,
}

impl From<&Commit> for IndexEntry {
    fn from(commit: &Commit) -> Self {
        Self {
            id: commit.id.clone(),
            timestamp: commit.timestamp,
            snapshot: commit.is_snapshot(),
        }
    }
}

/// Sort index entries oldest first, keeping append order among equal times.
pub(crate) fn time_ordered(mut entries: Vec<IndexEntry>) -> Vec<IndexEntry> {
    entries.sort_by_key(|entry| entry.timestamp);
    entries
}

/// Storage backend for commits and the latest profile snapshot.
///
/// Implementations must behave identically from the caller's point of view:
/// commits are append-only, duplicate ids are rejected, and
/// [`CommitStore::entries`] lists commits oldest first.
#[async_trait]
pub trait CommitStore: Send + Sync {
    /// Short backend name for logs (`"file"`, `"memory"`).
    fn kind(&self) -> &'static str;

    /// Prepare the backend. Safe to call more than once.
    async fn open(&self) -> Result<()>;

    /// Release resources held by the backend.
    async fn close(&self) -> Result<()>;

    /// Append a commit.
    async fn put_commit(&self, commit: &Commit) -> Result<()>;

    /// Fetch a commit by id.
    async fn get_commit(&self, id: &CommitId) -> Result<Option<Commit>>;

    /// Remove a commit. Returns whether it existed.
    async fn delete_commit(&self, id: &CommitId) -> Result<bool>;

    /// Index of all stored commits, oldest first.
    async fn entries(&self) -> Result<Vec<IndexEntry>>;

    /// Remove every commit. The snapshot slot is kept.
    async fn clear(&self) -> Result<()>;

    /// Overwrite the latest-snapshot slot.
    async fn put_snapshot(&self, profile: &Profile) -> Result<()>;

    /// Read the latest-snapshot slot.
    async fn get_snapshot(&self) -> Result<Option<Profile>>;
}

#[derive(Debug, Default)]
struct MemoryState {
    commits: HashMap<CommitId, Commit>,
    order: Vec<IndexEntry>,
    snapshot: Option<Profile>,
}

/// Commit store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryCommitStore {
    state: RwLock<MemoryState>,
}

impl MemoryCommitStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommitStore for MemoryCommitStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn open(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    async fn put_commit(&self, commit: &Commit) -> Result<()> {
        let mut state = self.state.write().await;
        if state.commits.contains_key(&commit.id) {
            return Err(KioskError::DuplicateCommit(commit.id.to_string()));
        }
        state.order.push(IndexEntry::from(commit));
        state.commits.insert(commit.id.clone(), commit.clone());
        Ok(())
    }

    async fn get_commit(&self, id: &CommitId) -> Result<Option<Commit>> {
        Ok(self.state.read().await.commits.get(id).cloned())
    }

    async fn delete_commit(&self, id: &CommitId) -> Result<bool> {
        let mut state = self.state.write().await;
        let existed = state.commits.remove(id).is_some();
        state.order.retain(|entry| &entry.id != id);
        Ok(existed)
    }

    async fn entries(&self) -> Result<Vec<IndexEntry>> {
        Ok(time_ordered(self.state.read().await.order.clone()))
    }

    async fn clear(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.commits.clear();
        state.order.clear();
        Ok(())
    }

    async fn put_snapshot(&self, profile: &Profile) -> Result<()> {
        self.state.write().await.snapshot = Some(profile.clone());
        Ok(())
    }

    async fn get_snapshot(&self) -> Result<Option<Profile>> {
        Ok(self.state.read().await.snapshot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use kiosk_test_helpers::prelude::*;

    fn sample() -> Profile {
        must(serde_json::from_value(sample_profile_json()))
    }

    #[tokio::test]
    async fn test_duplicate_commit_rejected() -> TestResult {
        let store = MemoryCommitStore::new();
        let commit = Commit::snapshot(sample(), None, "root", None);
        store.put_commit(&commit).await?;
        let again = store.put_commit(&commit).await;
        assert!(matches!(again, Err(KioskError::DuplicateCommit(_))));
        assert_eq!(store.entries().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_entries_are_time_ordered() -> TestResult {
        let store = MemoryCommitStore::new();
        let now = Utc::now();
        let late = Commit::snapshot(sample(), None, "late", None).at(now);
        let early = Commit::snapshot(sample(), None, "early", None).at(now - Duration::seconds(5));
        store.put_commit(&late).await?;
        store.put_commit(&early).await?;

        let ids: Vec<CommitId> = store.entries().await?.into_iter().map(|e| e.id).collect();
        assert_eq!(ids, [early.id, late.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_equal_timestamps_keep_append_order() -> TestResult {
        let store = MemoryCommitStore::new();
        let now = Utc::now();
        let first = Commit::snapshot(sample(), None, "first", None).at(now);
        let second = Commit::snapshot(sample(), None, "second", None).at(now);
        store.put_commit(&first).await?;
        store.put_commit(&second).await?;

        let ids: Vec<CommitId> = store.entries().await?.into_iter().map(|e| e.id).collect();
        assert_eq!(ids, [first.id, second.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_keeps_snapshot_slot() -> TestResult {
        let store = MemoryCommitStore::new();
        store.put_snapshot(&sample()).await?;
        store
            .put_commit(&Commit::snapshot(sample(), None, "root", None))
            .await?;
        store.clear().await?;
        assert!(store.entries().await?.is_empty());
        assert!(store.get_snapshot().await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_commit() -> TestResult {
        let store = MemoryCommitStore::new();
        let commit = Commit::snapshot(sample(), None, "root", None);
        store.put_commit(&commit).await?;
        assert!(store.delete_commit(&commit.id).await?);
        assert!(!store.delete_commit(&commit.id).await?);
        assert!(store.get_commit(&commit.id).await?.is_none());
        Ok(())
    }
}
