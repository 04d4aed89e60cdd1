//! Commit creation, reconstruction and rollback on top of the repository

use kiosk_diff::Diff;
use kiosk_errors::{EntityKind, KioskError, Result};
use kiosk_profile_repository::{Commit, CommitId, HistoryEntry, ProfileRepository, replay_chain};
use kiosk_schemas::Profile;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::HistoryConfig;

fn to_document(profile: &Profile) -> Result<Value> {
    serde_json::to_value(profile).map_err(KioskError::from)
}

/// Versioned history of one profile.
#[derive(Debug)]
pub struct HistoryManager {
    repository: ProfileRepository,
    config: HistoryConfig,
}

impl HistoryManager {
    /// Create a manager over `repository`.
    pub fn new(repository: ProfileRepository, config: HistoryConfig) -> Self {
        Self { repository, config }
    }

    /// Underlying repository.
    pub fn repository(&self) -> &ProfileRepository {
        &self.repository
    }

    /// History settings.
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Record `current` as the next commit.
    ///
    /// A snapshot is written when the history is empty, when no `previous`
    /// state is given, or when the configured snapshot interval is reached.
    /// Otherwise the commit holds the diff from `previous` to `current`,
    /// where `previous` must be the document at the latest commit.
    ///
    /// # Errors
    ///
    /// `NothingToCommit` when `previous` equals `current`.
    pub async fn create_commit(
        &self,
        current: &Profile,
        previous: Option<&Profile>,
        message: &str,
        author: Option<&str>,
    ) -> Result<Commit> {
        let commit = self.prepare_commit(current, previous, message, author).await?;
        self.append(&commit).await?;
        Ok(commit)
    }

    /// Build the commit [`create_commit`](Self::create_commit) would store,
    /// without storing it.
    pub async fn prepare_commit(
        &self,
        current: &Profile,
        previous: Option<&Profile>,
        message: &str,
        author: Option<&str>,
    ) -> Result<Commit> {
        let latest = self.repository.get_latest_commit().await?;
        let parent = latest.as_ref().map(|commit| commit.id.clone());
        let author = author.map(str::to_string);

        let commit = match (&latest, previous) {
            (Some(_), Some(previous)) => {
                let patch = kiosk_diff::diff(&to_document(previous)?, &to_document(current)?);
                if patch.is_empty() {
                    return Err(KioskError::NothingToCommit);
                }
                if self.snapshot_due().await? {
                    debug!("Snapshot interval reached");
                    Commit::snapshot(current.clone(), parent, message, author)
                } else {
                    Commit::diff(patch, parent, message, author)
                }
            }
            _ => Commit::snapshot(current.clone(), parent, message, author),
        };
        Ok(match latest {
            Some(latest) if latest.timestamp > commit.timestamp => commit.at(latest.timestamp),
            _ => commit,
        })
    }

    /// Store a commit built by one of the `prepare_*` methods.
    pub async fn append(&self, commit: &Commit) -> Result<()> {
        self.repository.save_commit(commit).await?;
        info!(
            commit_id = %commit.id,
            snapshot = commit.is_snapshot(),
            message = %commit.message,
            "Commit created"
        );
        Ok(())
    }

    async fn snapshot_due(&self) -> Result<bool> {
        if self.config.snapshot_interval == 0 {
            return Ok(false);
        }
        Ok(self.repository.diffs_since_snapshot().await? + 1 >= self.config.snapshot_interval)
    }

    async fn require_commit(&self, id: &CommitId) -> Result<Commit> {
        self.repository
            .get_commit(id)
            .await?
            .ok_or_else(|| KioskError::not_found(EntityKind::Commit, id.as_str()))
    }

    /// Document as of commit `id`.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id; corruption if the chain back to a
    /// snapshot is broken or a diff does not apply.
    pub async fn get_profile_at_commit(&self, id: &CommitId) -> Result<Profile> {
        let chain = self.repository.snapshot_chain(id).await?;
        replay_chain(&chain)
    }

    /// Append a commit that restores the document of `target`.
    ///
    /// `current` must be the document at the latest commit. History is
    /// never rewritten; the rollback is recorded even when it changes
    /// nothing.
    pub async fn rollback(
        &self,
        target: &CommitId,
        current: &Profile,
        author: Option<&str>,
    ) -> Result<Commit> {
        self.rollback_with_state(target, current, author)
            .await
            .map(|(commit, _)| commit)
    }

    /// Like [`rollback`](Self::rollback), also returning the restored document.
    pub async fn rollback_with_state(
        &self,
        target: &CommitId,
        current: &Profile,
        author: Option<&str>,
    ) -> Result<(Commit, Profile)> {
        let (commit, restored) = self.prepare_rollback(target, current, author).await?;
        self.append(&commit).await?;
        info!(commit_id = %commit.id, target = %target, "Rolled back");
        Ok((commit, restored))
    }

    /// Build the rollback commit and the restored document without storing
    /// anything.
    pub async fn prepare_rollback(
        &self,
        target: &CommitId,
        current: &Profile,
        author: Option<&str>,
    ) -> Result<(Commit, Profile)> {
        let target_commit = self.require_commit(target).await?;
        let restored = self.get_profile_at_commit(target).await?;
        let latest = self.repository.get_latest_commit().await?;

        let patch = kiosk_diff::diff(&to_document(current)?, &to_document(&restored)?);
        let message = format!("Rollback to {}: {}", target.short(), target_commit.message);
        let commit = Commit::diff(
            patch,
            latest.as_ref().map(|commit| commit.id.clone()),
            message,
            author.map(str::to_string),
        );
        let commit = match latest {
            Some(latest) if latest.timestamp > commit.timestamp => commit.at(latest.timestamp),
            _ => commit,
        };
        Ok((commit, restored))
    }

    /// History entries newest first.
    pub async fn get_history(&self, limit: usize, offset: usize) -> Result<Vec<HistoryEntry>> {
        let commits = self.repository.get_commits(limit, offset).await?;
        Ok(commits.iter().map(Commit::entry).collect())
    }

    /// Diff between the documents of two commits.
    pub async fn get_diff(&self, from: &CommitId, to: &CommitId) -> Result<Diff> {
        let old = self.get_profile_at_commit(from).await?;
        let new = self.get_profile_at_commit(to).await?;
        Ok(kiosk_diff::diff(&to_document(&old)?, &to_document(&new)?))
    }

    /// Whether any commit exists.
    pub async fn has_history(&self) -> Result<bool> {
        Ok(self.repository.get_commit_count().await? > 0)
    }

    /// Document of the oldest stored snapshot commit.
    pub async fn get_initial_profile(&self) -> Result<Option<Profile>> {
        Ok(self
            .repository
            .get_oldest_snapshot()
            .await?
            .and_then(|commit| commit.snapshot_profile().cloned()))
    }

    /// Human-readable lines describing what commit `id` changed.
    pub async fn get_commit_summary(&self, id: &CommitId) -> Result<Vec<String>> {
        let commit = self.require_commit(id).await?;
        let lines = match (commit.patch(), &commit.parent_commit_id) {
            (Some(patch), _) if patch.is_empty() => vec!["No changes".to_string()],
            (Some(patch), _) => patch.describe(),
            (None, None) => vec!["Initial snapshot".to_string()],
            (None, Some(_)) => vec!["Full snapshot".to_string()],
        };
        Ok(lines)
    }

    /// Delete every commit.
    pub async fn clear_history(&self) -> Result<()> {
        self.repository.clear_history().await
    }

    /// Number of stored commits.
    pub async fn get_commit_count(&self) -> Result<usize> {
        self.repository.get_commit_count().await
    }

    /// Run retention pruning now. Returns the number of deleted commits.
    pub async fn prune(&self) -> Result<usize> {
        self.repository.prune_old_commits().await
    }
}
