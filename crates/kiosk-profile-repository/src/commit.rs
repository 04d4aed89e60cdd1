//! Commit records and history replay

use core::fmt;

use chrono::{DateTime, Utc};
use kiosk_diff::Diff;
use kiosk_errors::{CorruptionError, KioskError, Result};
use kiosk_schemas::Profile;
use serde::{Deserialize, Serialize};

/// Commit identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for messages and log lines.
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CommitId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for CommitId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Payload of a commit: a full document or a diff from the parent's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommitContent {
    /// Full copy of the resulting document
    Snapshot(Box<Profile>),
    /// Patch from the parent's resulting document
    Diff(Diff),
}

/// Immutable, parent-linked history record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    /// Unique id
    pub id: CommitId,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Commit message
    pub message: String,
    /// Who made the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Previous commit, `None` only for the chain root
    pub parent_commit_id: Option<CommitId>,
    /// Snapshot or diff
    #[serde(flatten)]
    pub content: CommitContent,
}

impl Commit {
    /// Create a snapshot commit.
    pub fn snapshot(
        profile: Profile,
        parent: Option<CommitId>,
        message: impl Into<String>,
        author: Option<String>,
    ) -> Self {
        Self::with_content(CommitContent::Snapshot(Box::new(profile)), parent, message, author)
    }

    /// Create a diff commit.
    pub fn diff(
        diff: Diff,
        parent: Option<CommitId>,
        message: impl Into<String>,
        author: Option<String>,
    ) -> Self {
        Self::with_content(CommitContent::Diff(diff), parent, message, author)
    }

    fn with_content(
        content: CommitContent,
        parent: Option<CommitId>,
        message: impl Into<String>,
        author: Option<String>,
    ) -> Self {
        Self {
            id: CommitId::generate(),
            timestamp: Utc::now(),
            message: message.into(),
            author,
            parent_commit_id: parent,
            content,
        }
    }

    /// Override the timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Whether the commit carries a full document.
    pub fn is_snapshot(&self) -> bool {
        matches!(self.content, CommitContent::Snapshot(_))
    }

    /// The stored document, for snapshot commits.
    pub fn snapshot_profile(&self) -> Option<&Profile> {
        match &self.content {
            CommitContent::Snapshot(profile) => Some(profile),
            CommitContent::Diff(_) => None,
        }
    }

    /// The stored patch, for diff commits.
    pub fn patch(&self) -> Option<&Diff> {
        match &self.content {
            CommitContent::Snapshot(_) => None,
            CommitContent::Diff(diff) => Some(diff),
        }
    }

    /// Payload-free view of the commit.
    pub fn entry(&self) -> HistoryEntry {
        HistoryEntry {
            id: self.id.clone(),
            timestamp: self.timestamp,
            message: self.message.clone(),
            author: self.author.clone(),
        }
    }
}

/// Commit metadata without its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Commit id
    pub id: CommitId,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Commit message
    pub message: String,
    /// Author, if recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Rebuild the document at the last commit of `chain`.
///
/// `chain` is ordered oldest to newest. Replay starts at the newest snapshot
/// in the chain and applies every later diff in order.
///
/// # Errors
///
/// Returns a corruption error when the chain holds no snapshot, a diff fails
/// to apply, or the replayed document no longer decodes as a profile.
pub fn replay_chain(chain: &[Commit]) -> Result<Profile> {
    let Some(target) = chain.last() else {
        return Err(CorruptionError::missing_snapshot("<empty chain>").into());
    };
    let Some(start) = chain.iter().rposition(Commit::is_snapshot) else {
        return Err(CorruptionError::missing_snapshot(target.id.as_str()).into());
    };

    let mut doc = serde_json::Value::Null;
    for commit in chain.iter().skip(start) {
        match &commit.content {
            CommitContent::Snapshot(profile) => {
                doc = serde_json::to_value(profile.as_ref())?;
            }
            CommitContent::Diff(diff) => {
                doc = kiosk_diff::apply(&doc, diff).map_err(|e| {
                    KioskError::from(CorruptionError::patch_failed(commit.id.as_str(), e.to_string()))
                })?;
            }
        }
    }

    serde_json::from_value(doc).map_err(|e| {
        CorruptionError::undecodable(format!("commit {}", target.id), e.to_string()).into()
    })
}
