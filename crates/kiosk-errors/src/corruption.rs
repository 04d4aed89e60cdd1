//! Corruption conditions in the commit history.
//!
//! These are the only errors the engine treats as unrecoverable on its own.
//! Callers are expected to fall back to reloading the profile from its
//! canonical source.

/// History or storage corruption.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorruptionError {
    /// A commit references a parent that is not stored
    #[error("Broken commit chain: commit {commit_id} references missing parent {missing_id}")]
    BrokenChain {
        /// Commit whose parent link dangles
        commit_id: String,
        /// The parent id that could not be resolved
        missing_id: String,
    },

    /// Walking parent links never reached a snapshot-bearing commit
    #[error("No snapshot ancestor found for commit {commit_id}")]
    MissingSnapshot {
        /// Commit being reconstructed
        commit_id: String,
    },

    /// Parent links loop back on themselves
    #[error("Commit chain contains a cycle at {commit_id}")]
    Cycle {
        /// First commit visited twice
        commit_id: String,
    },

    /// A stored diff does not apply to the state it was recorded against
    #[error("Diff of commit {commit_id} failed to apply: {reason}")]
    PatchFailed {
        /// Commit carrying the diff
        commit_id: String,
        /// Underlying patch failure
        reason: String,
    },

    /// A stored record or reconstructed document cannot be decoded
    #[error("Stored document {source_name} is unreadable: {reason}")]
    Undecodable {
        /// Which record or document failed
        source_name: String,
        /// Decoder message
        reason: String,
    },
}

impl CorruptionError {
    /// Create a broken chain error.
    pub fn broken_chain(commit_id: impl Into<String>, missing_id: impl Into<String>) -> Self {
        Self::BrokenChain {
            commit_id: commit_id.into(),
            missing_id: missing_id.into(),
        }
    }

    /// Create a missing snapshot error.
    pub fn missing_snapshot(commit_id: impl Into<String>) -> Self {
        Self::MissingSnapshot {
            commit_id: commit_id.into(),
        }
    }

    /// Create a patch replay error.
    pub fn patch_failed(commit_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PatchFailed {
            commit_id: commit_id.into(),
            reason: reason.into(),
        }
    }

    /// Create an undecodable record error.
    pub fn undecodable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Undecodable {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}
