//! Convenience re-exports for repository users

pub use crate::commit::{Commit, CommitContent, CommitId, HistoryEntry, replay_chain};
pub use crate::file_store::FileCommitStore;
pub use crate::loader::{JsonFileLoader, ProfileLoader, StaticLoader};
pub use crate::repository::{
    ProfileRepository, RepositoryConfig, StorageBackend, open_commit_store,
};
pub use crate::store::{CommitStore, MemoryCommitStore};
pub use kiosk_errors::{KioskError, Result};
