//! Commit store and profile persistence for the kiosk profile engine
//!
//! This crate keeps the append-only commit history of a profile and the
//! latest saved snapshot, on disk or in memory.
//!
//! # Architecture
//!
//! - [`commit`]: `Commit` records, ids and history replay
//! - [`store`]: the `CommitStore` port and the in-memory backend
//! - [`file_store`]: the durable JSON file backend
//! - [`storage`]: file helpers with atomic writes
//! - [`loader`]: canonical profile sources
//! - [`repository`]: `ProfileRepository`, the API used by the engine
//!
//! # Error Recovery
//!
//! - Every file is written to a temporary path and renamed into place
//! - A durable store that cannot be opened is replaced by the memory store
//! - Broken parent links and undecodable records surface as corruption
//!   errors instead of partial results
//!
//! # Example
//!
//! ```ignore
//! use kiosk_profile_repository::prelude::*;
//!
//! # async fn example() -> kiosk_errors::Result<()> {
//! let repo = ProfileRepository::open(RepositoryConfig::new("kiosk-data"), None).await;
//! repo.initialize().await?;
//! let latest = repo.get_latest_commit().await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod commit;
pub mod file_store;
pub mod loader;
pub mod prelude;
pub mod repository;
pub mod storage;
pub mod store;

pub use commit::{Commit, CommitContent, CommitId, HistoryEntry, replay_chain};
pub use file_store::FileCommitStore;
pub use loader::{JsonFileLoader, ProfileLoader, StaticLoader};
pub use repository::{ProfileRepository, RepositoryConfig, StorageBackend, open_commit_store};
pub use storage::FileStorage;
pub use store::{CommitStore, IndexEntry, MemoryCommitStore};
