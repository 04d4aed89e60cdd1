//! Versioned kiosk profile engine
//!
//! [`ProfileEngine`] owns the committed profile, an optional staged overlay
//! and the working document derived from both. Staged changes are validated
//! as they arrive, committed into an append-only history and can be rolled
//! back by appending a restoring commit.
//!
//! # Architecture
//!
//! - [`engine`]: lifecycle, staging, commit, rollback, import and export
//! - [`history`]: commit creation and reconstruction over the repository
//! - [`menu`]: category and item editing plus menu queries
//! - [`promotions`]: promotions, store information and settings
//! - [`projection`]: the read-only ordering menu for the voice assistant
//! - [`config`]: engine and history configuration
//!
//! # Example
//!
//! ```ignore
//! use kiosk_profile::prelude::*;
//!
//! # async fn example() -> kiosk_errors::Result<()> {
//! let config = EngineConfig::default().with_source("profile.json");
//! let mut engine = ProfileEngine::from_config(&config).await;
//! engine.initialize().await?;
//!
//! engine.set_item_availability("bulgogi-burger", false)?;
//! engine.commit_changes("Sold out", Some("staff")).await?;
//! let menu = engine.get_menu_for_llm(true)?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod engine;
pub mod history;
pub mod menu;
pub mod prelude;
pub mod projection;
pub mod promotions;

pub use config::{EngineConfig, HistoryConfig};
pub use engine::{EngineStatus, ProfileEngine};
pub use history::HistoryManager;
pub use menu::{CategoryUpdate, MenuItemFilter, MenuItemUpdate, NewCategory, NewMenuItem};
pub use projection::{LlmCategory, LlmItem, LlmMenu, LlmOption, LlmOptionGroup, project_menu};
pub use promotions::{NewPromotion, PromotionUpdate};
