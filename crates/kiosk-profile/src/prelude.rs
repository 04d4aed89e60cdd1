//! Convenience re-exports for engine users

pub use crate::config::{EngineConfig, HistoryConfig};
pub use crate::engine::{EngineStatus, ProfileEngine};
pub use crate::history::HistoryManager;
pub use crate::menu::{CategoryUpdate, MenuItemFilter, MenuItemUpdate, NewCategory, NewMenuItem};
pub use crate::projection::{LlmMenu, project_menu};
pub use crate::promotions::{NewPromotion, PromotionUpdate};
pub use kiosk_errors::{KioskError, Result};
pub use kiosk_profile_repository::{
    CommitId, HistoryEntry, JsonFileLoader, ProfileLoader, RepositoryConfig, StaticLoader,
    StorageBackend,
};
pub use kiosk_schemas::{Profile, ProfilePatch, SettingsPatch, StoreInfoPatch};
