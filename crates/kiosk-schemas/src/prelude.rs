//! Convenience re-exports for the profile model

pub use crate::exclusion::{ExclusionTarget, GroupIndex, resolve_exclusion};
pub use crate::patch::{MenuPatch, ProfilePatch, SettingsPatch, StoreInfoPatch};
pub use crate::profile::{
    BusinessHours, FontSize, Menu, MenuCategory, MenuItem, OptionGroup, OptionItem, Profile,
    Promotion, PromotionType, Settings, StoreInfo, Theme,
};
pub use crate::validator::ProfileValidator;
