//! Kiosk profile document model
//!
//! This crate holds the typed [`Profile`] document, the typed partial update
//! [`ProfilePatch`] used for staging, and the [`ProfileValidator`] that gates
//! every document and partial update before it is accepted.
//!
//! # Example
//!
//! ```
//! use kiosk_schemas::prelude::*;
//! use serde_json::json;
//!
//! let mut validator = ProfileValidator::new();
//! assert!(validator.validate_partial(&json!({"storeInfo": {"name": "Y"}})));
//! assert!(!validator.validate(&json!({})));
//! assert!(validator.errors().iter().any(|issue| issue.path == "storeInfo"));
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod exclusion;
pub mod patch;
pub mod prelude;
pub mod profile;
pub mod validator;

pub use exclusion::{ExclusionTarget, GroupIndex, resolve_exclusion};
pub use patch::{MenuPatch, ProfilePatch, SettingsPatch, StoreInfoPatch};
pub use profile::{
    BusinessHours, FontSize, Menu, MenuCategory, MenuItem, OptionGroup, OptionItem, Profile,
    Promotion, PromotionType, Settings, StoreInfo, Theme, now_timestamp,
};
pub use validator::ProfileValidator;
