//! Shared test utilities for the kiosk profile engine.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with `#[track_caller]` panic locations
//! - [`fixtures`] - Profile documents for tests
//! - [`prelude`] - Convenience re-exports
//!
//! Fixtures are plain [`serde_json::Value`] documents so this crate can be a
//! dev-dependency of every crate in the workspace, including the one that
//! defines the typed model.
//!
//! ```rust,ignore
//! use kiosk_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod fixtures;
pub mod must;
pub mod prelude;

pub use must::*;
