//! Centralized error types for the kiosk profile engine
//!
//! Every crate in the workspace reports failures through [`KioskError`], so
//! callers can classify a failure without knowing which layer produced it.
//!
//! # Architecture
//!
//! - [`common`]: the top-level error enum, categories and severities
//! - [`validation`]: path-addressed validation issues
//! - [`corruption`]: history and storage corruption conditions
//!
//! # Example
//!
//! ```
//! use kiosk_errors::prelude::*;
//!
//! fn find_item(id: &str) -> Result<()> {
//!     Err(KioskError::not_found(EntityKind::MenuItem, id))
//! }
//!
//! let err = find_item("bulgogi-burger").unwrap_err();
//! assert_eq!(err.category(), ErrorCategory::NotFound);
//! assert!(err.is_recoverable());
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod common;
pub mod corruption;
pub mod prelude;
pub mod validation;

pub use common::{EntityKind, ErrorCategory, ErrorSeverity, KioskError};
pub use corruption::CorruptionError;
pub use validation::{ValidationError, ValidationIssue};

/// A specialized `Result` type for kiosk profile operations.
pub type Result<T> = std::result::Result<T, KioskError>;
