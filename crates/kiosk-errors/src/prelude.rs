//! Convenience re-exports for common error types

pub use crate::Result;
pub use crate::common::{EntityKind, ErrorCategory, ErrorSeverity, KioskError};
pub use crate::corruption::CorruptionError;
pub use crate::validation::{ValidationError, ValidationIssue};
