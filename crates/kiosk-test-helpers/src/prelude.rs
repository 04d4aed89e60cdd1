//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use kiosk_test_helpers::prelude::*;
//! ```

pub use crate::fixtures::{
    ProfileFixture, minimal_profile_json, sample_profile_json, write_json,
};
pub use crate::must::{must, must_async, must_some, must_with};

/// Result type for fallible tests; `T` defaults to `()`.
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;
