//! RFC 6902 diff and patch helpers for kiosk profile documents
//!
//! Documents are plain [`serde_json::Value`] trees. A [`Diff`] is an ordered
//! list of JSON Patch operations computed and applied by the `json-patch`
//! crate; this crate adds the all-or-nothing copy semantics, reversal and
//! the one-line summaries shown in commit history.
//!
//! - [`diff`] computes the patch that turns one document into another
//! - [`apply`] replays a patch on a copy of a document, all-or-nothing
//! - [`reverse`] computes the patch that undoes another one
//! - [`validate`] dry-runs a patch without producing a document
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//!
//! let old = json!({"storeInfo": {"name": "X"}});
//! let new = json!({"storeInfo": {"name": "Y"}});
//!
//! let patch = kiosk_diff::diff(&old, &new);
//! assert_eq!(kiosk_diff::apply(&old, &patch).ok(), Some(new.clone()));
//!
//! let undo = kiosk_diff::reverse(&old, &patch).unwrap_or_default();
//! assert_eq!(kiosk_diff::apply(&new, &undo).ok(), Some(old));
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod error;
pub mod operation;

pub use error::PatchError;
pub use json_patch::PatchOperation;
pub use operation::{Diff, summary_line};

use serde_json::Value;

/// Compute the patch that turns `from` into `to`.
pub fn diff(from: &Value, to: &Value) -> Diff {
    Diff::from(json_patch::diff(from, to))
}

/// Apply a patch to a copy of `doc` and return the patched copy.
///
/// The input is never mutated. If any operation fails the whole patch is
/// rejected.
///
/// # Errors
///
/// Returns the [`PatchError`] of the first operation that cannot be applied.
pub fn apply(doc: &Value, patch: &Diff) -> Result<Value, PatchError> {
    let mut target = doc.clone();
    json_patch::patch(&mut target, patch.operations())?;
    Ok(target)
}

/// Dry-run a patch against `doc`.
pub fn validate(doc: &Value, patch: &Diff) -> bool {
    apply(doc, patch).is_ok()
}

/// Compute the patch that undoes `patch` relative to `original`.
///
/// `patch` is applied to `original` first, then the resulting document is
/// diffed back to `original`.
///
/// # Errors
///
/// Returns the [`PatchError`] raised when `patch` does not apply to
/// `original`.
pub fn reverse(original: &Value, patch: &Diff) -> Result<Diff, PatchError> {
    let patched = apply(original, patch)?;
    Ok(diff(&patched, original))
}

/// Whether a patch contains no operations.
pub fn is_empty(patch: &Diff) -> bool {
    patch.is_empty()
}

/// Deep-copy a document.
///
/// Every value handed between the committed, working and reconstructed
/// documents goes through this so no two of them share structure.
pub fn clone_document(doc: &Value) -> Value {
    doc.clone()
}
