//! Patch application errors

/// A patch could not be applied to a document.
///
/// Application is all-or-nothing, so a failing patch never leaves a
/// partially modified document behind.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// An operation failed against the document
    #[error("Patch operation {operation} failed: {source}")]
    Operation {
        /// Zero-based index of the failing operation
        operation: usize,
        /// Underlying RFC 6902 error
        #[source]
        source: json_patch::PatchError,
    },
}

impl PatchError {
    /// Zero-based index of the operation that failed.
    pub fn operation(&self) -> usize {
        match self {
            PatchError::Operation { operation, .. } => *operation,
        }
    }
}

impl From<json_patch::PatchError> for PatchError {
    fn from(source: json_patch::PatchError) -> Self {
        PatchError::Operation {
            operation: source.operation,
            source,
        }
    }
}
