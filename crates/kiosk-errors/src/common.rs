//! Top-level error type and classification shared by every crate.

use core::fmt;

use crate::{CorruptionError, ValidationError};

/// Kind of entity a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A commit in the history store
    Commit,
    /// A menu category
    Category,
    /// A menu item
    MenuItem,
    /// A promotion
    Promotion,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Commit => write!(f, "commit"),
            EntityKind::Category => write!(f, "category"),
            EntityKind::MenuItem => write!(f, "menu item"),
            EntityKind::Promotion => write!(f, "promotion"),
        }
    }
}

/// Top-level error for the kiosk profile engine.
#[derive(Debug, thiserror::Error)]
pub enum KioskError {
    /// Candidate document or partial update was rejected
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Operation invoked while the engine is not ready
    #[error("Profile engine is not ready (status: {status})")]
    NotReady {
        /// Engine status at the time of the call
        status: String,
    },

    /// Unknown commit, category, item or promotion
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What was looked up
        kind: EntityKind,
        /// The unresolved identifier
        id: String,
    },

    /// Commit requested without a staged overlay
    #[error("No staged changes to commit")]
    NoStagedChanges,

    /// Commit requested but the resulting diff is empty
    #[error("Nothing to commit: working profile matches the latest commit")]
    NothingToCommit,

    /// Name or id collision inside a scope
    #[error("Conflict in {scope}: {message}")]
    Conflict {
        /// Scope in which the collision occurred
        scope: String,
        /// Description of the conflicting value
        message: String,
    },

    /// History or stored data is inconsistent
    #[error("Corruption detected: {0}")]
    Corruption(#[from] CorruptionError),

    /// Repository used before `initialize` or after `destroy`
    #[error("Repository is not initialized")]
    NotInitialized,

    /// Commit id already present in the append-only store
    #[error("Commit {0} already exists")]
    DuplicateCommit(String),

    /// Backend storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// External profile loader failure
    #[error("Failed to load profile: {0}")]
    Loader(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse or encode errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Schema or reference violations
    Validation = 0,
    /// Lifecycle misuse
    NotReady = 1,
    /// Unknown identifiers
    NotFound = 2,
    /// Rejected no-op operations
    NoOp = 3,
    /// Name or id collisions
    Conflict = 4,
    /// Broken history or undecodable stored data
    Corruption = 5,
    /// Storage backend and I/O failures
    Storage = 6,
    /// External loader failures
    Loader = 7,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Validation => write!(f, "Validation"),
            ErrorCategory::NotReady => write!(f, "NotReady"),
            ErrorCategory::NotFound => write!(f, "NotFound"),
            ErrorCategory::NoOp => write!(f, "NoOp"),
            ErrorCategory::Conflict => write!(f, "Conflict"),
            ErrorCategory::Corruption => write!(f, "Corruption"),
            ErrorCategory::Storage => write!(f, "Storage"),
            ErrorCategory::Loader => write!(f, "Loader"),
        }
    }
}

/// Error severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Informational, nothing changed
    Info = 0,
    /// Warning, caller input needs attention
    Warning = 1,
    /// Error, operation failed
    Error = 2,
    /// Critical, in-memory state must be reloaded
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl KioskError {
    /// Create a not-found error.
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        KioskError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create a not-ready error for the given status.
    pub fn not_ready(status: impl fmt::Display) -> Self {
        KioskError::NotReady {
            status: status.to_string(),
        }
    }

    /// Create a conflict error.
    pub fn conflict(scope: impl Into<String>, message: impl Into<String>) -> Self {
        KioskError::Conflict {
            scope: scope.into(),
            message: message.into(),
        }
    }

    /// Create a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        KioskError::Storage(msg.into())
    }

    /// Create a loader error.
    pub fn loader(msg: impl Into<String>) -> Self {
        KioskError::Loader(msg.into())
    }

    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            KioskError::Validation(_) => ErrorCategory::Validation,
            KioskError::NotReady { .. } | KioskError::NotInitialized => ErrorCategory::NotReady,
            KioskError::NotFound { .. } => ErrorCategory::NotFound,
            KioskError::NoStagedChanges | KioskError::NothingToCommit => ErrorCategory::NoOp,
            KioskError::Conflict { .. } | KioskError::DuplicateCommit(_) => ErrorCategory::Conflict,
            KioskError::Corruption(_) | KioskError::Json(_) => ErrorCategory::Corruption,
            KioskError::Storage(_) | KioskError::Io(_) => ErrorCategory::Storage,
            KioskError::Loader(_) => ErrorCategory::Loader,
        }
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::NoOp => ErrorSeverity::Info,
            ErrorCategory::Validation | ErrorCategory::Conflict => ErrorSeverity::Warning,
            ErrorCategory::NotReady
            | ErrorCategory::NotFound
            | ErrorCategory::Storage
            | ErrorCategory::Loader => ErrorSeverity::Error,
            ErrorCategory::Corruption => ErrorSeverity::Critical,
        }
    }

    /// Whether the caller can recover by correcting its input or retrying.
    ///
    /// Corruption is the only class the engine cannot recover from itself.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.category(), ErrorCategory::Corruption)
    }

    /// Validation issues carried by this error, if any.
    pub fn validation_issues(&self) -> Option<&[crate::ValidationIssue]> {
        match self {
            KioskError::Validation(err) => Some(&err.issues),
            _ => None,
        }
    }
}
