//! Error types for kioskctl

use std::path::PathBuf;

use kiosk_errors::{ErrorCategory, KioskError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Cannot read {path}: {source}")]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write {path}: {source}")]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid commit id: {0}")]
    InvalidCommitId(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Process exit code for a failed command.
///
/// Engine errors map by category so scripts can tell a rejected document
/// from a broken store.
pub fn exit_code(error: &anyhow::Error) -> u8 {
    if let Some(kiosk) = error.downcast_ref::<KioskError>() {
        return match kiosk.category() {
            ErrorCategory::NoOp => 2,
            ErrorCategory::NotFound => 3,
            ErrorCategory::Validation | ErrorCategory::Conflict => 4,
            ErrorCategory::Storage | ErrorCategory::Loader => 5,
            ErrorCategory::Corruption => 6,
            ErrorCategory::NotReady => 1,
        };
    }
    match error.downcast_ref::<CliError>() {
        Some(CliError::InvalidCommitId(_)) => 3,
        Some(CliError::ReadInput { .. } | CliError::InvalidConfiguration(_)) => 4,
        Some(CliError::WriteOutput { .. }) => 5,
        None => 1,
    }
}

/// Short type label for JSON error output.
pub fn error_type(error: &anyhow::Error) -> String {
    if let Some(kiosk) = error.downcast_ref::<KioskError>() {
        return kiosk.category().to_string();
    }
    match error.downcast_ref::<CliError>() {
        Some(CliError::ReadInput { .. }) => "ReadInput".to_string(),
        Some(CliError::WriteOutput { .. }) => "WriteOutput".to_string(),
        Some(CliError::InvalidCommitId(_)) => "NotFound".to_string(),
        Some(CliError::InvalidConfiguration(_)) => "Configuration".to_string(),
        None => "Unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_errors::{EntityKind, ValidationError};

    #[test]
    fn test_engine_errors_map_by_category() {
        let not_found = anyhow::Error::new(KioskError::not_found(EntityKind::Commit, "abc"));
        assert_eq!(exit_code(&not_found), 3);
        assert_eq!(error_type(&not_found), "NotFound");

        let invalid = anyhow::Error::new(KioskError::Validation(ValidationError::single(
            "storeInfo.name",
            "must not be empty",
        )));
        assert_eq!(exit_code(&invalid), 4);

        let nothing = anyhow::Error::new(KioskError::NothingToCommit);
        assert_eq!(exit_code(&nothing), 2);
    }

    #[test]
    fn test_context_does_not_hide_category() {
        let err = anyhow::Error::new(KioskError::storage("disk full")).context("committing");
        assert_eq!(exit_code(&err), 5);
    }

    #[test]
    fn test_cli_errors_and_unknown() {
        let err = anyhow::Error::new(CliError::InvalidCommitId(String::new()));
        assert_eq!(exit_code(&err), 3);
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
        assert_eq!(error_type(&anyhow::anyhow!("boom")), "Unknown");
    }
}
