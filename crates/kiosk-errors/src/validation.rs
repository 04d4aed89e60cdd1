//! Validation issue types.
//!
//! Validation never stops at the first problem: every violation found in a
//! candidate document is recorded as a [`ValidationIssue`] and the full list
//! travels inside a [`ValidationError`].

use core::fmt;

/// A single validation failure addressed by its document path.
///
/// Paths use dotted/indexed notation such as
/// `menu.categories[0].items[1].excludeOptions[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidationIssue {
    /// Location of the offending value
    pub path: String,
    /// Human-readable description of the violation
    pub message: String,
}

impl ValidationIssue {
    /// Create a new issue.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// A rejected candidate document together with every issue found in it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} validation issue(s): {}", .issues.len(), summarize(.issues))]
pub struct ValidationError {
    /// All recorded issues, in discovery order
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    /// Wrap a list of issues.
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// Build an error with a single issue.
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![ValidationIssue::new(path, message)],
        }
    }

    /// Whether any issue is reported at `path`.
    pub fn has_issue_at(&self, path: &str) -> bool {
        self.issues.iter().any(|issue| issue.path == path)
    }
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_display_with_path() {
        let issue = ValidationIssue::new("storeInfo.name", "is required");
        assert_eq!(issue.to_string(), "storeInfo.name: is required");
    }

    #[test]
    fn test_issue_display_without_path() {
        let issue = ValidationIssue::new("", "document must be an object");
        assert_eq!(issue.to_string(), "document must be an object");
    }

    #[test]
    fn test_error_lists_every_issue() {
        let err = ValidationError::new(vec![
            ValidationIssue::new("id", "is required"),
            ValidationIssue::new("version", "is required"),
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("2 validation issue(s)"));
        assert!(msg.contains("id: is required"));
        assert!(msg.contains("version: is required"));
    }

    #[test]
    fn test_has_issue_at() {
        let err = ValidationError::single("settings.theme", "unknown theme");
        assert!(err.has_issue_at("settings.theme"));
        assert!(!err.has_issue_at("settings.fontSize"));
    }
}
