//! Property-based tests for error classification and message content.

use kiosk_errors::prelude::*;
use proptest::prelude::*;

fn entity_kind(code: u8) -> EntityKind {
    match code % 4 {
        0 => EntityKind::Commit,
        1 => EntityKind::Category,
        2 => EntityKind::MenuItem,
        _ => EntityKind::Promotion,
    }
}

proptest! {
    #[test]
    fn test_not_found_message_contains_id(id in "[a-zA-Z0-9_-]+", kind in 0u8..4) {
        let err = KioskError::not_found(entity_kind(kind), &id);
        prop_assert!(err.to_string().contains(&id));
        prop_assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_validation_error_mentions_every_path(paths in proptest::collection::vec("[a-z]{1,8}(\\.[a-z]{1,8}){0,2}", 1..6)) {
        let issues: Vec<ValidationIssue> = paths
            .iter()
            .map(|p| ValidationIssue::new(p.clone(), "is invalid"))
            .collect();
        let err = KioskError::from(ValidationError::new(issues));
        let msg = err.to_string();
        for path in &paths {
            prop_assert!(msg.contains(path.as_str()));
        }
        prop_assert!(err.is_recoverable());
    }

    #[test]
    fn test_corruption_is_always_critical(commit in "[a-f0-9]{8}", parent in "[a-f0-9]{8}") {
        let err = KioskError::from(CorruptionError::broken_chain(&commit, &parent));
        prop_assert_eq!(err.severity(), ErrorSeverity::Critical);
        prop_assert!(!err.is_recoverable());
    }
}

#[test]
fn test_conflict_names_scope() {
    let err = KioskError::conflict("category 버거", "item name '불고기 버거' already exists");
    let msg = err.to_string();
    assert!(msg.contains("category 버거"));
    assert!(msg.contains("불고기 버거"));
    assert_eq!(err.category(), ErrorCategory::Conflict);
}

#[test]
fn test_io_error_is_storage() {
    let err = KioskError::from(std::io::Error::other("disk full"));
    assert_eq!(err.category(), ErrorCategory::Storage);
    assert_eq!(err.severity(), ErrorSeverity::Error);
}
