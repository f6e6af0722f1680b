use chrono::Utc;
use tollgate_types::{AuditAction, AuditEntry};

const ALL_ACTIONS: [AuditAction; 9] = [
    AuditAction::AdminAuthenticated,
    AuditAction::CodeGenerated,
    AuditAction::CodeRevoked,
    AuditAction::CodeRedeemed,
    AuditAction::PaymentFinalized,
    AuditAction::ManualGrant,
    AuditAction::TrialGranted,
    AuditAction::GraceGranted,
    AuditAction::EntitlementUpdated,
];

#[test]
fn action_label_roundtrip() {
    for action in ALL_ACTIONS {
        assert_eq!(AuditAction::from_label(action.label()), Some(action));
    }
}

#[test]
fn action_labels_are_snake_case() {
    for action in ALL_ACTIONS {
        let label = action.label();
        assert!(label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c == '_'));
    }
}

#[test]
fn action_from_label_rejects_unknown() {
    assert_eq!(AuditAction::from_label("logged_in"), None);
}

#[test]
fn display_matches_label() {
    assert_eq!(
        AuditAction::EntitlementUpdated.to_string(),
        "entitlement_updated"
    );
}

#[test]
fn entry_serialization_roundtrip() {
    let entry = AuditEntry {
        actor: "ops".to_string(),
        action: AuditAction::CodeGenerated,
        target: Some("ABCD-EFGH".to_string()),
        timestamp: Utc::now(),
        details: "class=1y".to_string(),
    };
    let json = serde_json::to_string(&entry).unwrap();
    let parsed: AuditEntry = serde_json::from_str(&json).unwrap();
    assert_eq!(entry, parsed);
}
