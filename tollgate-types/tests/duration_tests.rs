use chrono::TimeDelta;
use tollgate_types::DurationClass;

// ── Spans ─────────────────────────────────────────────────────────

#[test]
fn one_year_is_365_days() {
    assert_eq!(DurationClass::OneYear.span(), Some(TimeDelta::days(365)));
}

#[test]
fn five_years_is_1825_days() {
    assert_eq!(DurationClass::FiveYears.span(), Some(TimeDelta::days(1825)));
}

#[test]
fn lifetime_has_no_span() {
    assert_eq!(DurationClass::Lifetime.span(), None);
    assert!(DurationClass::Lifetime.is_lifetime());
    assert!(!DurationClass::OneYear.is_lifetime());
}

// ── Labels ────────────────────────────────────────────────────────

#[test]
fn label_roundtrip() {
    for class in [
        DurationClass::OneYear,
        DurationClass::FiveYears,
        DurationClass::Lifetime,
    ] {
        assert_eq!(DurationClass::from_label(class.label()), Some(class));
    }
}

#[test]
fn from_label_rejects_unknown() {
    assert_eq!(DurationClass::from_label("2y"), None);
    assert_eq!(DurationClass::from_label(""), None);
}

#[test]
fn display_matches_label() {
    assert_eq!(DurationClass::OneYear.to_string(), "1y");
    assert_eq!(DurationClass::Lifetime.to_string(), "lifetime");
}

// ── Serde ─────────────────────────────────────────────────────────

#[test]
fn serde_uses_snake_case() {
    let json = serde_json::to_string(&DurationClass::FiveYears).unwrap();
    assert_eq!(json, "\"five_years\"");
    let parsed: DurationClass = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, DurationClass::FiveYears);
}
