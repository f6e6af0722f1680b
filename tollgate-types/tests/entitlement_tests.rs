use chrono::{TimeDelta, Utc};
use proptest::prelude::*;
use tollgate_types::{ActivationSource, DurationClass, Entitlement, SubjectId, Tier};

fn fixed_entitlement(expires_in: TimeDelta) -> Entitlement {
    let now = Utc::now();
    Entitlement {
        subject_id: SubjectId::new(),
        is_active: true,
        tier: Tier::Fixed(DurationClass::OneYear),
        activated_at: now,
        expires_at: Some(now + expires_in),
        activation_source: ActivationSource::Code,
        activation_reference: Some("TEST-CODE".to_string()),
    }
}

// ── Tier labels ───────────────────────────────────────────────────

#[test]
fn tier_label_roundtrip() {
    let tiers = [
        Tier::Trial,
        Tier::Fixed(DurationClass::OneYear),
        Tier::Fixed(DurationClass::FiveYears),
        Tier::Lifetime,
    ];
    for tier in tiers {
        assert_eq!(Tier::from_label(&tier.label()), Some(tier));
    }
}

#[test]
fn tier_fixed_label_embeds_class() {
    assert_eq!(Tier::Fixed(DurationClass::OneYear).label(), "fixed:1y");
    assert_eq!(Tier::Fixed(DurationClass::FiveYears).label(), "fixed:5y");
}

#[test]
fn tier_from_label_rejects_unknown() {
    assert_eq!(Tier::from_label("fixed:2y"), None);
    assert_eq!(Tier::from_label("fixed:"), None);
    assert_eq!(Tier::from_label("gold"), None);
}

#[test]
fn tier_lifetime_flag() {
    assert!(Tier::Lifetime.is_lifetime());
    assert!(!Tier::Trial.is_lifetime());
    assert!(!Tier::Fixed(DurationClass::OneYear).is_lifetime());
}

// ── ActivationSource labels ───────────────────────────────────────

#[test]
fn activation_source_label_roundtrip() {
    let sources = [
        ActivationSource::Code,
        ActivationSource::Payment,
        ActivationSource::AdminGrant,
        ActivationSource::Trial,
        ActivationSource::Grace,
    ];
    for source in sources {
        assert_eq!(ActivationSource::from_label(source.label()), Some(source));
    }
}

// ── Liveness ──────────────────────────────────────────────────────

#[test]
fn active_before_expiry() {
    let ent = fixed_entitlement(TimeDelta::days(10));
    assert!(ent.is_active_at(Utc::now()));
}

#[test]
fn inactive_after_expiry() {
    let ent = fixed_entitlement(TimeDelta::days(10));
    let later = Utc::now() + TimeDelta::days(11);
    assert!(!ent.is_active_at(later));
}

#[test]
fn expiry_instant_is_inactive() {
    let now = Utc::now();
    let mut ent = fixed_entitlement(TimeDelta::zero());
    ent.expires_at = Some(now);
    assert!(!ent.is_active_at(now));
}

#[test]
fn lifetime_always_active() {
    let mut ent = fixed_entitlement(TimeDelta::days(1));
    ent.tier = Tier::Lifetime;
    ent.expires_at = None;
    let far_future = Utc::now() + TimeDelta::days(365 * 100);
    assert!(ent.is_active_at(far_future));
    assert_eq!(ent.remaining_at(far_future), None);
}

// ── Remaining time ────────────────────────────────────────────────

#[test]
fn remaining_counts_down() {
    let now = Utc::now();
    let ent = Entitlement {
        expires_at: Some(now + TimeDelta::hours(5)),
        ..fixed_entitlement(TimeDelta::zero())
    };
    assert_eq!(ent.remaining_at(now), Some(TimeDelta::hours(5)));
}

#[test]
fn remaining_clamps_to_zero_after_expiry() {
    let now = Utc::now();
    let ent = Entitlement {
        expires_at: Some(now - TimeDelta::days(3)),
        ..fixed_entitlement(TimeDelta::zero())
    };
    assert_eq!(ent.remaining_at(now), Some(TimeDelta::zero()));
}

proptest! {
    /// remaining_at never goes negative and agrees with is_active_at:
    /// a positive remainder means active, a zero remainder means expired.
    #[test]
    fn remaining_consistent_with_liveness(offset_secs in -10_000_000i64..10_000_000i64) {
        let now = Utc::now();
        let ent = Entitlement {
            expires_at: Some(now + TimeDelta::seconds(offset_secs)),
            ..fixed_entitlement(TimeDelta::zero())
        };
        let remaining = ent.remaining_at(now).unwrap();
        prop_assert!(remaining >= TimeDelta::zero());
        prop_assert_eq!(remaining > TimeDelta::zero(), ent.is_active_at(now));
    }
}

// ── Serde ─────────────────────────────────────────────────────────

#[test]
fn entitlement_serialization_roundtrip() {
    let ent = fixed_entitlement(TimeDelta::days(30));
    let json = serde_json::to_string(&ent).unwrap();
    let parsed: Entitlement = serde_json::from_str(&json).unwrap();
    assert_eq!(ent, parsed);
}
