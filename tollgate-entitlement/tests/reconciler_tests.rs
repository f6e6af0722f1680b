mod common;

use chrono::TimeDelta;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tollgate_entitlement::{Grant, GrantKind};
use tollgate_types::{ActivationSource, AuditAction, DurationClass, SubjectId, Tier};

fn one_year_code_grant() -> Grant {
    Grant {
        kind: GrantKind::Class(DurationClass::OneYear),
        source: ActivationSource::Code,
        reference: Some("TEST-CODE".to_string()),
    }
}

fn days_grant(days: i64) -> Grant {
    Grant {
        kind: GrantKind::Span(TimeDelta::days(days)),
        source: ActivationSource::Trial,
        reference: None,
    }
}

// ── Stacking ─────────────────────────────────────────────────────

#[test]
fn one_year_grants_stack_then_restart() {
    let (reconciler, clock, _store) = common::reconciler_at_t0();
    let subject = SubjectId::new();
    let t0 = common::t0();

    let first = reconciler.reconcile(subject, &one_year_code_grant()).unwrap();
    assert_eq!(first.expires_at, Some(t0 + TimeDelta::days(365)));
    assert_eq!(first.tier, Tier::Fixed(DurationClass::OneYear));
    assert_eq!(first.activation_source, ActivationSource::Code);
    assert_eq!(first.activation_reference.as_deref(), Some("TEST-CODE"));

    // Halfway through, a second grant extends from the current expiry,
    // never from now.
    clock.advance(TimeDelta::days(182));
    let second = reconciler.reconcile(subject, &one_year_code_grant()).unwrap();
    assert_eq!(second.expires_at, Some(t0 + TimeDelta::days(730)));

    // Long past expiry, a third grant starts fresh from now.
    clock.set(t0 + TimeDelta::days(800));
    let third = reconciler.reconcile(subject, &one_year_code_grant()).unwrap();
    assert_eq!(third.expires_at, Some(t0 + TimeDelta::days(800 + 365)));
    assert!(third.is_active_at(clock.now()));
}

#[test]
fn merge_adopts_latest_grant_identity() {
    let (reconciler, clock, _store) = common::reconciler_at_t0();
    let subject = SubjectId::new();
    let t0 = common::t0();

    let trial = reconciler.reconcile(subject, &days_grant(14)).unwrap();
    assert_eq!(trial.tier, Tier::Trial);
    assert_eq!(trial.expires_at, Some(t0 + TimeDelta::days(14)));

    clock.advance(TimeDelta::days(1));
    let grant = Grant {
        kind: GrantKind::Class(DurationClass::FiveYears),
        source: ActivationSource::Payment,
        reference: Some("session-1".to_string()),
    };
    let upgraded = reconciler.reconcile(subject, &grant).unwrap();
    assert_eq!(upgraded.tier, Tier::Fixed(DurationClass::FiveYears));
    assert_eq!(upgraded.activation_source, ActivationSource::Payment);
    assert_eq!(upgraded.activated_at, t0 + TimeDelta::days(1));
    // The unused trial days still count: base is the trial expiry.
    assert_eq!(upgraded.expires_at, Some(t0 + TimeDelta::days(14 + 1825)));
}

// ── Lifetime dominance ───────────────────────────────────────────

#[test]
fn lifetime_grant_clears_fixed_expiry() {
    let (reconciler, _clock, _store) = common::reconciler_at_t0();
    let subject = SubjectId::new();

    reconciler.reconcile(subject, &one_year_code_grant()).unwrap();
    let grant = Grant {
        kind: GrantKind::Class(DurationClass::Lifetime),
        source: ActivationSource::Payment,
        reference: Some("session-2".to_string()),
    };
    let merged = reconciler.reconcile(subject, &grant).unwrap();
    assert_eq!(merged.tier, Tier::Lifetime);
    assert_eq!(merged.expires_at, None);
    assert!(merged.is_active_at(common::t0() + TimeDelta::days(100_000)));
}

#[test]
fn lifetime_absorbs_followup_grants() {
    let (reconciler, clock, store) = common::reconciler_at_t0();
    let subject = SubjectId::new();

    let lifetime = Grant {
        kind: GrantKind::Class(DurationClass::Lifetime),
        source: ActivationSource::AdminGrant,
        reference: Some("root@example.com".to_string()),
    };
    reconciler.reconcile(subject, &lifetime).unwrap();

    clock.advance(TimeDelta::days(30));
    let after = reconciler.reconcile(subject, &one_year_code_grant()).unwrap();
    assert_eq!(after.tier, Tier::Lifetime);
    assert_eq!(after.expires_at, None);
    // The row is untouched; the absorbed attempt is only audited.
    assert_eq!(
        after.activation_reference.as_deref(),
        Some("root@example.com")
    );

    let log = store.load_audit_log(10, 0).unwrap();
    assert_eq!(log.len(), 2);
    assert!(log[0].details.contains("absorbed"));
}

// ── Concurrency ──────────────────────────────────────────────────

#[test]
fn concurrent_grants_all_land() {
    let (reconciler, _clock, store) = common::reconciler_at_t0();
    let subject = SubjectId::new();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let reconciler = reconciler.clone();
            scope.spawn(move || {
                reconciler.reconcile(subject, &days_grant(10)).unwrap();
            });
        }
    });

    // Every grant landed exactly once, whatever the interleaving.
    let merged = store.get_entitlement(&subject).unwrap().unwrap();
    assert_eq!(merged.expires_at, Some(common::t0() + TimeDelta::days(40)));
}

// ── Audit trail ──────────────────────────────────────────────────

#[test]
fn every_reconcile_leaves_an_audit_entry() {
    let (reconciler, _clock, store) = common::reconciler_at_t0();
    let subject = SubjectId::new();

    reconciler.reconcile(subject, &days_grant(14)).unwrap();
    reconciler.reconcile(subject, &one_year_code_grant()).unwrap();

    let log = store.load_audit_log(10, 0).unwrap();
    assert_eq!(log.len(), 2);
    for entry in &log {
        assert_eq!(entry.action, AuditAction::EntitlementUpdated);
        assert_eq!(entry.actor, subject.to_string());
        assert_eq!(entry.target.as_deref(), Some(subject.to_string().as_str()));
    }
    // Newest first: the code grant sits on top.
    assert!(log[0].details.contains("source=code"));
    assert!(log[1].details.contains("source=trial"));
}

// ── Properties ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn stacking_never_shortens(
        initial_days in 1i64..2_000,
        grant_days in 1i64..2_000,
        gap_days in 0i64..3_000,
    ) {
        let (reconciler, clock, _store) = common::reconciler_at_t0();
        let subject = SubjectId::new();

        let first = reconciler.reconcile(subject, &days_grant(initial_days)).unwrap();
        let before = first.expires_at.unwrap();

        clock.advance(TimeDelta::days(gap_days));
        let now = clock.now();
        let second = reconciler.reconcile(subject, &days_grant(grant_days)).unwrap();
        let after = second.expires_at.unwrap();

        prop_assert!(after >= before);
        prop_assert!(after >= now + TimeDelta::days(grant_days));
        // Exact merge rule: the later of previous expiry and now, plus the span.
        prop_assert_eq!(after, before.max(now) + TimeDelta::days(grant_days));
    }

    #[test]
    fn same_instant_grants_commute(spans in proptest::collection::vec(1i64..800, 1..6)) {
        let (reconciler, _clock, store) = common::reconciler_at_t0();
        let forward = SubjectId::new();
        let backward = SubjectId::new();

        for days in &spans {
            reconciler.reconcile(forward, &days_grant(*days)).unwrap();
        }
        for days in spans.iter().rev() {
            reconciler.reconcile(backward, &days_grant(*days)).unwrap();
        }

        let a = store.get_entitlement(&forward).unwrap().unwrap();
        let b = store.get_entitlement(&backward).unwrap().unwrap();
        prop_assert_eq!(a.expires_at, b.expires_at);

        let total: i64 = spans.iter().sum();
        prop_assert_eq!(a.expires_at.unwrap(), common::t0() + TimeDelta::days(total));
    }
}
