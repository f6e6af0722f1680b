mod common;

use chrono::TimeDelta;
use pretty_assertions::assert_eq;
use tollgate_entitlement::PaymentError;
use tollgate_types::{
    ActivationSource, AuditAction, DurationClass, PaymentMethod, PaymentOutcome, PaymentStatus,
    SubjectId, Tier,
};

// ── Session creation ─────────────────────────────────────────────

#[test]
fn create_prices_from_config() {
    let (payments, _clock, store) = common::payments_at_t0();
    let subject = SubjectId::new();

    let session = payments
        .create(subject, PaymentMethod::CardGateway, DurationClass::OneYear)
        .unwrap();
    assert_eq!(session.status, PaymentStatus::Pending);
    assert_eq!(session.amount, 3_999);
    assert_eq!(session.currency, "USD");
    assert_eq!(session.deadline, common::t0() + TimeDelta::minutes(30));
    assert_eq!(session.external_reference, None);

    let listed = payments.sessions_for_subject(&subject).unwrap();
    assert_eq!(listed, vec![store.get_payment_session(&session.id).unwrap().unwrap()]);
}

#[test]
fn lifetime_plan_settles_to_lifetime_tier() {
    let (payments, _clock, store) = common::payments_at_t0();
    let subject = SubjectId::new();

    let session = payments
        .create(subject, PaymentMethod::OnChainTransfer, DurationClass::Lifetime)
        .unwrap();
    assert_eq!(session.amount, 29_999);

    payments
        .finalize(&session.id, PaymentOutcome::Completed)
        .unwrap();
    let entitlement = store.get_entitlement(&subject).unwrap().unwrap();
    assert_eq!(entitlement.tier, Tier::Lifetime);
    assert_eq!(entitlement.expires_at, None);
    assert_eq!(entitlement.activation_source, ActivationSource::Payment);
}

// ── Gateway acknowledgement ──────────────────────────────────────

#[test]
fn acknowledge_records_the_gateway_reference() {
    let (payments, _clock, store) = common::payments_at_t0();
    let session = payments
        .create(SubjectId::new(), PaymentMethod::P2pWallet, DurationClass::OneYear)
        .unwrap();

    payments.mark_processing(&session.id, Some("gw-123")).unwrap();
    let stored = store.get_payment_session(&session.id).unwrap().unwrap();
    assert_eq!(stored.status, PaymentStatus::Processing);
    assert_eq!(stored.external_reference.as_deref(), Some("gw-123"));

    // A repeat acknowledgement is a no-op and keeps the reference.
    payments.mark_processing(&session.id, None).unwrap();
    let stored = store.get_payment_session(&session.id).unwrap().unwrap();
    assert_eq!(stored.external_reference.as_deref(), Some("gw-123"));
}

#[test]
fn acknowledge_after_settlement_is_refused() {
    let (payments, _clock, _store) = common::payments_at_t0();
    let session = payments
        .create(SubjectId::new(), PaymentMethod::CardGateway, DurationClass::OneYear)
        .unwrap();
    payments
        .finalize(&session.id, PaymentOutcome::Cancelled)
        .unwrap();

    let err = payments.mark_processing(&session.id, None).unwrap_err();
    assert!(matches!(
        err,
        PaymentError::AlreadyTerminal(PaymentStatus::Cancelled)
    ));
}

// ── Finalize ─────────────────────────────────────────────────────

#[test]
fn finalize_completed_grants_once() {
    let (payments, _clock, store) = common::payments_at_t0();
    let subject = SubjectId::new();
    let session = payments
        .create(subject, PaymentMethod::CardGateway, DurationClass::OneYear)
        .unwrap();
    payments.mark_processing(&session.id, Some("gw-9")).unwrap();

    payments
        .finalize(&session.id, PaymentOutcome::Completed)
        .unwrap();
    let entitlement = store.get_entitlement(&subject).unwrap().unwrap();
    let expiry = entitlement.expires_at.unwrap();
    assert_eq!(expiry, common::t0() + TimeDelta::days(365));
    assert_eq!(
        entitlement.activation_reference.as_deref(),
        Some(session.id.to_string().as_str())
    );

    // Same-outcome repeat: success, but nothing moves.
    payments
        .finalize(&session.id, PaymentOutcome::Completed)
        .unwrap();
    let entitlement = store.get_entitlement(&subject).unwrap().unwrap();
    assert_eq!(entitlement.expires_at, Some(expiry));

    let log = store.load_audit_log(20, 0).unwrap();
    let settlements = log
        .iter()
        .filter(|entry| entry.action == AuditAction::PaymentFinalized)
        .count();
    assert_eq!(settlements, 1);
}

#[test]
fn contradictory_finalize_is_refused() {
    let (payments, _clock, store) = common::payments_at_t0();
    let subject = SubjectId::new();
    let session = payments
        .create(subject, PaymentMethod::CardGateway, DurationClass::OneYear)
        .unwrap();

    payments
        .finalize(&session.id, PaymentOutcome::Failed)
        .unwrap();
    assert!(store.get_entitlement(&subject).unwrap().is_none());

    let err = payments
        .finalize(&session.id, PaymentOutcome::Completed)
        .unwrap_err();
    assert!(matches!(
        err,
        PaymentError::AlreadyTerminal(PaymentStatus::Failed)
    ));
    assert!(store.get_entitlement(&subject).unwrap().is_none());
}

#[test]
fn finalize_unknown_session() {
    let (payments, _clock, _store) = common::payments_at_t0();
    let err = payments
        .finalize(&tollgate_types::PaymentSessionId::new(), PaymentOutcome::Completed)
        .unwrap_err();
    assert!(matches!(err, PaymentError::NotFound));
}

// ── Cancellation ─────────────────────────────────────────────────

#[test]
fn cancel_pending_session() {
    let (payments, _clock, store) = common::payments_at_t0();
    let session = payments
        .create(SubjectId::new(), PaymentMethod::CardGateway, DurationClass::OneYear)
        .unwrap();

    payments.cancel(&session.id).unwrap();
    let stored = store.get_payment_session(&session.id).unwrap().unwrap();
    assert_eq!(stored.status, PaymentStatus::Cancelled);

    // Cancelling twice is a no-op; settling afterwards is refused.
    payments.cancel(&session.id).unwrap();
    let err = payments
        .finalize(&session.id, PaymentOutcome::Completed)
        .unwrap_err();
    assert!(matches!(
        err,
        PaymentError::AlreadyTerminal(PaymentStatus::Cancelled)
    ));
}

#[test]
fn cancel_after_acknowledgement_is_too_late() {
    let (payments, _clock, _store) = common::payments_at_t0();
    let session = payments
        .create(SubjectId::new(), PaymentMethod::CardGateway, DurationClass::OneYear)
        .unwrap();
    payments.mark_processing(&session.id, None).unwrap();

    let err = payments.cancel(&session.id).unwrap_err();
    assert!(matches!(err, PaymentError::TooLate));
}

// ── TTL expiry ───────────────────────────────────────────────────

#[test]
fn overdue_session_expires_on_read() {
    let (payments, clock, _store) = common::payments_at_t0();
    let session = payments
        .create(SubjectId::new(), PaymentMethod::CardGateway, DurationClass::OneYear)
        .unwrap();

    // One second shy of the deadline the session is still open.
    clock.set(session.deadline - TimeDelta::seconds(1));
    assert_eq!(
        payments.session(&session.id).unwrap().status,
        PaymentStatus::Pending
    );

    // At the deadline the next read flips it.
    clock.set(session.deadline);
    assert_eq!(
        payments.session(&session.id).unwrap().status,
        PaymentStatus::Expired
    );
}

#[test]
fn late_finalize_cannot_revive_an_expired_session() {
    let (payments, clock, store) = common::payments_at_t0();
    let subject = SubjectId::new();
    let session = payments
        .create(subject, PaymentMethod::CardGateway, DurationClass::OneYear)
        .unwrap();

    clock.advance(TimeDelta::minutes(31));
    let err = payments
        .finalize(&session.id, PaymentOutcome::Completed)
        .unwrap_err();
    assert!(matches!(
        err,
        PaymentError::AlreadyTerminal(PaymentStatus::Expired)
    ));
    assert!(store.get_entitlement(&subject).unwrap().is_none());
}

// ── Facade paths ─────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn webhook_and_poll_race_grants_once() {
    let (service, _clock, store) = common::service_at_t0();
    let subject = SubjectId::new();
    let session = service
        .create_payment_session(subject, PaymentMethod::CardGateway, DurationClass::OneYear)
        .await
        .unwrap();
    service
        .acknowledge_payment(session.id, Some("gw-race".to_string()))
        .await
        .unwrap();

    let webhook = {
        let service = service.clone();
        let id = session.id;
        tokio::spawn(async move { service.confirm_payment(id, PaymentOutcome::Completed).await })
    };
    let poller = {
        let service = service.clone();
        let id = session.id;
        tokio::spawn(async move { service.confirm_payment(id, PaymentOutcome::Completed).await })
    };

    // Both callers succeed; only one of them moved the state.
    webhook.await.unwrap().unwrap();
    poller.await.unwrap().unwrap();

    let entitlement = store.get_entitlement(&subject).unwrap().unwrap();
    assert_eq!(entitlement.expires_at, Some(common::t0() + TimeDelta::days(365)));

    let log = store.load_audit_log(20, 0).unwrap();
    let settlements = log
        .iter()
        .filter(|entry| entry.action == AuditAction::PaymentFinalized)
        .count();
    let updates = log
        .iter()
        .filter(|entry| entry.action == AuditAction::EntitlementUpdated)
        .count();
    assert_eq!(settlements, 1);
    assert_eq!(updates, 1);
}

#[tokio::test]
async fn sweep_reports_expired_sessions() {
    let (service, clock, _store) = common::service_at_t0();
    let subject = SubjectId::new();

    service
        .create_payment_session(subject, PaymentMethod::CardGateway, DurationClass::OneYear)
        .await
        .unwrap();
    service
        .create_payment_session(subject, PaymentMethod::P2pWallet, DurationClass::FiveYears)
        .await
        .unwrap();
    clock.advance(TimeDelta::minutes(31));
    let fresh = service
        .create_payment_session(subject, PaymentMethod::CardGateway, DurationClass::OneYear)
        .await
        .unwrap();

    let report = service.sweep_expired().await.unwrap();
    assert_eq!(report.payments_expired, 2);

    let session = service.payment_session(fresh.id).await.unwrap();
    assert_eq!(session.status, PaymentStatus::Pending);
}
