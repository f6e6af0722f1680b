//! Payment session lifecycle.
//!
//! Sessions open as `pending`, may pass through `processing` once a gateway
//! acknowledges them, and settle exactly once into a terminal status. Expiry
//! is lazy: overdue sessions flip to `expired` whenever they are next read,
//! finalized or swept, so a TTL breach never depends on a background task
//! having run first.

use std::sync::Arc;

use tollgate_store::{AccessStore, StoreResult};
use tollgate_types::{
    ActivationSource, AuditAction, AuditEntry, DurationClass, PaymentMethod, PaymentOutcome,
    PaymentSession, PaymentSessionId, PaymentStatus, SubjectId,
};
use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::config::ServiceConfig;
use crate::error::PaymentError;
use crate::reconciler::{Grant, GrantKind, Reconciler};

/// Opens, settles and sweeps payment sessions.
#[derive(Clone)]
pub struct PaymentManager {
    store: AccessStore,
    reconciler: Reconciler,
    clock: Arc<dyn Clock>,
    config: ServiceConfig,
}

impl PaymentManager {
    pub fn new(
        store: AccessStore,
        reconciler: Reconciler,
        clock: Arc<dyn Clock>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            reconciler,
            clock,
            config,
        }
    }

    /// Opens a pending session for `subject`, priced from configuration.
    pub fn create(
        &self,
        subject: SubjectId,
        method: PaymentMethod,
        plan: DurationClass,
    ) -> Result<PaymentSession, PaymentError> {
        let now = self.clock.now();
        let session = PaymentSession {
            id: PaymentSessionId::new(),
            subject_id: subject,
            method,
            plan,
            amount: self.config.price_of(plan),
            currency: self.config.currency.clone(),
            status: PaymentStatus::Pending,
            created_at: now,
            deadline: now + self.config.payment_session_ttl,
            external_reference: None,
        };
        self.store.save_payment_session(&session)?;
        info!(
            "Opened payment session {} for subject {} ({} {} {}, plan {})",
            session.id, subject, session.amount, session.currency, method, plan
        );
        Ok(session)
    }

    /// Records gateway acknowledgement of a pending session.
    ///
    /// Repeat acknowledgements are no-ops; a session that already settled
    /// is reported as such.
    pub fn mark_processing(
        &self,
        id: &PaymentSessionId,
        external_reference: Option<&str>,
    ) -> Result<(), PaymentError> {
        let session = self.load_swept(id)?;
        if session.status.is_terminal() {
            return Err(PaymentError::AlreadyTerminal(session.status));
        }
        if self.store.mark_payment_processing(id, external_reference)? {
            debug!("Payment session {} acknowledged by gateway", id);
            return Ok(());
        }
        // Lost the update: either already processing (fine) or a racer
        // settled it in the meantime.
        let current = self.store.get_payment_session(id)?.ok_or(PaymentError::NotFound)?;
        match current.status {
            PaymentStatus::Processing => Ok(()),
            status if status.is_terminal() => Err(PaymentError::AlreadyTerminal(status)),
            _ => Ok(()),
        }
    }

    /// Settles a session with the outcome a gateway reported.
    ///
    /// Exactly one caller wins the settlement for a given session; only a
    /// winning `Completed` outcome reaches the reconciler, so concurrent
    /// webhook and poll deliveries cannot double-grant. Repeating the same
    /// outcome is a quiet no-op, while a contradicting outcome is refused
    /// and logged loudly.
    pub fn finalize(
        &self,
        id: &PaymentSessionId,
        outcome: PaymentOutcome,
    ) -> Result<(), PaymentError> {
        let now = self.clock.now();
        let session = self.load_swept(id)?;
        if session.status.is_terminal() {
            return self.classify_terminal(&session, outcome);
        }

        if self.store.settle_payment(id, outcome.status())? {
            self.store.save_audit_entry(&AuditEntry {
                actor: session.subject_id.to_string(),
                action: AuditAction::PaymentFinalized,
                target: Some(id.to_string()),
                timestamp: now,
                details: format!("outcome={} plan={}", outcome.status(), session.plan),
            })?;
            if outcome == PaymentOutcome::Completed {
                let grant = Grant {
                    kind: GrantKind::Class(session.plan),
                    source: ActivationSource::Payment,
                    reference: Some(id.to_string()),
                };
                self.reconciler.reconcile(session.subject_id, &grant)?;
                info!(
                    "Payment session {} completed, entitlement extended for subject {}",
                    id, session.subject_id
                );
            } else {
                info!("Payment session {} settled as {}", id, outcome.status());
            }
            return Ok(());
        }

        // A concurrent settler won; re-read and classify against it.
        let current = self.store.get_payment_session(id)?.ok_or(PaymentError::NotFound)?;
        self.classify_terminal(&current, outcome)
    }

    /// Cancels a session the subject backed out of. Only pending sessions
    /// qualify; cancelling twice is a no-op.
    pub fn cancel(&self, id: &PaymentSessionId) -> Result<(), PaymentError> {
        let now = self.clock.now();
        let session = self.load_swept(id)?;
        match session.status {
            PaymentStatus::Cancelled => return Ok(()),
            PaymentStatus::Pending => {}
            _ => return Err(PaymentError::TooLate),
        }
        if self.store.cancel_payment_if_pending(id)? {
            self.store.save_audit_entry(&AuditEntry {
                actor: session.subject_id.to_string(),
                action: AuditAction::PaymentFinalized,
                target: Some(id.to_string()),
                timestamp: now,
                details: "outcome=cancelled by=subject".to_string(),
            })?;
            info!("Payment session {} cancelled by subject", id);
            return Ok(());
        }
        // Raced with the gateway; whatever it became, it is too late now.
        let current = self.store.get_payment_session(id)?.ok_or(PaymentError::NotFound)?;
        match current.status {
            PaymentStatus::Cancelled => Ok(()),
            _ => Err(PaymentError::TooLate),
        }
    }

    /// Reads one session, applying lazy expiry first.
    pub fn session(&self, id: &PaymentSessionId) -> Result<PaymentSession, PaymentError> {
        self.load_swept(id)
    }

    /// Lists a subject's sessions, newest first. Overdue open sessions are
    /// swept before the read so the listing never shows a stale `pending`.
    pub fn sessions_for_subject(&self, subject: &SubjectId) -> StoreResult<Vec<PaymentSession>> {
        self.store.sweep_expired_payments(self.clock.now())?;
        self.store.get_payment_sessions_for_subject(subject)
    }

    /// Expires every overdue open session.
    pub fn sweep_expired(&self) -> StoreResult<usize> {
        let swept = self.store.sweep_expired_payments(self.clock.now())?;
        if swept > 0 {
            info!("Swept {} expired payment session(s)", swept);
        }
        Ok(swept)
    }

    /// Loads a session and expires it on the spot if its deadline passed
    /// while it was still open.
    fn load_swept(&self, id: &PaymentSessionId) -> Result<PaymentSession, PaymentError> {
        let now = self.clock.now();
        let session = self.store.get_payment_session(id)?.ok_or(PaymentError::NotFound)?;
        if session.is_open() && session.is_past_deadline(now) {
            if self.store.mark_payment_expired(id, now)? {
                info!("Payment session {} expired at its deadline", id);
            }
            // Re-read: a concurrent settlement may have beaten the expiry.
            return self.store.get_payment_session(id)?.ok_or(PaymentError::NotFound);
        }
        Ok(session)
    }

    fn classify_terminal(
        &self,
        session: &PaymentSession,
        outcome: PaymentOutcome,
    ) -> Result<(), PaymentError> {
        if session.status == outcome.status() {
            debug!(
                "Repeat {} finalize for payment session {}, nothing to do",
                outcome.status(),
                session.id
            );
            Ok(())
        } else {
            error!(
                "Contradictory finalize for payment session {}: stored {}, reported {}",
                session.id,
                session.status,
                outcome.status()
            );
            Err(PaymentError::AlreadyTerminal(session.status))
        }
    }
}
