//! The async access facade.
//!
//! [`AccessService`] is the one entry point callers go through. Every
//! operation runs its SQLite work on the blocking pool and maps the rare
//! join failure into a storage error, so the async surface never blocks a
//! runtime worker on a database lock.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tollgate_store::{AccessStore, StoreError, StoreResult};
use tollgate_types::{
    AccessCode, AdminSession, AdminSessionId, AuditEntry, DurationClass, Entitlement,
    PaymentMethod, PaymentOutcome, PaymentSession, PaymentSessionId, PrivilegeLevel, SubjectId,
    Tier,
};
use tracing::warn;

use crate::admin::AdminGuard;
use crate::clock::{Clock, SystemClock};
use crate::codes::CodeRegistry;
use crate::config::ServiceConfig;
use crate::error::{AdminError, GraceError, PaymentError, RedeemError, TrialError};
use crate::payments::PaymentManager;
use crate::reconciler::Reconciler;
use crate::status::{derive_status, StatusSnapshot};
use crate::trial::TrialManager;

/// Result of one maintenance sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    pub payments_expired: usize,
    pub admin_sessions_deleted: usize,
}

struct ServiceInner {
    store: AccessStore,
    codes: CodeRegistry,
    payments: PaymentManager,
    trials: TrialManager,
    admin: AdminGuard,
    clock: Arc<dyn Clock>,
}

impl ServiceInner {
    fn snapshot(&self, subject: SubjectId) -> StoreResult<StatusSnapshot> {
        let entitlement = self.store.get_entitlement(&subject)?;
        let grace_available = match &entitlement {
            Some(current) if current.tier == Tier::Trial => {
                self.trials.grace_available(&subject)?
            }
            _ => false,
        };
        Ok(derive_status(
            entitlement.as_ref(),
            grace_available,
            self.clock.now(),
        ))
    }
}

/// Front door of the entitlement engine. Cheap to clone and share.
#[derive(Clone)]
pub struct AccessService {
    inner: Arc<ServiceInner>,
}

impl AccessService {
    /// Builds a service over `store` with the system clock.
    pub fn new(store: AccessStore, config: ServiceConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Builds a service with an explicit clock. Tests drive expiry through
    /// a [`ManualClock`](crate::ManualClock) here.
    pub fn with_clock(store: AccessStore, config: ServiceConfig, clock: Arc<dyn Clock>) -> Self {
        let reconciler = Reconciler::new(store.clone(), clock.clone());
        let codes = CodeRegistry::new(store.clone(), reconciler.clone(), clock.clone());
        let payments = PaymentManager::new(
            store.clone(),
            reconciler.clone(),
            clock.clone(),
            config.clone(),
        );
        let trials = TrialManager::new(
            store.clone(),
            reconciler.clone(),
            clock.clone(),
            config.clone(),
        );
        let admin = AdminGuard::new(store.clone(), reconciler, clock.clone(), config);
        Self {
            inner: Arc::new(ServiceInner {
                store,
                codes,
                payments,
                trials,
                admin,
                clock,
            }),
        }
    }

    // ── Subject surface ──────────────────────────────────────────

    /// Where the subject stands right now.
    pub async fn status(&self, subject: SubjectId) -> Result<StatusSnapshot, StoreError> {
        let inner = self.inner.clone();
        run_blocking(move || inner.snapshot(subject)).await
    }

    /// Redeems an access code and returns the refreshed status.
    pub async fn redeem_code(
        &self,
        value: &str,
        subject: SubjectId,
    ) -> Result<StatusSnapshot, RedeemError> {
        let inner = self.inner.clone();
        let value = value.to_string();
        run_blocking(move || {
            inner.codes.redeem(&value, subject)?;
            inner.snapshot(subject).map_err(RedeemError::from)
        })
        .await
    }

    /// Opens a payment session for the given plan.
    pub async fn create_payment_session(
        &self,
        subject: SubjectId,
        method: PaymentMethod,
        plan: DurationClass,
    ) -> Result<PaymentSession, PaymentError> {
        let inner = self.inner.clone();
        run_blocking(move || inner.payments.create(subject, method, plan)).await
    }

    /// Records gateway acknowledgement of a pending session.
    pub async fn acknowledge_payment(
        &self,
        id: PaymentSessionId,
        external_reference: Option<String>,
    ) -> Result<(), PaymentError> {
        let inner = self.inner.clone();
        run_blocking(move || inner.payments.mark_processing(&id, external_reference.as_deref()))
            .await
    }

    /// Settles a payment session with a gateway-reported outcome. Safe to
    /// call from webhook and poll paths concurrently.
    pub async fn confirm_payment(
        &self,
        id: PaymentSessionId,
        outcome: PaymentOutcome,
    ) -> Result<(), PaymentError> {
        let inner = self.inner.clone();
        run_blocking(move || inner.payments.finalize(&id, outcome)).await
    }

    /// Cancels a pending payment session.
    pub async fn cancel_payment(&self, id: PaymentSessionId) -> Result<(), PaymentError> {
        let inner = self.inner.clone();
        run_blocking(move || inner.payments.cancel(&id)).await
    }

    /// Reads one payment session, expiring it first if overdue.
    pub async fn payment_session(
        &self,
        id: PaymentSessionId,
    ) -> Result<PaymentSession, PaymentError> {
        let inner = self.inner.clone();
        run_blocking(move || inner.payments.session(&id)).await
    }

    /// Lists a subject's payment sessions, newest first.
    pub async fn payment_sessions_for(
        &self,
        subject: SubjectId,
    ) -> Result<Vec<PaymentSession>, StoreError> {
        let inner = self.inner.clone();
        run_blocking(move || inner.payments.sessions_for_subject(&subject)).await
    }

    /// Grants the one-time trial and returns the refreshed status.
    pub async fn request_trial(&self, subject: SubjectId) -> Result<StatusSnapshot, TrialError> {
        let inner = self.inner.clone();
        run_blocking(move || {
            inner.trials.grant_initial_trial(subject)?;
            inner.snapshot(subject).map_err(TrialError::from)
        })
        .await
    }

    /// Grants the one-time grace period and returns the refreshed status.
    pub async fn request_grace(&self, subject: SubjectId) -> Result<StatusSnapshot, GraceError> {
        let inner = self.inner.clone();
        run_blocking(move || {
            inner.trials.grant_grace_period(subject)?;
            inner.snapshot(subject).map_err(GraceError::from)
        })
        .await
    }

    // ── Admin surface ────────────────────────────────────────────

    /// Signs an admin in and opens a time-boxed session.
    pub async fn admin_sign_in(
        &self,
        admin_id: &str,
        password: &str,
    ) -> Result<AdminSession, AdminError> {
        let inner = self.inner.clone();
        let admin_id = admin_id.to_string();
        let password = password.to_string();
        run_blocking(move || inner.admin.authenticate(&admin_id, &password)).await
    }

    /// Mints a fresh access code. Standard privilege.
    pub async fn admin_generate_code(
        &self,
        session_id: AdminSessionId,
        class: DurationClass,
        valid_until: Option<DateTime<Utc>>,
    ) -> Result<AccessCode, AdminError> {
        let inner = self.inner.clone();
        run_blocking(move || {
            let session = inner.admin.authorize(&session_id, PrivilegeLevel::Standard)?;
            inner
                .codes
                .generate(class, &session.admin_id, valid_until)
                .map_err(AdminError::from)
        })
        .await
    }

    /// Withdraws an unredeemed code. Standard privilege.
    pub async fn admin_revoke_code(
        &self,
        session_id: AdminSessionId,
        code: &str,
    ) -> Result<(), AdminError> {
        let inner = self.inner.clone();
        let code = code.to_string();
        run_blocking(move || {
            let session = inner.admin.authorize(&session_id, PrivilegeLevel::Standard)?;
            inner
                .codes
                .revoke(&code, &session.admin_id)
                .map_err(revoke_error)
        })
        .await
    }

    /// Grants an entitlement directly to a subject. Super privilege.
    pub async fn admin_grant(
        &self,
        session_id: AdminSessionId,
        subject: SubjectId,
        class: DurationClass,
    ) -> Result<Entitlement, AdminError> {
        let inner = self.inner.clone();
        run_blocking(move || inner.admin.grant(&session_id, subject, class)).await
    }

    /// Pages through issued codes, newest first. Standard privilege.
    pub async fn admin_list_codes(
        &self,
        session_id: AdminSessionId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AccessCode>, AdminError> {
        let inner = self.inner.clone();
        run_blocking(move || {
            inner.admin.authorize(&session_id, PrivilegeLevel::Standard)?;
            inner.codes.list(limit, offset).map_err(AdminError::from)
        })
        .await
    }

    /// Pages through the audit log, newest first. Standard privilege.
    pub async fn admin_audit_log(
        &self,
        session_id: AdminSessionId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AuditEntry>, AdminError> {
        let inner = self.inner.clone();
        run_blocking(move || {
            inner.admin.authorize(&session_id, PrivilegeLevel::Standard)?;
            inner
                .store
                .load_audit_log(limit, offset)
                .map_err(AdminError::from)
        })
        .await
    }

    /// Total number of audit entries. Standard privilege.
    pub async fn admin_audit_log_count(
        &self,
        session_id: AdminSessionId,
    ) -> Result<usize, AdminError> {
        let inner = self.inner.clone();
        run_blocking(move || {
            inner.admin.authorize(&session_id, PrivilegeLevel::Standard)?;
            inner.store.audit_log_count().map_err(AdminError::from)
        })
        .await
    }

    // ── Maintenance ──────────────────────────────────────────────

    /// Expires overdue payment sessions and drops dead admin sessions.
    pub async fn sweep_expired(&self) -> Result<SweepReport, StoreError> {
        let inner = self.inner.clone();
        run_blocking(move || {
            let payments_expired = inner.payments.sweep_expired()?;
            let admin_sessions_deleted = inner.admin.sweep_expired_sessions()?;
            Ok(SweepReport {
                payments_expired,
                admin_sessions_deleted,
            })
        })
        .await
    }

    /// Spawns a background task that sweeps on a fixed interval until the
    /// handle is aborted or the runtime shuts down.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                if let Err(e) = service.sweep_expired().await {
                    warn!("Maintenance sweep failed: {}", e);
                }
            }
        })
    }
}

/// Runs closed-over SQLite work on the blocking pool.
async fn run_blocking<T, E, F>(task: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<StoreError> + Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result,
        Err(e) => Err(E::from(StoreError::Task(format!(
            "spawn_blocking failed: {e}"
        )))),
    }
}

// revoke() never surfaces Expired or Revoked; the fold keeps the match total.
fn revoke_error(err: RedeemError) -> AdminError {
    match err {
        RedeemError::NotFound | RedeemError::Expired | RedeemError::Revoked => {
            AdminError::CodeNotFound
        }
        RedeemError::AlreadyUsed => AdminError::CodeAlreadyRedeemed,
        RedeemError::Storage(e) => AdminError::Storage(e),
    }
}
