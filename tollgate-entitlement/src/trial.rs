//! One-time trial and grace grants.

use std::sync::Arc;

use tollgate_store::{AccessStore, StoreResult};
use tollgate_types::{
    ActivationSource, AuditAction, AuditEntry, Entitlement, SubjectId, Tier,
};
use tracing::info;

use crate::clock::Clock;
use crate::config::ServiceConfig;
use crate::error::{GraceError, TrialError};
use crate::reconciler::{Grant, GrantKind, Reconciler};

/// Grants the once-per-subject trial and its once-per-subject grace tail.
#[derive(Clone)]
pub struct TrialManager {
    store: AccessStore,
    reconciler: Reconciler,
    clock: Arc<dyn Clock>,
    config: ServiceConfig,
}

impl TrialManager {
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

    /// Grants the one-time trial to a subject with no history at all.
    ///
    /// Any existing entitlement row, active or long expired, rules the
    /// trial out. The trial-record insert is the atomic guard, so two
    /// concurrent requests cannot both succeed.
    pub fn grant_initial_trial(&self, subject: SubjectId) -> Result<Entitlement, TrialError> {
        let now = self.clock.now();
        if self.store.get_entitlement(&subject)?.is_some() {
            return Err(TrialError::AlreadyGranted);
        }
        if !self.store.insert_trial_record(&subject, now)? {
            return Err(TrialError::AlreadyGranted);
        }
        let grant = Grant {
            kind: GrantKind::Span(self.config.trial_span),
            source: ActivationSource::Trial,
            reference: None,
        };
        let entitlement = self.reconciler.reconcile(subject, &grant)?;
        self.store.save_audit_entry(&AuditEntry {
            actor: subject.to_string(),
            action: AuditAction::TrialGranted,
            target: Some(subject.to_string()),
            timestamp: now,
            details: format!("span_days={}", self.config.trial_span.num_days()),
        })?;
        info!(
            "Granted {}-day trial to subject {}",
            self.config.trial_span.num_days(),
            subject
        );
        Ok(entitlement)
    }

    /// Appends the one-time grace span to an expired trial.
    ///
    /// Eligibility: the subject still sits on the trial tier, the trial has
    /// expired, and grace was never granted before. The grace-column update
    /// is the atomic guard.
    pub fn grant_grace_period(&self, subject: SubjectId) -> Result<Entitlement, GraceError> {
        let now = self.clock.now();
        let Some(entitlement) = self.store.get_entitlement(&subject)? else {
            return Err(GraceError::Ineligible {
                reason: "subject has no entitlement",
            });
        };
        if entitlement.tier != Tier::Trial {
            return Err(GraceError::Ineligible {
                reason: "subject is not on the trial tier",
            });
        }
        if entitlement.is_active_at(now) {
            return Err(GraceError::Ineligible {
                reason: "trial has not expired yet",
            });
        }
        if !self.store.mark_grace_granted(&subject, now)? {
            return Err(GraceError::Ineligible {
                reason: "grace was already granted",
            });
        }
        let grant = Grant {
            kind: GrantKind::Span(self.config.grace_span),
            source: ActivationSource::Grace,
            reference: None,
        };
        let entitlement = self.reconciler.reconcile(subject, &grant)?;
        self.store.save_audit_entry(&AuditEntry {
            actor: subject.to_string(),
            action: AuditAction::GraceGranted,
            target: Some(subject.to_string()),
            timestamp: now,
            details: format!("span_days={}", self.config.grace_span.num_days()),
        })?;
        info!(
            "Granted {}-day grace period to subject {}",
            self.config.grace_span.num_days(),
            subject
        );
        Ok(entitlement)
    }

    /// Whether the subject could still claim grace on an expired trial.
    pub fn grace_available(&self, subject: &SubjectId) -> StoreResult<bool> {
        match self.store.get_trial_record(subject)? {
            Some(record) => Ok(record.grace_granted_at.is_none()),
            None => Ok(false),
        }
    }
}
