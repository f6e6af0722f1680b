//! Activation reconciler: the single writer of entitlement state.
//!
//! Codes, payments, admin grants, trials and grace all funnel through
//! [`Reconciler::reconcile`], which merges the approved grant into the one
//! entitlement row a subject has. Concurrent activations are serialized by
//! an optimistic revision check on that row.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tollgate_store::{AccessStore, StoreError, StoreResult};
use tollgate_types::{
    ActivationSource, AuditAction, AuditEntry, DurationClass, Entitlement, SubjectId, Tier,
};
use tracing::{debug, info, warn};

use crate::clock::Clock;

/// Write attempts before a reconcile gives up on the revision race.
const MAX_WRITE_ATTEMPTS: usize = 8;

/// What a grant stretches over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantKind {
    /// A named duration class (codes, payments, admin grants).
    Class(DurationClass),
    /// A raw span (trial and grace grants).
    Span(TimeDelta),
}

/// One approved activation, ready to merge into a subject's entitlement.
#[derive(Debug, Clone)]
pub struct Grant {
    pub kind: GrantKind,
    pub source: ActivationSource,
    /// Code value, payment session id or admin id behind the grant.
    pub reference: Option<String>,
}

impl Grant {
    /// The tier this grant confers on its own.
    pub fn tier(&self) -> Tier {
        match self.kind {
            GrantKind::Class(DurationClass::Lifetime) => Tier::Lifetime,
            GrantKind::Class(class) => Tier::Fixed(class),
            GrantKind::Span(_) => Tier::Trial,
        }
    }

    /// Span added on top of the stacking base, `None` for lifetime.
    fn span(&self) -> Option<TimeDelta> {
        match self.kind {
            GrantKind::Class(class) => class.span(),
            GrantKind::Span(span) => Some(span),
        }
    }
}

/// Merges approved grants into per-subject entitlement rows.
#[derive(Clone)]
pub struct Reconciler {
    store: AccessStore,
    clock: Arc<dyn Clock>,
}

impl Reconciler {
    pub fn new(store: AccessStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Applies `grant` to the subject's entitlement and returns the merged row.
    ///
    /// Stacking: the new expiry is `max(current expiry, now) + span`, so an
    /// active entitlement extends and an expired one restarts from now. An
    /// existing lifetime tier absorbs any further grant without changing the
    /// row; a lifetime grant clears the expiry for good. Every reconcile,
    /// including the absorbed ones, leaves an audit entry.
    pub fn reconcile(&self, subject: SubjectId, grant: &Grant) -> Result<Entitlement, StoreError> {
        let now = self.clock.now();
        for _ in 0..MAX_WRITE_ATTEMPTS {
            match self.store.get_entitlement_versioned(&subject)? {
                None => {
                    let merged = self.merged(subject, None, grant, now);
                    if self.store.insert_entitlement(&merged)? {
                        self.audit(&merged, grant, now)?;
                        info!(
                            "Activated entitlement for subject {} (tier {}, source {})",
                            subject, merged.tier, grant.source
                        );
                        return Ok(merged);
                    }
                    debug!("Lost entitlement insert race for subject {}, retrying", subject);
                }
                Some((current, revision)) => {
                    if current.tier.is_lifetime() {
                        self.audit_absorbed(&current, grant, now)?;
                        debug!(
                            "Subject {} already holds lifetime access, {} grant absorbed",
                            subject, grant.source
                        );
                        return Ok(current);
                    }
                    let merged = self.merged(subject, Some(&current), grant, now);
                    if self.store.update_entitlement(&merged, revision)? {
                        self.audit(&merged, grant, now)?;
                        info!(
                            "Updated entitlement for subject {} (tier {}, source {})",
                            subject, merged.tier, grant.source
                        );
                        return Ok(merged);
                    }
                    debug!("Lost entitlement update race for subject {}, retrying", subject);
                }
            }
        }
        warn!(
            "Entitlement write for subject {} lost {} revision races",
            subject, MAX_WRITE_ATTEMPTS
        );
        Err(StoreError::Conflict(format!(
            "entitlement write for subject {subject} kept losing revision races"
        )))
    }

    fn merged(
        &self,
        subject: SubjectId,
        current: Option<&Entitlement>,
        grant: &Grant,
        now: DateTime<Utc>,
    ) -> Entitlement {
        let expires_at = grant.span().map(|span| {
            let base = current
                .and_then(|entitlement| entitlement.expires_at)
                .map_or(now, |expiry| expiry.max(now));
            base + span
        });
        Entitlement {
            subject_id: subject,
            is_active: true,
            tier: grant.tier(),
            activated_at: now,
            expires_at,
            activation_source: grant.source,
            activation_reference: grant.reference.clone(),
        }
    }

    fn audit(&self, merged: &Entitlement, grant: &Grant, now: DateTime<Utc>) -> StoreResult<()> {
        let details = match merged.expires_at {
            Some(expiry) => format!(
                "tier={} source={} expires_at={}",
                merged.tier,
                grant.source,
                expiry.to_rfc3339()
            ),
            None => format!("tier={} source={}", merged.tier, grant.source),
        };
        self.store.save_audit_entry(&AuditEntry {
            actor: merged.subject_id.to_string(),
            action: AuditAction::EntitlementUpdated,
            target: Some(merged.subject_id.to_string()),
            timestamp: now,
            details,
        })
    }

    fn audit_absorbed(
        &self,
        current: &Entitlement,
        grant: &Grant,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.store.save_audit_entry(&AuditEntry {
            actor: current.subject_id.to_string(),
            action: AuditAction::EntitlementUpdated,
            target: Some(current.subject_id.to_string()),
            timestamp: now,
            details: format!("lifetime retained, {} grant absorbed", grant.source),
        })
    }
}
