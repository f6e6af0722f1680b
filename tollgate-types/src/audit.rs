//! Append-only audit trail records.
//!
//! Every state-changing operation leaves an entry. The table is never
//! updated or pruned; reads are paginated newest-first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened. One variant per state-changing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// An administrator signed in.
    AdminAuthenticated,
    /// An access code was issued.
    CodeGenerated,
    /// An unredeemed code was withdrawn.
    CodeRevoked,
    /// A code was consumed by a subject.
    CodeRedeemed,
    /// A payment session reached a terminal outcome.
    PaymentFinalized,
    /// An administrator granted access directly.
    ManualGrant,
    /// A subject received the one-time trial.
    TrialGranted,
    /// A subject received the one-time grace extension.
    GraceGranted,
    /// The entitlement row changed (written by the reconciler).
    EntitlementUpdated,
}

impl AuditAction {
    /// Stable text form used in storage.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::AdminAuthenticated => "admin_authenticated",
            Self::CodeGenerated => "code_generated",
            Self::CodeRevoked => "code_revoked",
            Self::CodeRedeemed => "code_redeemed",
            Self::PaymentFinalized => "payment_finalized",
            Self::ManualGrant => "manual_grant",
            Self::TrialGranted => "trial_granted",
            Self::GraceGranted => "grace_granted",
            Self::EntitlementUpdated => "entitlement_updated",
        }
    }

    /// Parses the stable text form produced by [`AuditAction::label`].
    #[must_use]
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "admin_authenticated" => Some(Self::AdminAuthenticated),
            "code_generated" => Some(Self::CodeGenerated),
            "code_revoked" => Some(Self::CodeRevoked),
            "code_redeemed" => Some(Self::CodeRedeemed),
            "payment_finalized" => Some(Self::PaymentFinalized),
            "manual_grant" => Some(Self::ManualGrant),
            "trial_granted" => Some(Self::TrialGranted),
            "grace_granted" => Some(Self::GraceGranted),
            "entitlement_updated" => Some(Self::EntitlementUpdated),
            _ => None,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One line in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Who acted: an admin id, a subject id, or `gateway`.
    pub actor: String,
    pub action: AuditAction,
    /// What was acted on: a code value, session id or subject id.
    pub target: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Free-form context, e.g. the granted tier or the outcome.
    pub details: String,
}
