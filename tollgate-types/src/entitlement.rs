//! The entitlement record — the current access rights of one subject.
//!
//! There is at most one entitlement per subject. Every successful
//! activation (code, payment, admin grant, trial, grace) merges into this
//! record; nothing ever inserts a second row for the same subject. The
//! merge itself lives in the engine's reconciler; this module only defines
//! the record and pure time helpers over an explicit `now`.

use crate::{DurationClass, SubjectId};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The access tier a subject currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "tier", content = "class")]
pub enum Tier {
    /// Time-limited trial access (also covers the post-trial grace span).
    Trial,
    /// Paid or granted access of a fixed duration class.
    Fixed(DurationClass),
    /// Access that never expires. Dominates every other grant.
    Lifetime,
}

impl Tier {
    /// Returns true for the lifetime tier.
    #[must_use]
    pub fn is_lifetime(&self) -> bool {
        matches!(self, Self::Lifetime)
    }

    /// Stable text form used in storage.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Trial => "trial".to_string(),
            Self::Fixed(class) => format!("fixed:{}", class.label()),
            Self::Lifetime => "lifetime".to_string(),
        }
    }

    /// Parses the stable text form produced by [`Tier::label`].
    #[must_use]
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "trial" => Some(Self::Trial),
            "lifetime" => Some(Self::Lifetime),
            other => other
                .strip_prefix("fixed:")
                .and_then(DurationClass::from_label)
                .map(Self::Fixed),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Which channel produced the current entitlement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationSource {
    /// A redeemed access code.
    Code,
    /// A completed payment session.
    Payment,
    /// A manual grant by an administrator.
    AdminGrant,
    /// The one-time initial trial.
    Trial,
    /// The one-time post-trial grace extension.
    Grace,
}

impl ActivationSource {
    /// Stable text form used in storage.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Payment => "payment",
            Self::AdminGrant => "admin_grant",
            Self::Trial => "trial",
            Self::Grace => "grace",
        }
    }

    /// Parses the stable text form produced by [`ActivationSource::label`].
    #[must_use]
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "code" => Some(Self::Code),
            "payment" => Some(Self::Payment),
            "admin_grant" => Some(Self::AdminGrant),
            "trial" => Some(Self::Trial),
            "grace" => Some(Self::Grace),
            _ => None,
        }
    }
}

impl fmt::Display for ActivationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The current access-rights record for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entitlement {
    /// The subject this entitlement belongs to.
    pub subject_id: SubjectId,
    /// Set on every activation. Liveness checks should prefer
    /// [`Entitlement::is_active_at`], which also accounts for expiry.
    pub is_active: bool,
    /// The tier granted by the most recent activation.
    pub tier: Tier,
    /// When the most recent activation was applied.
    pub activated_at: DateTime<Utc>,
    /// When access ends. `None` means lifetime access.
    pub expires_at: Option<DateTime<Utc>>,
    /// The channel that produced the current state.
    pub activation_source: ActivationSource,
    /// The code value, payment session id or granting admin behind the
    /// current state.
    pub activation_reference: Option<String>,
}

impl Entitlement {
    /// Returns true if access is live at `now`: lifetime, or expiry in
    /// the future.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expires) => expires > now,
        }
    }

    /// Remaining access time at `now`. `None` for lifetime access, a
    /// zero span once expired.
    #[must_use]
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.expires_at
            .map(|expires| (expires - now).max(TimeDelta::zero()))
    }
}
