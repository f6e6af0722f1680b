//! Access codes: admin-issued keys that grant a fixed duration class.
//!
//! A code is redeemable exactly once. The store enforces that with a
//! compare-and-set on the status column; the types here only describe the
//! record and the pure redeemability check.

use crate::{DurationClass, SubjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an access code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeStatus {
    /// Issued, never consumed.
    Unredeemed,
    /// Consumed by exactly one subject.
    Redeemed,
    /// Withdrawn by an administrator before redemption.
    Revoked,
}

impl CodeStatus {
    /// Stable text form used in storage.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unredeemed => "unredeemed",
            Self::Redeemed => "redeemed",
            Self::Revoked => "revoked",
        }
    }

    /// Parses the stable text form produced by [`CodeStatus::label`].
    #[must_use]
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "unredeemed" => Some(Self::Unredeemed),
            "redeemed" => Some(Self::Redeemed),
            "revoked" => Some(Self::Revoked),
            _ => None,
        }
    }
}

impl fmt::Display for CodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An issued access code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessCode {
    /// The code value itself. Primary key; codes are never reissued.
    pub code: String,
    /// The duration class a successful redemption grants.
    pub class: DurationClass,
    pub status: CodeStatus,
    /// Redemption deadline. `None` means the code never goes stale.
    pub valid_until: Option<DateTime<Utc>>,
    /// The administrator who issued the code.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    /// The subject that consumed the code, once redeemed.
    pub redeemed_by: Option<SubjectId>,
    pub redeemed_at: Option<DateTime<Utc>>,
}

impl AccessCode {
    /// Returns true if a redemption at `now` would succeed: still
    /// unredeemed and not past its deadline.
    #[must_use]
    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        self.status == CodeStatus::Unredeemed
            && self.valid_until.is_none_or(|deadline| deadline > now)
    }
}
