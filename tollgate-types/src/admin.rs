//! Administrator sessions and privilege levels.

use crate::AdminSessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How long an admin session stays valid after sign-in, in seconds.
pub const ADMIN_SESSION_TTL_SECS: i64 = 30 * 60;

/// Operator account name. Human-chosen, unlike the UUID-backed ids.
pub type AdminId = String;

/// Privilege tiers for administrative operations. Totally ordered:
/// `Standard < Super`, so a level check is a plain comparison.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PrivilegeLevel {
    /// Code issuance, revocation and audit reads.
    Standard,
    /// Everything Standard can do, plus manual entitlement grants.
    Super,
}

impl PrivilegeLevel {
    /// Stable text form used in storage.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Super => "super",
        }
    }

    /// Parses the stable text form produced by [`PrivilegeLevel::label`].
    #[must_use]
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(Self::Standard),
            "super" => Some(Self::Super),
            _ => None,
        }
    }
}

impl fmt::Display for PrivilegeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A live sign-in for one administrator. Every authorization checks
/// `expires_at` directly, so correctness never depends on the periodic
/// sweep that deletes lapsed rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminSession {
    pub id: AdminSessionId,
    pub admin_id: AdminId,
    pub level: PrivilegeLevel,
    pub granted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    /// Returns true once the session has lapsed.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Returns true if this session may perform an operation requiring
    /// `required` (expiry is checked separately).
    #[must_use]
    pub fn permits(&self, required: PrivilegeLevel) -> bool {
        self.level >= required
    }
}
