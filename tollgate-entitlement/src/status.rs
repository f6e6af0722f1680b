//! Read-side status derivation.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tollgate_types::{ActivationSource, Entitlement, Tier};

/// Where a subject stands, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessState {
    LifetimeActive,
    FixedActive,
    OnTrial,
    TrialExpiredGraceAvailable,
    TrialExpired,
    FixedExpired,
    NoAccess,
}

impl AccessState {
    /// Whether this state unlocks the product.
    pub fn has_access(&self) -> bool {
        matches!(
            self,
            Self::LifetimeActive | Self::FixedActive | Self::OnTrial
        )
    }
}

/// Point-in-time answer to "where does this subject stand".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub state: AccessState,
    pub active: bool,
    pub tier: Option<Tier>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Human-readable remaining span, present only while active and bounded.
    pub remaining_display: Option<String>,
    pub source: Option<ActivationSource>,
}

/// Derives the status snapshot for `entitlement` as of `now`.
///
/// `grace_available` only matters for an expired trial; it selects between
/// the grace-available and plain expired states.
pub fn derive_status(
    entitlement: Option<&Entitlement>,
    grace_available: bool,
    now: DateTime<Utc>,
) -> StatusSnapshot {
    let Some(entitlement) = entitlement else {
        return StatusSnapshot {
            state: AccessState::NoAccess,
            active: false,
            tier: None,
            expires_at: None,
            remaining_display: None,
            source: None,
        };
    };

    let active = entitlement.is_active_at(now);
    let state = match (entitlement.tier, active) {
        (Tier::Lifetime, _) => AccessState::LifetimeActive,
        (Tier::Fixed(_), true) => AccessState::FixedActive,
        (Tier::Trial, true) => AccessState::OnTrial,
        (Tier::Trial, false) if grace_available => AccessState::TrialExpiredGraceAvailable,
        (Tier::Trial, false) => AccessState::TrialExpired,
        (Tier::Fixed(_), false) => AccessState::FixedExpired,
    };
    let remaining_display = if active {
        entitlement.remaining_at(now).map(format_remaining)
    } else {
        None
    };

    StatusSnapshot {
        state,
        active,
        tier: Some(entitlement.tier),
        expires_at: entitlement.expires_at,
        remaining_display,
        source: Some(entitlement.activation_source),
    }
}

/// Renders a remaining span for display, floor-bucketed.
///
/// Months and years use fixed 30/365-day spans and only kick in past the
/// one-day mark, so short trials read in days and hours, never "0 months".
pub fn format_remaining(remaining: TimeDelta) -> String {
    let secs = remaining.num_seconds().max(0);
    let minutes = secs / 60;
    let hours = secs / 3_600;
    let days = secs / 86_400;

    if secs < 60 {
        "less than a minute".to_string()
    } else if minutes < 60 {
        format!("{} minute{}", minutes, plural(minutes))
    } else if hours < 24 {
        format!("{} hour{}", hours, plural(hours))
    } else if days < 30 {
        format!("{} day{}", days, plural(days))
    } else if days < 365 {
        let months = days / 30;
        format!("{} month{}", months, plural(months))
    } else {
        let years = days / 365;
        format!("{} year{}", years, plural(years))
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 { "" } else { "s" }
}
