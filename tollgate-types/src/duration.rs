//! Duration classes for fixed-length grants.
//!
//! The duration policy is fixed-day spans applied uniformly: one year is
//! always 365 days, five years always 1825 days. No calendar-month
//! arithmetic anywhere — stacking math stays commutative and independent
//! of the date a grant lands on.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The length class of a fixed-duration grant, or lifetime access.
///
/// The set is extensible; codes, payment plans and admin grants all
/// reference the same classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationClass {
    /// 365 days of access.
    OneYear,
    /// 1825 days of access.
    FiveYears,
    /// Access that never expires.
    Lifetime,
}

impl DurationClass {
    /// Returns the span this class grants, or `None` for lifetime.
    #[must_use]
    pub fn span(&self) -> Option<TimeDelta> {
        match self {
            Self::OneYear => Some(TimeDelta::days(365)),
            Self::FiveYears => Some(TimeDelta::days(5 * 365)),
            Self::Lifetime => None,
        }
    }

    /// Returns true if this class grants lifetime access.
    #[must_use]
    pub fn is_lifetime(&self) -> bool {
        matches!(self, Self::Lifetime)
    }

    /// Stable text form used in storage and audit details.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::OneYear => "1y",
            Self::FiveYears => "5y",
            Self::Lifetime => "lifetime",
        }
    }

    /// Parses the stable text form produced by [`DurationClass::label`].
    #[must_use]
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "1y" => Some(Self::OneYear),
            "5y" => Some(Self::FiveYears),
            "lifetime" => Some(Self::Lifetime),
            _ => None,
        }
    }
}

impl fmt::Display for DurationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
