//! Engine configuration: spans, pricing, and admin accounts.

use chrono::TimeDelta;
use sha2::{Digest, Sha256};
use tollgate_types::{
    AdminId, DurationClass, PrivilegeLevel, ADMIN_SESSION_TTL_SECS, PAYMENT_SESSION_TTL_SECS,
};

/// One configured administrator account.
///
/// Plaintext passwords are never held; accounts carry a per-account salt
/// and the hex SHA-256 digest of `salt || password`.
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub admin_id: AdminId,
    pub level: PrivilegeLevel,
    pub salt: String,
    pub password_digest: String,
}

impl AdminAccount {
    /// Builds an account by digesting a plaintext password.
    pub fn with_password(
        admin_id: impl Into<AdminId>,
        level: PrivilegeLevel,
        salt: impl Into<String>,
        password: &str,
    ) -> Self {
        let salt = salt.into();
        let password_digest = Self::digest(&salt, password);
        Self {
            admin_id: admin_id.into(),
            level,
            salt,
            password_digest,
        }
    }

    /// Hex SHA-256 of `salt || password`.
    pub fn digest(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub(crate) fn verify(&self, password: &str) -> bool {
        Self::digest(&self.salt, password) == self.password_digest
    }
}

/// Knobs for the activation engine.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Span of the one-time trial.
    pub trial_span: TimeDelta,
    /// Span of the one-time grace period appended to an expired trial.
    pub grace_span: TimeDelta,
    /// How long a payment session stays open before it expires.
    pub payment_session_ttl: TimeDelta,
    /// How long an admin session stays valid after sign-in.
    pub admin_session_ttl: TimeDelta,
    /// Pricing currency (ISO 4217 code).
    pub currency: String,
    /// Price of a one-year plan, in minor units.
    pub price_one_year: u64,
    /// Price of a five-year plan, in minor units.
    pub price_five_years: u64,
    /// Price of a lifetime plan, in minor units.
    pub price_lifetime: u64,
    /// Admin accounts allowed to sign in.
    pub admins: Vec<AdminAccount>,
}

impl ServiceConfig {
    /// Configured price for `class`, in minor units.
    pub fn price_of(&self, class: DurationClass) -> u64 {
        match class {
            DurationClass::OneYear => self.price_one_year,
            DurationClass::FiveYears => self.price_five_years,
            DurationClass::Lifetime => self.price_lifetime,
        }
    }

    pub(crate) fn account(&self, admin_id: &str) -> Option<&AdminAccount> {
        self.admins.iter().find(|account| account.admin_id == admin_id)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            trial_span: TimeDelta::days(14),
            grace_span: TimeDelta::days(7),
            payment_session_ttl: TimeDelta::seconds(PAYMENT_SESSION_TTL_SECS),
            admin_session_ttl: TimeDelta::seconds(ADMIN_SESSION_TTL_SECS),
            currency: "USD".to_string(),
            price_one_year: 3_999,
            price_five_years: 14_999,
            price_lifetime: 29_999,
            admins: Vec::new(),
        }
    }
}
