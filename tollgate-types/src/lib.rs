//! Core type definitions for the Tollgate entitlement system.
//!
//! This crate defines the fundamental types shared by the store and the
//! activation engine:
//! - Subject and session identifiers (UUID newtypes)
//! - Duration classes and the fixed-day duration policy
//! - The entitlement record and its tier/source enums
//! - Access code, payment session and admin session records with their
//!   status machines
//! - Append-only audit log entries
//!
//! Everything here is plain data plus pure helpers over an explicit `now`
//! argument. Nothing in this crate reads the wall clock or touches storage;
//! that keeps expiry math testable as pure functions of
//! (now, existing state, grant).

mod admin;
mod audit;
mod code;
mod duration;
mod entitlement;
mod ids;
mod payment;

pub use admin::{AdminId, AdminSession, PrivilegeLevel, ADMIN_SESSION_TTL_SECS};
pub use audit::{AuditAction, AuditEntry};
pub use code::{AccessCode, CodeStatus};
pub use duration::DurationClass;
pub use entitlement::{ActivationSource, Entitlement, Tier};
pub use ids::{AdminSessionId, PaymentSessionId, SubjectId};
pub use payment::{
    PaymentMethod, PaymentOutcome, PaymentSession, PaymentStatus, PAYMENT_SESSION_TTL_SECS,
};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("unknown {kind} value: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}
