//! Error types for the entitlement engine.

use thiserror::Error;
use tollgate_store::StoreError;
use tollgate_types::PaymentStatus;

/// Why a code redemption was turned down.
#[derive(Error, Debug)]
pub enum RedeemError {
    #[error("code not found")]
    NotFound,

    #[error("code already redeemed")]
    AlreadyUsed,

    #[error("code validity window has passed")]
    Expired,

    #[error("code has been revoked")]
    Revoked,

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Why a payment operation was turned down.
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("payment session not found")]
    NotFound,

    /// The session already settled with a different terminal status.
    #[error("payment session already settled as {0}")]
    AlreadyTerminal(PaymentStatus),

    /// Cancellation is only open to pending sessions.
    #[error("payment session can no longer be cancelled")]
    TooLate,

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Why a trial request was turned down.
#[derive(Error, Debug)]
pub enum TrialError {
    #[error("trial already granted for this subject")]
    AlreadyGranted,

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Why a grace request was turned down.
#[derive(Error, Debug)]
pub enum GraceError {
    #[error("subject is not eligible for grace: {reason}")]
    Ineligible { reason: &'static str },

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Why an admin operation was turned down.
#[derive(Error, Debug)]
pub enum AdminError {
    /// Unknown account or wrong password; callers cannot tell which.
    #[error("invalid admin credentials")]
    InvalidCredentials,

    #[error("admin session not found")]
    SessionNotFound,

    #[error("admin session expired")]
    SessionExpired,

    #[error("operation requires a higher privilege level")]
    InsufficientPrivilege,

    #[error("code not found")]
    CodeNotFound,

    #[error("code already redeemed")]
    CodeAlreadyRedeemed,

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}
