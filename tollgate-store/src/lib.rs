//! SQLite storage layer for the Tollgate entitlement core.
//!
//! Provides persistent storage for entitlements, access codes, payment
//! sessions, admin sessions, trial records and the append-only audit log.
//! SQLite is chosen for single-file durability and because its atomic
//! conditional updates carry the system's exactly-once guarantees.
//!
//! # Architecture
//!
//! - One database file, six tables, one shared connection
//! - Every uniqueness rule (single redemption, idempotent finalize,
//!   trial-once, grace-once) is a conditional UPDATE or conflict-free
//!   INSERT whose row count reports who won
//! - Entitlement rows carry a store-internal revision counter for
//!   optimistic concurrency; callers never see it outside the versioned
//!   read/update pair

mod access_store;
mod error;

pub use access_store::{AccessStore, TrialRecord};
pub use error::{StoreError, StoreResult};
