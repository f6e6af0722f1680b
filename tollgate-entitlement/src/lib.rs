//! Activation engine and access facade for Tollgate.
//!
//! Everything that can change what a subject is entitled to — trial starts,
//! code redemptions, payment settlements, admin grants and grace periods —
//! funnels through this crate, which reconciles them into the single
//! entitlement row a subject has.
//!
//! # Components
//!
//! - **Reconciler**: merges approved grants into entitlement rows; the only
//!   writer of entitlement state
//! - **CodeRegistry**: mints and redeems access codes
//! - **PaymentManager**: payment session lifecycle with lazy TTL expiry
//! - **TrialManager**: the one-time trial and its one-time grace tail
//! - **AdminGuard**: admin sign-in, privilege checks and manual grants
//! - **AccessService**: the async front door tying the pieces together
//!
//! # Exactly-once activations
//!
//! Every activation rides on one conditional update in the store: a code
//! redemption, a payment settlement, a trial start or a grace claim each
//! has a single SQL statement that can only succeed once. Concurrent
//! callers race on that statement; the losers re-read and classify what
//! happened instead of granting twice.
//!
//! # Example
//!
//! ```
//! use tollgate_entitlement::{AccessService, ServiceConfig};
//! use tollgate_store::AccessStore;
//!
//! let store = AccessStore::open_in_memory().unwrap();
//! let service = AccessService::new(store, ServiceConfig::default());
//! ```

mod admin;
mod clock;
mod codes;
mod config;
mod error;
mod payments;
mod reconciler;
mod service;
mod status;
mod trial;

pub use admin::AdminGuard;
pub use clock::{Clock, ManualClock, SystemClock};
pub use codes::CodeRegistry;
pub use config::{AdminAccount, ServiceConfig};
pub use error::{AdminError, GraceError, PaymentError, RedeemError, TrialError};
pub use payments::PaymentManager;
pub use reconciler::{Grant, GrantKind, Reconciler};
pub use service::{AccessService, SweepReport};
pub use status::{derive_status, format_remaining, AccessState, StatusSnapshot};
pub use trial::TrialManager;
