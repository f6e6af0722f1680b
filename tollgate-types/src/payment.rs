//! Payment sessions and their status machine.
//!
//! A session moves through a monotonic machine: `Pending -> Processing ->
//! {Completed, Failed, Cancelled}`, with `Expired` reachable from any
//! non-terminal state once the deadline passes. Terminal states are
//! absorbing; the store enforces that with conditional updates and the
//! engine decides what a contradictory late arrival means.

use crate::{DurationClass, PaymentSessionId, SubjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How long a payment session stays open before it is swept to
/// `Expired`, in seconds.
pub const PAYMENT_SESSION_TTL_SECS: i64 = 30 * 60;

/// The channel a payment runs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Hosted card checkout.
    CardGateway,
    /// Peer-to-peer wallet transfer.
    P2pWallet,
    /// Direct on-chain transfer.
    OnChainTransfer,
}

impl PaymentMethod {
    /// Stable text form used in storage.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::CardGateway => "card_gateway",
            Self::P2pWallet => "p2p_wallet",
            Self::OnChainTransfer => "on_chain_transfer",
        }
    }

    /// Parses the stable text form produced by [`PaymentMethod::label`].
    #[must_use]
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "card_gateway" => Some(Self::CardGateway),
            "p2p_wallet" => Some(Self::P2pWallet),
            "on_chain_transfer" => Some(Self::OnChainTransfer),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle state of a payment session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Created, awaiting the subject.
    Pending,
    /// Handed to the gateway, outcome not yet known.
    Processing,
    /// Paid in full. The only state that grants access.
    Completed,
    /// Rejected or errored at the gateway.
    Failed,
    /// Abandoned by the subject or voided by the gateway.
    Cancelled,
    /// Deadline passed before a terminal outcome arrived.
    Expired,
}

impl PaymentStatus {
    /// Terminal states are absorbing: no further transition is legal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::Expired
        )
    }

    /// Whether the machine permits moving from `self` to `next`.
    /// Transitions only ever move forward; there is no path out of a
    /// terminal state and no path back to `Pending`.
    #[must_use]
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        match self {
            Self::Pending => next != Self::Pending,
            Self::Processing => !matches!(next, Self::Pending | Self::Processing),
            _ => false,
        }
    }

    /// Stable text form used in storage.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }

    /// Parses the stable text form produced by [`PaymentStatus::label`].
    #[must_use]
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A terminal outcome reported by the gateway callback or the fallback
/// poller. Never `Expired`; expiry is decided locally by the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Completed,
    Failed,
    Cancelled,
}

impl PaymentOutcome {
    /// The session status this outcome settles into.
    #[must_use]
    pub fn status(&self) -> PaymentStatus {
        match self {
            Self::Completed => PaymentStatus::Completed,
            Self::Failed => PaymentStatus::Failed,
            Self::Cancelled => PaymentStatus::Cancelled,
        }
    }
}

impl fmt::Display for PaymentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status().label())
    }
}

/// One checkout attempt for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSession {
    pub id: PaymentSessionId,
    pub subject_id: SubjectId,
    pub method: PaymentMethod,
    /// The duration class a completed payment grants.
    pub plan: DurationClass,
    /// Price in minor units of `currency`.
    pub amount: u64,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    /// Hard close time. Sessions still open past this are swept to
    /// `Expired` and never grant access.
    pub deadline: DateTime<Utc>,
    /// Gateway-side reference, set once the gateway acknowledges.
    pub external_reference: Option<String>,
}

impl PaymentSession {
    /// Returns true once the deadline has passed.
    #[must_use]
    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline
    }

    /// An open session is one that can still reach a terminal state.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }
}
