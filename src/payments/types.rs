//! Payment session types.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::navigation::Route;
use crate::pricing::PriceError;
use crate::storage::StorageError;

/// Status of a payment session.
///
/// ```text
/// Waiting ──confirm──▶ Processing ──delay──▶ Confirmed
///    │                     │
///    └──countdown = 0──────┴──────────────▶ Expired
/// (load failure) ─────────────────────────▶ Error
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Awaiting the buyer's transfer.
    Waiting,
    /// Transfer reported; confirmation pending.
    Processing,
    Confirmed,
    Expired,
    Error,
}

impl PaymentStatus {
    /// The countdown only runs in these states.
    pub fn counts_down(&self) -> bool {
        matches!(self, PaymentStatus::Waiting | PaymentStatus::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Confirmed | PaymentStatus::Expired | PaymentStatus::Error
        )
    }

    /// Whether "restart checkout" is offered.
    pub fn can_restart(&self) -> bool {
        matches!(self, PaymentStatus::Expired | PaymentStatus::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Waiting => "waiting",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Confirmed => "confirmed",
            PaymentStatus::Expired => "expired",
            PaymentStatus::Error => "error",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User actions on a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// "I have sent the payment."
    Confirm,
    /// Discard the order and start checkout over. Offered after expiry or error.
    Restart,
    /// Return to the checkout form keeping the order. Offered while waiting.
    BackToCheckout,
    /// Navigate away; the session is dropped.
    Leave,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    /// Status at the time the session ended.
    pub status: PaymentStatus,
    /// Where to go next, if anywhere.
    pub route: Option<Route>,
}

/// Errors raised by the payment step.
#[derive(Debug, Error)]
pub enum SessionError {
    /// An action was not valid in the current status.
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: PaymentStatus,
        action: &'static str,
    },

    /// A required price could not be fetched.
    #[error("price lookup failed: {0}")]
    Price(#[from] PriceError),

    /// The amount to send could not be computed from the order.
    #[error("cannot compute payment amount: {0}")]
    Amount(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
