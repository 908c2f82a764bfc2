//! Transaction Operations
//!
//! Every mutating operation walks the same state machine:
//!
//! ```text
//! Idle -> Validating -> Submitting -> PendingInclusion -> Confirmed
//!             |              |               |
//!             +--------------+---------------+--------> Failed
//! ```
//!
//! `Confirmed` and `Failed` are terminal. A new invocation starts again from `Idle`.

use std::fmt::{Display, Formatter, Result as FmtResult};

use primitive_types::U256;
use thiserror::Error;

use crate::{amounts::AmountError, dates::DateRangeError, failures::ErrorKind, pricing::PricingError};

/// The three state-changing contract operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Register a piece of equipment.
    AddEquipment,

    /// Request and pay for a booking.
    RequestBooking,

    /// Confirm an existing booking.
    ConfirmBooking,
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::AddEquipment => f.write_str("add equipment"),
            Self::RequestBooking => f.write_str("request booking"),
            Self::ConfirmBooking => f.write_str("confirm booking"),
        }
    }
}

/// Reference returned once a submitted call is accepted into the pending pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubmissionHandle(String);

impl SubmissionHandle {
    /// Wrap a transaction hash.
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Transaction hash.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SubmissionHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Outcome of a successful inclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inclusion {
    /// Block the call was included in.
    pub block_number: u64,

    /// Gas consumed by the call.
    pub gas_used: U256,
}

/// Local input checks that failed before anything reached the network.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The ether amount did not parse.
    #[error("invalid price: {0}")]
    InvalidAmount(#[from] AmountError),

    /// The booking identifier is not a non-negative integer.
    #[error("invalid booking id {0:?}")]
    InvalidBookingId(String),

    /// The date range is malformed or empty.
    #[error(transparent)]
    DateRange(#[from] DateRangeError),

    /// The booking could not be priced.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// A read call against the contract or node failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// The collaborator could not be reached or refused the call.
    #[error("read failed: {0}")]
    Unavailable(String),

    /// The collaborator answered with data that could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Why an operation ended in `Failed`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// Local validation failed; nothing was submitted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The call was refused at submission.
    #[error("submission failed: {0}")]
    Submit(ErrorKind),

    /// The call was accepted but failed on inclusion.
    #[error("transaction failed: {0}")]
    Inclusion(ErrorKind),
}

impl FailureCause {
    /// Classified failure kind, for submission and inclusion failures.
    pub const fn error_kind(&self) -> Option<&ErrorKind> {
        match self {
            Self::Submit(kind) | Self::Inclusion(kind) => Some(kind),
            Self::Validation(_) => None,
        }
    }

    /// Whether the failure happened before anything was sent to the network.
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Position of an operation in its lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OperationState {
    /// Nothing in flight.
    #[default]
    Idle,

    /// Running local input checks.
    Validating,

    /// Handing the call to the signer.
    Submitting,

    /// Accepted; waiting for inclusion.
    PendingInclusion(SubmissionHandle),

    /// Included successfully.
    Confirmed(Inclusion),

    /// Ended with a failure.
    Failed(FailureCause),
}

impl OperationState {
    /// Whether this state ends an invocation.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed(_) | Self::Failed(_))
    }

    /// Whether the triggering control may accept a new invocation.
    pub const fn accepts_input(&self) -> bool {
        matches!(self, Self::Idle) || self.is_terminal()
    }
}

impl Display for OperationState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Validating => f.write_str("validating"),
            Self::Submitting => f.write_str("submitting"),
            Self::PendingInclusion(handle) => write!(f, "pending inclusion ({handle})"),
            Self::Confirmed(inclusion) => write!(f, "confirmed in block {}", inclusion.block_number),
            Self::Failed(cause) => write!(f, "failed: {cause}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_idle_and_terminal_states_accept_input() {
        let handle = SubmissionHandle::new("0xabc");
        let inclusion = Inclusion {
            block_number: 7,
            gas_used: U256::from(21_000),
        };

        assert!(OperationState::Idle.accepts_input());
        assert!(!OperationState::Validating.accepts_input());
        assert!(!OperationState::Submitting.accepts_input());
        assert!(!OperationState::PendingInclusion(handle).accepts_input());
        assert!(OperationState::Confirmed(inclusion).accepts_input());
        assert!(
            OperationState::Failed(FailureCause::Submit(ErrorKind::UserRejected)).accepts_input()
        );
    }

    #[test]
    fn failure_cause_exposes_error_kind() {
        let reverted = FailureCause::Inclusion(ErrorKind::ContractReverted("nope".to_string()));
        let local = FailureCause::Validation(ValidationError::MissingField("equipment id"));

        assert_eq!(
            reverted.error_kind(),
            Some(&ErrorKind::ContractReverted("nope".to_string()))
        );
        assert!(!reverted.is_local());
        assert_eq!(local.error_kind(), None);
        assert!(local.is_local());
    }

    #[test]
    fn failure_messages_are_human_readable() {
        let cause = FailureCause::Submit(ErrorKind::ContractReverted(
            "Already confirmed".to_string(),
        ));

        assert_eq!(
            cause.to_string(),
            "submission failed: contract reverted: Already confirmed"
        );
    }
}
