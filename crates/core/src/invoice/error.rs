//! Invoice error types.

use rust_decimal::Decimal;
use tally_shared::AppError;
use tally_shared::types::MAX_AMOUNT;
use thiserror::Error;

use super::entity::{MAX_DESCRIPTION_LEN, MAX_NAME_LEN};
use super::status::InvoiceStatus;

/// Invoice-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvoiceError {
    /// No credit limit is configured on the invoice.
    #[error("Invoice has no credit limit configured")]
    NoCreditLimit,

    /// Requested amount exceeds the available limit.
    #[error("Insufficient limit. Available: {available}, Required: {requested}")]
    InsufficientLimit {
        /// Available limit at the time of the request.
        available: Decimal,
        /// Amount requested.
        requested: Decimal,
    },

    /// New credit limit is smaller than what is already used.
    #[error("Credit limit ({new_limit}) cannot be lower than the used limit ({used})")]
    LimitBelowUsage {
        /// Proposed limit.
        new_limit: Decimal,
        /// Currently used amount.
        used: Decimal,
    },

    /// Credit limit must be greater than zero.
    #[error("Credit limit must be greater than zero")]
    NonPositiveLimit,

    /// Amount must be greater than zero.
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    /// Amount or limit carries fractions of a cent.
    #[error("Amount {0} has more than two decimal places")]
    AmountPrecision(Decimal),

    /// Amount or limit above what can be stored.
    #[error("Amount {0} exceeds the maximum of {MAX_AMOUNT}")]
    AmountTooLarge(Decimal),

    /// Name longer than `MAX_NAME_LEN` characters.
    #[error("Invoice name cannot exceed {MAX_NAME_LEN} characters")]
    NameTooLong,

    /// Description longer than `MAX_DESCRIPTION_LEN` characters.
    #[error("Invoice description cannot exceed {MAX_DESCRIPTION_LEN} characters")]
    DescriptionTooLong,

    /// Closing or due day outside 1-31.
    #[error("{field} must be between 1 and 31, got {value}")]
    DayOutOfRange {
        /// Which day field was rejected.
        field: &'static str,
        /// Offending value.
        value: i16,
    },

    /// Status change not allowed by the lifecycle.
    #[error("Invoice cannot move from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: InvoiceStatus,
        /// Requested status.
        to: InvoiceStatus,
    },

    /// Manual close asked for before a closing date was set.
    #[error("Invoice cannot be closed before a closing date is set")]
    ClosingDateNotSet,

    /// Computed date falls outside the supported calendar.
    #[error("Due date is out of range")]
    DateOutOfRange,

    /// Invoice is not in a payable state.
    #[error("Invoice cannot be paid while {0}")]
    NotPayable(InvoiceStatus),
}

impl From<InvoiceError> for AppError {
    fn from(err: InvoiceError) -> Self {
        match err {
            InvoiceError::InsufficientLimit {
                available,
                requested,
            } => Self::InsufficientLimit {
                available,
                requested,
            },
            InvoiceError::DayOutOfRange { .. }
            | InvoiceError::AmountPrecision(_)
            | InvoiceError::AmountTooLarge(_)
            | InvoiceError::NameTooLong
            | InvoiceError::DescriptionTooLong => Self::Validation(err.to_string()),
            other => Self::InvalidOperation(other.to_string()),
        }
    }
}
