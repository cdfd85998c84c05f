//! Validation rules for transactions bound to the credit limit.

use rust_decimal::Decimal;
use tally_shared::AppError;
use tally_shared::types::{MAX_AMOUNT, fits_money_column, has_money_scale};
use thiserror::Error;

use super::types::{TransactionDraft, TransactionStatus, TransactionType};

/// Largest installment count accepted for one purchase.
pub const MAX_INSTALLMENTS: i16 = 360;

/// Longest description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 255;

/// Longest notes text, in characters.
pub const MAX_NOTES_LEN: usize = 500;

/// Transaction rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionPolicyError {
    /// Description is blank.
    #[error("Description is required")]
    EmptyDescription,

    /// Description longer than `MAX_DESCRIPTION_LEN` characters.
    #[error("Description cannot exceed {MAX_DESCRIPTION_LEN} characters")]
    DescriptionTooLong,

    /// Notes longer than `MAX_NOTES_LEN` characters.
    #[error("Notes cannot exceed {MAX_NOTES_LEN} characters")]
    NotesTooLong,

    /// Amount must be greater than zero.
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    /// Amount carries fractions of a cent.
    #[error("Amount {0} has more than two decimal places")]
    AmountPrecision(Decimal),

    /// Amount above what can be stored.
    #[error("Amount {0} exceeds the maximum of {MAX_AMOUNT}")]
    AmountTooLarge(Decimal),

    /// Due date precedes transaction date.
    #[error("Due date cannot be earlier than the transaction date")]
    DueBeforeTransaction,

    /// Installment count outside `1..=MAX_INSTALLMENTS`.
    #[error("Installments total must be between 1 and {MAX_INSTALLMENTS}, got {0}")]
    InvalidInstallmentCount(i16),

    /// Current installment beyond the total.
    #[error("Current installment ({current}) cannot exceed total installments ({total})")]
    InstallmentOutOfRange {
        /// Current installment.
        current: i16,
        /// Total installments.
        total: i16,
    },

    /// Invoice referenced without a payment method.
    #[error("An invoice can only be referenced together with a payment method")]
    InvoiceWithoutPaymentMethod,

    /// Income referencing an invoice.
    #[error("Income transactions cannot be billed to an invoice")]
    IncomeWithInvoice,

    /// Status change not allowed.
    #[error("Transaction cannot move from {from} to {to}")]
    InvalidStatusChange {
        /// Current status.
        from: TransactionStatus,
        /// Requested status.
        to: TransactionStatus,
    },
}

impl From<TransactionPolicyError> for AppError {
    fn from(err: TransactionPolicyError) -> Self {
        match err {
            TransactionPolicyError::EmptyDescription
            | TransactionPolicyError::DescriptionTooLong
            | TransactionPolicyError::NotesTooLong
            | TransactionPolicyError::AmountPrecision(_)
            | TransactionPolicyError::AmountTooLarge(_) => Self::Validation(err.to_string()),
            other => Self::InvalidOperation(other.to_string()),
        }
    }
}

/// Transaction policy for business logic.
pub struct TransactionPolicy;

impl TransactionPolicy {
    /// Validates a draft before anything is persisted.
    ///
    /// # Errors
    ///
    /// Returns the first rule the draft violates.
    pub fn validate(draft: &TransactionDraft) -> Result<(), TransactionPolicyError> {
        let description = draft.description.trim();
        if description.is_empty() {
            return Err(TransactionPolicyError::EmptyDescription);
        }
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(TransactionPolicyError::DescriptionTooLong);
        }
        if let Some(notes) = &draft.notes
            && notes.chars().count() > MAX_NOTES_LEN
        {
            return Err(TransactionPolicyError::NotesTooLong);
        }
        Self::validate_amount(draft.amount)?;

        if let Some(due_date) = draft.due_date
            && due_date < draft.transaction_date
        {
            return Err(TransactionPolicyError::DueBeforeTransaction);
        }

        let total = draft.installments_total.unwrap_or(1);
        if !(1..=MAX_INSTALLMENTS).contains(&total) {
            return Err(TransactionPolicyError::InvalidInstallmentCount(total));
        }
        if let Some(current) = draft.installments_current
            && (current < 1 || current > total)
        {
            return Err(TransactionPolicyError::InstallmentOutOfRange { current, total });
        }

        if draft.invoice_id.is_some() {
            if draft.transaction_type == TransactionType::Income {
                return Err(TransactionPolicyError::IncomeWithInvoice);
            }
            if draft.payment_method_id.is_none() {
                return Err(TransactionPolicyError::InvoiceWithoutPaymentMethod);
            }
        }

        Ok(())
    }

    /// Checks that an amount is a storable, positive number of cents.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveAmount`, `AmountPrecision` for fractions of a
    /// cent, or `AmountTooLarge`.
    pub fn validate_amount(amount: Decimal) -> Result<(), TransactionPolicyError> {
        if amount <= Decimal::ZERO {
            return Err(TransactionPolicyError::NonPositiveAmount);
        }
        if !has_money_scale(amount) {
            return Err(TransactionPolicyError::AmountPrecision(amount));
        }
        if !fits_money_column(amount) {
            return Err(TransactionPolicyError::AmountTooLarge(amount));
        }
        Ok(())
    }

    /// Description of one installment row: `"<base> (n/N)"`.
    ///
    /// The base is shortened so the result stays within
    /// `MAX_DESCRIPTION_LEN` characters.
    #[must_use]
    pub fn installment_description(base: &str, number: i16, total: i16) -> String {
        let suffix = format!(" ({number}/{total})");
        let room = MAX_DESCRIPTION_LEN.saturating_sub(suffix.chars().count());
        let base: String = base.trim().chars().take(room).collect();
        format!("{}{suffix}", base.trim_end())
    }

    /// Checks a status change requested by the user.
    ///
    /// Repeating the current status is allowed and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatusChange` when leaving `Canceled`, or when moving
    /// a completed transaction back to pending.
    pub fn check_status_change(
        from: TransactionStatus,
        to: TransactionStatus,
    ) -> Result<(), TransactionPolicyError> {
        use TransactionStatus::{Canceled, Completed, Pending};

        match (from, to) {
            (a, b) if a == b => Ok(()),
            (Pending, Completed) | (Pending | Completed, Canceled) => Ok(()),
            _ => Err(TransactionPolicyError::InvalidStatusChange { from, to }),
        }
    }
}
