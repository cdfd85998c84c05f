//! Transaction domain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tally_shared::types::{InvoiceId, PaymentMethodId};
use uuid::Uuid;

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
}

impl TransactionType {
    /// Returns the string representation of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Parses a type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement status of a transaction.
///
/// - Pending → Completed
/// - Pending | Completed → Canceled
///
/// Canceled is terminal; a canceled transaction no longer holds credit limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Scheduled or awaiting settlement.
    Pending,
    /// Settled.
    #[default]
    Completed,
    /// Canceled.
    Canceled,
}

impl TransactionStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "canceled" | "cancelled" => Some(Self::Canceled),
            _ => None,
        }
    }

    /// Returns true if the transaction still holds its limit reservation.
    #[must_use]
    pub const fn holds_reservation(&self) -> bool {
        !matches!(self, Self::Canceled)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transaction about to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    /// Description.
    pub description: String,
    /// Amount, always positive.
    pub amount: Decimal,
    /// Income or expense.
    pub transaction_type: TransactionType,
    /// Initial status.
    #[serde(default)]
    pub status: TransactionStatus,
    /// Date of the purchase or receipt.
    pub transaction_date: NaiveDate,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Current installment number.
    pub installments_current: Option<i16>,
    /// Total number of installments.
    pub installments_total: Option<i16>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Category reference.
    pub category_id: Option<Uuid>,
    /// Payment method used.
    pub payment_method_id: Option<PaymentMethodId>,
    /// Invoice the expense is billed to.
    pub invoice_id: Option<InvoiceId>,
}

impl TransactionDraft {
    /// Invoice whose limit this draft consumes, if any.
    #[must_use]
    pub fn limit_invoice(&self) -> Option<InvoiceId> {
        match self.transaction_type {
            TransactionType::Expense => self.invoice_id,
            TransactionType::Income => None,
        }
    }

    /// Number of installments, at least one.
    #[must_use]
    pub fn installment_count(&self) -> i16 {
        self.installments_total.unwrap_or(1).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_accepts_both_spellings() {
        assert_eq!(
            TransactionStatus::parse("cancelled"),
            Some(TransactionStatus::Canceled)
        );
        assert_eq!(
            TransactionStatus::parse("CANCELED"),
            Some(TransactionStatus::Canceled)
        );
        assert_eq!(TransactionStatus::parse("void"), None);
    }

    #[test]
    fn test_default_status_is_completed() {
        assert_eq!(TransactionStatus::default(), TransactionStatus::Completed);
    }

    #[test]
    fn test_only_canceled_releases_reservation() {
        assert!(TransactionStatus::Pending.holds_reservation());
        assert!(TransactionStatus::Completed.holds_reservation());
        assert!(!TransactionStatus::Canceled.holds_reservation());
    }

    #[test]
    fn test_type_parse() {
        assert_eq!(TransactionType::parse("Expense"), Some(TransactionType::Expense));
        assert_eq!(TransactionType::parse("transfer"), None);
    }
}
