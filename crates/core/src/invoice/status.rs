//! Invoice status and its transition rules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of an invoice within its billing cycle.
///
/// The valid transitions are:
/// - Open → Closed (closing day reached, or manual close)
/// - Closed → Overdue (due date passed)
/// - Closed → Paid
/// - Overdue → Paid
/// - Pending → Open
///
/// Paid is terminal. Nothing returns to Open once closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Cycle is running and accepting purchases.
    Open,
    /// Cycle has closed and awaits payment.
    Closed,
    /// Invoice has been paid.
    Paid,
    /// Due date passed without payment.
    Overdue,
    /// Declared for future use.
    Pending,
}

impl InvoiceStatus {
    /// All statuses, in display order.
    pub const ALL: [Self; 5] = [
        Self::Open,
        Self::Closed,
        Self::Paid,
        Self::Overdue,
        Self::Pending,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Pending => "pending",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            "paid" => Some(Self::Paid),
            "overdue" => Some(Self::Overdue),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }

    /// Human-readable description shown next to the status.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Open => "Open - awaiting closing",
            Self::Closed => "Closed - awaiting payment",
            Self::Paid => "Paid",
            Self::Overdue => "Overdue",
            Self::Pending => "Pending - processing",
        }
    }

    /// Returns true if the invoice may move from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Open, Self::Closed)
                | (Self::Closed, Self::Overdue | Self::Paid)
                | (Self::Overdue, Self::Paid)
                | (Self::Pending, Self::Open)
        )
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
