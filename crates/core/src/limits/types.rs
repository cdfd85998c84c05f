//! Limit projection types.

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use tally_shared::types::{InvoiceId, PaymentMethodId};

use crate::invoice::InvoiceStatus;

/// Usage band of a credit limit.
///
/// - below 50%: healthy
/// - 50% to below 75%: attention
/// - 75% to below 90%: warning
/// - 90% and above: critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitBand {
    /// Below 50% used.
    Healthy,
    /// 50% to below 75% used.
    Attention,
    /// 75% to below 90% used.
    Warning,
    /// 90% or more used.
    Critical,
}

impl LimitBand {
    /// Classifies a usage percentage.
    #[must_use]
    pub fn from_usage(usage_percentage: Decimal) -> Self {
        if usage_percentage >= Decimal::from(90) {
            Self::Critical
        } else if usage_percentage >= Decimal::from(75) {
            Self::Warning
        } else if usage_percentage >= Decimal::from(50) {
            Self::Attention
        } else {
            Self::Healthy
        }
    }

    /// Returns the string representation of the band.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Attention => "attention",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for LimitBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Limit snapshot of a single invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitInfo {
    /// Invoice id.
    pub invoice_id: InvoiceId,
    /// Whether a credit limit is configured.
    pub has_limit: bool,
    /// Configured credit limit (zero when none).
    pub total: Decimal,
    /// Reserved amount.
    pub used: Decimal,
    /// Headroom left.
    pub available: Decimal,
    /// Used share in percent.
    pub usage_percentage: Decimal,
    /// Usage band.
    pub limit_status: LimitBand,
    /// Number of credit cards sharing the limit.
    pub credit_cards_count: usize,
    /// Invoice status.
    pub status: InvoiceStatus,
}

/// Card entry in a limit overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardSummary {
    /// Payment method id.
    pub id: PaymentMethodId,
    /// Card name.
    pub name: String,
    /// Last four digits, when known.
    pub last_four_digits: Option<String>,
    /// Name with the masked number.
    pub display_name: String,
}

/// Overview entry for one of a user's invoices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceLimitSummary {
    /// Invoice id.
    pub id: InvoiceId,
    /// Invoice name.
    pub name: String,
    /// Invoice status.
    pub status: InvoiceStatus,
    /// Configured credit limit.
    pub credit_limit: Option<Decimal>,
    /// Reserved amount.
    pub used_limit: Decimal,
    /// Headroom left.
    pub available_limit: Decimal,
    /// Used share in percent.
    pub usage_percentage: Decimal,
    /// Usage band.
    pub limit_status: LimitBand,
    /// Number of attached credit cards.
    pub credit_cards_count: usize,
    /// Attached credit cards.
    pub credit_cards: Vec<CardSummary>,
    /// Limit configured and some headroom left.
    pub can_make_purchases: bool,
}

/// Aggregate over all of a user's invoices that have a limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LimitStatistics {
    /// Invoices with a configured limit.
    pub invoices_with_limit: usize,
    /// Sum of credit limits.
    pub total_limit: Decimal,
    /// Sum of used limits.
    pub total_used: Decimal,
    /// Sum of available limits.
    pub total_available: Decimal,
    /// `total_used / total_limit` in percent.
    pub average_usage: Decimal,
    /// Invoices at 75% usage or more.
    pub critical_count: usize,
    /// Invoices below 75% usage.
    pub healthy_count: usize,
}

/// Outcome of a non-failing limit pre-check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitCheck {
    /// Whether the transaction may go ahead.
    pub can_proceed: bool,
    /// Available limit, reported when the amount does not fit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_limit: Option<Decimal>,
    /// Reason for refusal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LimitCheck {
    /// Check that lets the transaction through.
    #[must_use]
    pub const fn allowed() -> Self {
        Self {
            can_proceed: true,
            available_limit: None,
            message: None,
        }
    }

    /// Check that refuses the transaction.
    #[must_use]
    pub fn denied(message: impl Into<String>) -> Self {
        Self {
            can_proceed: false,
            available_limit: None,
            message: Some(message.into()),
        }
    }
}
