//! Pure projections over invoice limit state.

use rust_decimal::Decimal;

use super::types::{CardSummary, InvoiceLimitSummary, LimitBand, LimitCheck, LimitInfo, LimitStatistics};
use crate::invoice::Invoice;
use crate::transaction::TransactionType;

/// Usage at or above which an invoice counts as critical in statistics.
const STATISTICS_CRITICAL_THRESHOLD: i64 = 75;

/// Limit service for business logic.
pub struct LimitService;

impl LimitService {
    /// Returns true when limit rules apply to a transaction at all.
    ///
    /// Only expenses billed to an invoice consume credit limit.
    #[must_use]
    pub const fn applies(transaction_type: TransactionType, has_invoice: bool) -> bool {
        matches!(transaction_type, TransactionType::Expense) && has_invoice
    }

    /// Evaluates whether `amount` may be charged to `invoice`.
    ///
    /// Pass `None` when the referenced invoice could not be found.
    #[must_use]
    pub fn evaluate(invoice: Option<&Invoice>, amount: Decimal) -> LimitCheck {
        let Some(invoice) = invoice.filter(|i| i.is_active) else {
            return LimitCheck::denied("Invoice not found");
        };
        if !invoice.has_credit_limit() {
            return LimitCheck::denied("Invoice has no credit limit configured");
        }

        let available = invoice.available_limit();
        if amount > available {
            return LimitCheck {
                can_proceed: false,
                available_limit: Some(available),
                message: Some(format!(
                    "Insufficient limit. Available: {available}, Required: {amount}"
                )),
            };
        }

        LimitCheck::allowed()
    }

    /// Limit snapshot of `invoice`.
    #[must_use]
    pub fn info(invoice: &Invoice) -> LimitInfo {
        LimitInfo {
            invoice_id: invoice.id,
            has_limit: invoice.has_credit_limit(),
            total: invoice.credit_limit.unwrap_or(Decimal::ZERO),
            used: invoice.used_limit,
            available: invoice.available_limit(),
            usage_percentage: invoice.usage_percentage(),
            limit_status: invoice.limit_band(),
            credit_cards_count: invoice.credit_cards_count(),
            status: invoice.status,
        }
    }

    /// Overview entry for `invoice`, including its attached credit cards.
    #[must_use]
    pub fn summary(invoice: &Invoice) -> InvoiceLimitSummary {
        let credit_cards: Vec<CardSummary> = invoice
            .credit_cards()
            .map(|card| CardSummary {
                id: card.id,
                name: card.name.clone(),
                last_four_digits: card.last_four_digits.clone(),
                display_name: card.display_name(),
            })
            .collect();

        InvoiceLimitSummary {
            id: invoice.id,
            name: invoice.name.clone(),
            status: invoice.status,
            credit_limit: invoice.credit_limit,
            used_limit: invoice.used_limit,
            available_limit: invoice.available_limit(),
            usage_percentage: invoice.usage_percentage(),
            limit_status: invoice.limit_band(),
            credit_cards_count: credit_cards.len(),
            credit_cards,
            can_make_purchases: invoice.has_credit_limit()
                && invoice.available_limit() > Decimal::ZERO,
        }
    }

    /// Aggregates limit usage over the invoices that have a limit.
    #[must_use]
    pub fn statistics<'a>(invoices: impl IntoIterator<Item = &'a Invoice>) -> LimitStatistics {
        let threshold = Decimal::from(STATISTICS_CRITICAL_THRESHOLD);
        let mut stats = LimitStatistics::default();

        for invoice in invoices {
            let Some(limit) = invoice.credit_limit else {
                continue;
            };
            stats.invoices_with_limit += 1;
            stats.total_limit += limit;
            stats.total_used += invoice.used_limit;
            stats.total_available += invoice.available_limit();

            if invoice.exact_usage_percentage() >= threshold {
                stats.critical_count += 1;
            } else {
                stats.healthy_count += 1;
            }
        }

        stats.average_usage = if stats.total_limit.is_zero() {
            Decimal::ZERO
        } else {
            (stats.total_used / stats.total_limit * Decimal::ONE_HUNDRED).round_dp(2)
        };

        stats
    }

    /// Band for a raw usage percentage.
    #[must_use]
    pub fn band(usage_percentage: Decimal) -> LimitBand {
        LimitBand::from_usage(usage_percentage)
    }
}
