//! Per-invoice decisions of the daily lifecycle run.
//!
//! Each phase asks these rules whether an invoice qualifies on a given day.
//! They only look at the invoice's current state, so re-running a day finds
//! nothing left to do.

use chrono::NaiveDate;

use super::calendar::{closes_on, is_past_due, next_period, successor_name};
use crate::invoice::Invoice;

/// Lifecycle rules for business logic.
pub struct LifecycleRules;

impl LifecycleRules {
    /// Open, active invoices whose closing day is `today`.
    ///
    /// Invoices already named after the following period were spawned for
    /// the next cycle and are left open.
    #[must_use]
    pub fn should_close(invoice: &Invoice, today: NaiveDate) -> bool {
        invoice.is_active
            && invoice.is_open()
            && closes_on(invoice.closing_day, today)
            && !Self::is_next_period(invoice, today)
    }

    /// Returns true if `invoice` carries the name of the period after `today`.
    #[must_use]
    pub fn is_next_period(invoice: &Invoice, today: NaiveDate) -> bool {
        Self::successor_name(invoice, today).is_some_and(|name| name == invoice.name)
    }

    /// Closed, active invoices whose due date is `today` or earlier.
    #[must_use]
    pub fn should_mark_overdue(invoice: &Invoice, today: NaiveDate) -> bool {
        invoice.is_active
            && invoice.is_closed()
            && invoice.due_date.is_some_and(|due| is_past_due(due, today))
    }

    /// Name of the next-period invoice spawned from `invoice` on `today`.
    #[must_use]
    pub fn successor_name(invoice: &Invoice, today: NaiveDate) -> Option<String> {
        let (month, year) = next_period(today)?;
        Some(successor_name(&invoice.name, month, year))
    }

    /// Next-period invoice spawned from `invoice` on `today`.
    #[must_use]
    pub fn successor(invoice: &Invoice, today: NaiveDate, carry_over_limit: bool) -> Option<Invoice> {
        let name = Self::successor_name(invoice, today)?;
        Some(invoice.successor(name, carry_over_limit))
    }
}
