//! Outcome of one daily lifecycle run.

use serde::Serialize;
use std::fmt;
use tally_shared::types::InvoiceId;

/// Phase of the daily run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Closing invoices whose closing day is today.
    Close,
    /// Creating next-period invoices.
    Spawn,
    /// Flagging closed invoices past their due date.
    MarkOverdue,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Close => "close",
            Self::Spawn => "spawn",
            Self::MarkOverdue => "mark_overdue",
        };
        f.write_str(s)
    }
}

/// A single invoice that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// Phase the failure happened in.
    pub phase: Phase,
    /// Invoice being processed.
    pub invoice_id: InvoiceId,
    /// Error text.
    pub error: String,
}

/// Counts and failures of a daily run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailyRunReport {
    /// Invoices moved to closed.
    pub closed: usize,
    /// Successor invoices created.
    pub spawned: usize,
    /// Invoices moved to overdue.
    pub marked_overdue: usize,
    /// Invoices that failed, in processing order.
    pub failures: Vec<ItemFailure>,
}

impl DailyRunReport {
    /// Records a failed item.
    pub fn record_failure(&mut self, phase: Phase, invoice_id: InvoiceId, error: impl fmt::Display) {
        self.failures.push(ItemFailure {
            phase,
            invoice_id,
            error: error.to_string(),
        });
    }

    /// Returns true if no item failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of failures in `phase`.
    #[must_use]
    pub fn failures_in(&self, phase: Phase) -> usize {
        self.failures.iter().filter(|f| f.phase == phase).count()
    }
}
