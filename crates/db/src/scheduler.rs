//! Daily invoice lifecycle run.
//!
//! Three phases run in order against one calendar day: close invoices whose
//! closing day has come, spawn next-period invoices, flag overdue ones. Each
//! phase works on a snapshot taken when it starts, handles every invoice on
//! its own and records failures instead of stopping. Re-running a day only
//! finds invoices that are still in their pre-transition state, and the
//! spawn phase skips successors that already exist.

use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use tally_core::invoice::InvoiceError;
use tally_core::schedule::{DailyRunReport, LifecycleRules, Phase};
use tally_shared::types::InvoiceId;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::entities::{invoices, sea_orm_active_enums::InvoiceStatus};
use crate::repositories::invoice::{
    InvoiceRepoError, close_invoice, closing_total, insert_invoice, mark_overdue, name_taken,
};

/// Tuning knobs for the daily run.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerSettings {
    /// Upper bound on the time spent on one invoice in one phase.
    pub item_timeout: Duration,
    /// Copy the credit limit to spawned invoices.
    pub carry_over_credit_limit: bool,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            item_timeout: Duration::from_secs(30),
            carry_over_credit_limit: false,
        }
    }
}

/// Outcome of one invoice in one phase.
enum ItemOutcome {
    Done,
    Skipped,
}

/// Runs the invoice lifecycle phases.
#[derive(Debug, Clone)]
pub struct InvoiceScheduler {
    db: DatabaseConnection,
    settings: SchedulerSettings,
}

impl InvoiceScheduler {
    /// Creates a scheduler over the given connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection, settings: SchedulerSettings) -> Self {
        Self { db, settings }
    }

    /// Runs all three phases for `today`.
    ///
    /// Per-invoice failures end up in the report. Only failing to load a
    /// phase's snapshot aborts the run.
    ///
    /// # Errors
    ///
    /// Returns an error if a snapshot query fails.
    pub async fn run_daily(&self, today: NaiveDate) -> Result<DailyRunReport, DbErr> {
        info!(date = %today, "Starting daily invoice processing");
        let mut report = DailyRunReport::default();

        self.close_due(today, &mut report).await?;
        self.spawn_successors(today, &mut report).await?;
        self.flag_overdue(today, &mut report).await?;

        info!(
            date = %today,
            closed = report.closed,
            spawned = report.spawned,
            marked_overdue = report.marked_overdue,
            failures = report.failures.len(),
            "Daily invoice processing finished"
        );
        Ok(report)
    }

    // ========================================================================
    // Phase 1: close
    // ========================================================================

    async fn close_due(&self, today: NaiveDate, report: &mut DailyRunReport) -> Result<(), DbErr> {
        let candidates = invoices::Entity::find()
            .filter(invoices::Column::Status.eq(InvoiceStatus::Open))
            .filter(invoices::Column::IsActive.eq(true))
            .order_by_asc(invoices::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let due: Vec<_> = candidates
            .into_iter()
            .filter(|m| LifecycleRules::should_close(&m.clone().into_domain(Vec::new()), today))
            .collect();

        for model in &due {
            let db = &self.db;
            let outcome = self
                .guarded(async move {
                    let total = closing_total(db, model.id).await?;
                    let closed = close_invoice(db, model, today, total).await?;
                    Ok::<_, InvoiceRepoError>(if closed {
                        ItemOutcome::Done
                    } else {
                        ItemOutcome::Skipped
                    })
                })
                .await;
            record(report, Phase::Close, model.id, outcome, |r| r.closed += 1);
        }

        info!(candidates = due.len(), closed = report.closed, "Close phase finished");
        Ok(())
    }

    // ========================================================================
    // Phase 2: spawn
    // ========================================================================

    async fn spawn_successors(
        &self,
        today: NaiveDate,
        report: &mut DailyRunReport,
    ) -> Result<(), DbErr> {
        let sources = invoices::Entity::find()
            .filter(invoices::Column::IsActive.eq(true))
            .order_by_asc(invoices::Column::CreatedAt)
            .all(&self.db)
            .await?;
        let carry_over = self.settings.carry_over_credit_limit;

        for model in &sources {
            let db = &self.db;
            let outcome = self
                .guarded(async move {
                    let source = model.clone().into_domain(Vec::new());
                    let successor = LifecycleRules::successor(&source, today, carry_over)
                        .ok_or(InvoiceError::DateOutOfRange)?;

                    if name_taken(db, model.user_id, &successor.name, None).await? {
                        return Ok(ItemOutcome::Skipped);
                    }
                    match insert_invoice(db, &successor).await {
                        Ok(created) => {
                            debug!(
                                source_id = %model.id,
                                invoice_id = %created.id,
                                name = %created.name,
                                "Successor invoice created"
                            );
                            Ok(ItemOutcome::Done)
                        }
                        Err(InvoiceRepoError::DuplicateName(_)) => Ok(ItemOutcome::Skipped),
                        Err(e) => Err(e),
                    }
                })
                .await;
            record(report, Phase::Spawn, model.id, outcome, |r| r.spawned += 1);
        }

        info!(sources = sources.len(), spawned = report.spawned, "Spawn phase finished");
        Ok(())
    }

    // ========================================================================
    // Phase 3: overdue
    // ========================================================================

    async fn flag_overdue(
        &self,
        today: NaiveDate,
        report: &mut DailyRunReport,
    ) -> Result<(), DbErr> {
        let candidates = invoices::Entity::find()
            .filter(invoices::Column::Status.eq(InvoiceStatus::Closed))
            .filter(invoices::Column::IsActive.eq(true))
            .filter(invoices::Column::DueDate.lte(today))
            .order_by_asc(invoices::Column::DueDate)
            .all(&self.db)
            .await?;

        for model in &candidates {
            let db = &self.db;
            let outcome = self
                .guarded(async move {
                    let flagged = mark_overdue(db, model).await?;
                    Ok::<_, InvoiceRepoError>(if flagged {
                        ItemOutcome::Done
                    } else {
                        ItemOutcome::Skipped
                    })
                })
                .await;
            record(report, Phase::MarkOverdue, model.id, outcome, |r| {
                r.marked_overdue += 1;
            });
        }

        info!(
            candidates = candidates.len(),
            marked_overdue = report.marked_overdue,
            "Overdue phase finished"
        );
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Applies the per-item timeout.
    async fn guarded<F>(&self, work: F) -> Result<ItemOutcome, String>
    where
        F: Future<Output = Result<ItemOutcome, InvoiceRepoError>>,
    {
        match tokio::time::timeout(self.settings.item_timeout, work).await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(_) => Err(format!(
                "timed out after {}s",
                self.settings.item_timeout.as_secs()
            )),
        }
    }
}

/// Folds one item's outcome into the report.
fn record(
    report: &mut DailyRunReport,
    phase: Phase,
    invoice_id: Uuid,
    outcome: Result<ItemOutcome, String>,
    on_done: impl FnOnce(&mut DailyRunReport),
) {
    match outcome {
        Ok(ItemOutcome::Done) => on_done(report),
        Ok(ItemOutcome::Skipped) => {}
        Err(e) => {
            error!(phase = %phase, invoice_id = %invoice_id, error = %e, "Invoice processing failed");
            report.record_failure(phase, InvoiceId::from(invoice_id), e);
        }
    }
}
