//! Transaction repository and the credit-limit guard around it.
//!
//! An expense billed to an invoice reserves its amount in the same database
//! transaction that inserts its rows, so a committed transaction always has
//! its reservation and a rejected one leaves the ledger untouched.
//!
//! Each row records in `limit_reserved` what it currently holds against its
//! invoice. A single purchase holds its full amount; an installment purchase
//! spreads the reservation over its installments and the summary row holds
//! nothing. Canceling or deleting a row gives back exactly what it holds.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tally_core::invoice::InvoiceError;
use tally_core::transaction::{
    InstallmentPlan, TransactionDraft, TransactionPolicy, TransactionPolicyError,
    TransactionStatus as DomainTransactionStatus, TransactionType as DomainTransactionType,
};
use tally_shared::AppError;
use tally_shared::types::PageRequest;
use tracing::{info, warn};
use uuid::Uuid;

use super::invoice_limit::{self, InvoiceLimitRepository, LimitError};
use crate::entities::{
    payment_methods,
    sea_orm_active_enums::{TransactionStatus, TransactionType},
    transactions,
};

/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionRepoError {
    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    NotFound(Uuid),

    /// Referenced invoice not found.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(Uuid),

    /// Referenced payment method not found.
    #[error("Payment method not found: {0}")]
    PaymentMethodNotFound(Uuid),

    /// The draft or requested change breaks a transaction rule.
    #[error(transparent)]
    Policy(#[from] TransactionPolicyError),

    /// The credit limit refused the amount.
    #[error(transparent)]
    Limit(#[from] LimitError),

    /// The amount cannot be split into the requested installments.
    #[error("Amount cannot be split into {0} installments")]
    InvalidInstallments(i16),

    /// Amounts of installment purchases are fixed.
    #[error("The amount of an installment purchase cannot be changed")]
    InstallmentAmountLocked,

    /// Canceled transactions are read-only.
    #[error("Canceled transactions cannot be edited")]
    Canceled,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<InvoiceError> for TransactionRepoError {
    fn from(err: InvoiceError) -> Self {
        Self::Limit(LimitError::Domain(err))
    }
}

impl From<TransactionRepoError> for AppError {
    fn from(err: TransactionRepoError) -> Self {
        match err {
            TransactionRepoError::NotFound(_) => {
                Self::NotFound("Transaction not found".to_string())
            }
            TransactionRepoError::InvoiceNotFound(_) => {
                Self::NotFound("Invoice not found".to_string())
            }
            TransactionRepoError::PaymentMethodNotFound(_) => {
                Self::NotFound("Payment method not found".to_string())
            }
            TransactionRepoError::Policy(e) => e.into(),
            TransactionRepoError::Limit(e) => e.into(),
            TransactionRepoError::InvalidInstallments(_)
            | TransactionRepoError::InstallmentAmountLocked
            | TransactionRepoError::Canceled => Self::InvalidOperation(err.to_string()),
            TransactionRepoError::Database(e) => Self::Internal(e.to_string()),
        }
    }
}

/// Input for updating a transaction.
///
/// Type, invoice and payment method are fixed once created.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    /// New description.
    pub description: Option<String>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New transaction date.
    pub transaction_date: Option<NaiveDate>,
    /// New due date.
    pub due_date: Option<Option<NaiveDate>>,
    /// New notes.
    pub notes: Option<Option<String>>,
    /// New category.
    pub category_id: Option<Option<Uuid>>,
}

/// Filter options for listing transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Only this status.
    pub status: Option<DomainTransactionStatus>,
    /// Only this type.
    pub transaction_type: Option<DomainTransactionType>,
    /// Only transactions billed to this invoice.
    pub invoice_id: Option<Uuid>,
    /// Transaction date on or after.
    pub from: Option<NaiveDate>,
    /// Transaction date on or before.
    pub to: Option<NaiveDate>,
}

/// A transaction together with its installments.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionWithInstallments {
    /// The transaction, or the summary row of an installment purchase.
    #[serde(flatten)]
    pub transaction: transactions::Model,
    /// Installments in order; empty for single purchases.
    pub installments: Vec<transactions::Model>,
}

/// Transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========================================================================
    // Create
    // ========================================================================

    /// Creates a transaction, splitting it into installments when asked.
    ///
    /// Expenses billed to an invoice are checked against its limit first and
    /// reserved in the same database transaction as the insert.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The draft breaks a transaction rule
    /// - The invoice or payment method is not the user's
    /// - The invoice has no limit or not enough of it
    /// - Database operation fails
    pub async fn create(
        &self,
        user_id: Uuid,
        draft: TransactionDraft,
    ) -> Result<TransactionWithInstallments, TransactionRepoError> {
        TransactionPolicy::validate(&draft)?;

        if let Some(payment_method_id) = draft.payment_method_id {
            let id = payment_method_id.into_inner();
            let found = payment_methods::Entity::find_by_id(id)
                .filter(payment_methods::Column::UserId.eq(user_id))
                .filter(payment_methods::Column::IsActive.eq(true))
                .count(&self.db)
                .await?;
            if found == 0 {
                return Err(TransactionRepoError::PaymentMethodNotFound(id));
            }
        }

        self.check_limit(user_id, &draft).await?;
        let limit_invoice = draft.limit_invoice().map(|id| id.into_inner());

        let count = draft.installment_count();
        let plan = if count > 1 {
            let plan = InstallmentPlan::split(draft.amount, count, draft.transaction_date, draft.due_date)
                .ok_or(TransactionRepoError::InvalidInstallments(count))?;
            Some(plan)
        } else {
            None
        };

        let txn = self.db.begin().await?;

        if let Some(invoice_id) = limit_invoice {
            invoice_limit::reserve(&txn, invoice_id, draft.amount).await?;
        }

        let parent_reserved = match (&plan, limit_invoice) {
            (None, Some(_)) => draft.amount,
            _ => Decimal::ZERO,
        };
        let parent = insert_row(
            &txn,
            user_id,
            &draft,
            RowParts {
                description: draft.description.trim().to_string(),
                amount: draft.amount,
                status: draft.status,
                transaction_date: draft.transaction_date,
                due_date: draft.due_date,
                installments_current: draft.installments_current.unwrap_or(1),
                installments_total: count,
                parent_transaction_id: None,
                limit_reserved: parent_reserved,
            },
        )
        .await?;

        let mut installments = Vec::new();
        if let Some(plan) = &plan {
            for installment in &plan.installments {
                let child = insert_row(
                    &txn,
                    user_id,
                    &draft,
                    RowParts {
                        description: TransactionPolicy::installment_description(
                            &draft.description,
                            installment.number,
                            count,
                        ),
                        amount: installment.amount,
                        status: DomainTransactionStatus::Pending,
                        transaction_date: installment.transaction_date,
                        due_date: installment.due_date,
                        installments_current: installment.number,
                        installments_total: count,
                        parent_transaction_id: Some(parent.id),
                        limit_reserved: if limit_invoice.is_some() {
                            installment.amount
                        } else {
                            Decimal::ZERO
                        },
                    },
                )
                .await?;
                installments.push(child);
            }
        }

        txn.commit().await?;

        info!(
            transaction_id = %parent.id,
            user_id = %user_id,
            amount = %parent.amount,
            installments = installments.len(),
            invoice_id = ?limit_invoice,
            "Transaction created"
        );

        Ok(TransactionWithInstallments {
            transaction: parent,
            installments,
        })
    }

    /// Runs the non-failing limit pre-check and turns a refusal into an error.
    async fn check_limit(
        &self,
        user_id: Uuid,
        draft: &TransactionDraft,
    ) -> Result<(), TransactionRepoError> {
        let invoice_id = draft.invoice_id.map(|id| id.into_inner());
        let check = InvoiceLimitRepository::new(self.db.clone())
            .validate_transaction_with_limit(
                user_id,
                invoice_id,
                draft.amount,
                draft.transaction_type,
            )
            .await?;
        let Some(invoice_id) = invoice_id.filter(|_| !check.can_proceed) else {
            return Ok(());
        };

        warn!(
            invoice_id = %invoice_id,
            amount = %draft.amount,
            reason = check.message.as_deref().unwrap_or_default(),
            "Transaction refused by credit limit"
        );

        if let Some(available) = check.available_limit {
            return Err(InvoiceError::InsufficientLimit {
                available,
                requested: draft.amount,
            }
            .into());
        }
        // Refused without headroom: either missing or without a limit.
        invoice_limit::find_active(&self.db, invoice_id, Some(user_id))
            .await
            .map_err(|e| match e {
                LimitError::InvoiceNotFound(id) => TransactionRepoError::InvoiceNotFound(id),
                other => other.into(),
            })?;
        Err(InvoiceError::NoCreditLimit.into())
    }

    // ========================================================================
    // Status changes
    // ========================================================================

    /// Marks a pending transaction as completed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatusChange` for canceled transactions.
    pub async fn complete(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<transactions::Model, TransactionRepoError> {
        let row = self.find(user_id, id).await?;
        let from: DomainTransactionStatus = row.status.into();
        TransactionPolicy::check_status_change(from, DomainTransactionStatus::Completed)?;
        if from == DomainTransactionStatus::Completed {
            return Ok(row);
        }

        let mut active: transactions::ActiveModel = row.into();
        active.status = Set(TransactionStatus::Completed);
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&self.db).await?;
        info!(transaction_id = %id, "Transaction completed");
        Ok(updated)
    }

    /// Cancels a transaction and its installments, releasing what they hold.
    ///
    /// Canceling twice changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the transaction does not exist.
    pub async fn cancel(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<transactions::Model, TransactionRepoError> {
        let txn = self.db.begin().await?;

        let row = lock_row(&txn, user_id, id).await?;
        let from: DomainTransactionStatus = row.status.into();
        TransactionPolicy::check_status_change(from, DomainTransactionStatus::Canceled)?;
        if from == DomainTransactionStatus::Canceled {
            txn.commit().await?;
            return Ok(row);
        }

        let children = lock_children(&txn, id).await?;
        let released = release_rows(&txn, std::iter::once(&row).chain(&children)).await?;

        let ids: Vec<Uuid> = std::iter::once(row.id)
            .chain(children.iter().map(|c| c.id))
            .collect();
        transactions::Entity::update_many()
            .col_expr(transactions::Column::Status, TransactionStatus::Canceled.as_enum())
            .col_expr(transactions::Column::LimitReserved, Expr::value(Decimal::ZERO))
            .col_expr(transactions::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(transactions::Column::Id.is_in(ids))
            .exec(&txn)
            .await?;

        let updated = lock_row(&txn, user_id, id).await?;
        txn.commit().await?;

        info!(transaction_id = %id, released = %released, "Transaction canceled");
        Ok(updated)
    }

    /// Soft-deletes a transaction and its installments, releasing what they
    /// still hold.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the transaction does not exist.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), TransactionRepoError> {
        let txn = self.db.begin().await?;

        let row = lock_row(&txn, user_id, id).await?;
        let children = lock_children(&txn, id).await?;
        let released = release_rows(&txn, std::iter::once(&row).chain(&children)).await?;

        let ids: Vec<Uuid> = std::iter::once(row.id)
            .chain(children.iter().map(|c| c.id))
            .collect();
        transactions::Entity::update_many()
            .col_expr(transactions::Column::IsActive, Expr::value(false))
            .col_expr(transactions::Column::LimitReserved, Expr::value(Decimal::ZERO))
            .col_expr(transactions::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(transactions::Column::Id.is_in(ids))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(transaction_id = %id, released = %released, "Transaction deleted");
        Ok(())
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Updates a transaction, moving its reservation by the amount difference.
    ///
    /// # Errors
    ///
    /// Returns an error if the merged transaction breaks a rule, the limit
    /// cannot cover an increase, or the database operation fails.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: UpdateTransactionInput,
    ) -> Result<transactions::Model, TransactionRepoError> {
        let txn = self.db.begin().await?;

        let row = lock_row(&txn, user_id, id).await?;
        if row.status == TransactionStatus::Canceled {
            return Err(TransactionRepoError::Canceled);
        }

        let mut draft = draft_of(&row);
        if let Some(description) = &input.description {
            draft.description.clone_from(description);
        }
        if let Some(amount) = input.amount {
            draft.amount = amount;
        }
        if let Some(date) = input.transaction_date {
            draft.transaction_date = date;
        }
        if let Some(due_date) = input.due_date {
            draft.due_date = due_date;
        }
        if let Some(notes) = &input.notes {
            draft.notes.clone_from(notes);
        }
        TransactionPolicy::validate(&draft)?;

        let amount_changed = draft.amount != row.amount;
        if amount_changed && (row.is_installment_parent() || row.parent_transaction_id.is_some()) {
            return Err(TransactionRepoError::InstallmentAmountLocked);
        }

        let mut reserved = row.limit_reserved;
        if amount_changed
            && let Some(invoice_id) = row.invoice_id
            && row.limit_reserved > Decimal::ZERO
        {
            let delta = draft.amount - row.limit_reserved;
            if delta > Decimal::ZERO {
                invoice_limit::reserve(&txn, invoice_id, delta).await?;
            } else {
                invoice_limit::release(&txn, invoice_id, -delta).await?;
            }
            reserved = draft.amount;
        }

        let mut active: transactions::ActiveModel = row.into();
        active.description = Set(draft.description.trim().to_string());
        active.amount = Set(draft.amount);
        active.transaction_date = Set(draft.transaction_date);
        active.due_date = Set(draft.due_date);
        active.limit_reserved = Set(reserved);
        active.notes = Set(draft.notes);
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(transaction_id = %id, amount = %updated.amount, "Transaction updated");
        Ok(updated)
    }

    /// Changes only the amount of a transaction.
    ///
    /// # Errors
    ///
    /// See [`TransactionRepository::update`].
    pub async fn update_amount(
        &self,
        user_id: Uuid,
        id: Uuid,
        amount: Decimal,
    ) -> Result<transactions::Model, TransactionRepoError> {
        self.update(
            user_id,
            id,
            UpdateTransactionInput {
                amount: Some(amount),
                ..Default::default()
            },
        )
        .await
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Finds one of the user's active transactions.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if missing, deleted or owned by someone else.
    pub async fn find(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<transactions::Model, TransactionRepoError> {
        transactions::Entity::find_by_id(id)
            .filter(transactions::Column::UserId.eq(user_id))
            .filter(transactions::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or(TransactionRepoError::NotFound(id))
    }

    /// Finds a transaction together with its installments.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the transaction does not exist.
    pub async fn find_with_installments(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<TransactionWithInstallments, TransactionRepoError> {
        let transaction = self.find(user_id, id).await?;
        let installments = transactions::Entity::find()
            .filter(transactions::Column::ParentTransactionId.eq(id))
            .filter(transactions::Column::IsActive.eq(true))
            .order_by_asc(transactions::Column::InstallmentsCurrent)
            .all(&self.db)
            .await?;

        Ok(TransactionWithInstallments {
            transaction,
            installments,
        })
    }

    /// Lists the user's active transactions, newest first.
    ///
    /// Returns the page and the total number of matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: &TransactionFilter,
        page: &PageRequest,
    ) -> Result<(Vec<transactions::Model>, u64), DbErr> {
        let page = page.normalized();
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .filter(transactions::Column::IsActive.eq(true));

        if let Some(status) = filter.status {
            query = query.filter(transactions::Column::Status.eq(TransactionStatus::from(status)));
        }
        if let Some(kind) = filter.transaction_type {
            query = query
                .filter(transactions::Column::TransactionType.eq(TransactionType::from(kind)));
        }
        if let Some(invoice_id) = filter.invoice_id {
            query = query.filter(transactions::Column::InvoiceId.eq(invoice_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(transactions::Column::TransactionDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(transactions::Column::TransactionDate.lte(to));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(transactions::Column::TransactionDate)
            .order_by_desc(transactions::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }
}

// ============================================================================
// Row helpers
// ============================================================================

/// Per-row values of an insert; the rest comes from the draft.
struct RowParts {
    description: String,
    amount: Decimal,
    status: DomainTransactionStatus,
    transaction_date: NaiveDate,
    due_date: Option<NaiveDate>,
    installments_current: i16,
    installments_total: i16,
    parent_transaction_id: Option<Uuid>,
    limit_reserved: Decimal,
}

async fn insert_row(
    txn: &DatabaseTransaction,
    user_id: Uuid,
    draft: &TransactionDraft,
    parts: RowParts,
) -> Result<transactions::Model, DbErr> {
    let now = Utc::now().into();
    transactions::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(user_id),
        description: Set(parts.description),
        amount: Set(parts.amount),
        transaction_type: Set(draft.transaction_type.into()),
        status: Set(parts.status.into()),
        transaction_date: Set(parts.transaction_date),
        due_date: Set(parts.due_date),
        installments_current: Set(parts.installments_current),
        installments_total: Set(parts.installments_total),
        notes: Set(draft.notes.clone()),
        category_id: Set(draft.category_id),
        payment_method_id: Set(draft.payment_method_id.map(Into::into)),
        invoice_id: Set(draft.invoice_id.map(Into::into)),
        parent_transaction_id: Set(parts.parent_transaction_id),
        limit_reserved: Set(parts.limit_reserved),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(txn)
    .await
}

/// Loads and locks one of the user's active transactions.
async fn lock_row<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    id: Uuid,
) -> Result<transactions::Model, TransactionRepoError> {
    transactions::Entity::find_by_id(id)
        .filter(transactions::Column::UserId.eq(user_id))
        .filter(transactions::Column::IsActive.eq(true))
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(TransactionRepoError::NotFound(id))
}

/// Loads and locks the active installments of a transaction.
async fn lock_children<C: ConnectionTrait>(
    conn: &C,
    parent_id: Uuid,
) -> Result<Vec<transactions::Model>, DbErr> {
    transactions::Entity::find()
        .filter(transactions::Column::ParentTransactionId.eq(parent_id))
        .filter(transactions::Column::IsActive.eq(true))
        .lock_exclusive()
        .all(conn)
        .await
}

/// Gives back what each row holds against its invoice. Returns the total.
async fn release_rows<'a, C: ConnectionTrait>(
    conn: &C,
    rows: impl Iterator<Item = &'a transactions::Model>,
) -> Result<Decimal, DbErr> {
    let mut total = Decimal::ZERO;
    for row in rows {
        if let Some(invoice_id) = row.invoice_id
            && row.limit_reserved > Decimal::ZERO
        {
            invoice_limit::release(conn, invoice_id, row.limit_reserved).await?;
            total += row.limit_reserved;
        }
    }
    Ok(total)
}

/// Rebuilds the draft a stored row would have been created from.
fn draft_of(row: &transactions::Model) -> TransactionDraft {
    TransactionDraft {
        description: row.description.clone(),
        amount: row.amount,
        transaction_type: row.transaction_type.into(),
        status: row.status.into(),
        transaction_date: row.transaction_date,
        due_date: row.due_date,
        installments_current: Some(row.installments_current),
        installments_total: Some(row.installments_total),
        notes: row.notes.clone(),
        category_id: row.category_id,
        payment_method_id: row.payment_method_id.map(Into::into),
        invoice_id: row.invoice_id.map(Into::into),
    }
}
