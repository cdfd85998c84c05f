//! Credit-limit ledger persisted on the invoices table.
//!
//! Every mutation of `used_limit` or `credit_limit` is a single conditional
//! `UPDATE`, so the database re-checks the limit under the row lock and two
//! concurrent reservations can never both fit into the same headroom. When
//! no row matches, the invoice is reloaded to report why.
//!
//! The ledger primitives are generic over [`ConnectionTrait`] so the
//! transaction repository can run them inside its own database transaction.

use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use tally_core::invoice::{Invoice, InvoiceError};
use tally_core::limits::{
    InvoiceLimitSummary, LimitCheck, LimitInfo, LimitService, LimitStatistics,
};
use tally_core::transaction::TransactionType;
use tally_shared::AppError;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::invoice::attach_cards;
use crate::entities::invoices;

/// Errors raised by the limit ledger.
#[derive(Debug, Error)]
pub enum LimitError {
    /// Invoice does not exist, is inactive or belongs to someone else.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(Uuid),

    /// A limit rule rejected the request.
    #[error(transparent)]
    Domain(#[from] InvoiceError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<LimitError> for AppError {
    fn from(err: LimitError) -> Self {
        match err {
            LimitError::InvoiceNotFound(_) => Self::NotFound("Invoice not found".to_string()),
            LimitError::Domain(e) => e.into(),
            LimitError::Database(e) => Self::Internal(e.to_string()),
        }
    }
}

// ============================================================================
// Ledger primitives
// ============================================================================

/// Loads an active invoice, optionally scoped to its owner.
pub(crate) async fn find_active<C: ConnectionTrait>(
    conn: &C,
    invoice_id: Uuid,
    user_id: Option<Uuid>,
) -> Result<invoices::Model, LimitError> {
    let mut query = invoices::Entity::find_by_id(invoice_id)
        .filter(invoices::Column::IsActive.eq(true));
    if let Some(user_id) = user_id {
        query = query.filter(invoices::Column::UserId.eq(user_id));
    }

    query
        .one(conn)
        .await?
        .ok_or(LimitError::InvoiceNotFound(invoice_id))
}

/// Atomically adds `amount` to `used_limit` if it still fits.
pub(crate) async fn reserve<C: ConnectionTrait>(
    conn: &C,
    invoice_id: Uuid,
    amount: Decimal,
) -> Result<invoices::Model, LimitError> {
    Invoice::validate_amount(amount)?;

    let result = invoices::Entity::update_many()
        .col_expr(
            invoices::Column::UsedLimit,
            Expr::col(invoices::Column::UsedLimit).add(amount),
        )
        .col_expr(
            invoices::Column::UpdatedAt,
            Expr::value(chrono::Utc::now()),
        )
        .filter(invoices::Column::Id.eq(invoice_id))
        .filter(invoices::Column::IsActive.eq(true))
        .filter(invoices::Column::CreditLimit.is_not_null())
        .filter(
            Expr::expr(Expr::col(invoices::Column::UsedLimit).add(amount))
                .lte(Expr::col(invoices::Column::CreditLimit)),
        )
        .exec(conn)
        .await?;

    let invoice = find_active(conn, invoice_id, None).await?;
    if result.rows_affected == 0 {
        let mut current = invoice.into_domain(Vec::new());
        let available = current.available_limit();
        current.use_limit(amount)?;
        // Headroom changed between the update and the reload.
        return Err(InvoiceError::InsufficientLimit {
            available,
            requested: amount,
        }
        .into());
    }

    debug!(invoice_id = %invoice_id, amount = %amount, used = %invoice.used_limit, "Limit reserved");
    Ok(invoice)
}

/// Subtracts `amount` from `used_limit`, clamping at zero.
///
/// Inactive invoices are released as well so a soft-deleted invoice never
/// keeps stale usage. Returns the number of rows touched.
pub(crate) async fn release<C: ConnectionTrait>(
    conn: &C,
    invoice_id: Uuid,
    amount: Decimal,
) -> Result<u64, DbErr> {
    if amount <= Decimal::ZERO {
        return Ok(0);
    }

    let result = invoices::Entity::update_many()
        .col_expr(
            invoices::Column::UsedLimit,
            Func::greatest([
                Expr::col(invoices::Column::UsedLimit).sub(amount),
                Expr::val(Decimal::ZERO).into(),
            ])
            .into(),
        )
        .col_expr(
            invoices::Column::UpdatedAt,
            Expr::value(chrono::Utc::now()),
        )
        .filter(invoices::Column::Id.eq(invoice_id))
        .exec(conn)
        .await?;

    debug!(invoice_id = %invoice_id, amount = %amount, "Limit released");
    Ok(result.rows_affected)
}

/// Sets a new credit limit if it still covers `used_limit`.
pub(crate) async fn resize<C: ConnectionTrait>(
    conn: &C,
    invoice_id: Uuid,
    user_id: Option<Uuid>,
    new_limit: Decimal,
) -> Result<invoices::Model, LimitError> {
    let current = find_active(conn, invoice_id, user_id).await?;
    current.into_domain(Vec::new()).update_credit_limit(new_limit)?;

    let result = invoices::Entity::update_many()
        .col_expr(invoices::Column::CreditLimit, Expr::value(new_limit))
        .col_expr(
            invoices::Column::UpdatedAt,
            Expr::value(chrono::Utc::now()),
        )
        .filter(invoices::Column::Id.eq(invoice_id))
        .filter(invoices::Column::IsActive.eq(true))
        .filter(invoices::Column::UsedLimit.lte(new_limit))
        .exec(conn)
        .await?;

    let invoice = find_active(conn, invoice_id, user_id).await?;
    if result.rows_affected == 0 {
        invoice.clone().into_domain(Vec::new()).update_credit_limit(new_limit)?;
        return Err(InvoiceError::LimitBelowUsage {
            new_limit,
            used: invoice.used_limit,
        }
        .into());
    }

    Ok(invoice)
}

// ============================================================================
// Repository
// ============================================================================

/// Limit ledger over a user's invoices.
#[derive(Debug, Clone)]
pub struct InvoiceLimitRepository {
    db: DatabaseConnection,
}

impl InvoiceLimitRepository {
    /// Creates a new limit repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns true if `amount` fits in the invoice's available limit.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound` for a missing invoice and `NoCreditLimit`
    /// when no limit is configured.
    pub async fn can_make_purchase(
        &self,
        user_id: Uuid,
        invoice_id: Uuid,
        amount: Decimal,
    ) -> Result<bool, LimitError> {
        let invoice = find_active(&self.db, invoice_id, Some(user_id))
            .await?
            .into_domain(Vec::new());
        if !invoice.has_credit_limit() {
            return Err(InvoiceError::NoCreditLimit.into());
        }

        Ok(invoice.has_available_limit(amount))
    }

    /// Reserves `amount` against the invoice's credit limit.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound`, `NoCreditLimit`, `NonPositiveAmount`,
    /// `AmountPrecision`, `AmountTooLarge` or `InsufficientLimit`.
    pub async fn use_limit(
        &self,
        user_id: Uuid,
        invoice_id: Uuid,
        amount: Decimal,
    ) -> Result<invoices::Model, LimitError> {
        let current = find_active(&self.db, invoice_id, Some(user_id)).await?;
        current.into_domain(Vec::new()).use_limit(amount)?;

        let invoice = reserve(&self.db, invoice_id, amount).await?;
        info!(invoice_id = %invoice_id, amount = %amount, "Credit limit used");
        Ok(invoice)
    }

    /// Gives back `amount`; over-release clamps `used_limit` to zero.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound` for a missing invoice, or
    /// `AmountPrecision`/`AmountTooLarge` for an amount that cannot be stored.
    pub async fn release_limit(
        &self,
        user_id: Uuid,
        invoice_id: Uuid,
        amount: Decimal,
    ) -> Result<invoices::Model, LimitError> {
        find_active(&self.db, invoice_id, Some(user_id)).await?;
        if amount > Decimal::ZERO {
            Invoice::validate_amount(amount)?;
        }
        release(&self.db, invoice_id, amount).await?;

        info!(invoice_id = %invoice_id, amount = %amount, "Credit limit released");
        find_active(&self.db, invoice_id, Some(user_id)).await
    }

    /// Resizes the invoice's credit limit.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound`, `LimitBelowUsage` or `NonPositiveLimit`.
    pub async fn update_credit_limit(
        &self,
        user_id: Uuid,
        invoice_id: Uuid,
        new_limit: Decimal,
    ) -> Result<invoices::Model, LimitError> {
        let invoice = resize(&self.db, invoice_id, Some(user_id), new_limit).await?;
        info!(invoice_id = %invoice_id, new_limit = %new_limit, "Credit limit updated");
        Ok(invoice)
    }

    /// Non-failing pre-check for a transaction about to be created.
    ///
    /// Lets everything through that is not an expense billed to an invoice.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn validate_transaction_with_limit(
        &self,
        user_id: Uuid,
        invoice_id: Option<Uuid>,
        amount: Decimal,
        transaction_type: TransactionType,
    ) -> Result<LimitCheck, DbErr> {
        let invoice_id = match invoice_id {
            Some(id) if LimitService::applies(transaction_type, true) => id,
            _ => return Ok(LimitCheck::allowed()),
        };

        let invoice = invoices::Entity::find_by_id(invoice_id)
            .filter(invoices::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .map(|model| model.into_domain(Vec::new()));

        Ok(LimitService::evaluate(invoice.as_ref(), amount))
    }

    /// Limit snapshot of one invoice.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound` for a missing invoice.
    pub async fn limit_info(&self, user_id: Uuid, invoice_id: Uuid) -> Result<LimitInfo, LimitError> {
        let model = find_active(&self.db, invoice_id, Some(user_id)).await?;
        let invoice = attach_cards(&self.db, vec![model])
            .await?
            .pop()
            .ok_or(LimitError::InvoiceNotFound(invoice_id))?;

        Ok(LimitService::info(&invoice))
    }

    /// Overview of all the user's active invoices.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn user_overview(&self, user_id: Uuid) -> Result<Vec<InvoiceLimitSummary>, DbErr> {
        let invoices = self.active_invoices(user_id).await?;
        Ok(invoices.iter().map(LimitService::summary).collect())
    }

    /// Aggregate limit usage over the user's invoices that have a limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn statistics(&self, user_id: Uuid) -> Result<LimitStatistics, DbErr> {
        let invoices = self.active_invoices(user_id).await?;
        Ok(LimitService::statistics(&invoices))
    }

    async fn active_invoices(&self, user_id: Uuid) -> Result<Vec<Invoice>, DbErr> {
        let models = invoices::Entity::find()
            .filter(invoices::Column::UserId.eq(user_id))
            .filter(invoices::Column::IsActive.eq(true))
            .order_by_asc(invoices::Column::DisplayOrder)
            .order_by_asc(invoices::Column::Name)
            .all(&self.db)
            .await?;

        attach_cards(&self.db, models).await
    }
}
