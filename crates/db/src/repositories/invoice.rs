//! Invoice repository for database operations.
//!
//! Status changes go through conditional updates keyed on the status the
//! invoice is expected to be in, so a manual close racing the scheduler
//! leaves exactly one winner.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use tally_core::invoice::{
    AttachedCard, DEFAULT_COLOR, DEFAULT_ICON, Invoice, InvoiceError,
    InvoiceStatus as DomainInvoiceStatus,
};
use tally_shared::AppError;
use tracing::info;
use uuid::Uuid;

use crate::entities::{
    invoices, payment_methods,
    sea_orm_active_enums::{InvoiceStatus, TransactionStatus, TransactionType},
    transactions,
};

/// Error types for invoice operations.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceRepoError {
    /// Invoice not found.
    #[error("Invoice not found: {0}")]
    NotFound(Uuid),

    /// An active invoice with this name already exists for the user.
    #[error("Invoice '{0}' already exists")]
    DuplicateName(String),

    /// Name is empty.
    #[error("Invoice name cannot be empty")]
    EmptyName,

    /// Active payment methods still point at the invoice.
    #[error("Invoice still has {0} payment method(s) attached")]
    HasPaymentMethods(u64),

    /// A domain rule rejected the change.
    #[error(transparent)]
    Domain(#[from] InvoiceError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<InvoiceRepoError> for AppError {
    fn from(err: InvoiceRepoError) -> Self {
        match err {
            InvoiceRepoError::NotFound(_) => Self::NotFound("Invoice not found".to_string()),
            InvoiceRepoError::DuplicateName(_) | InvoiceRepoError::HasPaymentMethods(_) => {
                Self::Conflict(err.to_string())
            }
            InvoiceRepoError::EmptyName => Self::Validation(err.to_string()),
            InvoiceRepoError::Domain(e) => e.into(),
            InvoiceRepoError::Database(e) => Self::Internal(e.to_string()),
        }
    }
}

/// Input for creating an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Closing day (1-31).
    pub closing_day: i16,
    /// Due day (1-31).
    pub due_day: i16,
    /// Optional credit limit.
    pub credit_limit: Option<Decimal>,
    /// Display color.
    pub color: Option<String>,
    /// Display icon.
    pub icon: Option<String>,
    /// Display order.
    pub order: Option<i32>,
}

/// Input for updating an invoice.
///
/// Status and usage are not editable here.
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoiceInput {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New closing day.
    pub closing_day: Option<i16>,
    /// New due day.
    pub due_day: Option<i16>,
    /// Date the cycle is due to close; manual close needs it set.
    pub closing_date: Option<Option<NaiveDate>>,
    /// Payment due date.
    pub due_date: Option<Option<NaiveDate>>,
    /// New color.
    pub color: Option<String>,
    /// New icon.
    pub icon: Option<String>,
    /// New display order.
    pub order: Option<i32>,
}

/// Invoices created for new users.
const DEFAULT_INVOICES: [(&str, i16, i16, &str, i32); 2] = [
    ("Fatura Nubank", 5, 10, "#8B5CF6", 1),
    ("Fatura Inter", 8, 13, "#FF6B6B", 2),
];

// ============================================================================
// Shared helpers
// ============================================================================

/// Loads the active payment methods of each invoice and builds the aggregates.
pub(crate) async fn attach_cards<C: ConnectionTrait>(
    conn: &C,
    models: Vec<invoices::Model>,
) -> Result<Vec<Invoice>, DbErr> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let cards = payment_methods::Entity::find()
        .filter(payment_methods::Column::InvoiceId.is_in(ids))
        .filter(payment_methods::Column::IsActive.eq(true))
        .order_by_asc(payment_methods::Column::DisplayOrder)
        .order_by_asc(payment_methods::Column::Name)
        .all(conn)
        .await?;

    let mut by_invoice: HashMap<Uuid, Vec<AttachedCard>> = HashMap::new();
    for card in cards {
        if let Some(invoice_id) = card.invoice_id {
            by_invoice.entry(invoice_id).or_default().push(card.into());
        }
    }

    Ok(models
        .into_iter()
        .map(|model| {
            let cards = by_invoice.remove(&model.id).unwrap_or_default();
            model.into_domain(cards)
        })
        .collect())
}

/// Sum billed when an invoice closes.
///
/// Counts active, non-canceled expenses bound to the invoice. The summary
/// row of an installment purchase is skipped since its installments are
/// counted individually.
pub(crate) async fn closing_total<C: ConnectionTrait>(
    conn: &C,
    invoice_id: Uuid,
) -> Result<Decimal, DbErr> {
    let rows = transactions::Entity::find()
        .filter(transactions::Column::InvoiceId.eq(invoice_id))
        .filter(transactions::Column::IsActive.eq(true))
        .filter(transactions::Column::TransactionType.eq(TransactionType::Expense))
        .filter(transactions::Column::Status.ne(TransactionStatus::Canceled))
        .all(conn)
        .await?;

    Ok(rows
        .iter()
        .filter(|t| !t.is_installment_parent())
        .map(|t| t.amount)
        .sum())
}

/// Closes an open invoice on `on`.
///
/// Returns `Ok(false)` when the invoice was no longer open by the time the
/// update ran.
pub(crate) async fn close_invoice<C: ConnectionTrait>(
    conn: &C,
    model: &invoices::Model,
    on: NaiveDate,
    total_amount: Decimal,
) -> Result<bool, InvoiceRepoError> {
    let mut invoice = model.clone().into_domain(Vec::new());
    invoice.close(on, total_amount)?;

    let result = invoices::Entity::update_many()
        .col_expr(invoices::Column::Status, InvoiceStatus::Closed.as_enum())
        .col_expr(invoices::Column::ClosingDate, Expr::value(invoice.closing_date))
        .col_expr(invoices::Column::DueDate, Expr::value(invoice.due_date))
        .col_expr(invoices::Column::TotalAmount, Expr::value(invoice.total_amount))
        .col_expr(invoices::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(invoices::Column::Id.eq(model.id))
        .filter(invoices::Column::Status.eq(InvoiceStatus::Open))
        .exec(conn)
        .await?;

    Ok(result.rows_affected > 0)
}

/// Flags a closed invoice as overdue.
///
/// Returns `Ok(false)` when the invoice was no longer closed.
pub(crate) async fn mark_overdue<C: ConnectionTrait>(
    conn: &C,
    model: &invoices::Model,
) -> Result<bool, InvoiceRepoError> {
    model.clone().into_domain(Vec::new()).mark_overdue()?;

    let result = invoices::Entity::update_many()
        .col_expr(invoices::Column::Status, InvoiceStatus::Overdue.as_enum())
        .col_expr(invoices::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(invoices::Column::Id.eq(model.id))
        .filter(invoices::Column::Status.eq(InvoiceStatus::Closed))
        .exec(conn)
        .await?;

    Ok(result.rows_affected > 0)
}

/// Inserts an invoice aggregate.
pub(crate) async fn insert_invoice<C: ConnectionTrait>(
    conn: &C,
    invoice: &Invoice,
) -> Result<invoices::Model, InvoiceRepoError> {
    let now = Utc::now().into();
    let model = invoices::ActiveModel {
        id: Set(invoice.id.into_inner()),
        user_id: Set(invoice.user_id.into_inner()),
        name: Set(invoice.name.clone()),
        description: Set(invoice.description.clone()),
        closing_day: Set(invoice.closing_day),
        due_day: Set(invoice.due_day),
        status: Set(invoice.status.into()),
        credit_limit: Set(invoice.credit_limit),
        used_limit: Set(invoice.used_limit),
        total_amount: Set(invoice.total_amount),
        closing_date: Set(invoice.closing_date),
        due_date: Set(invoice.due_date),
        payment_date: Set(invoice.payment_date),
        color: Set(invoice.color.clone()),
        icon: Set(invoice.icon.clone()),
        display_order: Set(invoice.order),
        is_active: Set(invoice.is_active),
        created_at: Set(now),
        updated_at: Set(now),
    };

    model.insert(conn).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            InvoiceRepoError::DuplicateName(invoice.name.clone())
        }
        _ => InvoiceRepoError::Database(e),
    })
}

/// Returns true if the user already has an active invoice named `name`.
pub(crate) async fn name_taken<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    name: &str,
    except: Option<Uuid>,
) -> Result<bool, DbErr> {
    let mut query = invoices::Entity::find()
        .filter(invoices::Column::UserId.eq(user_id))
        .filter(invoices::Column::Name.eq(name))
        .filter(invoices::Column::IsActive.eq(true));
    if let Some(id) = except {
        query = query.filter(invoices::Column::Id.ne(id));
    }

    Ok(query.count(conn).await? > 0)
}

// ============================================================================
// Repository
// ============================================================================

/// Invoice repository for CRUD and lifecycle operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an invoice.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name is empty or already used by an active invoice
    /// - A day is outside 1-31 or the credit limit is not positive
    /// - Database operation fails
    pub async fn create(
        &self,
        user_id: Uuid,
        input: CreateInvoiceInput,
    ) -> Result<invoices::Model, InvoiceRepoError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(InvoiceRepoError::EmptyName);
        }
        Invoice::validate_name(&name)?;
        Invoice::validate_description(input.description.as_deref())?;

        let mut invoice = Invoice::new(
            user_id.into(),
            name.clone(),
            input.closing_day,
            input.due_day,
        )?;
        if let Some(limit) = input.credit_limit {
            invoice.update_credit_limit(limit)?;
        }
        invoice.description = input.description;
        invoice.color = input.color.unwrap_or_else(|| DEFAULT_COLOR.to_string());
        invoice.icon = input.icon.unwrap_or_else(|| DEFAULT_ICON.to_string());
        invoice.order = input.order.unwrap_or(0);

        if name_taken(&self.db, user_id, &name, None).await? {
            return Err(InvoiceRepoError::DuplicateName(name));
        }

        let model = insert_invoice(&self.db, &invoice).await?;
        info!(invoice_id = %model.id, user_id = %user_id, "Invoice created");
        Ok(model)
    }

    /// Lists the user's invoices ordered by display order, then name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, user_id: Uuid, include_inactive: bool) -> Result<Vec<Invoice>, DbErr> {
        let mut query = invoices::Entity::find().filter(invoices::Column::UserId.eq(user_id));
        if !include_inactive {
            query = query.filter(invoices::Column::IsActive.eq(true));
        }

        let models = query
            .order_by_asc(invoices::Column::DisplayOrder)
            .order_by_asc(invoices::Column::Name)
            .all(&self.db)
            .await?;

        attach_cards(&self.db, models).await
    }

    /// Finds one of the user's active invoices with its attached cards.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the invoice is missing, inactive or owned by
    /// someone else.
    pub async fn find(&self, user_id: Uuid, invoice_id: Uuid) -> Result<Invoice, InvoiceRepoError> {
        let model = self.find_model(user_id, invoice_id).await?;
        attach_cards(&self.db, vec![model])
            .await?
            .pop()
            .ok_or(InvoiceRepoError::NotFound(invoice_id))
    }

    async fn find_model(
        &self,
        user_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<invoices::Model, InvoiceRepoError> {
        invoices::Entity::find_by_id(invoice_id)
            .filter(invoices::Column::UserId.eq(user_id))
            .filter(invoices::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or(InvoiceRepoError::NotFound(invoice_id))
    }

    /// Updates descriptive fields and billing days.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice is not found, the new name is taken,
    /// a day is out of range, or the database operation fails.
    pub async fn update(
        &self,
        user_id: Uuid,
        invoice_id: Uuid,
        input: UpdateInvoiceInput,
    ) -> Result<invoices::Model, InvoiceRepoError> {
        let invoice = self.find_model(user_id, invoice_id).await?;
        let mut active: invoices::ActiveModel = invoice.into();

        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(InvoiceRepoError::EmptyName);
            }
            Invoice::validate_name(&name)?;
            if name_taken(&self.db, user_id, &name, Some(invoice_id)).await? {
                return Err(InvoiceRepoError::DuplicateName(name));
            }
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            Invoice::validate_description(description.as_deref())?;
            active.description = Set(description);
        }
        if let Some(day) = input.closing_day {
            Invoice::validate_day("closing_day", day)?;
            active.closing_day = Set(day);
        }
        if let Some(day) = input.due_day {
            Invoice::validate_day("due_day", day)?;
            active.due_day = Set(day);
        }
        if let Some(date) = input.closing_date {
            active.closing_date = Set(date);
        }
        if let Some(date) = input.due_date {
            active.due_date = Set(date);
        }
        if let Some(color) = input.color {
            active.color = Set(color);
        }
        if let Some(icon) = input.icon {
            active.icon = Set(icon);
        }
        if let Some(order) = input.order {
            active.display_order = Set(order);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Soft-deletes an invoice.
    ///
    /// # Errors
    ///
    /// Returns `HasPaymentMethods` while active payment methods are attached.
    pub async fn remove(&self, user_id: Uuid, invoice_id: Uuid) -> Result<(), InvoiceRepoError> {
        let invoice = self.find_model(user_id, invoice_id).await?;

        let attached = payment_methods::Entity::find()
            .filter(payment_methods::Column::InvoiceId.eq(invoice_id))
            .filter(payment_methods::Column::IsActive.eq(true))
            .count(&self.db)
            .await?;
        if attached > 0 {
            return Err(InvoiceRepoError::HasPaymentMethods(attached));
        }

        let mut active: invoices::ActiveModel = invoice.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await?;

        info!(invoice_id = %invoice_id, "Invoice removed");
        Ok(())
    }

    /// Active invoices in `status`, ordered by due date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_status(
        &self,
        user_id: Uuid,
        status: DomainInvoiceStatus,
    ) -> Result<Vec<Invoice>, DbErr> {
        let models = invoices::Entity::find()
            .filter(invoices::Column::UserId.eq(user_id))
            .filter(invoices::Column::IsActive.eq(true))
            .filter(invoices::Column::Status.eq(InvoiceStatus::from(status)))
            .order_by_asc(invoices::Column::DueDate)
            .order_by_asc(invoices::Column::Name)
            .all(&self.db)
            .await?;

        attach_cards(&self.db, models).await
    }

    /// Closes an open invoice by hand on `on`.
    ///
    /// The invoice must have a closing date set (see
    /// [`Invoice::can_close`]); it is replaced by `on`. `total_amount`
    /// defaults to the sum of the invoice's expenses.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the invoice is open,
    /// `ClosingDateNotSet` when no closing date was set, or `AmountPrecision`
    /// for a total that cannot be stored.
    pub async fn close(
        &self,
        user_id: Uuid,
        invoice_id: Uuid,
        total_amount: Option<Decimal>,
        on: NaiveDate,
    ) -> Result<invoices::Model, InvoiceRepoError> {
        let invoice = self.find_model(user_id, invoice_id).await?;
        invoice.clone().into_domain(Vec::new()).check_manual_close()?;
        let total = match total_amount {
            Some(total) => {
                Invoice::validate_money(total)?;
                total
            }
            None => closing_total(&self.db, invoice_id).await?,
        };

        if !close_invoice(&self.db, &invoice, on, total).await? {
            let current = self.find_model(user_id, invoice_id).await?;
            return Err(InvoiceError::InvalidTransition {
                from: current.status.into(),
                to: DomainInvoiceStatus::Closed,
            }
            .into());
        }

        info!(invoice_id = %invoice_id, total = %total, "Invoice closed manually");
        self.find_model(user_id, invoice_id).await
    }

    /// Records payment of a closed or overdue invoice.
    ///
    /// # Errors
    ///
    /// Returns `NotPayable` unless the invoice is closed or overdue.
    pub async fn pay(
        &self,
        user_id: Uuid,
        invoice_id: Uuid,
        on: NaiveDate,
    ) -> Result<invoices::Model, InvoiceRepoError> {
        let invoice = self.find_model(user_id, invoice_id).await?;
        let mut domain = invoice.clone().into_domain(Vec::new());
        domain.pay(on)?;

        let result = invoices::Entity::update_many()
            .col_expr(invoices::Column::Status, InvoiceStatus::Paid.as_enum())
            .col_expr(invoices::Column::PaymentDate, Expr::value(on))
            .col_expr(invoices::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(invoices::Column::Id.eq(invoice_id))
            .filter(invoices::Column::Status.is_in([InvoiceStatus::Closed, InvoiceStatus::Overdue]))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            let current = self.find_model(user_id, invoice_id).await?;
            return Err(InvoiceError::NotPayable(current.status.into()).into());
        }

        info!(invoice_id = %invoice_id, "Invoice paid");
        self.find_model(user_id, invoice_id).await
    }

    /// Creates the starter invoices, skipping names the user already has.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn create_defaults(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<invoices::Model>, InvoiceRepoError> {
        let mut created = Vec::with_capacity(DEFAULT_INVOICES.len());

        for (name, closing_day, due_day, color, order) in DEFAULT_INVOICES {
            if name_taken(&self.db, user_id, name, None).await? {
                continue;
            }

            let mut invoice = Invoice::new(user_id.into(), name, closing_day, due_day)?;
            invoice.color = color.to_string();
            invoice.order = order;

            match insert_invoice(&self.db, &invoice).await {
                Ok(model) => created.push(model),
                Err(InvoiceRepoError::DuplicateName(_)) => {}
                Err(e) => return Err(e),
            }
        }

        info!(user_id = %user_id, count = created.len(), "Default invoices created");
        Ok(created)
    }
}
