//! Payment method repository.
//!
//! Only credit cards may be attached to an invoice; every card attached to
//! the same invoice draws on its shared credit limit.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use tally_core::invoice::PaymentMethodKind;
use tally_shared::AppError;
use tracing::info;
use uuid::Uuid;

use crate::entities::{invoices, payment_methods, sea_orm_active_enums::PaymentMethodType};

/// Icon given to payment methods created without one.
const DEFAULT_ICON: &str = "💳";

/// Error types for payment method operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentMethodRepoError {
    /// Payment method not found.
    #[error("Payment method not found: {0}")]
    NotFound(Uuid),

    /// Invoice to attach to not found.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(Uuid),

    /// An active payment method with this name already exists.
    #[error("Payment method '{0}' already exists")]
    DuplicateName(String),

    /// Only credit cards can be attached to an invoice.
    #[error("Only credit cards can be attached to an invoice")]
    NotCreditCard,

    /// Last four digits must be exactly four digits.
    #[error("Last four digits must be exactly 4 digits")]
    InvalidLastFour,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<PaymentMethodRepoError> for AppError {
    fn from(err: PaymentMethodRepoError) -> Self {
        match err {
            PaymentMethodRepoError::NotFound(_) => {
                Self::NotFound("Payment method not found".to_string())
            }
            PaymentMethodRepoError::InvoiceNotFound(_) => {
                Self::NotFound("Invoice not found".to_string())
            }
            PaymentMethodRepoError::DuplicateName(_) => Self::Conflict(err.to_string()),
            PaymentMethodRepoError::NotCreditCard => Self::InvalidOperation(err.to_string()),
            PaymentMethodRepoError::InvalidLastFour => Self::Validation(err.to_string()),
            PaymentMethodRepoError::Database(e) => Self::Internal(e.to_string()),
        }
    }
}

/// Input for creating a payment method.
#[derive(Debug, Clone)]
pub struct CreatePaymentMethodInput {
    /// Display name.
    pub name: String,
    /// Kind of payment method.
    pub kind: PaymentMethodKind,
    /// Last four card digits.
    pub last_four_digits: Option<String>,
    /// Invoice to attach to (credit cards only).
    pub invoice_id: Option<Uuid>,
    /// Display color.
    pub color: Option<String>,
    /// Display icon.
    pub icon: Option<String>,
    /// Display order.
    pub order: Option<i32>,
}

/// Payment method repository.
#[derive(Debug, Clone)]
pub struct PaymentMethodRepository {
    db: DatabaseConnection,
}

impl PaymentMethodRepository {
    /// Creates a new payment method repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a payment method, optionally attached to an invoice.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken, the digits are malformed, a
    /// non-credit card is attached, the invoice is missing, or the database
    /// operation fails.
    pub async fn create(
        &self,
        user_id: Uuid,
        input: CreatePaymentMethodInput,
    ) -> Result<payment_methods::Model, PaymentMethodRepoError> {
        if let Some(digits) = &input.last_four_digits
            && (digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()))
        {
            return Err(PaymentMethodRepoError::InvalidLastFour);
        }
        if let Some(invoice_id) = input.invoice_id {
            self.check_attachable(user_id, input.kind, invoice_id).await?;
        }

        let exists = payment_methods::Entity::find()
            .filter(payment_methods::Column::UserId.eq(user_id))
            .filter(payment_methods::Column::Name.eq(&input.name))
            .filter(payment_methods::Column::IsActive.eq(true))
            .count(&self.db)
            .await?;
        if exists > 0 {
            return Err(PaymentMethodRepoError::DuplicateName(input.name));
        }

        let now = Utc::now().into();
        let name = input.name;
        let model = payment_methods::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(user_id),
            name: Set(name.clone()),
            kind: Set(PaymentMethodType::from(input.kind)),
            last_four_digits: Set(input.last_four_digits),
            invoice_id: Set(input.invoice_id),
            color: Set(input
                .color
                .unwrap_or_else(|| tally_core::invoice::DEFAULT_COLOR.to_string())),
            icon: Set(input.icon.unwrap_or_else(|| DEFAULT_ICON.to_string())),
            display_order: Set(input.order.unwrap_or(0)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                PaymentMethodRepoError::DuplicateName(name)
            }
            _ => PaymentMethodRepoError::Database(e),
        })?;

        info!(payment_method_id = %created.id, user_id = %user_id, "Payment method created");
        Ok(created)
    }

    /// Lists the user's active payment methods.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<payment_methods::Model>, DbErr> {
        payment_methods::Entity::find()
            .filter(payment_methods::Column::UserId.eq(user_id))
            .filter(payment_methods::Column::IsActive.eq(true))
            .order_by_asc(payment_methods::Column::DisplayOrder)
            .order_by_asc(payment_methods::Column::Name)
            .all(&self.db)
            .await
    }

    /// Finds one of the user's active payment methods.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if missing, inactive or owned by someone else.
    pub async fn find(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<payment_methods::Model, PaymentMethodRepoError> {
        payment_methods::Entity::find_by_id(id)
            .filter(payment_methods::Column::UserId.eq(user_id))
            .filter(payment_methods::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or(PaymentMethodRepoError::NotFound(id))
    }

    /// Attaches a credit card to an invoice, or detaches it with `None`.
    ///
    /// # Errors
    ///
    /// Returns `NotCreditCard` when attaching anything else, or `NotFound`
    /// for a missing payment method or invoice.
    pub async fn attach_to_invoice(
        &self,
        user_id: Uuid,
        id: Uuid,
        invoice_id: Option<Uuid>,
    ) -> Result<payment_methods::Model, PaymentMethodRepoError> {
        let method = self.find(user_id, id).await?;
        if let Some(invoice_id) = invoice_id {
            self.check_attachable(user_id, method.kind.into(), invoice_id)
                .await?;
        }

        let mut active: payment_methods::ActiveModel = method.into();
        active.invoice_id = Set(invoice_id);
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&self.db).await?;
        info!(payment_method_id = %id, invoice_id = ?invoice_id, "Payment method invoice changed");
        Ok(updated)
    }

    /// Soft-deletes a payment method.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the payment method does not exist.
    pub async fn remove(&self, user_id: Uuid, id: Uuid) -> Result<(), PaymentMethodRepoError> {
        let method = self.find(user_id, id).await?;

        let mut active: payment_methods::ActiveModel = method.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await?;

        info!(payment_method_id = %id, "Payment method removed");
        Ok(())
    }

    async fn check_attachable(
        &self,
        user_id: Uuid,
        kind: PaymentMethodKind,
        invoice_id: Uuid,
    ) -> Result<(), PaymentMethodRepoError> {
        if kind != PaymentMethodKind::CreditCard {
            return Err(PaymentMethodRepoError::NotCreditCard);
        }

        let found = invoices::Entity::find_by_id(invoice_id)
            .filter(invoices::Column::UserId.eq(user_id))
            .filter(invoices::Column::IsActive.eq(true))
            .count(&self.db)
            .await?;
        if found == 0 {
            return Err(PaymentMethodRepoError::InvoiceNotFound(invoice_id));
        }

        Ok(())
    }
}
