//! Transaction routes.
//!
//! Expenses billed to an invoice reserve its credit limit on create and give
//! it back on cancel or delete.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tally_core::transaction::{TransactionDraft, TransactionStatus, TransactionType};
use tally_db::repositories::{TransactionFilter, TransactionRepository, UpdateTransactionInput};
use tally_shared::AppError;
use tally_shared::types::{InvoiceId, PageRequest, PageResponse, PaymentMethodId};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, db_error};
use crate::{AppState, middleware::AuthUser};

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route(
            "/transactions/{transaction_id}",
            get(get_transaction)
                .patch(update_transaction)
                .delete(delete_transaction),
        )
        .route("/transactions/{transaction_id}/complete", post(complete_transaction))
        .route("/transactions/{transaction_id}/cancel", post(cancel_transaction))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing transactions.
#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsQuery {
    /// Filter by status.
    pub status: Option<String>,
    /// Filter by transaction type.
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// Filter by invoice.
    pub invoice_id: Option<Uuid>,
    /// Filter by date range start (YYYY-MM-DD).
    pub from: Option<NaiveDate>,
    /// Filter by date range end (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Request body for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Description.
    pub description: String,
    /// Amount, positive.
    pub amount: Decimal,
    /// `income` or `expense`.
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// Initial status; `completed` when absent.
    pub status: Option<String>,
    /// Date of the purchase or receipt.
    pub transaction_date: NaiveDate,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Total number of installments.
    pub installments_total: Option<i16>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Category reference.
    pub category_id: Option<Uuid>,
    /// Payment method used.
    pub payment_method_id: Option<Uuid>,
    /// Invoice the expense is billed to.
    pub invoice_id: Option<Uuid>,
}

/// Request body for updating a transaction.
///
/// Absent fields stay unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTransactionRequest {
    /// New description.
    pub description: Option<String>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New transaction date.
    pub transaction_date: Option<NaiveDate>,
    /// New due date.
    pub due_date: Option<NaiveDate>,
    /// New notes.
    pub notes: Option<String>,
    /// New category.
    pub category_id: Option<Uuid>,
}

fn parse_type(value: &str) -> Result<TransactionType, ApiError> {
    TransactionType::parse(value).ok_or_else(|| {
        ApiError(AppError::Validation(format!(
            "Unknown transaction type '{value}'"
        )))
    })
}

fn parse_status(value: &str) -> Result<TransactionStatus, ApiError> {
    TransactionStatus::parse(value).ok_or_else(|| {
        ApiError(AppError::Validation(format!(
            "Unknown transaction status '{value}'"
        )))
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/transactions` - Paginated list with optional filters.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = TransactionFilter {
        status: query.status.as_deref().map(parse_status).transpose()?,
        transaction_type: query.transaction_type.as_deref().map(parse_type).transpose()?,
        invoice_id: query.invoice_id,
        from: query.from,
        to: query.to,
    };
    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    }
    .normalized();

    let repo = TransactionRepository::new((*state.db).clone());
    let (rows, total) = repo
        .list(auth.user_id(), &filter, &page)
        .await
        .map_err(db_error)?;

    Ok(Json(PageResponse::new(rows, page.page, page.per_page, total)))
}

/// POST `/transactions` - Create a transaction, splitting installments.
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTransactionRequest>,
) -> ApiResult<impl IntoResponse> {
    let draft = TransactionDraft {
        transaction_type: parse_type(&payload.transaction_type)?,
        status: payload
            .status
            .as_deref()
            .map(parse_status)
            .transpose()?
            .unwrap_or_default(),
        description: payload.description,
        amount: payload.amount,
        transaction_date: payload.transaction_date,
        due_date: payload.due_date,
        installments_current: None,
        installments_total: payload.installments_total,
        notes: payload.notes,
        category_id: payload.category_id,
        payment_method_id: payload.payment_method_id.map(PaymentMethodId::from_uuid),
        invoice_id: payload.invoice_id.map(InvoiceId::from_uuid),
    };

    let repo = TransactionRepository::new((*state.db).clone());
    let created = repo.create(auth.user_id(), draft).await?;

    info!(
        transaction_id = %created.transaction.id,
        installments = created.installments.len(),
        "Transaction created"
    );

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET `/transactions/{transaction_id}` - One transaction with its installments.
async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let repo = TransactionRepository::new((*state.db).clone());
    Ok(Json(
        repo.find_with_installments(auth.user_id(), transaction_id)
            .await?,
    ))
}

/// PATCH `/transactions/{transaction_id}` - Update fields and adjust the
/// reservation when the amount changes.
async fn update_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> ApiResult<impl IntoResponse> {
    let input = UpdateTransactionInput {
        description: payload.description,
        amount: payload.amount,
        transaction_date: payload.transaction_date,
        due_date: payload.due_date.map(Some),
        notes: payload.notes.map(Some),
        category_id: payload.category_id.map(Some),
    };

    let repo = TransactionRepository::new((*state.db).clone());
    Ok(Json(repo.update(auth.user_id(), transaction_id, input).await?))
}

/// DELETE `/transactions/{transaction_id}` - Soft-delete, releasing the limit.
async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let repo = TransactionRepository::new((*state.db).clone());
    repo.delete(auth.user_id(), transaction_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST `/transactions/{transaction_id}/complete` - Mark as completed.
async fn complete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let repo = TransactionRepository::new((*state.db).clone());
    Ok(Json(repo.complete(auth.user_id(), transaction_id).await?))
}

/// POST `/transactions/{transaction_id}/cancel` - Cancel with its
/// installments, releasing the limit.
async fn cancel_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let repo = TransactionRepository::new((*state.db).clone());
    repo.cancel(auth.user_id(), transaction_id).await?;

    Ok(Json(
        repo.find_with_installments(auth.user_id(), transaction_id)
            .await?,
    ))
}
