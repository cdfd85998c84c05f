//! Invoice routes: CRUD, lifecycle actions, credit-limit views and the manual
//! scheduler trigger.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tally_core::invoice::InvoiceStatus;
use tally_db::InvoiceScheduler;
use tally_db::repositories::{
    CreateInvoiceInput, InvoiceLimitRepository, InvoiceRepository, UpdateInvoiceInput,
};
use tally_shared::AppError;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, db_error};
use crate::{AppState, middleware::AuthUser};

/// Creates the invoice routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route("/invoices/defaults", post(create_default_invoices))
        .route("/invoices/statuses", get(list_statuses))
        .route("/invoices/status/{status}", get(list_by_status))
        .route("/invoices/limits/overview", get(limits_overview))
        .route("/invoices/limits/statistics", get(limits_statistics))
        .route("/invoices/scheduler/run", post(run_scheduler))
        .route(
            "/invoices/{invoice_id}",
            get(get_invoice).patch(update_invoice).delete(delete_invoice),
        )
        .route("/invoices/{invoice_id}/close", post(close_invoice))
        .route("/invoices/{invoice_id}/pay", post(pay_invoice))
        .route("/invoices/{invoice_id}/limit-info", get(limit_info))
        .route("/invoices/{invoice_id}/credit-limit", patch(update_credit_limit))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing invoices.
#[derive(Debug, Default, Deserialize)]
pub struct ListInvoicesQuery {
    /// Include soft-deleted invoices.
    #[serde(default)]
    pub include_inactive: bool,
}

/// Request body for creating an invoice.
#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
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

/// Request body for updating an invoice.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateInvoiceRequest {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New closing day.
    pub closing_day: Option<i16>,
    /// New due day.
    pub due_day: Option<i16>,
    /// Date the cycle is due to close (YYYY-MM-DD).
    pub closing_date: Option<NaiveDate>,
    /// Payment due date (YYYY-MM-DD).
    pub due_date: Option<NaiveDate>,
    /// New color.
    pub color: Option<String>,
    /// New icon.
    pub icon: Option<String>,
    /// New display order.
    pub order: Option<i32>,
}

/// Request body for closing an invoice by hand.
#[derive(Debug, Default, Deserialize)]
pub struct CloseInvoiceRequest {
    /// Billed total; computed from the invoice's expenses when absent.
    pub total_amount: Option<Decimal>,
    /// Closing date; today when absent.
    pub closing_date: Option<NaiveDate>,
}

/// Request body for paying an invoice.
#[derive(Debug, Default, Deserialize)]
pub struct PayInvoiceRequest {
    /// Payment date; today when absent.
    pub payment_date: Option<NaiveDate>,
}

/// Request body for resizing the credit limit.
#[derive(Debug, Deserialize)]
pub struct UpdateCreditLimitRequest {
    /// New credit limit.
    pub credit_limit: Decimal,
}

/// Request body for the manual scheduler trigger.
#[derive(Debug, Default, Deserialize)]
pub struct RunSchedulerRequest {
    /// Day to process; today when absent.
    pub date: Option<NaiveDate>,
}

/// One entry of the status list.
#[derive(Debug, Serialize)]
pub struct StatusOption {
    /// Status value.
    pub value: InvoiceStatus,
    /// Human-readable description.
    pub description: &'static str,
}

// ============================================================================
// CRUD
// ============================================================================

/// GET `/invoices` - List the user's invoices.
async fn list_invoices(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListInvoicesQuery>,
) -> ApiResult<impl IntoResponse> {
    let repo = InvoiceRepository::new((*state.db).clone());
    let invoices = repo
        .list(auth.user_id(), query.include_inactive)
        .await
        .map_err(db_error)?;

    Ok(Json(json!({ "invoices": invoices })))
}

/// POST `/invoices` - Create an invoice.
async fn create_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateInvoiceRequest>,
) -> ApiResult<impl IntoResponse> {
    let repo = InvoiceRepository::new((*state.db).clone());
    let created = repo
        .create(
            auth.user_id(),
            CreateInvoiceInput {
                name: payload.name,
                description: payload.description,
                closing_day: payload.closing_day,
                due_day: payload.due_day,
                credit_limit: payload.credit_limit,
                color: payload.color,
                icon: payload.icon,
                order: payload.order,
            },
        )
        .await?;

    let invoice = repo.find(auth.user_id(), created.id).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// POST `/invoices/defaults` - Create the starter invoices.
async fn create_default_invoices(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let repo = InvoiceRepository::new((*state.db).clone());
    let created = repo.create_defaults(auth.user_id()).await?;

    Ok((StatusCode::CREATED, Json(json!({ "invoices": created }))))
}

/// GET `/invoices/statuses` - List the statuses with their descriptions.
async fn list_statuses(_auth: AuthUser) -> impl IntoResponse {
    let statuses: Vec<StatusOption> = InvoiceStatus::ALL
        .into_iter()
        .map(|value| StatusOption {
            value,
            description: value.description(),
        })
        .collect();

    Json(json!({ "statuses": statuses }))
}

/// GET `/invoices/status/{status}` - List invoices in one status.
async fn list_by_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(status): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let Some(status) = InvoiceStatus::parse(&status) else {
        return Err(ApiError(AppError::Validation(format!(
            "Unknown invoice status '{status}'"
        ))));
    };

    let repo = InvoiceRepository::new((*state.db).clone());
    let invoices = repo
        .find_by_status(auth.user_id(), status)
        .await
        .map_err(db_error)?;

    Ok(Json(json!({ "invoices": invoices })))
}

/// GET `/invoices/{invoice_id}` - Get one invoice with its cards.
async fn get_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invoice_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let repo = InvoiceRepository::new((*state.db).clone());
    Ok(Json(repo.find(auth.user_id(), invoice_id).await?))
}

/// PATCH `/invoices/{invoice_id}` - Update names, days and display fields.
async fn update_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<UpdateInvoiceRequest>,
) -> ApiResult<impl IntoResponse> {
    let repo = InvoiceRepository::new((*state.db).clone());
    repo.update(
        auth.user_id(),
        invoice_id,
        UpdateInvoiceInput {
            name: payload.name,
            description: payload.description.map(Some),
            closing_day: payload.closing_day,
            due_day: payload.due_day,
            closing_date: payload.closing_date.map(Some),
            due_date: payload.due_date.map(Some),
            color: payload.color,
            icon: payload.icon,
            order: payload.order,
        },
    )
    .await?;

    Ok(Json(repo.find(auth.user_id(), invoice_id).await?))
}

/// DELETE `/invoices/{invoice_id}` - Soft-delete an invoice.
async fn delete_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invoice_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let repo = InvoiceRepository::new((*state.db).clone());
    repo.remove(auth.user_id(), invoice_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Lifecycle
// ============================================================================

/// POST `/invoices/{invoice_id}/close` - Close an open invoice.
async fn close_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invoice_id): Path<Uuid>,
    payload: Option<Json<CloseInvoiceRequest>>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload.unwrap_or_default();
    let on = payload.closing_date.unwrap_or_else(|| state.today());

    let repo = InvoiceRepository::new((*state.db).clone());
    repo.close(auth.user_id(), invoice_id, payload.total_amount, on)
        .await?;

    Ok(Json(repo.find(auth.user_id(), invoice_id).await?))
}

/// POST `/invoices/{invoice_id}/pay` - Record payment.
async fn pay_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invoice_id): Path<Uuid>,
    payload: Option<Json<PayInvoiceRequest>>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload.unwrap_or_default();
    let on = payload.payment_date.unwrap_or_else(|| state.today());

    let repo = InvoiceRepository::new((*state.db).clone());
    repo.pay(auth.user_id(), invoice_id, on).await?;

    Ok(Json(repo.find(auth.user_id(), invoice_id).await?))
}

// ============================================================================
// Credit limit
// ============================================================================

/// GET `/invoices/{invoice_id}/limit-info` - Limit snapshot.
async fn limit_info(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invoice_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let repo = InvoiceLimitRepository::new((*state.db).clone());
    Ok(Json(repo.limit_info(auth.user_id(), invoice_id).await?))
}

/// PATCH `/invoices/{invoice_id}/credit-limit` - Resize the credit limit.
async fn update_credit_limit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<UpdateCreditLimitRequest>,
) -> ApiResult<impl IntoResponse> {
    let repo = InvoiceLimitRepository::new((*state.db).clone());
    repo.update_credit_limit(auth.user_id(), invoice_id, payload.credit_limit)
        .await?;

    Ok(Json(repo.limit_info(auth.user_id(), invoice_id).await?))
}

/// GET `/invoices/limits/overview` - Limit summary of every invoice.
async fn limits_overview(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let repo = InvoiceLimitRepository::new((*state.db).clone());
    let invoices = repo.user_overview(auth.user_id()).await.map_err(db_error)?;

    Ok(Json(json!({ "invoices": invoices })))
}

/// GET `/invoices/limits/statistics` - Aggregate limit usage.
async fn limits_statistics(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let repo = InvoiceLimitRepository::new((*state.db).clone());
    Ok(Json(repo.statistics(auth.user_id()).await.map_err(db_error)?))
}

// ============================================================================
// Scheduler
// ============================================================================

/// POST `/invoices/scheduler/run` - Run the daily phases now.
///
/// Refused in production, where only the daily job runs them.
async fn run_scheduler(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Option<Json<RunSchedulerRequest>>,
) -> ApiResult<impl IntoResponse> {
    if state.environment.is_production() {
        return Err(ApiError(AppError::InvalidOperation(
            "Manual scheduler runs are disabled in production".to_string(),
        )));
    }

    let Json(payload) = payload.unwrap_or_default();
    let day = payload.date.unwrap_or_else(|| state.today());
    info!(user_id = %auth.user_id(), date = %day, "Manual scheduler run requested");

    let scheduler = InvoiceScheduler::new((*state.db).clone(), state.scheduler);
    let report = scheduler.run_daily(day).await.map_err(db_error)?;

    Ok(Json(report))
}
