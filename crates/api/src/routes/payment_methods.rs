//! Payment method routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, put},
};
use serde::Deserialize;
use serde_json::json;
use tally_core::invoice::PaymentMethodKind;
use tally_db::repositories::{CreatePaymentMethodInput, PaymentMethodRepository};
use tally_shared::AppError;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, db_error};
use crate::{AppState, middleware::AuthUser};

/// Creates the payment method routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payment-methods", get(list_payment_methods).post(create_payment_method))
        .route("/payment-methods/{payment_method_id}", delete(delete_payment_method))
        .route("/payment-methods/{payment_method_id}/invoice", put(attach_invoice))
}

/// Request body for creating a payment method.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentMethodRequest {
    /// Display name, unique per user.
    pub name: String,
    /// Kind, e.g. `credit_card` or `pix`.
    pub kind: String,
    /// Last four card digits.
    pub last_four_digits: Option<String>,
    /// Invoice a credit card bills to.
    pub invoice_id: Option<Uuid>,
    /// Display color.
    pub color: Option<String>,
    /// Display icon.
    pub icon: Option<String>,
    /// Display order.
    pub order: Option<i32>,
}

/// Request body for attaching a card to an invoice; `null` detaches it.
#[derive(Debug, Deserialize)]
pub struct AttachInvoiceRequest {
    /// Target invoice.
    pub invoice_id: Option<Uuid>,
}

/// GET `/payment-methods`
async fn list_payment_methods(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let repo = PaymentMethodRepository::new((*state.db).clone());
    let methods = repo.list(auth.user_id()).await.map_err(db_error)?;

    Ok(Json(json!({ "payment_methods": methods })))
}

/// POST `/payment-methods`
async fn create_payment_method(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreatePaymentMethodRequest>,
) -> ApiResult<impl IntoResponse> {
    let Some(kind) = PaymentMethodKind::parse(&payload.kind) else {
        return Err(ApiError(AppError::Validation(format!(
            "Unknown payment method kind '{}'",
            payload.kind
        ))));
    };

    let repo = PaymentMethodRepository::new((*state.db).clone());
    let created = repo
        .create(
            auth.user_id(),
            CreatePaymentMethodInput {
                name: payload.name,
                kind,
                last_four_digits: payload.last_four_digits,
                invoice_id: payload.invoice_id,
                color: payload.color,
                icon: payload.icon,
                order: payload.order,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE `/payment-methods/{payment_method_id}`
async fn delete_payment_method(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(payment_method_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let repo = PaymentMethodRepository::new((*state.db).clone());
    repo.remove(auth.user_id(), payment_method_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// PUT `/payment-methods/{payment_method_id}/invoice`
async fn attach_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(payment_method_id): Path<Uuid>,
    Json(payload): Json<AttachInvoiceRequest>,
) -> ApiResult<impl IntoResponse> {
    let repo = PaymentMethodRepository::new((*state.db).clone());
    let updated = repo
        .attach_to_invoice(auth.user_id(), payment_method_id, payload.invoice_id)
        .await?;

    Ok(Json(updated))
}
