//! Mapping of application errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde_json::json;
use tally_shared::AppError;
use tracing::error;

/// Error returned by handlers.
///
/// Anything convertible into [`AppError`] converts into this, so handlers can
/// use `?` on repository results directly.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl<E> From<E> for ApiError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        if !err.is_domain() {
            error!(error = %err, "Request failed");
        }

        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut body = json!({
            "error": err.error_code(),
            "message": err.public_message(),
        });
        if let AppError::InsufficientLimit {
            available,
            requested,
        } = &err
        {
            body["available"] = json!(available);
            body["requested"] = json!(requested);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Maps a raw database error to an internal error.
#[allow(clippy::needless_pass_by_value)]
pub fn db_error(err: DbErr) -> ApiError {
    ApiError(AppError::Internal(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rust_decimal_macros::dec;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = ApiError(err).into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_insufficient_limit_carries_amounts() {
        let (status, body) = render(AppError::InsufficientLimit {
            available: dec!(600),
            requested: dec!(700),
        })
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "insufficient_limit");
        assert_eq!(body["available"], "600");
        assert_eq!(body["requested"], "700");
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let (status, body) = render(AppError::Internal("pool timed out".into())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal_error");
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_not_found_keeps_message() {
        let (status, body) = render(AppError::NotFound("Invoice not found".into())).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Invoice not found");
        assert!(body.get("available").is_none());
    }
}
