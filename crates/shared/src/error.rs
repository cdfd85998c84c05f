//! Application-wide error types.
//!
//! Domain failures (`NotFound`, `InvalidOperation`, `InsufficientLimit`,
//! `Conflict`) carry a message meant for the end user. Everything else ends
//! up as `Internal`, whose message is never shown to clients.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Referenced resource does not exist or is inactive for this user.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request payload is malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation violates a structural invariant.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Credit limit cannot cover the requested amount.
    #[error("Insufficient limit. Available: {available}, Required: {requested}")]
    InsufficientLimit {
        /// Headroom left on the invoice.
        available: Decimal,
        /// Amount that was asked for.
        requested: Decimal,
    },

    /// Conflict (e.g., duplicate name).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::Validation(_) | Self::InvalidOperation(_) => 400,
            Self::InsufficientLimit { .. } => 422,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_error",
            Self::InvalidOperation(_) => "invalid_operation",
            Self::InsufficientLimit { .. } => "insufficient_limit",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Returns the message that may be shown to a client.
    ///
    /// Internal errors collapse to a generic text; the cause is expected to
    /// be logged where it was raised.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Unauthorized(msg)
            | Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::InvalidOperation(msg)
            | Self::Conflict(msg) => msg.clone(),
            Self::InsufficientLimit { .. } => self.to_string(),
            Self::Internal(_) => "An internal error occurred".to_string(),
        }
    }

    /// Returns true for errors the caller caused and can act on.
    #[must_use]
    pub const fn is_domain(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(AppError::Unauthorized(String::new()), 401, "unauthorized")]
    #[case(AppError::NotFound(String::new()), 404, "not_found")]
    #[case(AppError::Validation(String::new()), 400, "validation_error")]
    #[case(AppError::InvalidOperation(String::new()), 400, "invalid_operation")]
    #[case(
        AppError::InsufficientLimit { available: dec!(1), requested: dec!(2) },
        422,
        "insufficient_limit"
    )]
    #[case(AppError::Conflict(String::new()), 409, "conflict")]
    #[case(AppError::Internal(String::new()), 500, "internal_error")]
    fn test_error_mapping(#[case] error: AppError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(error.status_code(), status);
        assert_eq!(error.error_code(), code);
    }

    #[test]
    fn test_insufficient_limit_message_names_both_amounts() {
        let err = AppError::InsufficientLimit {
            available: dec!(600.00),
            requested: dec!(700.00),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient limit. Available: 600.00, Required: 700.00"
        );
        assert_eq!(err.public_message(), err.to_string());
    }

    #[test]
    fn test_internal_message_is_hidden() {
        let err = AppError::Internal("connection reset by peer".into());
        assert_eq!(err.public_message(), "An internal error occurred");
        assert!(!err.is_domain());
    }

    #[test]
    fn test_domain_message_is_passed_through() {
        let err = AppError::Conflict("Invoice name already exists".into());
        assert_eq!(err.public_message(), "Invoice name already exists");
        assert!(err.is_domain());
    }
}
