//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod health;
pub mod invoices;
pub mod payment_methods;
pub mod transactions;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(invoices::routes())
        .merge(transactions::routes())
        .merge(payment_methods::routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}


#[cfg(test)]
mod tests {
    use super::test_support::{request, test_app, test_state};
    use axum::http::StatusCode;
    use tally_shared::config::Environment;

    #[tokio::test]
    async fn test_rejects_malformed_token() {
        let (app, _) = test_app(test_state(Environment::Development));
        let response = request(
            app,
            "GET",
            "/api/v1/payment-methods",
            Some("not.a.jwt"),
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (app, token) = test_app(test_state(Environment::Development));
        let response = request(app, "GET", "/api/v1/accounts", Some(&token), None).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
