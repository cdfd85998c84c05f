//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for invoices, their credit limits, transactions and
//!   payment methods
//! - Authentication middleware
//! - Error-to-response mapping
//! - The daily invoice job

pub mod error;
pub mod job;
pub mod middleware;
pub mod routes;

use axum::Router;
use chrono::NaiveDate;
use chrono_tz::Tz;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tally_db::SchedulerSettings;
use tally_shared::JwtService;
use tally_shared::config::Environment;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Settings used when the invoice scheduler is triggered.
    pub scheduler: SchedulerSettings,
    /// Deployment environment.
    pub environment: Environment,
    /// Timezone that decides the current calendar day.
    pub timezone: Tz,
}

impl AppState {
    /// Current calendar day in the configured timezone.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        job::today_in(self.timezone)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
