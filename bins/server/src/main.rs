//! Tally API Server
//!
//! Main entry point for the Tally backend service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tally_api::job::{DailySchedule, spawn_daily_job};
use tally_api::{AppState, create_router};
use tally_db::{SchedulerSettings, connect_with};
use tally_shared::{AppConfig, JwtConfig, JwtService};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tally=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(config.log.json);

    let timezone = config
        .scheduler
        .tz()
        .map_err(anyhow::Error::msg)
        .context("Invalid scheduler timezone")?;

    let db = connect_with(&config.database).await?;
    info!("Connected to database");

    let settings = SchedulerSettings {
        item_timeout: Duration::from_secs(config.scheduler.item_timeout_secs),
        carry_over_credit_limit: config.scheduler.carry_over_credit_limit,
    };

    if config.scheduler.enabled {
        spawn_daily_job(
            db.clone(),
            DailySchedule {
                timezone,
                hour: config.scheduler.run_hour,
                minute: config.scheduler.run_minute,
            },
            settings,
        );
    } else {
        info!("Daily invoice job disabled");
    }

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(JwtService::new(JwtConfig::from(&config.jwt))),
        scheduler: settings,
        environment: config.environment,
        timezone,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
