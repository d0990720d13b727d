//! TutorHub Server — Application entry point.

mod config;

use std::time::Duration;

use chrono::Utc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tutorhub_booking::{BookingService, FixedExchangeRate, TracingNotifier};
use tutorhub_db::{DbError, DbManager, SurrealRepositories};

use crate::config::{ConfigError, ServerConfig};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("database connection: {0}")]
    Connect(#[from] surrealdb::Error),

    #[error("database migration: {0}")]
    Migrate(#[from] DbError),
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine; the process environment still applies.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tutorhub=info")),
        )
        .json()
        .init();

    info!("Starting TutorHub server...");

    if let Err(e) = run().await {
        error!(error = %e, "TutorHub server failed");
        std::process::exit(1);
    }

    info!("TutorHub server stopped.");
}

async fn run() -> Result<(), StartupError> {
    let config = ServerConfig::from_env()?;

    let manager = DbManager::connect(&config.db).await?;
    let db = manager.client().clone();
    tutorhub_db::run_migrations(&db).await?;

    let repos = SurrealRepositories::new(db);
    let bookings = BookingService::new(
        repos,
        FixedExchangeRate::new(config.booking.ngn_per_usd),
        TracingNotifier,
        config.booking.clone(),
    );

    info!(
        ngn_per_usd = config.booking.ngn_per_usd,
        allow_unpriced_bookings = config.booking.allow_unpriced_bookings,
        housekeeping_interval_secs = config.housekeeping_interval_secs,
        "Booking services ready"
    );

    let mut housekeeping =
        tokio::time::interval(Duration::from_secs(config.housekeeping_interval_secs));

    loop {
        tokio::select! {
            _ = housekeeping.tick() => {
                if let Err(e) = bookings.purge_expired_drafts(Utc::now()).await {
                    error!(error = %e, "Draft housekeeping failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}
