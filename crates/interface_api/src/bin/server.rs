//! Admission API Server Binary
//!
//! Starts the HTTP API for hospitalization account assurance.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin admission-api
//!
//! # Run with environment variables
//! API_PORT=8080 DATABASE_URL=postgres://... cargo run --bin admission-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_DATABASE_URL` or `DATABASE_URL` - PostgreSQL connection string
//! * `API_LOG_LEVEL` - Log level when `RUST_LOG` is unset (default: info)
//! * `API_MAX_CONNECTIONS` - Pool size (default: 10)
//! * `API_RUN_MIGRATIONS` - Apply the bundled schema at startup (default: false)
//! * `API_TIMEZONE` - Hospital time zone (default: America/Lima)
//! * `API_TRANSACTION_TIMEOUT_SECS` - Assurance transaction budget (default: 30)
//! * `API_SERIALIZE_PER_PATIENT` - Take a per-patient lock (default: false)
//! * `API_DEFAULT_INSURANCE_CODE`, `API_DEFAULT_COMPANY_CODE`,
//!   `API_DEFAULT_DEPARTMENT_CODE`, `API_DEFAULT_ORIGIN_CODE` - Settlement defaults

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_admission::AccountAssuranceService;
use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresRecordStore, PostgresSettlementProcedure};
use interface_api::{config::ApiConfig, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid API configuration")?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        timezone = %config.timezone,
        "Starting admission API server"
    );

    let calendar = config.calendar().context("invalid API_TIMEZONE")?;

    let pool = create_pool(
        DatabaseConfig::new(config.database_url.clone()).max_connections(config.max_connections),
    )
    .await
    .context("database connection failed")?;

    if config.run_migrations {
        run_migrations(&pool).await.context("database migration failed")?;
    }

    let service = AccountAssuranceService::new(
        PostgresRecordStore::new(pool),
        PostgresSettlementProcedure::new(),
        calendar,
        config.assurance_config(),
    );

    let app = create_router(Arc::new(service), config.clone());

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid listen address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for Ctrl+C or SIGTERM so in-flight requests can finish
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
