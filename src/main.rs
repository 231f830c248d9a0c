//! cash_closing - Cash Drawer Closing Service
//!
//! HTTP service for recording sales, previewing and submitting end-of-day
//! cash closings, and browsing closing history.

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cash_closing::api::{self, AuthState, UnauthorizedAttempt};
use cash_closing::app::Application;
use cash_closing::cache::SystemClock;
use cash_closing::{db, Config};

/// Initialize tracing/logging; `LOG_FORMAT=json` for structured output
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cash_closing=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!(environment = %config.environment, "Starting cash_closing server");

    if config.api_keys.is_empty() {
        tracing::warn!("API_KEYS is empty; every /api/v1 request will be rejected");
    }

    let clock = Arc::new(SystemClock);
    let (application, pool) = match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await?;

            if !db::check_schema(&pool).await? {
                tracing::error!("Database schema is not complete. Please run migrations.");
                return Err(anyhow::anyhow!("Database schema incomplete"));
            }
            tracing::info!("Database connected successfully");

            (Application::postgres(&config, pool.clone(), clock), Some(pool))
        }
        None => {
            if config.is_production() {
                return Err(anyhow::anyhow!("DATABASE_URL is required in production"));
            }
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
            (Application::in_memory(&config, clock), None)
        }
    };

    let scheduler = application.scheduler().start();

    let auth = AuthState::new(config.api_keys.clone()).with_unauthorized_hook(Arc::new(
        |attempt: &UnauthorizedAttempt| {
            tracing::warn!(
                target: "cash_closing::security",
                failure = ?attempt.failure,
                path = %attempt.path,
                correlation_id = %attempt.correlation_id,
                "Unauthorized access attempt"
            );
        },
    ));

    let app = api::build_router(application.state.clone(), auth);

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutting down...");
    scheduler.abort();
    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("Database connections closed");
    }
    tracing::info!("Goodbye!");

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
