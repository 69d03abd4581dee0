//! # movies-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the movies catalog.
//! Binds to configurable port (default 8080).

use anyhow::Context;
use movies_api::auth::ApiKey;
use movies_api::config::{AppConfig, LogFormat};
use movies_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::Text);
            tracing::error!("Configuration error: {e}");
            return Err(e).context("invalid configuration");
        }
    };
    init_tracing(config.log_format);
    tracing::info!(?config, "configuration loaded");

    // No DATABASE_URL means in-memory repositories.
    let db_pool = movies_api::db::init_pool(&config).await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;

    let state = match db_pool {
        Some(pool) => AppState::with_pool(&config.jwt, pool),
        None => AppState::in_memory(&config.jwt),
    }
    .with_api_key(config.api_key.as_deref().map(ApiKey::new));

    let state = match movies_api::middleware::metrics::install_recorder() {
        Ok(handle) => state.with_metrics(handle),
        Err(e) => {
            tracing::warn!("Prometheus recorder not installed: {e}. /metrics will return 404.");
            state
        }
    };

    let app = movies_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Movies API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Movies API stopped");
    Ok(())
}

/// Initialize structured tracing. `RUST_LOG` overrides the `info` default.
fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
