//! NativeNest stall booking server.
//!
//! Wires configuration, the Postgres stall registry, metrics and the HTTP
//! router together. The binary in `main.rs` is a thin shell over [`run`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod metrics;

pub use config::Config;

use anyhow::Context;
use nativenest_postgres::PostgresStallStore;
use nativenest_web::{AppState, build_router};
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// Connect the pool described by `config`.
///
/// # Errors
///
/// Returns an error if the database cannot be reached within the connect timeout.
pub async fn connect_store(config: &config::PostgresConfig) -> anyhow::Result<PostgresStallStore> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout))
        .idle_timeout(Duration::from_secs(config.idle_timeout))
        .connect(&config.url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    let store = PostgresStallStore::from_pool(pool);
    if config.run_migrations {
        store.migrate().await.context("Failed to run migrations")?;
    }

    Ok(store)
}

/// Run the HTTP server until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the database, metrics exporter or listener cannot be
/// set up, or the server fails while running.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let metrics_addr = metrics::install_exporter(
        &config.server.metrics_host,
        config.server.metrics_port,
    )
    .context("Failed to install Prometheus exporter")?;
    metrics::register_stall_metrics();
    tracing::info!(%metrics_addr, "Prometheus metrics available at /metrics");

    let store = connect_store(&config.postgres).await?;
    tracing::info!("✓ Stall registry connected");

    let app = build_router(AppState::new(store.clone()));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "🏪 Stall booking server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    let timeout = Duration::from_secs(config.server.shutdown_timeout);
    if tokio::time::timeout(timeout, store.pool().close()).await.is_err() {
        tracing::warn!(?timeout, "Timed out closing database pool");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutting down gracefully...");
}
