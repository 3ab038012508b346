//! EventMingle HTTP server.
//!
//! Startup sequence:
//!
//! 1. Load `.env` and configuration
//! 2. Initialize tracing
//! 3. Connect to `PostgreSQL` and apply migrations
//! 4. Install the Prometheus exporter
//! 5. Build the application state and router
//! 6. Serve until SIGINT/SIGTERM, then drain connections
//!
//! # Environment Variables
//!
//! See [`eventmingle::config`] for the complete list. The important ones:
//!
//! - `DATABASE_URL`: `PostgreSQL` connection string
//! - `AUTH_JWT_SECRET`: session token signing secret
//! - `HOST` / `PORT`: bind address (default `0.0.0.0:8080`)
//! - `METRICS_PORT`: Prometheus exporter port (default 9090)
//! - `RUST_LOG`: log filter (default `eventmingle=info,tower_http=debug`)

use anyhow::Context;
use eventmingle::config::Config;
use eventmingle::metrics;
use eventmingle::server::{AppState, build_router, cors_layer};
use eventmingle_core::environment::SystemClock;
use eventmingle_postgres::PostgresRecordStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eventmingle=info,tower_http=debug".into()),
        )
        .with(fmt::layer())
        .init();

    info!("Starting EventMingle server");

    let config = Config::from_env();
    info!(
        host = %config.server.host,
        port = config.server.port,
        "Configuration loaded"
    );
    if config.uses_default_secret() {
        warn!("AUTH_JWT_SECRET is not set; using the development secret");
    }

    info!("Connecting to PostgreSQL...");
    let store = PostgresRecordStore::connect(&config.database.settings())
        .await
        .context("failed to connect to PostgreSQL")?;
    store.migrate().await.context("failed to run migrations")?;
    info!("Database ready");

    let metrics_addr: SocketAddr = format!(
        "{}:{}",
        config.server.metrics_host, config.server.metrics_port
    )
    .parse()
    .context("invalid metrics address")?;
    metrics::install_exporter(metrics_addr)?;

    let state = AppState::new(
        Arc::new(store),
        Arc::new(SystemClock),
        &config.auth,
        &config.chat,
    );
    let app = build_router(state, cors_layer(&config.server.cors_allowed_origins));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "HTTP server listening");

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            })
            .await
    });

    tokio::select! {
        joined = &mut server => {
            joined.context("server task panicked")?.context("server error")?;
            return Ok(());
        }
        () = shutdown_signal() => {}
    }

    let _ = shutdown_tx.send(true);
    let grace = Duration::from_secs(config.server.shutdown_timeout);
    match tokio::time::timeout(grace, server).await {
        Ok(joined) => {
            joined.context("server task panicked")?.context("server error")?;
            info!("Server shut down cleanly");
        }
        // Open chat sockets never finish on their own.
        Err(_) => warn!(?grace, "Shutdown timeout elapsed; dropping open connections"),
    }

    Ok(())
}

/// Waits for Ctrl+C (SIGINT) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C signal, shutting down gracefully..."),
        () = terminate => info!("Received SIGTERM signal, shutting down gracefully..."),
    }
}
