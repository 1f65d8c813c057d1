//! Webapp Cache - admin server for the in-process cache
//!
//! Opens the cache from its snapshot and serves the admin endpoints.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use webapp_cache::{create_router, AppState, Cache, Config};

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the cache: load the snapshot, persist, start background tasks
/// 4. Create Axum router with the admin endpoints
/// 5. Start HTTP server on configured port
/// 6. On SIGINT/SIGTERM, write a final snapshot and stop the cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to info level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webapp_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Webapp Cache");

    let config = Config::from_env();
    info!(
        snapshot = ?config.snapshot_path(),
        sweep_interval_s = config.sweep_interval.as_secs(),
        persist_interval_s = config.persist_interval.as_secs(),
        port = config.server_port,
        "Configuration loaded"
    );

    let cache = Cache::open(&config).context("Failed to open cache")?;
    let app = create_router(AppState::new(cache.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Final snapshot before the tasks go away
    let persisted = cache.persist().await;
    cache.destroy().await;
    persisted.context("Final cache persist failed")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
