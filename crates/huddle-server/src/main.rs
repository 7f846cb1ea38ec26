//! # Huddle Server
//!
//! Multi-party session broker: create sessions, join them by name, and open
//! a WebSocket relay bound to a session and client.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings
//! huddle
//!
//! # Run with environment variables
//! HUDDLE_PORT=8080 HUDDLE_HOST=0.0.0.0 huddle
//! ```
//!
//! ## Endpoints
//!
//! - `POST /session/create`
//! - `POST /session/{sessionId}/join`
//! - `GET /session/{sessionId}/connect/{clientId}` (WebSocket)
//! - `GET /socket` (WebSocket, unauthenticated echo open to any origin)
//! - `GET /health`

mod config;
mod error;
mod handlers;
mod metrics;

use anyhow::Result;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "huddle=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::load()?;

    info!("Starting Huddle server on {}:{}", config.host, config.port);

    // Initialize metrics
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    let shutdown = CancellationToken::new();
    let grace_period = config.shutdown.grace_period();
    let mut server = tokio::spawn(handlers::run_server(config, shutdown.clone()));

    tokio::select! {
        result = &mut server => {
            // Server exited on its own, typically a bind failure
            return result?;
        }
        _ = shutdown_signal() => {}
    }

    shutdown.cancel();

    match tokio::time::timeout(grace_period, server).await {
        Ok(result) => result??,
        Err(_) => warn!(
            "Shutdown grace period of {:?} elapsed, exiting",
            grace_period
        ),
    }

    info!("Huddle server shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown"),
            Err(e) => {
                error!("Failed to listen for SIGINT: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
