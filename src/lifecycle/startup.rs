//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize observability in dependency order
//! - Bind the listener and hand it to the server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener binds last (traffic only when ready)

use tokio::net::TcpListener;

use crate::config::ProxyConfig;
use crate::http::ProxyServer;
use crate::observability::{logging, metrics};

/// Fatal startup failures.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Install the global subscriber and, when enabled, the metrics exporter.
pub fn init_observability(config: &ProxyConfig) -> Result<(), StartupError> {
    logging::init_logging(&config.observability)?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }
    Ok(())
}

/// Bind the configured address and serve `server` until a shutdown signal.
pub async fn run(server: ProxyServer) -> Result<(), StartupError> {
    let address = server.config().listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    server
        .serve_until_signal(listener)
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Shutdown complete");
    Ok(())
}
