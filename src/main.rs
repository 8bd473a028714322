//! Layered Reverse Proxy
//!
//! Forwards traffic to a single upstream while letting in-process code
//! claim individual requests first.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────────┐
//!                              │                   LAYERED PROXY                       │
//!                              │                                                       │
//!     Client Request           │  ┌─────────┐    ┌──────────────┐    ┌────────────┐   │
//!     ─────────────────────────┼─▶│  http   │───▶│ interceptors │───▶│  handlers  │   │
//!                              │  │ server  │    │   (regex)    │    │(path+verb) │   │
//!                              │  └─────────┘    └──────────────┘    └─────┬──────┘   │
//!                              │                                          │          │
//!                              │                                          ▼          │
//!                              │                                   ┌────────────┐    │
//!                              │                                   │   local    │    │
//!                              │                                   │  resolver  │    │
//!                              │                                   └─────┬──────┘    │
//!                              │                                         │           │
//!                              │                                         ▼           │
//!     Client Response          │  ┌─────────┐                     ┌────────────┐     │
//!     ◀────────────────────────┼──│streamed │◀────────────────────│pass-through│◀────┼──── Upstream
//!                              │  │  body   │                     │  (hyper)   │     │
//!                              │  └─────────┘                     └────────────┘     │
//!                              │                                                     │
//!                              │  ┌───────────────────────────────────────────────┐  │
//!                              │  │            Cross-Cutting Concerns              │  │
//!                              │  │  ┌─────────┐  ┌──────────────┐  ┌───────────┐ │  │
//!                              │  │  │ config  │  │observability │  │ lifecycle │ │  │
//!                              │  │  └─────────┘  └──────────────┘  └───────────┘ │  │
//!                              │  └───────────────────────────────────────────────┘  │
//!                              └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use layered_proxy::config::{load_config, validate_config, ConfigError, ProxyConfig, UpstreamConfig};
use layered_proxy::lifecycle::startup;
use layered_proxy::ProxyServer;

#[derive(Parser, Debug)]
#[command(name = "layered-proxy", version, about = "Layered single-upstream reverse proxy")]
struct Cli {
    /// Configuration file (TOML, or JSON by extension).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Upstream target as `host` or `host:port`.
    #[arg(short, long)]
    upstream: Option<String>,

    /// Listen on `0.0.0.0:<port>`.
    #[arg(short, long)]
    port: Option<u16>,

    /// Base path prepended to every forwarded path.
    #[arg(long)]
    base_path: Option<String>,

    /// Serve files from this directory before passing through.
    #[arg(long)]
    local_root: Option<PathBuf>,

    /// Disable per-request logging.
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn into_config(self) -> Result<ProxyConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(target) = &self.upstream {
            let parsed: UpstreamConfig = target.parse()?;
            config.upstream.host = parsed.host;
            config.upstream.port = parsed.port;
        }
        if let Some(port) = self.port {
            config.listener.bind_address = format!("0.0.0.0:{port}");
        }
        if let Some(base_path) = self.base_path {
            config.upstream.path = base_path;
        }
        if let Some(root) = self.local_root {
            config.local.root = Some(root);
        }
        if self.quiet {
            config.upstream.log_requests = false;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    startup::init_observability(&config)?;

    tracing::info!("layered-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream,
        log_requests = config.upstream.log_requests,
        upstream_timeout_secs = ?config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    let server = ProxyServer::new(config);
    startup::run(server).await?;
    Ok(())
}
