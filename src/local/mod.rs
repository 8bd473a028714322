//! Local override stage.
//!
//! # Data Flow
//! ```text
//! Request not claimed by interceptors or handlers
//!     → LocalResolver::attempt
//!     → Outcome::Handled(complete response) | Outcome::Pass(untouched request)
//! ```
//!
//! # Design Decisions
//! - A resolver that declines never produces any response bytes
//! - A resolver that claims returns the complete response
//! - Default is `NoLocalFiles`; `StaticFiles` serves a directory tree

pub mod static_files;

use axum::{body::Body, http::Request};
use futures_util::future::{self, BoxFuture, FutureExt};
use std::sync::Arc;

use crate::config::ProxyConfig;
use crate::routing::Outcome;

pub use static_files::StaticFiles;

/// The "did I handle this" contract between handlers and pass-through.
pub trait LocalResolver: Send + Sync {
    /// Offer a request; return it untouched to decline.
    fn attempt(&self, request: Request<Body>, config: Arc<ProxyConfig>)
        -> BoxFuture<'static, Outcome>;
}

/// Resolver that never claims anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocalFiles;

impl LocalResolver for NoLocalFiles {
    fn attempt(
        &self,
        request: Request<Body>,
        _config: Arc<ProxyConfig>,
    ) -> BoxFuture<'static, Outcome> {
        future::ready(Outcome::Pass(request)).boxed()
    }
}

/// Build the resolver described by the configuration.
pub fn from_config(config: &ProxyConfig) -> Arc<dyn LocalResolver> {
    match config.local.effective_root(&config.upstream.path) {
        Some(root) => {
            tracing::info!(root = %root.display(), "Serving local files");
            Arc::new(StaticFiles::new(root).with_index_file(&config.local.index_file))
        }
        None => Arc::new(NoLocalFiles),
    }
}
