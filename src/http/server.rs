//! HTTP server setup and registration API.
//!
//! # Responsibilities
//! - Create the Axum Router that sends every request to the dispatcher
//! - Wire up middleware (tracing, request ID)
//! - Expose handler / interceptor / completion registration
//! - Bind and serve until shutdown

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::dispatcher::Dispatcher;
use crate::http::request::request_id_middleware;
use crate::http::response::CompletedResponse;
use crate::lifecycle::{shutdown, signals, Shutdown};
use crate::local::LocalResolver;
use crate::routing::{handler_fn, intercept_fn, Outcome, PatternMatch, VerbSet};

/// The layered proxy server.
#[derive(Debug, Clone)]
pub struct ProxyServer {
    dispatcher: Arc<Dispatcher>,
}

impl ProxyServer {
    /// Create a new server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new(Arc::new(config))),
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn config(&self) -> &ProxyConfig {
        self.dispatcher.config()
    }

    /// Register `handler` for `path`; `None` verbs means the default method set.
    pub fn add_handler<F, Fut, R>(&self, path: &str, verbs: Option<VerbSet>, handler: F) -> &Self
    where
        F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        self.dispatcher.add_handler(path, verbs, handler_fn(handler));
        self
    }

    /// Remove all verbs for `path`, or only the given ones.
    pub fn remove_handler(&self, path: &str, verbs: Option<VerbSet>) -> &Self {
        self.dispatcher.remove_handler(path, verbs);
        self
    }

    /// Add or replace the interceptor for `pattern`.
    pub fn intercept<F, Fut>(&self, pattern: &str, callback: F) -> Result<&Self, ProxyError>
    where
        F: Fn(PatternMatch, Request<Body>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        self.dispatcher.intercept(pattern, Some(intercept_fn(callback)))?;
        Ok(self)
    }

    /// Remove the interceptor registered for `pattern`.
    pub fn remove_interceptor(&self, pattern: &str) -> Result<&Self, ProxyError> {
        self.dispatcher.intercept(pattern, None)?;
        Ok(self)
    }

    /// Invoke `callback` with every fully received pass-through response.
    pub fn on_response_complete<F>(&self, callback: F) -> &Self
    where
        F: Fn(CompletedResponse) + Send + Sync + 'static,
    {
        self.dispatcher.set_completion_callback(Some(Arc::new(callback)));
        self
    }

    /// Stop buffering pass-through responses for a completion callback.
    pub fn clear_response_complete(&self) -> &Self {
        self.dispatcher.set_completion_callback(None);
        self
    }

    /// Replace the local resolver.
    pub fn with_local_resolver(self, resolver: impl LocalResolver + 'static) -> Self {
        self.dispatcher.set_local_resolver(Arc::new(resolver));
        self
    }

    /// Build the Axum router with all middleware layers.
    pub fn router(&self) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(self.dispatcher.clone())
            .layer(middleware::from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve on `listener` until `shutdown_rx` fires.
    pub async fn run(
        &self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config().upstream,
            "HTTP server starting"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Bind `0.0.0.0:port` and serve until Ctrl+C / SIGTERM.
    pub async fn listen(&self, port: u16) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
        self.serve_until_signal(listener).await
    }

    /// Serve on `listener` until Ctrl+C / SIGTERM.
    pub async fn serve_until_signal(&self, listener: TcpListener) -> Result<(), std::io::Error> {
        let shutdown = Shutdown::new();
        let receiver = shutdown.subscribe();
        tokio::spawn(async move {
            signals::shutdown_signal().await;
            shutdown.trigger();
        });
        self.run(listener, receiver).await
    }
}

/// Every request, whatever its path or method, goes to the dispatcher.
async fn proxy_handler(
    State(dispatcher): State<Arc<Dispatcher>>,
    request: Request<Body>,
) -> Response {
    dispatcher.handle(request).await
}
