//! Request dispatch across resolution stages.
//!
//! # Responsibilities
//! - Offer every request to the stages in fixed priority order
//! - Isolate stage callbacks so a panic cannot take down the server
//! - Own the registries and apply registration changes atomically
//!
//! # Design Decisions
//! - Interceptors → Handlers → LocalResolver → PassThrough, first claim wins
//! - Pass-through always claims; there is nothing after it
//! - Dispatch reads one registry snapshot per request; writers swap whole snapshots

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    http::{header, Request},
    response::{IntoResponse, Response},
};
use futures_util::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::response::CompletionFn;
use crate::local::{self, LocalResolver};
use crate::observability::metrics;
use crate::proxy::PassThrough;
use crate::routing::matcher::match_target;
use crate::routing::{
    HandlerFn, HandlerRegistry, InterceptFn, InterceptorRegistry, Outcome, PathPattern, VerbSet,
};

/// The stage that claimed a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Interceptor,
    Handler,
    LocalResolver,
    PassThrough,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Interceptor => "interceptor",
            Stage::Handler => "handler",
            Stage::LocalResolver => "local",
            Stage::PassThrough => "passthrough",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One consistent view of everything registration can change.
#[derive(Clone)]
pub struct Registries {
    pub interceptors: InterceptorRegistry,
    pub handlers: HandlerRegistry,
    pub local: Arc<dyn LocalResolver>,
    pub on_complete: Option<CompletionFn>,
}

impl fmt::Debug for Registries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registries")
            .field("interceptors", &self.interceptors)
            .field("handlers", &self.handlers)
            .field("on_complete", &self.on_complete.is_some())
            .finish_non_exhaustive()
    }
}

/// Resolves each request through the stages.
pub struct Dispatcher {
    config: Arc<ProxyConfig>,
    default_verbs: VerbSet,
    registries: ArcSwap<Registries>,
    passthrough: PassThrough,
}

impl Dispatcher {
    pub fn new(config: Arc<ProxyConfig>) -> Self {
        let default_verbs = VerbSet::parse_all(&config.methods.0).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid default methods, using the standard set");
            VerbSet::standard()
        });
        let registries = Registries {
            interceptors: InterceptorRegistry::new(),
            handlers: HandlerRegistry::new(),
            local: local::from_config(&config),
            on_complete: None,
        };

        Self {
            passthrough: PassThrough::new(&config),
            default_verbs,
            registries: ArcSwap::from_pointee(registries),
            config,
        }
    }

    pub fn config(&self) -> &Arc<ProxyConfig> {
        &self.config
    }

    /// Current registry snapshot.
    pub fn registries(&self) -> Arc<Registries> {
        self.registries.load_full()
    }

    /// Add, replace or (with `None`) remove an interceptor.
    pub fn intercept(&self, pattern: &str, callback: Option<InterceptFn>) -> Result<(), ProxyError> {
        let pattern = PathPattern::new(pattern)?;
        self.update(|r| r.interceptors.register(pattern.clone(), callback.clone()));
        Ok(())
    }

    /// Register a handler; `None` verbs means the configured default set.
    pub fn add_handler(&self, path: &str, verbs: Option<VerbSet>, handler: HandlerFn) {
        let verbs = verbs.unwrap_or_else(|| self.default_verbs.clone());
        self.update(|r| r.handlers.add(path, &verbs, handler.clone()));
    }

    /// Remove a whole path (`None`) or only the given verbs.
    pub fn remove_handler(&self, path: &str, verbs: Option<VerbSet>) {
        self.update(|r| r.handlers.remove(path, verbs.as_ref()));
    }

    /// Replace the local resolver.
    pub fn set_local_resolver(&self, resolver: Arc<dyn LocalResolver>) {
        self.update(|r| r.local = resolver.clone());
    }

    /// Set or clear the pass-through completion callback.
    pub fn set_completion_callback(&self, callback: Option<CompletionFn>) {
        self.update(|r| r.on_complete = callback.clone());
    }

    fn update(&self, apply: impl Fn(&mut Registries)) {
        self.registries.rcu(|current| {
            let mut next = Registries::clone(current);
            apply(&mut next);
            next
        });
    }

    /// Dispatch a request, recording which stage claimed it.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        if self.config.upstream.log_requests {
            let host = request
                .headers()
                .get(header::HOST)
                .and_then(|h| h.to_str().ok())
                .unwrap_or("");
            tracing::info!(
                method = %request.method(),
                host = %host,
                path = %match_target(request.uri()),
                "Inbound request"
            );
        }

        let (stage, response) = self.dispatch(request).await;

        tracing::debug!(stage = %stage, status = %response.status(), "Request resolved");
        metrics::record_request(stage.as_str(), response.status().as_u16(), start);
        response
    }

    /// Offer the request to each stage in order; the first claim wins.
    pub async fn dispatch(&self, request: Request<Body>) -> (Stage, Response) {
        let registries = self.registries.load_full();

        let request = match isolate(Stage::Interceptor, registries.interceptors.run(request)).await {
            Ok(Outcome::Handled(response)) => return (Stage::Interceptor, response),
            Ok(Outcome::Pass(request)) => request,
            Err(fault) => return (Stage::Interceptor, fault),
        };

        let handler = registries
            .handlers
            .lookup(request.uri().path(), request.method());
        if let Some(handler) = handler {
            let response = isolate(Stage::Handler, async move { handler(request).await })
                .await
                .unwrap_or_else(|fault| fault);
            return (Stage::Handler, response);
        }

        let local = registries.local.clone();
        let config = self.config.clone();
        let attempt = async move { local.attempt(request, config).await };
        let request = match isolate(Stage::LocalResolver, attempt).await {
            Ok(Outcome::Handled(response)) => return (Stage::LocalResolver, response),
            Ok(Outcome::Pass(request)) => request,
            Err(fault) => return (Stage::LocalResolver, fault),
        };

        let response = self
            .passthrough
            .forward(request, registries.on_complete.clone())
            .await;
        (Stage::PassThrough, response)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registries", &self.registries.load_full())
            .field("passthrough", &self.passthrough)
            .finish()
    }
}

/// Run one stage, turning a panic into a 500 response.
async fn isolate<T>(stage: Stage, fut: impl Future<Output = T>) -> Result<T, Response> {
    AssertUnwindSafe(fut).catch_unwind().await.map_err(|panic| {
        tracing::error!(stage = %stage, panic = %panic_message(&*panic), "Stage callback panicked");
        ProxyError::HandlerFault {
            stage: stage.as_str(),
        }
        .into_response()
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
