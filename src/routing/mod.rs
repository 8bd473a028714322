//! Request resolution registries.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path + query, method)
//!     → interceptor.rs (ordered regex patterns, may short-circuit)
//!     → handler.rs (exact path → verb → handler)
//!     → Return: Outcome::Handled(response) or Outcome::Pass(request)
//!
//! Registration (at any time):
//!     intercept / add_handler / remove_handler
//!     → clone current registry, apply change
//!     → atomic swap (readers never see a half-applied change)
//! ```
//!
//! # Design Decisions
//! - Registries are explicit ordered sequences; insertion order is evaluation order
//! - Deterministic: same input always resolves to the same callback
//! - First claim wins
//! - A stage that declines hands the untouched request back, so nothing can be
//!   written to a response that a later stage will also write

pub mod handler;
pub mod interceptor;
pub mod matcher;
pub mod verbs;

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use futures_util::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;

pub use handler::{HandlerEntry, HandlerRegistry};
pub use interceptor::{Interceptor, InterceptorRegistry};
pub use matcher::{PathPattern, PatternMatch};
pub use verbs::VerbSet;

/// Result of offering a request to a resolution stage.
#[derive(Debug)]
pub enum Outcome {
    /// The stage claimed the request and produced the full response.
    Handled(Response),
    /// The stage declined; the request continues to the next stage.
    Pass(Request<Body>),
}

impl Outcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, Outcome::Handled(_))
    }
}

/// Interceptor callback: receives the pattern match and the request.
pub type InterceptFn =
    Arc<dyn Fn(PatternMatch, Request<Body>) -> BoxFuture<'static, Outcome> + Send + Sync>;

/// Handler callback: always produces a response.
pub type HandlerFn = Arc<dyn Fn(Request<Body>) -> BoxFuture<'static, Response> + Send + Sync>;

/// Wrap an async closure as an interceptor callback.
pub fn intercept_fn<F, Fut>(f: F) -> InterceptFn
where
    F: Fn(PatternMatch, Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    Arc::new(move |m: PatternMatch, req: Request<Body>| f(m, req).boxed())
}

/// Wrap an async closure returning anything that converts into a response.
pub fn handler_fn<F, Fut, R>(f: F) -> HandlerFn
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    Arc::new(move |req: Request<Body>| {
        let fut = f(req);
        async move { fut.await.into_response() }.boxed()
    })
}
