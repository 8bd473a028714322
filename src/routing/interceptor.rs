//! Interceptor registry.
//!
//! # Responsibilities
//! - Keep interceptors in registration order, one per pattern text
//! - Offer a request to every matching interceptor until one claims it
//!
//! # Design Decisions
//! - Re-registering a pattern replaces its callback in place (order kept)
//! - Registering with no callback removes the pattern
//! - Matching runs against path plus query string

use axum::{body::Body, http::Request};
use std::fmt;

use super::matcher::{match_target, PathPattern, PatternMatch};
use super::{InterceptFn, Outcome};

/// A pattern with its callback.
#[derive(Clone)]
pub struct Interceptor {
    pattern: PathPattern,
    callback: InterceptFn,
}

impl Interceptor {
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn callback(&self) -> &InterceptFn {
        &self.callback
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("pattern", &self.pattern.source())
            .finish_non_exhaustive()
    }
}

/// Ordered collection of interceptors.
#[derive(Clone, Default, Debug)]
pub struct InterceptorRegistry {
    entries: Vec<Interceptor>,
}

impl InterceptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add, replace or (with `None`) remove the interceptor for a pattern.
    pub fn register(&mut self, pattern: PathPattern, callback: Option<InterceptFn>) {
        let existing = self
            .entries
            .iter()
            .position(|e| e.pattern.source() == pattern.source());

        match (existing, callback) {
            (Some(index), Some(callback)) => {
                self.entries[index].callback = callback;
            }
            (Some(index), None) => {
                self.entries.remove(index);
            }
            (None, Some(callback)) => {
                self.entries.push(Interceptor { pattern, callback });
            }
            (None, None) => {}
        }
    }

    /// Remove the interceptor registered under this pattern text.
    pub fn remove(&mut self, source: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.pattern.source() != source);
        self.entries.len() != before
    }

    /// First interceptor whose pattern matches the target, with its captures.
    pub fn evaluate<'a>(&'a self, target: &'a str) -> Option<(&'a Interceptor, PatternMatch)> {
        self.matching(target).next()
    }

    /// Every matching interceptor, in registration order.
    pub fn matching<'a>(
        &'a self,
        target: &'a str,
    ) -> impl Iterator<Item = (&'a Interceptor, PatternMatch)> + 'a {
        self.entries
            .iter()
            .filter_map(move |e| e.pattern.matches(target).map(|m| (e, m)))
    }

    /// Offer the request to each matching interceptor in order.
    ///
    /// Stops at the first one that claims the request; a declining
    /// interceptor hands the request back for the next one.
    pub async fn run(&self, request: Request<Body>) -> Outcome {
        let target = match_target(request.uri()).to_string();
        let mut request = request;

        for (interceptor, captures) in self.matching(&target) {
            tracing::debug!(pattern = %interceptor.pattern.source(), "Interceptor matched");
            match (interceptor.callback)(captures, request).await {
                Outcome::Handled(response) => return Outcome::Handled(response),
                Outcome::Pass(returned) => request = returned,
            }
        }

        Outcome::Pass(request)
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.pattern.source())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
