//! Request identification.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every inbound request
//! - Attach it as a request extension and to the request's tracing span
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The ID is never written into request headers: forwarded headers must
//!   stay exactly what the client sent (minus `host`)

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::fmt;
use tracing::Instrument;
use uuid::Uuid;

/// Unique identifier of one inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Access the request ID stored on a request.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<RequestId>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<RequestId> {
        self.extensions().get::<RequestId>().copied()
    }
}

/// Middleware: assign a request ID and run the rest of the stack in its span.
pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let id = RequestId::new();
    request.extensions_mut().insert(id);
    let span = tracing::info_span!("request", request_id = %id);
    next.run(request).instrument(span).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn request_id_extension_roundtrip() {
        let id = RequestId::new();
        let mut request = Request::new(Body::empty());
        assert_eq!(request.request_id(), None);
        request.extensions_mut().insert(id);
        assert_eq!(request.request_id(), Some(id));
    }
}
