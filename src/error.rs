//! Error types for dispatch and pass-through.
//!
//! # Design Decisions
//! - Every variant is local to one request or one registration call
//! - Upstream failures always produce a response (502/504), never a panic
//! - Registration errors are returned to the caller, never logged and dropped

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// Errors raised while resolving or forwarding a request.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The outbound connection could not be established or failed before
    /// the upstream response head arrived.
    #[error("upstream connection failed: {0}")]
    UpstreamConnection(String),

    /// The configured upstream timeout elapsed before the response head.
    #[error("upstream did not respond within {0} seconds")]
    UpstreamTimeout(u64),

    /// The outbound URI could not be assembled from host, port and path.
    #[error("invalid upstream uri {uri:?}: {reason}")]
    InvalidUpstreamUri { uri: String, reason: String },

    /// A registered callback panicked.
    #[error("{stage} callback panicked")]
    HandlerFault { stage: &'static str },

    /// An interceptor pattern failed to compile.
    #[error("invalid interceptor pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A verb token is not a valid HTTP method.
    #[error("invalid verb {0:?}")]
    InvalidVerb(String),
}

impl ProxyError {
    /// Status code written to the client for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::UpstreamConnection(_) | ProxyError::InvalidUpstreamUri { .. } => {
                StatusCode::BAD_GATEWAY
            }
            ProxyError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::HandlerFault { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::InvalidPattern { .. } | ProxyError::InvalidVerb(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::UpstreamConnection(_) => "connection",
            ProxyError::UpstreamTimeout(_) => "timeout",
            ProxyError::InvalidUpstreamUri { .. } => "uri",
            ProxyError::HandlerFault { .. } => "handler_fault",
            ProxyError::InvalidPattern { .. } => "pattern",
            ProxyError::InvalidVerb(_) => "verb",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), self.to_string()).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}

/// Render an error together with its source chain.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
