//! Streaming pass-through to the configured upstream.
//!
//! # Responsibilities
//! - Build the outbound request from the inbound one
//! - Stream the request body out as it arrives
//! - Relay status, headers and body chunks back as they arrive
//! - Map connection failures to 502 and the optional timeout to 504

use axum::{
    body::Body,
    http::{Request, Response},
    response::IntoResponse,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::time::Duration;

use super::context::{default_header_map, UpstreamRequestContext};
use crate::config::{ProxyConfig, UpstreamConfig};
use crate::error::{error_chain, ProxyError};
use crate::http::request::RequestIdExt;
use crate::http::response::{capture, CompletionFn, PendingCompletion};
use crate::observability::metrics;
use crate::routing::matcher::match_target;

/// Outbound HTTP client type.
pub type UpstreamClient = Client<HttpConnector, Body>;

/// Forwards requests to the single upstream.
#[derive(Clone)]
pub struct PassThrough {
    client: UpstreamClient,
    upstream: UpstreamConfig,
    base_headers: axum::http::HeaderMap,
    timeout: Option<Duration>,
}

impl PassThrough {
    /// Create the pass-through stage for the given configuration.
    pub fn new(config: &ProxyConfig) -> Self {
        // Idle connections are never kept: each request dials the upstream.
        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(HttpConnector::new());

        Self {
            client,
            upstream: config.upstream.clone(),
            base_headers: default_header_map(&config.upstream.default_headers()),
            timeout: config.timeouts.upstream_secs.map(Duration::from_secs),
        }
    }

    /// Forward a request. Always produces a response.
    pub async fn forward(
        &self,
        request: Request<Body>,
        on_complete: Option<CompletionFn>,
    ) -> Response<Body> {
        match self.try_forward(request, on_complete).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(upstream = %self.upstream.authority(), error = %e, "Upstream error");
                metrics::record_upstream_error(e.kind());
                e.into_response()
            }
        }
    }

    async fn try_forward(
        &self,
        request: Request<Body>,
        on_complete: Option<CompletionFn>,
    ) -> Result<Response<Body>, ProxyError> {
        let request_id = request.request_id();
        let (parts, body) = request.into_parts();
        let inbound_path = match_target(&parts.uri).to_string();
        let ctx = UpstreamRequestContext::build(&self.base_headers, &self.upstream.path, &parts);
        let uri = ctx.uri(&self.upstream)?;

        tracing::debug!(method = %ctx.method, uri = %uri, "Forwarding to upstream");

        let mut outbound = Request::new(body);
        *outbound.method_mut() = ctx.method.clone();
        *outbound.uri_mut() = uri;
        *outbound.headers_mut() = ctx.headers;

        let pending = self.client.request(outbound);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| ProxyError::UpstreamTimeout(limit.as_secs()))?,
            None => pending.await,
        };
        let response = result.map_err(|e| ProxyError::UpstreamConnection(error_chain(&e)))?;

        let (parts, body) = response.into_parts();
        tracing::debug!(status = %parts.status, "Upstream responded");

        let body = match on_complete {
            Some(callback) => capture(
                body,
                PendingCompletion {
                    callback,
                    request_id,
                    method: ctx.method,
                    path: inbound_path,
                    status: parts.status,
                    headers: parts.headers.clone(),
                },
            ),
            None => Body::new(body),
        };

        Ok(Response::from_parts(parts, body))
    }
}

impl std::fmt::Debug for PassThrough {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassThrough")
            .field("upstream", &self.upstream.authority())
            .field("base_path", &self.upstream.path)
            .field("timeout", &self.timeout)
            .finish()
    }
}
