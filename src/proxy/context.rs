//! Per-request outbound context.
//!
//! # Responsibilities
//! - Layer inbound headers (minus `host`) over the configured defaults
//! - Pick the outbound method, honoring `Access-Control-Request-Method`
//! - Join base path and inbound path-and-query verbatim

use axum::http::{header, request, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use std::collections::BTreeMap;

use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::routing::matcher::match_target;

/// Everything needed to issue one outbound request. Built fresh per request.
#[derive(Debug, Clone)]
pub struct UpstreamRequestContext {
    /// Outbound method.
    pub method: Method,
    /// Outbound path and query (base path + inbound target).
    pub path: String,
    /// Outbound headers.
    pub headers: HeaderMap,
}

impl UpstreamRequestContext {
    /// Build the outbound context from the inbound request head.
    pub fn build(base_headers: &HeaderMap, base_path: &str, inbound: &request::Parts) -> Self {
        let mut headers = base_headers.clone();
        for name in inbound.headers.keys() {
            if name == header::HOST {
                continue;
            }
            headers.remove(name);
            for value in inbound.headers.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }

        Self {
            method: outbound_method(&inbound.method, &inbound.headers),
            path: format!("{}{}", base_path, match_target(&inbound.uri)),
            headers,
        }
    }

    /// Absolute outbound URI for the given upstream.
    pub fn uri(&self, upstream: &UpstreamConfig) -> Result<Uri, ProxyError> {
        let text = format!("http://{}{}", upstream.authority(), self.path);
        text.parse::<Uri>()
            .map_err(|e| ProxyError::InvalidUpstreamUri {
                reason: e.to_string(),
                uri: text,
            })
    }
}

/// `Access-Control-Request-Method` wins over the request method when it
/// carries a valid method token.
fn outbound_method(inbound: &Method, headers: &HeaderMap) -> Method {
    let Some(value) = headers.get(header::ACCESS_CONTROL_REQUEST_METHOD) else {
        return inbound.clone();
    };
    match value.to_str().map(str::trim).map(|v| Method::from_bytes(v.as_bytes())) {
        Ok(Ok(method)) => method,
        _ => {
            tracing::warn!(value = ?value, "Ignoring invalid Access-Control-Request-Method");
            inbound.clone()
        }
    }
}

/// Convert validated default headers into a header map.
///
/// Entries that are not valid header names or values are skipped with a
/// warning; `validate_config` reports them before startup.
pub fn default_header_map(defaults: &BTreeMap<String, String>) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(defaults.len());
    for (name, value) in defaults {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Skipping invalid default header"),
        }
    }
    headers
}
