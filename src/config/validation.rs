//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate upstream target (host, port, base path)
//! - Validate default headers and method tokens before they reach the wire
//! - Validate bind and metrics addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::{HeaderName, HeaderValue, Method};
use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human readable description.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }

    let upstream = &config.upstream;
    if upstream.host.trim().is_empty() {
        errors.push(ValidationError::new("upstream.host", "must not be empty"));
    }
    if upstream.port == 0 {
        errors.push(ValidationError::new("upstream.port", "must be between 1 and 65535"));
    }
    if !upstream.path.is_empty() && !upstream.path.starts_with('/') {
        errors.push(ValidationError::new(
            "upstream.path",
            format!("{:?} must be empty or start with '/'", upstream.path),
        ));
    }
    for (name, value) in upstream.default_headers() {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                format!("upstream.headers.{name}"),
                "invalid header name",
            ));
        }
        if HeaderValue::from_str(&value).is_err() {
            errors.push(ValidationError::new(
                format!("upstream.headers.{name}"),
                "invalid header value",
            ));
        }
    }

    if config.methods.0.is_empty() {
        errors.push(ValidationError::new("methods", "must name at least one method"));
    }
    for method in &config.methods.0 {
        if Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "methods",
                format!("{method:?} is not a valid HTTP method"),
            ));
        }
    }

    if config.local.index_file.contains('/') {
        errors.push(ValidationError::new(
            "local.index_file",
            "must be a plain file name",
        ));
    }

    if config.timeouts.upstream_secs == Some(0) {
        errors.push(ValidationError::new("timeouts.upstream_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("{:?} is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.upstream.port = 0;
        config.upstream.path = "api".into();
        config.upstream.headers.insert("bad header".into(), "x".into());
        config.methods.0.push("GE T".into());

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "upstream.port",
                "upstream.path",
                "upstream.headers.bad header",
                "methods",
            ]
        );
    }

    #[test]
    fn test_base_path_may_be_empty_or_rooted() {
        let mut config = ProxyConfig::default();
        config.upstream.path = "/api/".into();
        assert!(validate_config(&config).is_ok());
        config.upstream.path.clear();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());
        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
