//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Port used when an upstream target names no port.
pub const DEFAULT_UPSTREAM_PORT: u16 = 80;

/// Methods a handler applies to when registered without explicit verbs.
pub const DEFAULT_METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "PATCH"];

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single upstream that unmatched requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// Default verb set for handlers registered without explicit verbs.
    pub methods: MethodsConfig,

    /// Local file override settings.
    pub local: LocalConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// Build a configuration pointing at the given upstream target text.
    pub fn for_upstream(target: &str) -> Result<Self, UpstreamParseError> {
        Ok(Self {
            upstream: target.parse()?,
            ..Self::default()
        })
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream target.
///
/// Deserializes either from `"host"` / `"host:port"` text or from a table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "UpstreamTarget")]
pub struct UpstreamConfig {
    /// Upstream host name or address.
    pub host: String,

    /// Upstream port.
    pub port: u16,

    /// Base path prepended verbatim to every forwarded request path.
    pub path: String,

    /// Headers sent with every forwarded request unless the client sends its own.
    pub headers: BTreeMap<String, String>,

    /// Overrides the `user-agent` default header.
    pub user_agent: Option<String>,

    /// Emit one log line per inbound request.
    pub log_requests: bool,
}

impl UpstreamConfig {
    /// `host:port` authority used for the outbound URI.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Default headers with the user agent override applied.
    pub fn default_headers(&self) -> BTreeMap<String, String> {
        let mut headers: BTreeMap<String, String> = self
            .headers
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
            .collect();
        if let Some(agent) = &self.user_agent {
            headers.insert("user-agent".to_string(), agent.clone());
        }
        headers
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_UPSTREAM_PORT,
            path: String::new(),
            headers: BTreeMap::new(),
            user_agent: None,
            log_requests: true,
        }
    }
}

/// Error returned when an upstream target string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamParseError {
    #[error("upstream host is empty")]
    EmptyHost,
    #[error("invalid upstream port {0:?}")]
    InvalidPort(String),
}

impl FromStr for UpstreamConfig {
    type Err = UpstreamParseError;

    /// Parses `host` or `host:port`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (host, port) = match s.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| UpstreamParseError::InvalidPort(port.to_string()))?;
                (host, port)
            }
            None => (s, DEFAULT_UPSTREAM_PORT),
        };
        if host.is_empty() {
            return Err(UpstreamParseError::EmptyHost);
        }
        Ok(Self {
            host: host.to_string(),
            port,
            ..Self::default()
        })
    }
}

impl fmt::Display for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}{}", self.host, self.port, self.path)
    }
}

/// Wire forms accepted for the upstream section.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UpstreamTarget {
    Address(String),
    Detailed(UpstreamTable),
}

#[derive(Debug, Deserialize)]
struct UpstreamTable {
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    path: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default, alias = "userAgent")]
    user_agent: Option<String>,
    #[serde(default = "default_log_requests", alias = "logRequests")]
    log_requests: bool,
}

fn default_port() -> u16 {
    DEFAULT_UPSTREAM_PORT
}

fn default_log_requests() -> bool {
    true
}

impl TryFrom<UpstreamTarget> for UpstreamConfig {
    type Error = UpstreamParseError;

    fn try_from(target: UpstreamTarget) -> Result<Self, Self::Error> {
        match target {
            UpstreamTarget::Address(text) => text.parse(),
            UpstreamTarget::Detailed(table) => {
                if table.host.is_empty() {
                    return Err(UpstreamParseError::EmptyHost);
                }
                Ok(Self {
                    host: table.host,
                    port: table.port,
                    path: table.path,
                    headers: table.headers,
                    user_agent: table.user_agent,
                    log_requests: table.log_requests,
                })
            }
        }
    }
}

/// Default method set for handler registration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct MethodsConfig(pub Vec<String>);

impl Default for MethodsConfig {
    fn default() -> Self {
        Self(DEFAULT_METHODS.iter().map(|m| m.to_string()).collect())
    }
}

/// Local file override configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Directory that local files are served from.
    pub root: Option<PathBuf>,

    /// Derive the root from the upstream base path when `root` is unset.
    pub derive_from_base_path: bool,

    /// File served for directory requests.
    pub index_file: String,
}

impl LocalConfig {
    /// Effective root directory, if local files are enabled.
    pub fn effective_root(&self, base_path: &str) -> Option<PathBuf> {
        if let Some(root) = &self.root {
            return Some(root.clone());
        }
        if self.derive_from_base_path {
            let trimmed = base_path.trim_start_matches('/');
            return Some(if trimmed.is_empty() {
                PathBuf::from(".")
            } else {
                PathBuf::from(".").join(trimmed)
            });
        }
        None
    }
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            root: None,
            derive_from_base_path: false,
            index_file: "index.html".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upper bound on waiting for the upstream response head, in seconds.
    /// Unset means wait indefinitely.
    pub upstream_secs: Option<u64>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
