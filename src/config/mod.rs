//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML/JSON) or CLI flags
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc with the dispatcher and pass-through
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; registries are the only runtime-mutable state
//! - All fields have defaults to allow minimal configs
//! - Upstream accepts `host`, `host:port` or a full table
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ListenerConfig, LocalConfig, LogFormat, MethodsConfig, ObservabilityConfig, ProxyConfig,
    TimeoutConfig, UpstreamConfig, UpstreamParseError,
};
pub use validation::{validate_config, ValidationError};
