//! Layered reverse proxy library.
//!
//! Every inbound request is offered, in order, to regex interceptors,
//! exact path handlers, a local resolver and finally a streaming
//! pass-through to a single upstream.

pub mod config;
pub mod error;
pub mod http;
pub mod local;
pub mod proxy;
pub mod routing;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::{CompletedResponse, ProxyServer};
pub use lifecycle::Shutdown;
pub use local::{LocalResolver, StaticFiles};
pub use routing::{Outcome, PatternMatch, VerbSet};
