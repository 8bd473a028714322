//! Pass-through proxy subsystem.
//!
//! # Data Flow
//! ```text
//! Unclaimed inbound request
//!     → context.rs (method, path, headers for the upstream)
//!     → passthrough.rs (dial upstream, stream request body out)
//!     → upstream response head relayed immediately
//!     → body frames relayed as they arrive (optionally captured)
//! ```
//!
//! # Design Decisions
//! - One upstream, no load balancing, no retries
//! - No idle connection reuse: every request opens a new upstream connection
//! - Inbound `host` is dropped; the client derives it from the upstream URI
//! - Upstream failures become 502/504 responses carrying the error text

pub mod context;
pub mod passthrough;

pub use context::UpstreamRequestContext;
pub use passthrough::PassThrough;
