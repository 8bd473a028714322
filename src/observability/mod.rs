//! Logs and metrics.
//!
//! ```text
//! dispatcher / pass-through / completion capture
//!     → tracing events inside the per-request span (request id)
//!     → logging.rs subscriber → stdout, pretty or JSON
//!     → metrics.rs counters and histograms → Prometheus scrape endpoint
//! ```
//!
//! The metrics recorder is only installed when enabled; until then the
//! `metrics` macros are no-ops.

pub mod logging;
pub mod metrics;
