//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, fallback route)
//!     → request.rs (add request ID, open request span)
//!     → dispatcher.rs (interceptors → handlers → local → pass-through)
//!     → response.rs (stream body, optional completion capture)
//!     → Send to client
//! ```

pub mod dispatcher;
pub mod request;
pub mod response;
pub mod server;

pub use dispatcher::{Dispatcher, Registries, Stage};
pub use request::{request_id_middleware, RequestId, RequestIdExt};
pub use response::{CompletedResponse, CompletionFn};
pub use server::ProxyServer;
