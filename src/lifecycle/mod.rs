//! Process lifecycle.
//!
//! ```text
//! startup.rs:   config → logging + metrics → bind listener → serve
//! signals.rs:   SIGINT / SIGTERM → Shutdown::trigger
//! shutdown.rs:  trigger → server stops accepting → in-flight requests drain
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::StartupError;
