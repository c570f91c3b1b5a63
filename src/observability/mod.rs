//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! cart, pricing, checkout, payments
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges)
//! ```
//!
//! Logs go to stderr so the CLI's stdout stays machine-readable.

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
