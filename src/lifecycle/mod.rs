//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → every CancelToken fires → timers and loops exit
//!
//! Signals (signals.rs):
//!     SIGINT → Shutdown::trigger
//!
//! Scripted tasks (scripted.rs):
//!     fixed delay ⟂ CancelToken → Ok(output) | Err(Cancelled)
//! ```
//!
//! # Design Decisions
//! - One cancellation primitive for the price feed, the session countdown
//!   and the simulated confirmation
//! - Timers belong to the state that started them and are dropped with it

pub mod scripted;
pub mod shutdown;
pub mod signals;

pub use scripted::{Cancelled, ScriptedTask};
pub use shutdown::{CancelToken, Shutdown};
