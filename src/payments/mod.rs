//! Payment step: a time-boxed session against the pending order.
//!
//! # Data Flow
//! ```text
//! OrderStore (order key)
//!     → PaymentStep::open → amount + address → PaymentSession
//!     → SessionDriver::run (countdown, confirm, restart)
//!     → SessionOutcome { status, route }
//! ```
//!
//! # Design Decisions
//! - `PaymentSession` is plain state; `SessionDriver` owns every timer
//! - Amounts are computed once, when the step opens

pub mod address;
pub mod driver;
pub mod session;
pub mod step;
pub mod types;

pub use address::generate_address;
pub use driver::{SessionControl, SessionDriver};
pub use session::{payment_amount, prepare_details, PaymentDetails, PaymentSession};
pub use step::{PaymentEntry, PaymentStep};
pub use types::{PaymentStatus, SessionCommand, SessionError, SessionOutcome};
