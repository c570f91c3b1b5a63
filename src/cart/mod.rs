//! Shopping cart.
//!
//! # Data Flow
//! ```text
//! storage (cart key) → Cart::load → add/remove/set_quantity/clear → storage
//!                                 ↘ total_usd(quote from pricing::PriceFeed)
//! ```

pub mod store;
pub mod types;

pub use store::{AddOutcome, Cart};
pub use types::{CartItem, Price, Product, ValueError};
