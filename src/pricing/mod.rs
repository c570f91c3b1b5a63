//! External price quotes.
//!
//! # Data Flow
//! ```text
//! ticker (HTTP GET ?symbol=SOLUSDT) ─┐
//! StaticPrices (offline/tests) ──────┴→ PriceSource
//!     → PriceFeed::refresh (startup + every refresh_secs)
//!     → ArcSwapOption<PriceQuote> → QuoteHandle::current()
//!     → Cart::total_usd / checkout / payment amount
//! ```

pub mod feed;
pub mod ticker;
pub mod types;

pub use feed::{PriceFeed, QuoteHandle};
pub use ticker::{PriceSource, StaticPrices, TickerClient};
pub use types::{parse_price, PriceError, PriceQuote, QuoteSource};
