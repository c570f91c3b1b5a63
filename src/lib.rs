//! Cryoner storefront core: cart, SOL price feed, checkout and payment sessions.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod lifecycle;
pub mod navigation;
pub mod notifications;
pub mod observability;
pub mod payments;
pub mod pricing;
pub mod storage;
pub mod storefront;

pub use config::StoreConfig;
pub use lifecycle::Shutdown;
pub use storefront::Storefront;
