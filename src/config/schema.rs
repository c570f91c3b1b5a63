//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the storefront.
//! All types derive Serde traits for deserialization from config files.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Root configuration for the storefront.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// Local persisted state (cart and order documents).
    pub storage: StorageConfig,

    /// External price ticker settings.
    pub pricing: PricingConfig,

    /// Checkout form rules.
    pub checkout: CheckoutConfig,

    /// Payment session timing.
    pub payment: PaymentConfig,

    /// Product catalog source.
    pub catalog: CatalogConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Where persisted state lives.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one JSON document per key.
    pub dir: String,

    /// Key of the serialized cart array.
    pub cart_key: String,

    /// Key of the serialized order snapshot.
    pub order_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: ".cryoner".to_string(),
            cart_key: "cryoner_cart".to_string(),
            order_key: "cryoner_order".to_string(),
        }
    }
}

/// External price ticker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Ticker endpoint; queried as `{ticker_url}?symbol=<SYMBOL>`.
    pub ticker_url: String,

    /// Symbol of the SOL/USD pair.
    pub sol_symbol: String,

    /// Refresh interval in seconds.
    pub refresh_secs: u64,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Quote substituted on the first failed fetch. `None` leaves the quote unavailable.
    pub fallback_sol_usd: Option<Decimal>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            ticker_url: "https://api.binance.com/api/v3/ticker/price".to_string(),
            sol_symbol: "SOLUSDT".to_string(),
            refresh_secs: 60,
            timeout_secs: 10,
            fallback_sol_usd: Some(Decimal::from(150)),
        }
    }
}

/// Checkout form rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// Character every contact handle starts with.
    pub handle_sigil: char,

    /// Minimum handle length, sigil included.
    pub handle_min_len: usize,

    /// Maximum handle length, sigil included.
    pub handle_max_len: usize,

    /// Pause between persisting the order and moving to payment.
    pub navigation_delay_ms: u64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            handle_sigil: '@',
            handle_min_len: 2,
            handle_max_len: 33,
            navigation_delay_ms: 1500,
        }
    }
}

/// Payment session timing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PaymentConfig {
    /// Countdown length in seconds.
    pub session_secs: u64,

    /// Simulated blockchain confirmation delay in seconds.
    pub confirmation_delay_secs: u64,

    /// Delay before redirecting home after confirmation, in seconds.
    pub redirect_delay_secs: u64,

    /// Prefix of generated payment addresses.
    pub address_prefix: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            session_secs: 600,
            confirmation_delay_secs: 5,
            redirect_delay_secs: 7,
            address_prefix: "CRYONER_UNIQUE".to_string(),
        }
    }
}

/// Product catalog configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path to a TOML catalog. The built-in catalog is used when unset.
    pub path: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "cryoner=info".to_string(),
            json_logs: false,
        }
    }
}
