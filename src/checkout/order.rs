//! Payment methods and the persisted order snapshot.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::CartItem;
use crate::pricing::PriceQuote;
use crate::storage::{Storage, StorageError, StorageExt};

/// Cryptocurrencies accepted at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Sol,
    Btc,
    Eth,
    UsdtTrc20,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Sol,
        PaymentMethod::Btc,
        PaymentMethod::Eth,
        PaymentMethod::UsdtTrc20,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            PaymentMethod::Sol => "sol",
            PaymentMethod::Btc => "btc",
            PaymentMethod::Eth => "eth",
            PaymentMethod::UsdtTrc20 => "usdt_trc20",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PaymentMethod::Sol => "Solana",
            PaymentMethod::Btc => "Bitcoin",
            PaymentMethod::Eth => "Ethereum",
            PaymentMethod::UsdtTrc20 => "Tether",
        }
    }

    pub fn ticker(&self) -> &'static str {
        match self {
            PaymentMethod::Sol => "SOL",
            PaymentMethod::Btc => "BTC",
            PaymentMethod::Eth => "ETH",
            PaymentMethod::UsdtTrc20 => "USDT",
        }
    }

    /// Network the payer must send from.
    pub fn network(&self) -> &'static str {
        match self {
            PaymentMethod::Sol => "Solana Network",
            PaymentMethod::Btc => "Bitcoin Network",
            PaymentMethod::Eth => "Ethereum (ERC20)",
            PaymentMethod::UsdtTrc20 => "Tron (TRC20)",
        }
    }

    /// Ticker pair used to price this asset in USD.
    pub fn usd_symbol(&self) -> String {
        format!("{}USDT", self.ticker())
    }

    /// Decimal places shown for the amount to send.
    pub fn amount_scale(&self) -> u32 {
        match self {
            PaymentMethod::Sol => 4,
            _ => 8,
        }
    }

    /// Pegged 1:1 to USD; no price lookup needed.
    pub fn is_usd_stable(&self) -> bool {
        matches!(self, PaymentMethod::UsdtTrc20)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.network())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.id() == wanted || m.ticker().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| {
                format!(
                    "unknown payment method '{}' (expected one of: {})",
                    s,
                    PaymentMethod::ALL.map(|m| m.id()).join(", ")
                )
            })
    }
}

/// Immutable record of a confirmed cart, created when checkout succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub id: Uuid,
    /// Copied from the cart at checkout time.
    pub items: Vec<CartItem>,
    pub total_usd: Decimal,
    pub contact_handle: String,
    pub email: Option<String>,
    pub payment_method: PaymentMethod,
    /// SOL quote the total was computed with, if one was available.
    pub sol_quote: Option<PriceQuote>,
    /// Unix seconds.
    pub created_at: u64,
}

impl OrderSnapshot {
    /// Comma-separated item titles.
    pub fn summary(&self) -> String {
        self.items
            .iter()
            .map(|item| item.title.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Persistence of the single pending order.
#[derive(Clone)]
pub struct OrderStore {
    storage: Arc<dyn Storage>,
    key: String,
}

impl fmt::Debug for OrderStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderStore").field("key", &self.key).finish()
    }
}

impl OrderStore {
    pub fn new(storage: Arc<dyn Storage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn load(&self) -> Result<Option<OrderSnapshot>, StorageError> {
        self.storage.load_json(&self.key)
    }

    pub fn save(&self, order: &OrderSnapshot) -> Result<(), StorageError> {
        self.storage.save_json(&self.key, order)?;
        tracing::info!(order_id = %order.id, key = %self.key, "Order snapshot persisted");
        Ok(())
    }

    pub fn discard(&self) -> Result<(), StorageError> {
        self.storage.remove(&self.key)?;
        tracing::debug!(key = %self.key, "Order snapshot discarded");
        Ok(())
    }

    pub fn exists(&self) -> Result<bool, StorageError> {
        Ok(self.storage.get_raw(&self.key)?.is_some())
    }
}
