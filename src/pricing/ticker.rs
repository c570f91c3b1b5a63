//! Price sources: the HTTP ticker and a static in-memory table.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rust_decimal::Decimal;
use url::Url;

use crate::config::PricingConfig;
use crate::observability::metrics;
use crate::pricing::types::{parse_price, PriceError, TickerResponse};

/// Something that can quote a USD price for a ticker symbol.
pub trait PriceSource: Send + Sync {
    /// USD price of one unit of `symbol` (e.g. `SOLUSDT`).
    fn usd_price(&self, symbol: &str) -> impl Future<Output = Result<Decimal, PriceError>> + Send;
}

/// HTTP client for a public `GET ?symbol=` price ticker.
#[derive(Debug, Clone)]
pub struct TickerClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl TickerClient {
    /// Build a client for the configured ticker endpoint.
    pub fn new(config: &PricingConfig) -> Result<Self, PriceError> {
        let base_url = Url::parse(&config.ticker_url)
            .map_err(|e| PriceError::Request(format!("invalid ticker URL: {}", e)))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("cryoner/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PriceError::Request(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            timeout_secs: config.timeout_secs,
        })
    }

    async fn fetch(&self, symbol: &str) -> Result<Decimal, PriceError> {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair("symbol", symbol);

        let response = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                PriceError::Timeout(self.timeout_secs)
            } else {
                PriceError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PriceError::Status(status.as_u16()));
        }

        let body: TickerResponse = response
            .json()
            .await
            .map_err(|e| PriceError::Decode(e.to_string()))?;
        parse_price(&body.price)
    }
}

impl PriceSource for TickerClient {
    async fn usd_price(&self, symbol: &str) -> Result<Decimal, PriceError> {
        let result = self.fetch(symbol).await;
        metrics::record_price_fetch(symbol, result.is_ok());
        match &result {
            Ok(price) => tracing::debug!(symbol, price = %price, "Fetched ticker price"),
            Err(e) => tracing::warn!(symbol, error = %e, "Ticker fetch failed"),
        }
        result
    }
}

/// Fixed prices held in memory, for offline runs and tests.
///
/// Clones share the same table, so prices can be changed while a feed or
/// session holds the source.
#[derive(Debug, Clone, Default)]
pub struct StaticPrices {
    prices: Arc<Mutex<HashMap<String, Decimal>>>,
}

impl StaticPrices {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding only the SOL/USD pair.
    pub fn sol(usd: Decimal) -> Self {
        let prices = Self::new();
        prices.set("SOLUSDT", usd);
        prices
    }

    pub fn with(self, symbol: &str, usd: Decimal) -> Self {
        self.set(symbol, usd);
        self
    }

    pub fn set(&self, symbol: &str, usd: Decimal) {
        self.lock().insert(symbol.to_string(), usd);
    }

    /// Make `symbol` fail from now on.
    pub fn remove(&self, symbol: &str) {
        self.lock().remove(symbol);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Decimal>> {
        self.prices.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PriceSource for StaticPrices {
    async fn usd_price(&self, symbol: &str) -> Result<Decimal, PriceError> {
        self.lock()
            .get(symbol)
            .copied()
            .ok_or_else(|| PriceError::UnknownSymbol(symbol.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_prices() {
        let prices = StaticPrices::sol(Decimal::from(150)).with("BTCUSDT", Decimal::from(60_000));
        assert_eq!(prices.usd_price("SOLUSDT").await.unwrap(), Decimal::from(150));
        assert_eq!(prices.usd_price("BTCUSDT").await.unwrap(), Decimal::from(60_000));

        let shared = prices.clone();
        shared.remove("SOLUSDT");
        assert_eq!(
            prices.usd_price("SOLUSDT").await,
            Err(PriceError::UnknownSymbol("SOLUSDT".into()))
        );
    }

    #[test]
    fn test_client_rejects_bad_url() {
        let config = PricingConfig {
            ticker_url: "::nope::".into(),
            ..PricingConfig::default()
        };
        assert!(matches!(TickerClient::new(&config), Err(PriceError::Request(_))));
    }
}
