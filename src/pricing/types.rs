//! Price quote types and errors.

use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a quote came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteSource {
    /// Fetched from the ticker.
    Live,
    /// Configured constant substituted after the first failed fetch.
    Fallback,
}

/// USD price of one unit of a crypto asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Ticker symbol the quote is for (e.g. `SOLUSDT`).
    pub symbol: String,
    /// USD per unit.
    pub usd: Decimal,
    pub source: QuoteSource,
    /// Unix seconds.
    pub fetched_at: u64,
}

impl PriceQuote {
    pub fn new(symbol: impl Into<String>, usd: Decimal, source: QuoteSource) -> Self {
        let fetched_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            symbol: symbol.into(),
            usd,
            source,
            fetched_at,
        }
    }

    pub fn is_live(&self) -> bool {
        self.source == QuoteSource::Live
    }
}

/// Errors that can occur while fetching a price.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    /// Transport-level failure.
    #[error("ticker request failed: {0}")]
    Request(String),

    /// The ticker did not answer in time.
    #[error("ticker timeout after {0} seconds")]
    Timeout(u64),

    /// Non-success HTTP status.
    #[error("ticker returned status {0}")]
    Status(u16),

    /// Body was not the expected JSON.
    #[error("malformed ticker response: {0}")]
    Decode(String),

    /// Price field did not hold a positive decimal.
    #[error("invalid price '{0}'")]
    InvalidPrice(String),

    /// The source has no price for this symbol.
    #[error("no price available for {0}")]
    UnknownSymbol(String),
}

/// Ticker response body: `{"symbol":"SOLUSDT","price":"123.45000000"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerResponse {
    #[serde(default)]
    pub symbol: Option<String>,
    pub price: String,
}

/// Parse a string-encoded decimal price, rejecting zero and negatives.
pub fn parse_price(raw: &str) -> Result<Decimal, PriceError> {
    let price =
        Decimal::from_str(raw.trim()).map_err(|_| PriceError::InvalidPrice(raw.to_string()))?;
    if price <= Decimal::ZERO {
        return Err(PriceError::InvalidPrice(raw.to_string()));
    }
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("123.45000000").unwrap(), Decimal::new(12345, 2));
        assert_eq!(parse_price(" 7 ").unwrap(), Decimal::from(7));
        assert!(matches!(parse_price("abc"), Err(PriceError::InvalidPrice(_))));
        assert!(matches!(parse_price("0"), Err(PriceError::InvalidPrice(_))));
        assert!(matches!(parse_price("-3.2"), Err(PriceError::InvalidPrice(_))));
    }

    #[test]
    fn test_decode_ticker_body() {
        let body: TickerResponse =
            serde_json::from_str(r#"{"symbol":"SOLUSDT","price":"142.17000000"}"#).unwrap();
        assert_eq!(body.symbol.as_deref(), Some("SOLUSDT"));
        assert_eq!(parse_price(&body.price).unwrap(), Decimal::new(14217, 2));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(PriceError::Status(451).to_string(), "ticker returned status 451");
        assert_eq!(
            PriceError::Timeout(10).to_string(),
            "ticker timeout after 10 seconds"
        );
    }
}
