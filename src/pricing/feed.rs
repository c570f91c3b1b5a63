//! Periodically refreshed SOL/USD quote.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tokio::time::{self, MissedTickBehavior};

use crate::config::PricingConfig;
use crate::lifecycle::CancelToken;
use crate::notifications::Notifier;
use crate::observability::metrics;
use crate::pricing::ticker::PriceSource;
use crate::pricing::types::{PriceError, PriceQuote, QuoteSource};

/// Read-only view of the latest quote, cheap to clone and share.
#[derive(Debug, Clone, Default)]
pub struct QuoteHandle {
    latest: Arc<ArcSwapOption<PriceQuote>>,
}

impl QuoteHandle {
    /// The most recent quote, live or fallback.
    pub fn current(&self) -> Option<Arc<PriceQuote>> {
        self.latest.load_full()
    }
}

/// Keeps the latest SOL/USD quote up to date.
///
/// On a failed fetch the last known quote is kept. If there has never been
/// one, the configured fallback is stored and marked
/// [`QuoteSource::Fallback`]. Every failure raises a warning notice.
pub struct PriceFeed<S> {
    source: S,
    symbol: String,
    fallback: Option<Decimal>,
    interval: Duration,
    quotes: QuoteHandle,
    notifier: Notifier,
}

impl<S: PriceSource> PriceFeed<S> {
    pub fn new(source: S, config: &PricingConfig, notifier: Notifier) -> Self {
        Self {
            source,
            symbol: config.sol_symbol.clone(),
            fallback: config.fallback_sol_usd,
            interval: Duration::from_secs(config.refresh_secs),
            quotes: QuoteHandle::default(),
            notifier,
        }
    }

    /// A handle observing this feed's quotes.
    pub fn handle(&self) -> QuoteHandle {
        self.quotes.clone()
    }

    pub fn current(&self) -> Option<Arc<PriceQuote>> {
        self.quotes.current()
    }

    /// Fetch once and update the shared quote.
    pub async fn refresh(&self) -> Result<Arc<PriceQuote>, PriceError> {
        match self.source.usd_price(&self.symbol).await {
            Ok(usd) => {
                let quote = Arc::new(PriceQuote::new(&self.symbol, usd, QuoteSource::Live));
                self.quotes.latest.store(Some(quote.clone()));
                metrics::record_sol_price(usd.to_f64().unwrap_or_default());
                tracing::info!(symbol = %self.symbol, usd = %usd, "Price quote updated");
                Ok(quote)
            }
            Err(e) => {
                tracing::warn!(symbol = %self.symbol, error = %e, "Price refresh failed");
                if self.quotes.current().is_none() {
                    if let Some(usd) = self.fallback {
                        tracing::warn!(usd = %usd, "Using fallback price quote");
                        self.quotes.latest.store(Some(Arc::new(PriceQuote::new(
                            &self.symbol,
                            usd,
                            QuoteSource::Fallback,
                        ))));
                    }
                }
                self.notifier.warning(
                    "Crypto Price Error",
                    "Could not fetch live SOL price. USD estimates may be unavailable.",
                );
                Err(e)
            }
        }
    }

    /// Refresh now and then on every interval until `cancel` fires.
    ///
    /// A refresh in progress finishes before the next one starts. Cancelling
    /// mid-fetch drops the fetch; its result is never stored.
    pub async fn run(self, mut cancel: CancelToken) {
        tracing::info!(
            symbol = %self.symbol,
            interval_secs = self.interval.as_secs(),
            "Price feed starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Price feed received shutdown signal, exiting loop");
                    break;
                }
                _ = ticker.tick() => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            tracing::info!("Price feed cancelled during refresh, exiting loop");
                            break;
                        }
                        _ = self.refresh() => {}
                    }
                }
            }
        }
    }
}
