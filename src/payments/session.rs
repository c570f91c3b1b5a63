//! The payment session state machine.
//!
//! Pure state: no timers, no I/O. [`crate::payments::SessionDriver`] feeds
//! it ticks and commands.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use uuid::Uuid;

use crate::checkout::{OrderSnapshot, PaymentMethod};
use crate::payments::address::generate_address;
use crate::payments::types::{PaymentStatus, SessionError};
use crate::pricing::PriceSource;

/// What the buyer has to send, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentDetails {
    /// Rounded to the method's display precision.
    pub amount: Decimal,
    pub address: String,
}

/// A single time-boxed payment attempt against an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSession {
    order_id: Uuid,
    method: PaymentMethod,
    details: Option<PaymentDetails>,
    status: PaymentStatus,
    remaining_secs: u64,
    duration_secs: u64,
}

impl PaymentSession {
    /// A session awaiting payment of `details`.
    pub fn waiting(order: &OrderSnapshot, details: PaymentDetails, duration_secs: u64) -> Self {
        Self {
            order_id: order.id,
            method: order.payment_method,
            details: Some(details),
            status: PaymentStatus::Waiting,
            remaining_secs: duration_secs,
            duration_secs,
        }
    }

    /// A session whose amount could not be determined.
    pub fn failed(order: &OrderSnapshot, duration_secs: u64) -> Self {
        Self {
            order_id: order.id,
            method: order.payment_method,
            details: None,
            status: PaymentStatus::Error,
            remaining_secs: duration_secs,
            duration_secs,
        }
    }

    pub fn order_id(&self) -> Uuid {
        self.order_id
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn details(&self) -> Option<&PaymentDetails> {
        self.details.as_ref()
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// Remaining time as `MM:SS`.
    pub fn remaining_display(&self) -> String {
        format!("{:02}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }

    /// Fraction of the countdown left, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        self.remaining_secs as f64 / self.duration_secs as f64
    }

    /// Advance the countdown by one second.
    ///
    /// Returns `true` if this tick expired the session. Ticks outside
    /// `Waiting`/`Processing` change nothing.
    pub fn tick(&mut self) -> bool {
        if !self.status.counts_down() {
            return false;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.status = PaymentStatus::Expired;
            return true;
        }
        false
    }

    /// Buyer reports the transfer: `Waiting → Processing`.
    pub fn confirm(&mut self) -> Result<(), SessionError> {
        self.transition(PaymentStatus::Waiting, PaymentStatus::Processing, "confirm")
    }

    /// Confirmation arrived: `Processing → Confirmed`.
    pub fn complete(&mut self) -> Result<(), SessionError> {
        self.transition(PaymentStatus::Processing, PaymentStatus::Confirmed, "complete")
    }

    fn transition(
        &mut self,
        from: PaymentStatus,
        to: PaymentStatus,
        action: &'static str,
    ) -> Result<(), SessionError> {
        if self.status != from {
            return Err(SessionError::InvalidTransition {
                from: self.status,
                action,
            });
        }
        tracing::debug!(order_id = %self.order_id, from = %from, to = %to, "Payment status change");
        self.status = to;
        Ok(())
    }
}

/// Amount of `order.payment_method` to send for `order.total_usd`.
///
/// SOL uses the quote captured at checkout, fetching a live one only when
/// none was captured. USDT is 1:1. Anything else is priced live.
pub async fn payment_amount<S: PriceSource>(
    order: &OrderSnapshot,
    prices: &S,
    sol_symbol: &str,
) -> Result<Decimal, SessionError> {
    let method = order.payment_method;
    let raw = if method.is_usd_stable() {
        order.total_usd
    } else {
        let unit_usd = match (method, &order.sol_quote) {
            (PaymentMethod::Sol, Some(quote)) => quote.usd,
            (PaymentMethod::Sol, None) => prices.usd_price(sol_symbol).await?,
            _ => prices.usd_price(&method.usd_symbol()).await?,
        };
        if unit_usd <= Decimal::ZERO {
            return Err(SessionError::Amount(format!(
                "non-positive {} price {}",
                method.ticker(),
                unit_usd
            )));
        }
        order
            .total_usd
            .checked_div(unit_usd)
            .ok_or_else(|| SessionError::Amount("division overflow".to_string()))?
    };

    Ok(raw.round_dp_with_strategy(method.amount_scale(), RoundingStrategy::MidpointAwayFromZero))
}

/// Compute the amount and a fresh address for `order`.
pub async fn prepare_details<S: PriceSource>(
    order: &OrderSnapshot,
    prices: &S,
    sol_symbol: &str,
    address_prefix: &str,
) -> Result<PaymentDetails, SessionError> {
    let amount = payment_amount(order, prices, sol_symbol).await?;
    Ok(PaymentDetails {
        amount,
        address: generate_address(address_prefix, order.payment_method),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::{PriceError, PriceQuote, QuoteSource, StaticPrices};

    fn order(method: PaymentMethod, total: Decimal, sol_quote: Option<Decimal>) -> OrderSnapshot {
        OrderSnapshot {
            id: Uuid::new_v4(),
            items: Vec::new(),
            total_usd: total,
            contact_handle: "@buyer".into(),
            email: None,
            payment_method: method,
            sol_quote: sol_quote
                .map(|usd| PriceQuote::new("SOLUSDT", usd, QuoteSource::Live)),
            created_at: 0,
        }
    }

    fn session(duration: u64) -> PaymentSession {
        let order = order(PaymentMethod::Sol, Decimal::from(300), Some(Decimal::from(150)));
        PaymentSession::waiting(
            &order,
            PaymentDetails {
                amount: Decimal::from(2),
                address: "ADDR".into(),
            },
            duration,
        )
    }

    #[test]
    fn test_countdown_expires_and_stops() {
        let mut s = session(3);
        assert!(!s.tick());
        assert!(!s.tick());
        assert_eq!(s.remaining_secs(), 1);
        assert!(s.tick());
        assert_eq!(s.status(), PaymentStatus::Expired);
        assert_eq!(s.remaining_secs(), 0);

        assert!(!s.tick());
        assert_eq!(s.remaining_secs(), 0);
        assert_eq!(s.status(), PaymentStatus::Expired);
    }

    #[test]
    fn test_processing_still_counts_down() {
        let mut s = session(2);
        s.confirm().unwrap();
        assert!(!s.tick());
        assert!(s.tick());
        assert_eq!(s.status(), PaymentStatus::Expired);
        assert!(s.complete().is_err());
    }

    #[test]
    fn test_confirm_path() {
        let mut s = session(600);
        s.confirm().unwrap();
        assert_eq!(s.status(), PaymentStatus::Processing);
        assert!(s.confirm().is_err());
        s.complete().unwrap();
        assert_eq!(s.status(), PaymentStatus::Confirmed);

        let remaining = s.remaining_secs();
        assert!(!s.tick());
        assert_eq!(s.remaining_secs(), remaining);
    }

    #[test]
    fn test_failed_session() {
        let o = order(PaymentMethod::Btc, Decimal::from(1), None);
        let mut s = PaymentSession::failed(&o, 600);
        assert_eq!(s.status(), PaymentStatus::Error);
        assert!(s.details().is_none());
        assert!(matches!(
            s.confirm(),
            Err(SessionError::InvalidTransition { from: PaymentStatus::Error, .. })
        ));
    }

    #[test]
    fn test_display_and_progress() {
        let mut s = session(600);
        assert_eq!(s.remaining_display(), "10:00");
        s.tick();
        assert_eq!(s.remaining_display(), "09:59");
        assert!((s.progress() - 599.0 / 600.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_sol_amount_uses_captured_quote() {
        // The live price differs; the captured one wins.
        let prices = StaticPrices::sol(Decimal::from(999));
        let o = order(PaymentMethod::Sol, Decimal::from(600), Some(Decimal::from(150)));
        assert_eq!(payment_amount(&o, &prices, "SOLUSDT").await.unwrap(), Decimal::from(4));
    }

    #[tokio::test]
    async fn test_sol_amount_fetches_when_not_captured() {
        let prices = StaticPrices::sol(Decimal::from(7));
        let o = order(PaymentMethod::Sol, Decimal::from(100), None);
        // 14.285714... rounded to 4 places.
        assert_eq!(
            payment_amount(&o, &prices, "SOLUSDT").await.unwrap(),
            Decimal::new(142857, 4)
        );
    }

    #[tokio::test]
    async fn test_stablecoin_is_one_to_one() {
        let o = order(PaymentMethod::UsdtTrc20, Decimal::new(19999, 2), None);
        assert_eq!(
            payment_amount(&o, &StaticPrices::new(), "SOLUSDT").await.unwrap(),
            Decimal::new(19999, 2)
        );
    }

    #[tokio::test]
    async fn test_other_crypto_priced_live() {
        let prices = StaticPrices::new().with("BTCUSDT", Decimal::from(60_000));
        let o = order(PaymentMethod::Btc, Decimal::from(300), None);
        assert_eq!(
            payment_amount(&o, &prices, "SOLUSDT").await.unwrap(),
            Decimal::new(500_000, 8)
        );
    }

    #[tokio::test]
    async fn test_missing_price_is_an_error() {
        let o = order(PaymentMethod::Eth, Decimal::from(300), None);
        let err = payment_amount(&o, &StaticPrices::new(), "SOLUSDT").await.unwrap_err();
        assert!(matches!(err, SessionError::Price(PriceError::UnknownSymbol(_))));
    }

    #[tokio::test]
    async fn test_zero_price_rejected() {
        let prices = StaticPrices::new().with("ETHUSDT", Decimal::ZERO);
        let o = order(PaymentMethod::Eth, Decimal::from(300), None);
        assert!(matches!(
            payment_amount(&o, &prices, "SOLUSDT").await,
            Err(SessionError::Amount(_))
        ));
    }

    #[tokio::test]
    async fn test_prepare_details() {
        let o = order(PaymentMethod::UsdtTrc20, Decimal::from(50), None);
        let details = prepare_details(&o, &StaticPrices::new(), "SOLUSDT", "PFX").await.unwrap();
        assert_eq!(details.amount, Decimal::from(50));
        assert!(details.address.starts_with("PFX_USDT_ADDRESS_"));
    }
}
