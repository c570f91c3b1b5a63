//! Entering the payment step.

use crate::checkout::{OrderSnapshot, OrderStore};
use crate::config::{PaymentConfig, PricingConfig};
use crate::lifecycle::CancelToken;
use crate::navigation::Route;
use crate::notifications::Notifier;
use crate::observability::metrics;
use crate::payments::driver::{SessionControl, SessionDriver};
use crate::payments::session::{prepare_details, PaymentSession};
use crate::pricing::PriceSource;

/// Result of opening the payment step.
#[derive(Debug)]
pub enum PaymentEntry {
    /// There is nothing to pay for; go elsewhere.
    Redirect(Route),
    /// A session is ready to drive, along with the order it belongs to.
    Ready {
        order: OrderSnapshot,
        session: PaymentSession,
    },
}

/// Loads the pending order and prices it into a [`PaymentSession`].
#[derive(Debug, Clone)]
pub struct PaymentStep<S> {
    prices: S,
    orders: OrderStore,
    config: PaymentConfig,
    sol_symbol: String,
    notifier: Notifier,
}

impl<S: PriceSource> PaymentStep<S> {
    pub fn new(
        prices: S,
        orders: OrderStore,
        payment: &PaymentConfig,
        pricing: &PricingConfig,
        notifier: Notifier,
    ) -> Self {
        Self {
            prices,
            orders,
            config: payment.clone(),
            sol_symbol: pricing.sol_symbol.clone(),
            notifier,
        }
    }

    /// Open the step.
    ///
    /// Without a readable order the buyer is sent back to checkout. If the
    /// amount cannot be computed the session starts in the error state.
    pub async fn open(&self) -> PaymentEntry {
        let order = match self.orders.load() {
            Ok(Some(order)) => order,
            Ok(None) => {
                tracing::info!("No pending order, redirecting to checkout");
                return PaymentEntry::Redirect(Route::Checkout);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable order snapshot, discarding");
                if let Err(e) = self.orders.discard() {
                    tracing::error!(error = %e, "Failed to delete order snapshot");
                }
                self.notifier.error(
                    "Order Unavailable",
                    "Your saved order could not be read. Please check out again.",
                );
                return PaymentEntry::Redirect(Route::Checkout);
            }
        };

        let session = match prepare_details(
            &order,
            &self.prices,
            &self.sol_symbol,
            &self.config.address_prefix,
        )
        .await
        {
            Ok(details) => {
                tracing::info!(
                    order_id = %order.id,
                    method = order.payment_method.id(),
                    amount = %details.amount,
                    "Payment session prepared"
                );
                PaymentSession::waiting(&order, details, self.config.session_secs)
            }
            Err(e) => {
                tracing::error!(order_id = %order.id, error = %e, "Payment amount unavailable");
                metrics::record_session_end("error");
                self.notifier.error(
                    "Payment Calculation Error",
                    format!(
                        "Could not determine the {} amount. Please restart checkout.",
                        order.payment_method.ticker()
                    ),
                );
                PaymentSession::failed(&order, self.config.session_secs)
            }
        };

        PaymentEntry::Ready { order, session }
    }

    /// Wrap `session` in a driver bound to this step's order store.
    pub fn drive(
        &self,
        session: PaymentSession,
        cancel: CancelToken,
    ) -> (SessionDriver, SessionControl) {
        SessionDriver::new(
            session,
            &self.config,
            self.orders.clone(),
            self.notifier.clone(),
            cancel,
        )
    }

    pub fn orders(&self) -> &OrderStore {
        &self.orders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use uuid::Uuid;

    use crate::checkout::PaymentMethod;
    use crate::notifications::{drain, NoticeLevel};
    use crate::payments::types::PaymentStatus;
    use crate::pricing::StaticPrices;
    use crate::storage::{MemoryStore, Storage};

    fn step(storage: Arc<MemoryStore>, prices: StaticPrices, notifier: Notifier) -> PaymentStep<StaticPrices> {
        PaymentStep::new(
            prices,
            OrderStore::new(storage, "cryoner_order"),
            &PaymentConfig::default(),
            &PricingConfig::default(),
            notifier,
        )
    }

    fn order(method: PaymentMethod) -> OrderSnapshot {
        OrderSnapshot {
            id: Uuid::new_v4(),
            items: Vec::new(),
            total_usd: Decimal::from(300),
            contact_handle: "@buyer".into(),
            email: None,
            payment_method: method,
            sol_quote: None,
            created_at: 0,
        }
    }

    #[tokio::test]
    async fn test_no_order_redirects() {
        let step = step(Arc::new(MemoryStore::new()), StaticPrices::new(), Notifier::default());
        assert!(matches!(step.open().await, PaymentEntry::Redirect(Route::Checkout)));
    }

    #[tokio::test]
    async fn test_corrupt_order_discarded() {
        let storage = Arc::new(MemoryStore::new());
        storage.set_raw("cryoner_order", "{not json").unwrap();
        let notifier = Notifier::default();
        let mut rx = notifier.subscribe();

        let step = step(storage.clone(), StaticPrices::new(), notifier);
        assert!(matches!(step.open().await, PaymentEntry::Redirect(Route::Checkout)));
        assert!(!storage.contains("cryoner_order"));
        assert_eq!(drain(&mut rx)[0].title, "Order Unavailable");
    }

    #[tokio::test]
    async fn test_ready_session() {
        let storage = Arc::new(MemoryStore::new());
        let step = step(
            storage,
            StaticPrices::new().with("BTCUSDT", Decimal::from(60_000)),
            Notifier::default(),
        );
        let saved = order(PaymentMethod::Btc);
        step.orders().save(&saved).unwrap();

        let PaymentEntry::Ready { order, session } = step.open().await else {
            panic!("expected a session");
        };
        assert_eq!(order, saved);
        assert_eq!(session.status(), PaymentStatus::Waiting);
        assert_eq!(session.remaining_secs(), 600);
        let details = session.details().unwrap();
        assert_eq!(details.amount, Decimal::new(5, 3));
        assert!(details.address.starts_with("CRYONER_UNIQUE_BTC_ADDRESS_"));
    }

    #[tokio::test]
    async fn test_price_failure_enters_error_state() {
        let storage = Arc::new(MemoryStore::new());
        let notifier = Notifier::default();
        let mut rx = notifier.subscribe();
        let step = step(storage, StaticPrices::new(), notifier);
        step.orders().save(&order(PaymentMethod::Eth)).unwrap();

        let PaymentEntry::Ready { session, .. } = step.open().await else {
            panic!("expected a session");
        };
        assert_eq!(session.status(), PaymentStatus::Error);
        assert!(session.details().is_none());
        // The order is kept so the buyer can restart from it.
        assert!(step.orders().exists().unwrap());

        let notices = drain(&mut rx);
        assert_eq!(notices[0].title, "Payment Calculation Error");
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }
}
