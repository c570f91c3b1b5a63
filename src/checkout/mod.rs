//! Checkout: turning the cart into a persisted order.
//!
//! # Data Flow
//! ```text
//! CheckoutForm (handle, email, method) + Cart + SOL quote
//!     → validate (handle → email → method → cart → total)
//!     → OrderSnapshot → OrderStore (order key)
//!     → Route::Payment after the navigation delay
//! ```

pub mod form;
pub mod order;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;
use uuid::Uuid;

use crate::cart::{Cart, ValueError};
use crate::config::CheckoutConfig;
use crate::navigation::Route;
use crate::notifications::Notifier;
use crate::observability::metrics;
use crate::pricing::PriceQuote;
use crate::storage::StorageError;

pub use form::CheckoutForm;
pub use order::{OrderSnapshot, OrderStore, PaymentMethod};

/// Reasons a checkout submission is rejected.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Contact handle must start with {sigil} and be at least {min_len} characters long.")]
    InvalidHandle { sigil: char, min_len: usize },

    #[error("Contact handle is too long (max {max_len} characters).")]
    HandleTooLong { max_len: usize },

    #[error("Please enter a valid email address or leave it blank.")]
    InvalidEmail,

    #[error("Please select a cryptocurrency for payment.")]
    MissingPaymentMethod,

    #[error("Your cart is empty. Please add items before proceeding.")]
    EmptyCart,

    #[error("Could not determine SOL price for checkout. Please try again.")]
    PriceUnavailable,

    #[error("Your order total is too large to process. Please reduce quantities.")]
    TotalOutOfRange,

    #[error("Could not save your order: {0}")]
    Storage(String),
}

impl CheckoutError {
    /// Short heading for the notice shown to the buyer.
    pub fn title(&self) -> &'static str {
        match self {
            CheckoutError::InvalidHandle { .. } | CheckoutError::HandleTooLong { .. } => {
                "Invalid Contact Handle"
            }
            CheckoutError::InvalidEmail => "Invalid Email Address",
            CheckoutError::MissingPaymentMethod => "Payment Method Required",
            CheckoutError::EmptyCart => "Empty Cart",
            CheckoutError::PriceUnavailable => "Price Error",
            CheckoutError::TotalOutOfRange => "Order Too Large",
            CheckoutError::Storage(_) => "Checkout Failed",
        }
    }
}

impl From<StorageError> for CheckoutError {
    fn from(e: StorageError) -> Self {
        CheckoutError::Storage(e.to_string())
    }
}

/// Validates the checkout form and persists the resulting order.
#[derive(Debug, Clone)]
pub struct Checkout {
    rules: CheckoutConfig,
    orders: OrderStore,
    notifier: Notifier,
}

impl Checkout {
    pub fn new(rules: CheckoutConfig, orders: OrderStore, notifier: Notifier) -> Self {
        Self {
            rules,
            orders,
            notifier,
        }
    }

    pub fn rules(&self) -> &CheckoutConfig {
        &self.rules
    }

    /// Validate and persist. Nothing is written unless every check passes.
    pub fn submit(
        &self,
        form: &CheckoutForm,
        cart: &Cart,
        sol_quote: Option<&PriceQuote>,
    ) -> Result<OrderSnapshot, CheckoutError> {
        let result = self.build_order(form, cart, sol_quote).and_then(|order| {
            self.orders.save(&order)?;
            Ok(order)
        });

        match &result {
            Ok(order) => {
                metrics::record_checkout("accepted");
                tracing::info!(
                    order_id = %order.id,
                    items = order.items.len(),
                    total_usd = %order.total_usd,
                    method = order.payment_method.id(),
                    "Checkout accepted"
                );
            }
            Err(e) => {
                metrics::record_checkout("rejected");
                self.notifier.error(e.title(), e.to_string());
            }
        }
        result
    }

    /// Submit, then move on to the payment step after the navigation delay.
    pub async fn proceed(
        &self,
        form: &CheckoutForm,
        cart: &Cart,
        sol_quote: Option<&PriceQuote>,
    ) -> Result<(OrderSnapshot, Route), CheckoutError> {
        let order = self.submit(form, cart, sol_quote)?;
        tokio::time::sleep(Duration::from_millis(self.rules.navigation_delay_ms)).await;
        Ok((order, Route::Payment))
    }

    fn build_order(
        &self,
        form: &CheckoutForm,
        cart: &Cart,
        sol_quote: Option<&PriceQuote>,
    ) -> Result<OrderSnapshot, CheckoutError> {
        form.validate_handle(&self.rules)?;
        form.validate_email()?;
        let method = form.method().ok_or(CheckoutError::MissingPaymentMethod)?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let total_usd = cart.try_total_usd(sol_quote).map_err(|e| match e {
            ValueError::MissingQuote => CheckoutError::PriceUnavailable,
            ValueError::Overflow => CheckoutError::TotalOutOfRange,
        })?;

        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        Ok(OrderSnapshot {
            id: Uuid::new_v4(),
            items: cart.items().to_vec(),
            total_usd,
            contact_handle: form.handle().to_string(),
            email: form.email().map(str::to_string),
            payment_method: method,
            sol_quote: sol_quote.cloned(),
            created_at,
        })
    }
}
