//! Wiring of the storefront components from a [`StoreConfig`].

use std::sync::Arc;

use thiserror::Error;

use crate::cart::Cart;
use crate::catalog::{Catalog, CatalogError};
use crate::checkout::{Checkout, OrderStore};
use crate::config::StoreConfig;
use crate::notifications::Notifier;
use crate::payments::PaymentStep;
use crate::pricing::{PriceFeed, PriceSource};
use crate::storage::{FileStore, Storage};

#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),
}

/// Shared context: configuration, storage, notices and the catalog.
///
/// Components are built on demand and share the same storage and notifier.
#[derive(Clone)]
pub struct Storefront {
    config: StoreConfig,
    storage: Arc<dyn Storage>,
    notifier: Notifier,
    catalog: Catalog,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("storage_dir", &self.config.storage.dir)
            .field("products", &self.catalog.len())
            .finish()
    }
}

impl Storefront {
    /// File-backed storefront rooted at `config.storage.dir`.
    pub fn open(config: StoreConfig) -> Result<Self, StorefrontError> {
        let catalog = Catalog::from_config(&config.catalog)?;
        let storage = Arc::new(FileStore::new(&config.storage.dir));
        tracing::debug!(dir = %config.storage.dir, "Storefront opened");
        Ok(Self::with_storage(config, storage, catalog))
    }

    pub fn with_storage(config: StoreConfig, storage: Arc<dyn Storage>, catalog: Catalog) -> Self {
        Self {
            config,
            storage,
            notifier: Notifier::default(),
            catalog,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// The persisted cart.
    pub fn cart(&self) -> Cart {
        Cart::load(
            self.storage.clone(),
            self.config.storage.cart_key.as_str(),
            self.notifier.clone(),
        )
    }

    pub fn orders(&self) -> OrderStore {
        OrderStore::new(self.storage.clone(), self.config.storage.order_key.as_str())
    }

    pub fn checkout(&self) -> Checkout {
        Checkout::new(
            self.config.checkout.clone(),
            self.orders(),
            self.notifier.clone(),
        )
    }

    pub fn price_feed<S: PriceSource>(&self, source: S) -> PriceFeed<S> {
        PriceFeed::new(source, &self.config.pricing, self.notifier.clone())
    }

    pub fn payment_step<S: PriceSource>(&self, prices: S) -> PaymentStep<S> {
        PaymentStep::new(
            prices,
            self.orders(),
            &self.config.payment,
            &self.config.pricing,
            self.notifier.clone(),
        )
    }
}
