//! The cart state container.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::cart::types::{CartItem, Product, ValueError};
use crate::notifications::Notifier;
use crate::observability::metrics;
use crate::pricing::PriceQuote;
use crate::storage::{Storage, StorageExt};

/// Result of [`Cart::add_item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// The id was already present; nothing changed.
    AlreadyInCart,
}

/// Single source of truth for the shopping cart.
///
/// Loaded from storage once at construction and written back after every
/// mutation. Items are kept in insertion order with unique ids.
pub struct Cart {
    items: Vec<CartItem>,
    open: bool,
    storage: Arc<dyn Storage>,
    key: String,
    notifier: Notifier,
}

impl std::fmt::Debug for Cart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cart")
            .field("items", &self.items)
            .field("open", &self.open)
            .field("key", &self.key)
            .finish()
    }
}

impl Cart {
    /// Load the cart stored under `key`. A missing or unreadable document
    /// yields an empty cart.
    pub fn load(storage: Arc<dyn Storage>, key: impl Into<String>, notifier: Notifier) -> Self {
        let key = key.into();
        let items = match storage.load_json::<Vec<CartItem>>(&key) {
            Ok(Some(items)) => sanitize(items),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding unreadable cart");
                Vec::new()
            }
        };
        tracing::debug!(key = %key, items = items.len(), "Cart loaded");

        Self {
            items,
            open: false,
            storage,
            key,
            notifier,
        }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any line is priced in SOL.
    pub fn has_sol_items(&self) -> bool {
        self.items.iter().any(|item| item.price.is_sol())
    }

    /// Add `product` unless its id is already present. Opens the cart panel.
    pub fn add_item(&mut self, product: &Product, quantity: u32) -> AddOutcome {
        self.open = true;

        if self.contains(&product.id) {
            self.notifier.info(
                format!("{} is already in your cart.", product.title),
                "You can adjust details at checkout.",
            );
            return AddOutcome::AlreadyInCart;
        }

        self.items.push(CartItem::from_product(product, quantity));
        self.persist("add");
        AddOutcome::Added
    }

    /// Remove the line with `id`. Returns whether a line was removed.
    ///
    /// The removal notice is sent even when `id` was absent.
    pub fn remove_item(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        let removed = self.items.len() != before;

        self.persist("remove");
        self.notifier
            .info("Item Removed", "The item has been removed from your cart.");
        removed
    }

    /// Set the quantity of `id` to `max(1, quantity)`. No-op if absent.
    pub fn set_quantity(&mut self, id: &str, quantity: i64) -> bool {
        let clamped = u32::try_from(quantity.max(1)).unwrap_or(u32::MAX);
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.quantity = clamped;
                self.persist("set_quantity");
                true
            }
            None => false,
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.persist("clear");
        self.notifier
            .info("Cart Cleared", "All items have been removed from your cart.");
    }

    /// Grand total in USD.
    ///
    /// `None` when the cart holds a SOL-priced line and no quote is available,
    /// or when the total is out of range; never a silent zero.
    pub fn total_usd(&self, sol_quote: Option<&PriceQuote>) -> Option<Decimal> {
        self.try_total_usd(sol_quote).ok()
    }

    /// Like [`Cart::total_usd`], saying why the total is unavailable.
    pub fn try_total_usd(&self, sol_quote: Option<&PriceQuote>) -> Result<Decimal, ValueError> {
        let sol_usd = sol_quote.map(|q| q.usd);
        self.items.iter().try_fold(Decimal::ZERO, |total, item| {
            total
                .checked_add(item.line_usd(sol_usd)?)
                .ok_or(ValueError::Overflow)
        })
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    fn persist(&self, operation: &'static str) {
        metrics::record_cart_mutation(operation, self.items.len());
        if let Err(e) = self.storage.save_json(&self.key, &self.items) {
            tracing::error!(key = %self.key, error = %e, "Failed to persist cart");
            self.notifier.warning(
                "Cart Not Saved",
                "Your cart could not be saved and may be lost on restart.",
            );
        }
    }
}

/// Drop duplicate ids and restore the quantity floor on stored data.
fn sanitize(items: Vec<CartItem>) -> Vec<CartItem> {
    let mut out: Vec<CartItem> = Vec::with_capacity(items.len());
    for mut item in items {
        if out.iter().any(|existing| existing.id == item.id) {
            tracing::warn!(id = %item.id, "Dropping duplicate stored cart item");
            continue;
        }
        item.quantity = item.quantity.max(1);
        out.push(item);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::types::Price;
    use crate::notifications::{drain, NoticeLevel};
    use crate::pricing::QuoteSource;
    use crate::storage::{MemoryStore, StorageError};

    const KEY: &str = "cryoner_cart";

    fn usd(id: &str, amount: i64) -> Product {
        Product::new(id, id.to_uppercase(), Price::Usd(Decimal::from(amount)))
    }

    fn sol(id: &str, amount: i64) -> Product {
        Product::new(id, id.to_uppercase(), Price::Sol(Decimal::from(amount)))
    }

    fn quote(usd: i64) -> PriceQuote {
        PriceQuote::new("SOLUSDT", Decimal::from(usd), QuoteSource::Live)
    }

    fn empty_cart() -> (Cart, Arc<MemoryStore>, Notifier) {
        let store = Arc::new(MemoryStore::new());
        let notifier = Notifier::default();
        let cart = Cart::load(store.clone(), KEY, notifier.clone());
        (cart, store, notifier)
    }

    #[test]
    fn test_usd_total() {
        let (mut cart, _, _) = empty_cart();
        cart.add_item(&usd("a", 199), 1);
        assert_eq!(cart.total_usd(None), Some(Decimal::from(199)));
    }

    #[test]
    fn test_sol_total_unavailable_without_quote() {
        let (mut cart, _, _) = empty_cart();
        cart.add_item(&sol("b", 4), 1);
        assert_eq!(cart.total_usd(None), None);
        assert_eq!(cart.total_usd(Some(&quote(150))), Some(Decimal::from(600)));
    }

    #[test]
    fn test_total_mixed_lines() {
        let (mut cart, _, _) = empty_cart();
        cart.add_item(&usd("a", 100), 2);
        cart.add_item(&sol("b", 2), 1);
        cart.add_item(&Product::new("c", "C", Price::OnRequest), 5);
        assert_eq!(cart.total_usd(Some(&quote(50))), Some(Decimal::from(300)));
    }

    #[test]
    fn test_empty_cart_total_is_zero() {
        let (cart, _, _) = empty_cart();
        assert_eq!(cart.total_usd(None), Some(Decimal::ZERO));
    }

    #[test]
    fn test_readd_keeps_quantity() {
        let (mut cart, _, notifier) = empty_cart();
        let mut rx = notifier.subscribe();

        assert_eq!(cart.add_item(&usd("a", 10), 3), AddOutcome::Added);
        assert_eq!(cart.add_item(&usd("a", 10), 7), AddOutcome::AlreadyInCart);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get("a").unwrap().quantity, 3);
        assert!(cart.is_open());

        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "A is already in your cart.");
        assert_eq!(notices[0].level, NoticeLevel::Info);
    }

    #[test]
    fn test_set_quantity_clamps() {
        let (mut cart, _, _) = empty_cart();
        cart.add_item(&usd("a", 10), 1);

        assert!(cart.set_quantity("a", 0));
        assert_eq!(cart.get("a").unwrap().quantity, 1);
        assert!(cart.set_quantity("a", -5));
        assert_eq!(cart.get("a").unwrap().quantity, 1);
        assert!(cart.set_quantity("a", 4));
        assert_eq!(cart.get("a").unwrap().quantity, 4);

        assert!(!cart.set_quantity("missing", 4));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_remove_absent_still_notifies() {
        let (mut cart, _, notifier) = empty_cart();
        let mut rx = notifier.subscribe();
        cart.add_item(&usd("a", 10), 1);

        assert!(!cart.remove_item("zzz"));
        assert!(cart.remove_item("a"));
        assert!(cart.is_empty());

        let titles: Vec<_> = drain(&mut rx).into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["Item Removed", "Item Removed"]);
    }

    #[test]
    fn test_mutations_persist() {
        let (mut cart, store, notifier) = empty_cart();
        cart.add_item(&usd("a", 10), 1);
        cart.add_item(&sol("b", 4), 2);
        cart.set_quantity("a", 9);

        let reloaded = Cart::load(store.clone(), KEY, notifier.clone());
        assert_eq!(reloaded.items(), cart.items());
        assert!(!reloaded.is_open());

        cart.clear();
        let reloaded = Cart::load(store, KEY, notifier);
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_load_sanitizes_stored_items() {
        let store = Arc::new(MemoryStore::new());
        store
            .save_json(
                KEY,
                &vec![
                    CartItem::from_product(&usd("a", 1), 2),
                    CartItem {
                        quantity: 0,
                        ..CartItem::from_product(&usd("b", 1), 1)
                    },
                    CartItem::from_product(&usd("a", 1), 5),
                ],
            )
            .unwrap();

        let cart = Cart::load(store, KEY, Notifier::default());
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.get("a").unwrap().quantity, 2);
        assert_eq!(cart.get("b").unwrap().quantity, 1);
    }

    #[test]
    fn test_corrupt_document_loads_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set_raw(KEY, "][").unwrap();
        let cart = Cart::load(store, KEY, Notifier::default());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_random_sequences_keep_invariants() {
        let (mut cart, _, _) = empty_cart();
        let ids = ["a", "b", "c", "d"];
        let mut rng = fastrand::Rng::with_seed(7);

        for _ in 0..500 {
            let id = ids[rng.usize(..ids.len())];
            match rng.u8(..3) {
                0 => {
                    let before = cart.get(id).map(|item| item.quantity);
                    cart.add_item(&usd(id, 1), rng.u32(..5));
                    if let Some(q) = before {
                        assert_eq!(cart.get(id).unwrap().quantity, q);
                    }
                }
                1 => {
                    cart.remove_item(id);
                }
                _ => {
                    cart.set_quantity(id, rng.i64(-3..10));
                }
            }

            let mut seen: Vec<&str> = cart.items().iter().map(|i| i.id.as_str()).collect();
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), cart.len());
            assert!(cart.items().iter().all(|item| item.quantity >= 1));
        }
    }

    #[test]
    fn test_huge_totals_are_unavailable_not_panics() {
        let (mut cart, _, _) = empty_cart();
        let big = Decimal::from_i128_with_scale(10i128.pow(20), 0);
        cart.add_item(&Product::new("big", "Big", Price::Usd(big)), 1);
        assert_eq!(cart.total_usd(None), Some(big));

        assert!(cart.set_quantity("big", i64::MAX));
        assert_eq!(cart.get("big").unwrap().quantity, u32::MAX);
        assert_eq!(cart.total_usd(None), None);
        assert_eq!(cart.try_total_usd(None), Err(ValueError::Overflow));

        let (mut cart, _, _) = empty_cart();
        cart.add_item(&Product::new("max", "Max", Price::Sol(Decimal::MAX)), 1);
        assert_eq!(cart.try_total_usd(Some(&quote(150))), Err(ValueError::Overflow));
        assert_eq!(cart.try_total_usd(None), Err(ValueError::MissingQuote));

        // Each line fits; their sum does not.
        let (mut cart, _, _) = empty_cart();
        cart.add_item(&Product::new("x", "X", Price::Usd(Decimal::MAX)), 1);
        cart.add_item(&Product::new("y", "Y", Price::Usd(Decimal::MAX)), 1);
        assert_eq!(cart.try_total_usd(None), Err(ValueError::Overflow));
    }

    /// Storage whose writes always fail.
    struct ReadOnlyStore;

    impl Storage for ReadOnlyStore {
        fn get_raw(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set_raw(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io {
                key: key.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_keeps_memory_state_and_warns() {
        let notifier = Notifier::default();
        let mut rx = notifier.subscribe();
        let mut cart = Cart::load(Arc::new(ReadOnlyStore), KEY, notifier);

        assert_eq!(cart.add_item(&usd("a", 10), 2), AddOutcome::Added);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get("a").unwrap().quantity, 2);
        assert_eq!(cart.total_usd(None), Some(Decimal::from(20)));

        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "Cart Not Saved");
        assert_eq!(notices[0].level, NoticeLevel::Warning);
    }

    #[test]
    fn test_panel_toggle() {
        let (mut cart, _, _) = empty_cart();
        assert!(!cart.is_open());
        cart.toggle();
        assert!(cart.is_open());
        cart.set_open(false);
        assert!(!cart.is_open());
    }
}
