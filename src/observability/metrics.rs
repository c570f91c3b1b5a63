//! Metrics collection.
//!
//! # Metrics
//! - `cryoner_cart_mutations_total` (counter): cart changes by operation
//! - `cryoner_cart_items` (gauge): distinct items currently in the cart
//! - `cryoner_price_fetch_total` (counter): ticker fetches by symbol, outcome
//! - `cryoner_sol_price_usd` (gauge): latest SOL quote
//! - `cryoner_checkout_total` (counter): checkout submissions by outcome
//! - `cryoner_payment_sessions_total` (counter): sessions by how they ended
//!
//! No exporter is installed here; without a recorder every call is a no-op.

/// Record a cart mutation.
pub fn record_cart_mutation(operation: &'static str, items: usize) {
    metrics::counter!("cryoner_cart_mutations_total", "operation" => operation).increment(1);
    metrics::gauge!("cryoner_cart_items").set(items as f64);
}

/// Record the outcome of one ticker request.
pub fn record_price_fetch(symbol: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!(
        "cryoner_price_fetch_total",
        "symbol" => symbol.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record the SOL quote currently in use.
pub fn record_sol_price(usd: f64) {
    metrics::gauge!("cryoner_sol_price_usd").set(usd);
}

/// Record a checkout submission.
pub fn record_checkout(outcome: &'static str) {
    metrics::counter!("cryoner_checkout_total", "outcome" => outcome).increment(1);
}

/// Record a payment session reaching a terminal status.
pub fn record_session_end(status: &'static str) {
    metrics::counter!("cryoner_payment_sessions_total", "status" => status).increment(1);
}
