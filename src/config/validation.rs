//! Configuration validation.
//!
//! Serde handles syntax; this pass checks value ranges and cross-field rules.
//! Every problem is reported, not just the first.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::config::schema::StoreConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &StoreConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.storage.dir.trim().is_empty() {
        errors.push(ValidationError::new("storage.dir", "must not be empty"));
    }
    if config.storage.cart_key.is_empty() || config.storage.order_key.is_empty() {
        errors.push(ValidationError::new("storage", "keys must not be empty"));
    }
    if config.storage.cart_key == config.storage.order_key {
        errors.push(ValidationError::new(
            "storage.order_key",
            "must differ from storage.cart_key",
        ));
    }

    if let Err(e) = url::Url::parse(&config.pricing.ticker_url) {
        errors.push(ValidationError::new(
            "pricing.ticker_url",
            format!("invalid URL: {}", e),
        ));
    }
    if config.pricing.sol_symbol.is_empty() {
        errors.push(ValidationError::new("pricing.sol_symbol", "must not be empty"));
    }
    if config.pricing.refresh_secs == 0 {
        errors.push(ValidationError::new("pricing.refresh_secs", "must be > 0"));
    }
    if config.pricing.timeout_secs == 0 {
        errors.push(ValidationError::new("pricing.timeout_secs", "must be > 0"));
    }
    if let Some(fallback) = config.pricing.fallback_sol_usd {
        if fallback <= Decimal::ZERO {
            errors.push(ValidationError::new(
                "pricing.fallback_sol_usd",
                "must be positive",
            ));
        }
    }

    let checkout = &config.checkout;
    if checkout.handle_min_len < 2 {
        errors.push(ValidationError::new(
            "checkout.handle_min_len",
            "must leave room for the sigil and one character",
        ));
    }
    if checkout.handle_max_len < checkout.handle_min_len {
        errors.push(ValidationError::new(
            "checkout.handle_max_len",
            "must be >= checkout.handle_min_len",
        ));
    }

    if config.payment.session_secs == 0 {
        errors.push(ValidationError::new("payment.session_secs", "must be > 0"));
    }
    if config.payment.address_prefix.is_empty() {
        errors.push(ValidationError::new(
            "payment.address_prefix",
            "must not be empty",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
