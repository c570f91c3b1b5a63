//! Checkout form state and field validation.

use crate::checkout::CheckoutError;
use crate::checkout::order::PaymentMethod;
use crate::config::CheckoutConfig;

/// What the buyer has typed and picked so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutForm {
    handle: String,
    email: String,
    method: Option<PaymentMethod>,
}

impl CheckoutForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the contact handle, prefixing `sigil` to non-empty input that lacks it.
    pub fn set_handle(&mut self, input: &str, sigil: char) {
        let input = input.trim();
        self.handle = if input.is_empty() || input.starts_with(sigil) {
            input.to_string()
        } else {
            format!("{}{}", sigil, input)
        };
    }

    pub fn set_email(&mut self, input: &str) {
        self.email = input.trim().to_string();
    }

    pub fn select_method(&mut self, method: PaymentMethod) {
        self.method = Some(method);
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// The email, if one was entered.
    pub fn email(&self) -> Option<&str> {
        if self.email.is_empty() {
            None
        } else {
            Some(&self.email)
        }
    }

    pub fn method(&self) -> Option<PaymentMethod> {
        self.method
    }

    /// Check the contact handle against the configured rules.
    pub fn validate_handle(&self, rules: &CheckoutConfig) -> Result<(), CheckoutError> {
        let len = self.handle.chars().count();
        if !self.handle.starts_with(rules.handle_sigil) || len < rules.handle_min_len {
            return Err(CheckoutError::InvalidHandle {
                sigil: rules.handle_sigil,
                min_len: rules.handle_min_len,
            });
        }
        if len > rules.handle_max_len {
            return Err(CheckoutError::HandleTooLong {
                max_len: rules.handle_max_len,
            });
        }
        Ok(())
    }

    /// An empty email is fine; anything else must look like `local@domain.tld`.
    pub fn validate_email(&self) -> Result<(), CheckoutError> {
        match self.email() {
            Some(email) if !is_email_shaped(email) => Err(CheckoutError::InvalidEmail),
            _ => Ok(()),
        }
    }
}

/// `^[^\s@]+@[^\s@]+\.[^\s@]+$`
fn is_email_shaped(input: &str) -> bool {
    if input.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = input.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // Some dot must have non-empty text on both sides.
    domain
        .char_indices()
        .filter(|(_, c)| *c == '.')
        .any(|(i, _)| i > 0 && i + 1 < domain.len())
}
