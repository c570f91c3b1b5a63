//! Cart and catalog value types.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a USD value could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValueError {
    /// A SOL-priced amount needs a quote and none is available.
    #[error("no SOL quote available")]
    MissingQuote,

    /// The value does not fit in a `Decimal`.
    #[error("amount out of range")]
    Overflow,
}

/// How a product is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "currency", content = "amount")]
pub enum Price {
    /// Fixed price in US dollars.
    #[serde(rename = "USD")]
    Usd(Decimal),
    /// Fixed price in SOL; its USD value depends on the live quote.
    #[serde(rename = "SOL")]
    Sol(Decimal),
    /// "Contact for quote": contributes nothing to totals.
    #[serde(rename = "QUOTE")]
    OnRequest,
}

impl Price {
    /// USD value of one unit, given the current SOL quote.
    ///
    /// Fails for SOL prices when no quote is available, or on overflow.
    pub fn usd_value(&self, sol_usd: Option<Decimal>) -> Result<Decimal, ValueError> {
        match self {
            Price::Usd(amount) => Ok(*amount),
            Price::Sol(amount) => {
                let quote = sol_usd.ok_or(ValueError::MissingQuote)?;
                amount.checked_mul(quote).ok_or(ValueError::Overflow)
            }
            Price::OnRequest => Ok(Decimal::ZERO),
        }
    }

    pub fn is_sol(&self) -> bool {
        matches!(self, Price::Sol(_))
    }

    /// Currency tag as shown to the user.
    pub fn currency(&self) -> &'static str {
        match self {
            Price::Usd(_) => "USD",
            Price::Sol(_) => "SOL",
            Price::OnRequest => "QUOTE",
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Usd(amount) => write!(f, "${}", amount.normalize()),
            Price::Sol(amount) => write!(f, "{} SOL", amount.normalize()),
            Price::OnRequest => f.write_str("Contact for quote"),
        }
    }
}

/// A product that can be put in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Short badge such as "NEW" or "LIMITED".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Product {
    pub fn new(id: impl Into<String>, title: impl Into<String>, price: Price) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price,
            category: None,
            tag: None,
            description: None,
        }
    }
}

/// One line of the cart. `quantity` is always at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub title: String,
    pub price: Price,
    pub quantity: u32,
}

impl CartItem {
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            id: product.id.clone(),
            title: product.title.clone(),
            price: product.price,
            quantity: quantity.max(1),
        }
    }

    /// USD value of the whole line, see [`Price::usd_value`].
    pub fn line_usd(&self, sol_usd: Option<Decimal>) -> Result<Decimal, ValueError> {
        self.price
            .usd_value(sol_usd)?
            .checked_mul(Decimal::from(self.quantity))
            .ok_or(ValueError::Overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_display() {
        assert_eq!(Price::Usd(Decimal::from(199)).to_string(), "$199");
        assert_eq!(Price::Sol(Decimal::new(45, 1)).to_string(), "4.5 SOL");
        assert_eq!(Price::OnRequest.to_string(), "Contact for quote");
    }

    #[test]
    fn test_usd_value() {
        let quote = Some(Decimal::from(150));
        assert_eq!(Price::Usd(Decimal::from(199)).usd_value(None), Ok(Decimal::from(199)));
        assert_eq!(Price::Sol(Decimal::from(4)).usd_value(quote), Ok(Decimal::from(600)));
        assert_eq!(
            Price::Sol(Decimal::from(4)).usd_value(None),
            Err(ValueError::MissingQuote)
        );
        assert_eq!(Price::OnRequest.usd_value(None), Ok(Decimal::ZERO));
    }

    #[test]
    fn test_value_overflow_is_an_error() {
        assert_eq!(
            Price::Sol(Decimal::MAX).usd_value(Some(Decimal::from(150))),
            Err(ValueError::Overflow)
        );

        let product = Product::new("big", "Big", Price::Usd(Decimal::from_i128_with_scale(10i128.pow(20), 0)));
        let item = CartItem::from_product(&product, u32::MAX);
        assert_eq!(item.line_usd(None), Err(ValueError::Overflow));
    }

    #[test]
    fn test_price_wire_format() {
        let json = serde_json::to_string(&Price::Sol(Decimal::from(4))).unwrap();
        assert_eq!(json, r#"{"currency":"SOL","amount":"4"}"#);

        let price: Price = serde_json::from_str(r#"{"currency":"USD","amount":199}"#).unwrap();
        assert_eq!(price, Price::Usd(Decimal::from(199)));

        let price: Price = serde_json::from_str(r#"{"currency":"QUOTE"}"#).unwrap();
        assert_eq!(price, Price::OnRequest);
    }

    #[test]
    fn test_item_quantity_floor() {
        let product = Product::new("a", "A", Price::Usd(Decimal::from(10)));
        assert_eq!(CartItem::from_product(&product, 0).quantity, 1);
        assert_eq!(
            CartItem::from_product(&product, 3).line_usd(None),
            Ok(Decimal::from(30))
        );
    }
}
