//! Product catalog.
//!
//! Loaded from a TOML file of `[[products]]` tables, or the built-in list
//! when no file is configured:
//!
//! ```toml
//! [[products]]
//! id = "starter-kit"
//! title = "Cold Storage Starter Kit"
//! price = { currency = "USD", amount = "199" }
//! category = "hardware"
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{Price, Product};
use crate::config::CatalogConfig;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("product id must not be empty")]
    EmptyId,

    #[error("duplicate product id '{0}'")]
    DuplicateId(String),

    #[error("product '{0}' has a negative price")]
    NegativePrice(String),
}

/// An ordered list of products with unique ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let catalog = Self { products };
        catalog.check()?;
        Ok(catalog)
    }

    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = toml::from_str(content)?;
        catalog.check()?;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// The configured catalog file, or [`Catalog::builtin`].
    pub fn from_config(config: &CatalogConfig) -> Result<Self, CatalogError> {
        match &config.path {
            Some(path) => {
                let catalog = Self::load(Path::new(path))?;
                tracing::info!(path = %path, products = catalog.len(), "Catalog loaded");
                Ok(catalog)
            }
            None => Ok(Self::builtin()),
        }
    }

    /// A small demo catalog covering every price kind.
    pub fn builtin() -> Self {
        let product = |id: &str, title: &str, price: Price, category: &str, description: &str| {
            Product {
                category: Some(category.to_string()),
                description: Some(description.to_string()),
                ..Product::new(id, title, price)
            }
        };

        Self {
            products: vec![
                product(
                    "starter-kit",
                    "Cold Storage Starter Kit",
                    Price::Usd(Decimal::from(199)),
                    "hardware",
                    "Steel seed plate, tamper-evident bags and a printed setup guide.",
                ),
                product(
                    "signing-device",
                    "Air-Gapped Signing Device",
                    Price::Sol(Decimal::new(25, 1)),
                    "hardware",
                    "Offline transaction signer with QR transport.",
                ),
                Product {
                    tag: Some("NEW".to_string()),
                    ..product(
                        "node-setup",
                        "Validator Node Setup",
                        Price::Sol(Decimal::from(4)),
                        "services",
                        "Remote setup and hardening of a validator node.",
                    )
                },
                product(
                    "security-audit",
                    "Wallet Security Review",
                    Price::Usd(Decimal::new(34950, 2)),
                    "services",
                    "Review of key management and backup procedures.",
                ),
                product(
                    "custom-integration",
                    "Custom Integration",
                    Price::OnRequest,
                    "services",
                    "Bespoke tooling; priced after a scoping call.",
                ),
            ],
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn find(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    fn check(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for product in &self.products {
            if product.id.trim().is_empty() {
                return Err(CatalogError::EmptyId);
            }
            if !seen.insert(product.id.as_str()) {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
            if let Price::Usd(amount) | Price::Sol(amount) = product.price {
                if amount.is_sign_negative() {
                    return Err(CatalogError::NegativePrice(product.id.clone()));
                }
            }
        }
        Ok(())
    }
}
