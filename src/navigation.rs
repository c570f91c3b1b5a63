//! Where the storefront flow goes next.

use std::fmt;

use serde::Serialize;

/// A step of the storefront flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Home,
    Checkout,
    Payment,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = match self {
            Route::Home => "/",
            Route::Checkout => "/checkout",
            Route::Payment => "/payment",
        };
        f.write_str(path)
    }
}
