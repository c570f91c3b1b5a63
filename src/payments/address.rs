//! Synthetic payment addresses.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::checkout::PaymentMethod;

/// `<PREFIX>_<TICKER>_ADDRESS_<unix millis>_<random suffix>`.
///
/// The millisecond timestamp orders addresses; the suffix keeps two
/// sessions opened in the same millisecond apart.
pub fn generate_address(prefix: &str, method: PaymentMethod) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let suffix: String = std::iter::repeat_with(fastrand::alphanumeric)
        .take(8)
        .collect::<String>()
        .to_ascii_uppercase();

    format!("{}_{}_ADDRESS_{}_{}", prefix, method.ticker(), millis, suffix)
}
