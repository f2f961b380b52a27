//! Monetary amounts
//!
//! The wallet works in a single currency with two decimal places. Amounts are
//! plain `Decimal` values; this module holds the validation rule every
//! externally supplied amount goes through and the serde helpers that render
//! amounts with fixed precision.

use super::error::WalletError;
use rust_decimal::Decimal;

/// Monetary amount (single currency, 2 decimal places)
pub type Amount = Decimal;

/// Number of decimal places carried by every amount
pub const AMOUNT_SCALE: u32 = 2;

/// Validate an externally supplied amount
///
/// Accepts strictly positive values with at most two decimal places
/// (trailing zeros are ignored, so `10.500` is accepted as `10.50`).
///
/// # Errors
///
/// Returns `WalletError::InvalidAmount` for zero, negative or over-precise values.
pub fn validate_amount(amount: Amount) -> Result<Amount, WalletError> {
    if amount <= Decimal::ZERO {
        return Err(WalletError::invalid_amount(amount, "amount must be positive"));
    }

    let normalized = amount.normalize();
    if normalized.scale() > AMOUNT_SCALE {
        return Err(WalletError::invalid_amount(
            amount,
            "amount supports at most 2 decimal places",
        ));
    }

    Ok(normalized)
}

/// Render an amount with exactly two decimal places
pub fn format_amount(amount: Amount) -> String {
    format!("{:.2}", amount)
}

/// Serde adapter writing amounts as fixed 2-decimal strings (`"10.00"`)
///
/// Deserialization accepts both JSON strings and numbers.
pub mod fixed2 {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_amount(*amount))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        <Decimal as Deserialize>::deserialize(deserializer)
    }
}
