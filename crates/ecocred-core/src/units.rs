//! Decimal rendering and parsing of 18-decimal fixed-point amounts.

use crate::constants::{CREDIT_DECIMALS, CREDIT_UNIT};
use crate::error::EcoCredError;
use crate::types::Amount;

/// Parse a decimal string such as `"12.5"` into base units.
///
/// At most 18 fractional digits are accepted; anything finer is an error
/// rather than a silent truncation.
pub fn parse_amount(s: &str) -> Result<Amount, EcoCredError> {
    let s = s.trim();
    let invalid = || EcoCredError::InvalidArgument(format!("invalid amount: {s:?}"));
    if s.is_empty() {
        return Err(invalid());
    }
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > CREDIT_DECIMALS as usize {
        return Err(EcoCredError::InvalidArgument(format!(
            "amount {s:?} has more than {CREDIT_DECIMALS} decimal places"
        )));
    }

    let whole: Amount = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
    let frac_units: Amount = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = CREDIT_DECIMALS as usize);
        padded.parse().map_err(|_| invalid())?
    };

    whole
        .checked_mul(CREDIT_UNIT)
        .and_then(|w| w.checked_add(frac_units))
        .ok_or(EcoCredError::ArithmeticOverflow)
}

/// Render base units as a decimal string with trailing zeros trimmed.
pub fn format_amount(amount: Amount) -> String {
    let whole = amount / CREDIT_UNIT;
    let frac = amount % CREDIT_UNIT;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0>width$}", width = CREDIT_DECIMALS as usize);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Serde adapter that writes amounts as base-unit decimal strings, so that
/// JSON consumers never lose precision on values above 2^53.
pub mod amount_string {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::types::Amount;

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
