//! Numeric parsing and rounding.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::errors::{AppError, AppResult};

/// Largest scale a `Decimal` can carry.
const MAX_DECIMAL_PLACES: u32 = 28;

/// Parses a trimmed integer.
///
/// # Errors
/// Returns `AppError::InvalidValue` if the input is empty or not an integer.
pub fn parse_int(s: &str) -> AppResult<i64> {
    parse_trimmed(s, "integer")
}

/// Parses a trimmed finite float.
///
/// # Errors
/// Returns `AppError::InvalidValue` if the input is empty, malformed, NaN or infinite.
pub fn parse_float(s: &str) -> AppResult<f64> {
    let value: f64 = parse_trimmed(s, "number")?;
    if !value.is_finite() {
        return Err(AppError::InvalidValue(format!("`{s}` is not a finite number")));
    }
    Ok(value)
}

/// Parses a trimmed exact decimal.
///
/// # Errors
/// Returns `AppError::InvalidValue` if the input is empty or not a decimal.
pub fn parse_decimal(s: &str) -> AppResult<Decimal> {
    parse_trimmed(s, "decimal")
}

fn parse_trimmed<T: FromStr>(s: &str, what: &str) -> AppResult<T> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidValue(format!("empty string is not a valid {what}")));
    }
    trimmed
        .parse()
        .map_err(|_| AppError::InvalidValue(format!("`{trimmed}` is not a valid {what}")))
}

/// Quantizes `value` to exactly `places` fractional digits.
///
/// Ties round to even and shorter values are padded, so `3.1457` gives `3.15`
/// and `3.1` gives `3.10` for two places.
///
/// # Errors
/// Returns `AppError::InvalidValue` if `places` exceeds 28.
pub fn dround(value: Decimal, places: u32) -> AppResult<Decimal> {
    if places > MAX_DECIMAL_PLACES {
        return Err(AppError::InvalidValue(format!(
            "at most {MAX_DECIMAL_PLACES} decimal places are supported"
        )));
    }
    let mut rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(places);
    Ok(rounded)
}
