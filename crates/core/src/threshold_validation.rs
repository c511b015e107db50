//! Shared threshold validation helpers.
//!
//! Range checks reused by the rep thresholds and feedback policies.

use crate::error::CoreError;

/// Validate that an angle threshold lies within `(0.0, 180.0]`.
pub fn validate_degrees(value: f64, name: &str) -> Result<(), CoreError> {
    if !(value > 0.0 && value <= 180.0) {
        return Err(CoreError::Validation(format!(
            "{name} must be within (0, 180] degrees, got {value}"
        )));
    }
    Ok(())
}

/// Validate that `low < high` for a named band, after range-checking both
/// ends with `check`.
pub fn validate_band(
    low: f64,
    high: f64,
    name: &str,
    check: fn(f64, &str) -> Result<(), CoreError>,
) -> Result<(), CoreError> {
    check(low, name)?;
    check(high, name)?;
    if low >= high {
        return Err(CoreError::Validation(format!(
            "{name} lower bound ({low}) must be below upper bound ({high})"
        )));
    }
    Ok(())
}

/// Validate that a value is finite and strictly positive.
pub fn validate_positive(value: f64, name: &str) -> Result<(), CoreError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(CoreError::Validation(format!(
            "{name} must be a positive number, got {value}"
        )));
    }
    Ok(())
}
