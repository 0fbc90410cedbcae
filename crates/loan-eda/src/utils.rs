//! Shared helpers for the EDA stages.

use crate::error::{EdaError, Result};
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    dtype.is_integer() || dtype.is_float()
}

/// Check if a DataType is an integer type.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    dtype.is_integer()
}

#[inline]
pub fn is_categorical_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Categorical(..) | DataType::Enum(..))
}

/// Categorical dtype backed by the global string cache.
pub fn categorical_dtype() -> DataType {
    DataType::from_categories(Categories::global())
}

/// Fail with `IncompatibleType` naming `operation` unless the column is numeric.
pub fn ensure_numeric(series: &Series, operation: &str) -> Result<()> {
    if is_numeric_dtype(series.dtype()) {
        Ok(())
    } else {
        Err(EdaError::incompatible(
            series.name().as_str(),
            operation,
            series.dtype(),
        ))
    }
}

/// Non-missing values of a numeric column as `f64`.
///
/// NaN counts as missing alongside null. Infinities are kept.
/// Text columns are rejected rather than cast, which would turn them into
/// nulls.
pub fn numeric_values(series: &Series, operation: &str) -> Result<Vec<f64>> {
    ensure_numeric(series, operation)?;
    let floats = series.cast(&DataType::Float64)?;
    Ok(floats
        .f64()?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect())
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Text that stands for a missing value.
pub const MISSING_MARKERS: [&str; 7] = ["unknown", "n/a", "na", "null", "missing", "none", "#n/a"];

pub const BOOLEAN_TRUE: [&str; 5] = ["true", "t", "yes", "y", "1"];
pub const BOOLEAN_FALSE: [&str; 5] = ["false", "f", "no", "n", "0"];

/// Clean a string for numeric parsing by removing formatting characters.
///
/// ```rust,ignore
/// assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
/// assert_eq!(clean_numeric_string("  42%  "), "42");
/// ```
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

pub fn is_missing_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    MISSING_MARKERS.iter().any(|&marker| lower == marker)
}

/// Parse yes/no style text, case-insensitive. Unrecognised text is `None`.
pub fn parse_boolean(s: &str) -> Option<bool> {
    let lower = s.trim().to_ascii_lowercase();
    if BOOLEAN_TRUE.contains(&lower.as_str()) {
        Some(true)
    } else if BOOLEAN_FALSE.contains(&lower.as_str()) {
        Some(false)
    } else {
        None
    }
}
