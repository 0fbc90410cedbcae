//! Per-column conversion functions used by the coercion stage.

use crate::error::{EdaError, Result};
use crate::utils::{
    categorical_dtype, clean_numeric_string, is_missing_marker, is_numeric_dtype, parse_boolean,
};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

/// A number followed by an optional alphabetic unit, e.g. `36 months`.
static NUMBER_WITH_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)\s*[A-Za-z]*$")
        .expect("Invalid regex: number with unit")
});

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

/// Cast to `Categorical`, going through `String` for non-text columns.
pub(crate) fn to_categorical(series: &Series) -> Result<Series> {
    let text = if series.dtype() == &DataType::String {
        series.clone()
    } else {
        series.cast(&DataType::String)?
    };
    Ok(text.cast(&categorical_dtype())?)
}

/// Parse month-year text to `Date`, pinned to the first of the month.
///
/// `format` is a chrono format without a day component (`%b-%Y`). Blank text
/// and nulls stay null. The first value that fails to parse aborts the whole
/// column with [`EdaError::Parse`].
pub(crate) fn to_month_start_date(series: &Series, format: &str) -> Result<Series> {
    let column = series.name().to_string();
    let text = series
        .str()
        .map_err(|_| EdaError::incompatible(&column, "date parsing", series.dtype()))?;
    let day_format = format!("%d {}", format);
    let epoch = epoch();

    let mut days: Vec<Option<i32>> = Vec::with_capacity(text.len());
    for opt_val in text.into_iter() {
        let Some(raw) = opt_val else {
            days.push(None);
            continue;
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            days.push(None);
            continue;
        }

        let date = NaiveDate::parse_from_str(&format!("01 {}", trimmed), &day_format).map_err(
            |_| EdaError::Parse {
                column: column.clone(),
                value: raw.to_string(),
                format: format.to_string(),
            },
        )?;
        days.push(Some((date - epoch).num_days() as i32));
    }

    Ok(Series::new(series.name().clone(), days).cast(&DataType::Date)?)
}

/// Round a numeric column to two fractional digits, ties to even.
pub(crate) fn round_currency(series: &Series) -> Result<Series> {
    if !is_numeric_dtype(series.dtype()) {
        return Err(EdaError::incompatible(
            series.name().as_str(),
            "currency rounding",
            series.dtype(),
        ));
    }
    let floats = series.cast(&DataType::Float64)?;
    let rounded = floats.round(2, RoundMode::HalfToEven)?;
    Ok(rounded.with_name(series.name().clone()))
}

/// Cast to `Int64`, truncating fractions and stripping unit suffixes.
///
/// Returns `Ok(None)` when any non-null value cannot be represented, in which
/// case the caller keeps the column as it was. Missing-value markers such as
/// `n/a` are text like any other and count as unrepresentable; only blank
/// cells become null.
pub(crate) fn to_lenient_int(series: &Series) -> Result<Option<Series>> {
    let values: Vec<Option<f64>> = match series.dtype() {
        dtype if is_numeric_dtype(dtype) => {
            series.cast(&DataType::Float64)?.f64()?.into_iter().collect()
        }
        DataType::String => {
            let mut out = Vec::with_capacity(series.len());
            for opt_val in series.str()?.into_iter() {
                match opt_val.map(str::trim) {
                    None => out.push(None),
                    Some("") => out.push(None),
                    Some(v) => match parse_number_with_unit(v) {
                        Some(n) => out.push(Some(n)),
                        None => return Ok(None),
                    },
                }
            }
            out
        }
        _ => return Ok(None),
    };

    let mut ints: Vec<Option<i64>> = Vec::with_capacity(values.len());
    for value in values {
        match value {
            None => ints.push(None),
            Some(v) if v.is_finite() && v.trunc() >= i64::MIN as f64 && v.trunc() < i64::MAX as f64 => {
                ints.push(Some(v.trunc() as i64))
            }
            Some(_) => return Ok(None),
        }
    }

    Ok(Some(Series::new(series.name().clone(), ints)))
}

fn parse_number_with_unit(text: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(text);
    let caps = NUMBER_WITH_UNIT.captures(&cleaned)?;
    caps.get(1)?.as_str().parse::<f64>().ok()
}

/// Cast to `Float64`. Text is cleaned of currency and percent marks; text
/// that still fails to parse becomes null.
pub(crate) fn to_float(series: &Series) -> Result<Series> {
    match series.dtype() {
        dtype if is_numeric_dtype(dtype) => Ok(series.cast(&DataType::Float64)?),
        DataType::String => {
            let values: Vec<Option<f64>> = series
                .str()?
                .into_iter()
                .map(|opt_val| {
                    opt_val
                        .map(str::trim)
                        .filter(|v| !v.is_empty() && !is_missing_marker(v))
                        .and_then(|v| clean_numeric_string(v).parse::<f64>().ok())
                })
                .collect();
            Ok(Series::new(series.name().clone(), values))
        }
        dtype => Err(EdaError::incompatible(
            series.name().as_str(),
            "float conversion",
            dtype,
        )),
    }
}

/// Parse yes/no text to `Boolean`.
///
/// Returns the converted series and the number of non-null values that were
/// not recognised (those become null).
pub(crate) fn to_boolean(series: &Series) -> Result<(Series, usize)> {
    match series.dtype() {
        DataType::Boolean => Ok((series.clone(), 0)),
        DataType::String => {
            let mut unrecognised = 0;
            let values: Vec<Option<bool>> = series
                .str()?
                .into_iter()
                .map(|opt_val| {
                    let parsed = opt_val.and_then(parse_boolean);
                    if opt_val.is_some() && parsed.is_none() {
                        unrecognised += 1;
                    }
                    parsed
                })
                .collect();
            Ok((Series::new(series.name().clone(), values), unrecognised))
        }
        dtype => Err(EdaError::incompatible(
            series.name().as_str(),
            "boolean parsing",
            dtype,
        )),
    }
}
