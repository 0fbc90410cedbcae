//! Mode and median imputation.

use crate::coercion::to_categorical;
use crate::error::{Result, ResultExt};
use crate::stats::statistics;
use crate::table::Table;
use crate::types::ImputationPlan;
use crate::utils::{is_categorical_dtype, is_integer_dtype, numeric_values};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Statistical imputation for the columns of an [`ImputationPlan`].
pub struct NullImputer;

impl NullImputer {
    /// Run mode imputation then median imputation over the plan's columns.
    pub fn apply(
        table: Table,
        plan: &ImputationPlan,
        processing_steps: &mut Vec<String>,
    ) -> Result<Table> {
        info!(
            "Imputing nulls: {} mode columns, {} median columns",
            plan.mode_columns().len(),
            plan.median_columns().len()
        );
        let table = Self::impute_with_mode(table, plan.mode_columns(), processing_steps)?;
        Self::impute_with_median(table, plan.median_columns(), processing_steps)
    }

    /// Fill nulls with the most frequent non-null value of each column.
    ///
    /// Ties go to the smallest value in the column's sort order. Works for
    /// any dtype; categorical columns stay categorical.
    pub fn impute_with_mode(
        mut table: Table,
        columns: &[String],
        processing_steps: &mut Vec<String>,
    ) -> Result<Table> {
        for col in columns {
            let series = table.series(col)?;
            if series.null_count() == 0 {
                debug!("Column '{}' has no nulls, skipping mode imputation", col);
                continue;
            }

            let filled =
                Self::fill_with_mode(series).context(format!("Mode imputation of '{}'", col))?;
            match filled {
                Some((filled, mode)) => {
                    let nulls = series.null_count();
                    table.replace_column(filled)?;
                    processing_steps.push(format!(
                        "Filled {} nulls in '{}' with mode: {}",
                        nulls, col, mode
                    ));
                }
                None => warn!("Column '{}' has no non-null values; mode imputation skipped", col),
            }
        }
        Ok(table)
    }

    /// Fill nulls with the median of the non-null values of each column.
    ///
    /// NaN cells are missing too: they are excluded from the median and
    /// filled along with the nulls. Integer columns stay integer when the
    /// median is a whole number and are widened to `Float64` otherwise.
    /// Non-numeric columns fail with a type error.
    pub fn impute_with_median(
        mut table: Table,
        columns: &[String],
        processing_steps: &mut Vec<String>,
    ) -> Result<Table> {
        for col in columns {
            let series = table.series(col)?;
            let values = numeric_values(series, "median imputation")?;
            let nulls = Self::missing_count(series)?;
            if nulls == 0 {
                debug!("Column '{}' has no nulls, skipping median imputation", col);
                continue;
            }

            let Some(median) = statistics::median(&values) else {
                warn!("Column '{}' has no non-null values; median imputation skipped", col);
                continue;
            };

            let filled = Self::fill_with_value(series, median)?;
            table.replace_column(filled)?;
            processing_steps.push(format!(
                "Filled {} nulls in '{}' with median: {:.2}",
                nulls, col, median
            ));
        }
        Ok(table)
    }

    /// Null-filled series and a printable mode, or `None` for an all-null column.
    fn fill_with_mode(series: &Series) -> Result<Option<(Series, String)>> {
        if is_categorical_dtype(series.dtype()) {
            let text = series.cast(&DataType::String)?;
            return match Self::fill_with_mode(&text)? {
                Some((filled, mode)) => Ok(Some((to_categorical(&filled)?, mode))),
                None => Ok(None),
            };
        }

        let non_null = series.drop_nulls();
        if non_null.is_empty() {
            return Ok(None);
        }

        let sorted = non_null.sort(SortOptions::default())?;
        let values = (0..sorted.len())
            .map(|i| sorted.get(i))
            .collect::<PolarsResult<Vec<_>>>()?;

        // Longest run of equal values; the first (smallest) run wins ties.
        let (mut best_start, mut best_len) = (0, 0);
        let mut run_start = 0;
        for i in 1..=values.len() {
            if i == values.len() || values[i] != values[run_start] {
                if i - run_start > best_len {
                    best_start = run_start;
                    best_len = i - run_start;
                }
                run_start = i;
            }
        }

        let label = values[best_start].to_string();
        let mode = sorted.slice(best_start as i64, 1);
        let filler = mode.new_from_index(0, series.len());
        let filled = series.zip_with(&series.is_not_null(), &filler)?;
        Ok(Some((filled, label)))
    }

    fn fill_with_value(series: &Series, value: f64) -> Result<Series> {
        if is_integer_dtype(series.dtype()) && value.fract() == 0.0 {
            let filler = Series::new(series.name().clone(), [value as i64])
                .cast(series.dtype())?
                .new_from_index(0, series.len());
            return Ok(series.zip_with(&series.is_not_null(), &filler)?);
        }

        let floats = series.cast(&DataType::Float64)?;
        let filled: Float64Chunked = floats
            .f64()?
            .into_iter()
            .map(|v| Some(v.filter(|x| !x.is_nan()).unwrap_or(value)))
            .collect();
        Ok(filled.into_series().with_name(series.name().clone()))
    }

    /// Nulls plus NaN cells.
    fn missing_count(series: &Series) -> Result<usize> {
        let nan = match series.dtype() {
            DataType::Float32 | DataType::Float64 => series
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .flatten()
                .filter(|v| v.is_nan())
                .count(),
            _ => 0,
        };
        Ok(series.null_count() + nan)
    }
}
