//! Type coercion stage.
//!
//! Applies the caller's [`ColumnSpec`] list to a table: categorical, date,
//! boolean, integer, float and currency columns. Date parsing is strict and
//! fails the run; integer casting is lenient and leaves a column untouched
//! when any value refuses to convert.

mod converters;

use crate::config::DEFAULT_DATE_FORMAT;
use crate::error::{Result, ResultExt};
use crate::table::Table;
use crate::types::{ColumnSpec, SemanticType};
use polars::prelude::*;
use tracing::{debug, info, warn};

pub(crate) use converters::to_categorical;

/// Coerces columns to their semantic types.
#[derive(Debug, Clone)]
pub struct TypeCoercer {
    date_format: String,
}

impl Default for TypeCoercer {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}

impl TypeCoercer {
    /// `date_format` is a chrono month-year format such as `%b-%Y`.
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
        }
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Coerce every column in `specs`, in order.
    pub fn coerce(
        &self,
        mut table: Table,
        specs: &[ColumnSpec],
        processing_steps: &mut Vec<String>,
    ) -> Result<Table> {
        info!("Coercing {} columns", specs.len());
        for spec in specs {
            self.coerce_column(&mut table, spec, processing_steps)
                .context(format!("Coercing '{}' to {}", spec.name, spec.semantic_type.as_str()))?;
        }
        Ok(table)
    }

    /// Coerce one column in place.
    pub fn coerce_column(
        &self,
        table: &mut Table,
        spec: &ColumnSpec,
        processing_steps: &mut Vec<String>,
    ) -> Result<()> {
        let series = table.series(&spec.name)?;
        let before = series.dtype().clone();

        let converted = match spec.semantic_type {
            SemanticType::Categorical => {
                if matches!(before, DataType::Categorical(..)) {
                    None
                } else {
                    Some(converters::to_categorical(series)?)
                }
            }
            SemanticType::Date => {
                if before == DataType::Date {
                    None
                } else {
                    Some(converters::to_month_start_date(series, &self.date_format)?)
                }
            }
            SemanticType::Currency => Some(converters::round_currency(series)?),
            SemanticType::Float => Some(converters::to_float(series)?),
            SemanticType::Integer => match converters::to_lenient_int(series)? {
                Some(ints) => Some(ints),
                None => {
                    warn!(
                        "Column '{}' kept as {}: not every value converts to an integer",
                        spec.name, before
                    );
                    processing_steps.push(format!(
                        "Kept '{}' as {} (integer conversion not possible)",
                        spec.name, before
                    ));
                    return Ok(());
                }
            },
            SemanticType::Boolean => {
                let (bools, unrecognised) = converters::to_boolean(series)?;
                if unrecognised > 0 {
                    warn!(
                        "Column '{}': {} unrecognised boolean values set to null",
                        spec.name, unrecognised
                    );
                }
                Some(bools)
            }
        };

        let Some(converted) = converted else {
            debug!("Column '{}' already {}", spec.name, before);
            return Ok(());
        };

        let after = converted.dtype().clone();
        table.replace_column(converted)?;
        debug!("Column '{}': {} -> {}", spec.name, before, after);
        processing_steps.push(format!(
            "Converted '{}' from {} to {} ({})",
            spec.name,
            before,
            after,
            spec.semantic_type.as_str()
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loan_frame() -> Table {
        Table::new(
            df![
                "grade" => ["A", "B", "A"],
                "issue_date" => [Some("Jan-2021"), Some("Feb-2021"), None],
                "term" => [Some("36 months"), None, Some("60 months")],
                "funded_amount_inv" => [100.456, 200.0, 300.999],
                "payment_plan" => ["n", "n", "y"],
                "mths_since_last_delinq" => [Some(2.0), None, Some(f64::INFINITY)],
            ]
            .unwrap(),
        )
    }

    fn specs() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::new("grade", SemanticType::Categorical),
            ColumnSpec::new("issue_date", SemanticType::Date),
            ColumnSpec::new("term", SemanticType::Integer),
            ColumnSpec::new("funded_amount_inv", SemanticType::Currency),
            ColumnSpec::new("payment_plan", SemanticType::Boolean),
        ]
    }

    #[test]
    fn test_coerce_all_types() {
        let mut steps = Vec::new();
        let table = TypeCoercer::default()
            .coerce(loan_frame(), &specs(), &mut steps)
            .unwrap();

        assert!(matches!(
            table.series("grade").unwrap().dtype(),
            DataType::Categorical(..)
        ));
        assert_eq!(table.series("issue_date").unwrap().dtype(), &DataType::Date);
        assert_eq!(table.series("term").unwrap().dtype(), &DataType::Int64);
        assert_eq!(table.series("payment_plan").unwrap().dtype(), &DataType::Boolean);

        let fee = table.series("funded_amount_inv").unwrap();
        assert_eq!(fee.get(0).unwrap().try_extract::<f64>().unwrap(), 100.46);
        assert_eq!(fee.get(2).unwrap().try_extract::<f64>().unwrap(), 301.0);

        assert_eq!(steps.len(), 5);
        assert_eq!(table.height(), 3);
    }

    #[test]
    fn test_lenient_integer_failure_keeps_column() {
        let mut steps = Vec::new();
        let spec = [ColumnSpec::new("mths_since_last_delinq", SemanticType::Integer)];
        let table = TypeCoercer::default()
            .coerce(loan_frame(), &spec, &mut steps)
            .unwrap();

        let col = table.series("mths_since_last_delinq").unwrap();
        assert_eq!(col.dtype(), &DataType::Float64);
        assert_eq!(col.get(0).unwrap().try_extract::<f64>().unwrap(), 2.0);
        assert!(steps[0].contains("Kept"));
    }

    #[test]
    fn test_lenient_integer_keeps_text_with_missing_markers() {
        let table = Table::new(df!["term" => ["36 months", "n/a", "none"]].unwrap());
        let mut steps = Vec::new();
        let table = TypeCoercer::default()
            .coerce(table, &[ColumnSpec::new("term", SemanticType::Integer)], &mut steps)
            .unwrap();

        let term = table.series("term").unwrap();
        assert_eq!(term.dtype(), &DataType::String);
        assert_eq!(term.null_count(), 0);
        assert_eq!(term.str().unwrap().get(1), Some("n/a"));
        assert!(steps[0].contains("Kept 'term'"));
    }

    #[test]
    fn test_date_parse_error_aborts() {
        let table = Table::new(df!["issue_date" => ["Jan-2021", "not a date"]].unwrap());
        let mut steps = Vec::new();
        let err = TypeCoercer::default()
            .coerce(
                table,
                &[ColumnSpec::new("issue_date", SemanticType::Date)],
                &mut steps,
            )
            .unwrap_err();

        assert_eq!(err.error_code(), "PARSE_ERROR");
        assert!(err.to_string().contains("issue_date"));
        assert!(steps.is_empty());
    }

    #[test]
    fn test_missing_column_fails() {
        let mut steps = Vec::new();
        let err = TypeCoercer::default()
            .coerce(
                loan_frame(),
                &[ColumnSpec::new("nope", SemanticType::Float)],
                &mut steps,
            )
            .unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_coercion_is_idempotent_for_dates_and_categories() {
        let mut steps = Vec::new();
        let coercer = TypeCoercer::default();
        let specs = [
            ColumnSpec::new("grade", SemanticType::Categorical),
            ColumnSpec::new("issue_date", SemanticType::Date),
        ];
        let once = coercer.coerce(loan_frame(), &specs, &mut steps).unwrap();
        let twice = coercer.coerce(once.clone(), &specs, &mut steps).unwrap();

        assert_eq!(steps.len(), 2);
        assert!(once.frame().equals_missing(twice.frame()));
    }
}
