//! Read-only summaries of a table.
//!
//! Nothing in this module mutates the table. The pipeline takes a
//! [`TableStatistics`] snapshot before and after cleaning for the run report.

pub mod statistics;

use crate::error::Result;
use crate::table::Table;
use crate::types::{ColumnDescription, ColumnInfo, DistinctValues, NullCount};
use crate::utils::{is_categorical_dtype, is_numeric_dtype, numeric_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Every summary [`StatisticsReporter`] produces, taken at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStatistics {
    pub shape: (usize, usize),
    pub columns: Vec<ColumnInfo>,
    pub describe: Vec<ColumnDescription>,
    pub distinct_values: Vec<DistinctValues>,
    pub nulls: Vec<NullCount>,
}

/// Computes shape, column info, numeric summaries, categorical levels and
/// missingness for a table.
pub struct StatisticsReporter;

impl StatisticsReporter {
    /// `(rows, columns)`.
    pub fn shape(table: &Table) -> (usize, usize) {
        table.shape()
    }

    pub fn column_info(table: &Table) -> Vec<ColumnInfo> {
        table
            .frame()
            .get_columns()
            .iter()
            .map(|col| ColumnInfo {
                name: col.name().to_string(),
                dtype: col.dtype().to_string(),
                non_null_count: col.len() - col.null_count(),
            })
            .collect()
    }

    /// Count, mean, sample std, min, quartiles and max for every numeric column.
    pub fn describe(table: &Table) -> Result<Vec<ColumnDescription>> {
        let mut out = Vec::new();
        for col in table.frame().get_columns() {
            if is_numeric_dtype(col.dtype()) {
                out.push(Self::describe_series(col.as_materialized_series())?);
            }
        }
        Ok(out)
    }

    /// Summary for a single named column, which must be numeric.
    pub fn describe_column(table: &Table, column: &str) -> Result<ColumnDescription> {
        Self::describe_series(table.series(column)?)
    }

    fn describe_series(series: &Series) -> Result<ColumnDescription> {
        let values = statistics::sorted(&numeric_values(series, "describe")?);
        debug!("Describing '{}' over {} values", series.name(), values.len());

        Ok(ColumnDescription {
            column: series.name().to_string(),
            count: values.len(),
            mean: statistics::mean(&values),
            std: statistics::sample_std(&values),
            min: values.first().copied(),
            q25: statistics::quantile_sorted(&values, 0.25),
            median: statistics::quantile_sorted(&values, 0.5),
            q75: statistics::quantile_sorted(&values, 0.75),
            max: values.last().copied(),
        })
    }

    /// Sorted distinct non-null values of every categorical column.
    pub fn distinct_values(table: &Table) -> Result<Vec<DistinctValues>> {
        let mut out = Vec::new();
        for col in table.frame().get_columns() {
            if !is_categorical_dtype(col.dtype()) {
                continue;
            }
            let as_text = col.as_materialized_series().cast(&DataType::String)?;
            let values: BTreeSet<String> = as_text
                .str()?
                .into_iter()
                .flatten()
                .map(str::to_string)
                .collect();
            out.push(DistinctValues {
                column: col.name().to_string(),
                values: values.into_iter().collect(),
            });
        }
        Ok(out)
    }

    /// Null count and `100 * nulls / rows` per column; 0.0 for an empty table.
    pub fn null_report(table: &Table) -> Vec<NullCount> {
        let rows = table.height();
        table
            .frame()
            .get_columns()
            .iter()
            .map(|col| {
                let null_count = col.null_count();
                let null_percentage = if rows > 0 {
                    100.0 * null_count as f64 / rows as f64
                } else {
                    0.0
                };
                NullCount {
                    column: col.name().to_string(),
                    null_count,
                    null_percentage,
                }
            })
            .collect()
    }

    pub fn snapshot(table: &Table) -> Result<TableStatistics> {
        Ok(TableStatistics {
            shape: Self::shape(table),
            columns: Self::column_info(table),
            describe: Self::describe(table)?,
            distinct_values: Self::distinct_values(table)?,
            nulls: Self::null_report(table),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::categorical_dtype;
    use pretty_assertions::assert_eq;

    fn sample() -> Table {
        let mut df = df![
            "amount" => [Some(1.0), Some(2.0), Some(3.0), Some(4.0), None],
            "grade" => [Some("B"), Some("A"), Some("B"), None, Some("C")],
            "note" => ["x", "y", "z", "w", "v"],
        ]
        .unwrap();
        let grade = df
            .column("grade")
            .unwrap()
            .cast(&categorical_dtype())
            .unwrap();
        df.replace("grade", grade.take_materialized_series()).unwrap();
        Table::new(df)
    }

    #[test]
    fn test_shape_and_column_info() {
        let table = sample();
        assert_eq!(StatisticsReporter::shape(&table), (5, 3));

        let info = StatisticsReporter::column_info(&table);
        assert_eq!(info.len(), 3);
        assert_eq!(info[0].name, "amount");
        assert_eq!(info[0].non_null_count, 4);
        assert_eq!(info[1].non_null_count, 4);
    }

    #[test]
    fn test_describe_numeric_only() {
        let table = sample();
        let described = StatisticsReporter::describe(&table).unwrap();

        assert_eq!(described.len(), 1);
        let d = &described[0];
        assert_eq!(d.column, "amount");
        assert_eq!(d.count, 4);
        assert_eq!(d.mean, Some(2.5));
        assert_eq!(d.min, Some(1.0));
        assert_eq!(d.q25, Some(1.75));
        assert_eq!(d.median, Some(2.5));
        assert_eq!(d.q75, Some(3.25));
        assert_eq!(d.max, Some(4.0));
        let std = d.std.unwrap();
        assert!((std - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_describe_column_rejects_text() {
        let table = sample();
        let err = StatisticsReporter::describe_column(&table, "note").unwrap_err();
        assert_eq!(err.error_code(), "TYPE_ERROR");
    }

    #[test]
    fn test_distinct_values_sorted_categorical_only() {
        let table = sample();
        let distinct = StatisticsReporter::distinct_values(&table).unwrap();

        assert_eq!(
            distinct,
            vec![DistinctValues {
                column: "grade".to_string(),
                values: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            }]
        );
    }

    #[test]
    fn test_null_report_percentages() {
        let table = sample();
        let nulls = StatisticsReporter::null_report(&table);

        assert_eq!(nulls[0].null_count, 1);
        assert_eq!(nulls[0].null_percentage, 20.0);
        assert_eq!(nulls[2].null_count, 0);
        assert_eq!(nulls[2].null_percentage, 0.0);
    }

    #[test]
    fn test_null_report_invariant_to_row_order() {
        let table = sample();
        let reversed = Table::new(table.frame().reverse());

        assert_eq!(
            StatisticsReporter::null_report(&table),
            StatisticsReporter::null_report(&reversed)
        );
    }

    #[test]
    fn test_null_report_empty_table() {
        let df = df!["a" => Vec::<f64>::new()].unwrap();
        let nulls = StatisticsReporter::null_report(&Table::new(df));
        assert_eq!(nulls[0].null_percentage, 0.0);
    }
}
