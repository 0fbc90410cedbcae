//! Outlier removal stage.
//!
//! Tukey fences are computed per column from the input table, then every row
//! with a non-null value outside any of its columns' fences is dropped in a
//! single pass. NaN is treated like null throughout. Fences are never carried between calls.

use crate::error::Result;
use crate::stats::statistics;
use crate::table::Table;
use crate::types::OutlierFence;
use crate::utils::numeric_values;
use polars::prelude::*;
use tracing::{debug, info};

pub struct OutlierRemover;

impl OutlierRemover {
    /// `[Q1 - k*IQR, Q3 + k*IQR]` for each column, quartiles by linear
    /// interpolation over non-null values. All-null columns get no fence.
    pub fn compute_fences(
        table: &Table,
        columns: &[String],
        multiplier: f64,
    ) -> Result<Vec<OutlierFence>> {
        let mut fences = Vec::with_capacity(columns.len());
        for col in columns {
            let sorted = statistics::sorted(&numeric_values(table.series(col)?, "outlier removal")?);
            let (Some(q1), Some(q3)) = (
                statistics::quantile_sorted(&sorted, 0.25),
                statistics::quantile_sorted(&sorted, 0.75),
            ) else {
                debug!("Column '{}' has no non-null values, no fence", col);
                continue;
            };

            let fence = OutlierFence::new(col.clone(), q1, q3, multiplier);
            debug!(
                "Column '{}': Q1={:.4} Q3={:.4} fence [{:.4}, {:.4}]",
                col, q1, q3, fence.lower, fence.upper
            );
            fences.push(fence);
        }
        Ok(fences)
    }

    /// Drop every row that is an outlier in at least one of `columns`.
    pub fn remove_outliers(
        table: Table,
        columns: &[String],
        multiplier: f64,
        processing_steps: &mut Vec<String>,
    ) -> Result<Table> {
        let fences = Self::compute_fences(&table, columns, multiplier)?;
        Self::remove_outside(table, &fences, processing_steps)
    }

    /// Drop rows with a non-null value outside its column's fence.
    ///
    /// Null and NaN cells never mark a row as an outlier.
    pub fn remove_outside(
        table: Table,
        fences: &[OutlierFence],
        processing_steps: &mut Vec<String>,
    ) -> Result<Table> {
        let original_rows = table.height();
        let mut keep = vec![true; original_rows];

        for fence in fences {
            let floats = table.series(&fence.column)?.cast(&DataType::Float64)?;
            let mut flagged = 0;
            for (keep_row, value) in keep.iter_mut().zip(floats.f64()?.into_iter()) {
                if let Some(v) = value
                    && !v.is_nan()
                    && !fence.contains(v)
                {
                    flagged += 1;
                    *keep_row = false;
                }
            }
            debug!("Column '{}': {} values outside fence", fence.column, flagged);
        }

        let table = table.retain_rows(&keep)?;
        let rows_removed = original_rows - table.height();
        info!("Removed {} outlier rows of {}", rows_removed, original_rows);
        processing_steps.push(format!(
            "Removed {} rows containing outliers across {} columns",
            rows_removed,
            fences.len()
        ));
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(table: &Table, col: &str) -> Vec<Option<f64>> {
        table
            .series(col)
            .unwrap()
            .cast(&DataType::Float64)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_single_outlier_removed() {
        let table = Table::new(df!["x" => [1.0, 2.0, 3.0, 4.0, 100.0]].unwrap());
        let mut steps = Vec::new();

        let fences = OutlierRemover::compute_fences(&table, &["x".to_string()], 1.5).unwrap();
        assert_eq!(fences[0].q1, 2.0);
        assert_eq!(fences[0].q3, 4.0);
        assert_eq!(fences[0].iqr, 2.0);
        assert_eq!((fences[0].lower, fences[0].upper), (-1.0, 7.0));

        let cleaned =
            OutlierRemover::remove_outliers(table, &["x".to_string()], 1.5, &mut steps).unwrap();
        assert_eq!(cleaned.height(), 4);
        assert_eq!(cleaned.index(), &[0, 1, 2, 3]);
        assert!(steps[0].contains("Removed 1 rows"));
    }

    #[test]
    fn test_rows_flagged_by_any_column() {
        let table = Table::new(
            df![
                "a" => [1.0, 2.0, 3.0, 4.0, 100.0, 3.0],
                "b" => [10.0, 11.0, 12.0, -500.0, 11.0, 12.0],
            ]
            .unwrap(),
        );
        let cols = ["a".to_string(), "b".to_string()];
        let fences = OutlierRemover::compute_fences(&table, &cols, 1.5).unwrap();
        let mut steps = Vec::new();

        let cleaned = OutlierRemover::remove_outliers(table, &cols, 1.5, &mut steps).unwrap();

        assert_eq!(cleaned.index(), &[0, 1, 2, 5]);
        // Survivors satisfy the fences computed from the input.
        for fence in &fences {
            for v in values(&cleaned, &fence.column).into_iter().flatten() {
                assert!(fence.contains(v));
            }
        }
    }

    #[test]
    fn test_nulls_never_flag_a_row() {
        let table = Table::new(df!["x" => [Some(1.0), None, Some(2.0), Some(3.0), None]].unwrap());
        let mut steps = Vec::new();

        let cleaned =
            OutlierRemover::remove_outliers(table, &["x".to_string()], 1.5, &mut steps).unwrap();
        assert_eq!(cleaned.height(), 5);
    }

    #[test]
    fn test_nan_ignored_for_fences_and_rows() {
        let nan = f64::NAN;
        let table = Table::new(df!["x" => [1.0, 2.0, 3.0, 4.0, nan, nan, nan]].unwrap());
        let mut steps = Vec::new();

        let fences = OutlierRemover::compute_fences(&table, &["x".to_string()], 1.5).unwrap();
        assert_eq!(fences[0].q1, 1.75);
        assert_eq!(fences[0].q3, 3.25);
        assert!(fences[0].lower.is_finite() && fences[0].upper.is_finite());

        let cleaned =
            OutlierRemover::remove_outliers(table, &["x".to_string()], 1.5, &mut steps).unwrap();
        assert_eq!(cleaned.height(), 7);
        assert!(steps[0].contains("Removed 0 rows"));
    }

    #[test]
    fn test_all_nan_column_has_no_fence() {
        let table = Table::new(df!["x" => [f64::NAN, f64::NAN]].unwrap());
        let fences = OutlierRemover::compute_fences(&table, &["x".to_string()], 1.5).unwrap();
        assert!(fences.is_empty());
    }

    #[test]
    fn test_infinite_value_is_an_outlier() {
        let table = Table::new(df!["x" => [1.0, 2.0, 3.0, 4.0, f64::INFINITY]].unwrap());
        let mut steps = Vec::new();

        let fences = OutlierRemover::compute_fences(&table, &["x".to_string()], 1.5).unwrap();
        assert_eq!((fences[0].q1, fences[0].q3), (2.0, 4.0));

        let cleaned =
            OutlierRemover::remove_outliers(table, &["x".to_string()], 1.5, &mut steps).unwrap();
        assert_eq!(cleaned.index(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_all_null_column_has_no_fence() {
        let table = Table::new(df!["x" => [Option::<f64>::None, None]].unwrap());
        let fences = OutlierRemover::compute_fences(&table, &["x".to_string()], 1.5).unwrap();
        assert!(fences.is_empty());
    }

    #[test]
    fn test_integer_columns_supported() {
        let table = Table::new(df!["n" => [1i64, 2, 3, 4, 1000]].unwrap());
        let mut steps = Vec::new();

        let cleaned =
            OutlierRemover::remove_outliers(table, &["n".to_string()], 1.5, &mut steps).unwrap();
        assert_eq!(cleaned.height(), 4);
        assert_eq!(cleaned.series("n").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_rejects_text_column() {
        let table = Table::new(df!["g" => ["a", "b"]].unwrap());
        let mut steps = Vec::new();

        let err = OutlierRemover::remove_outliers(table, &["g".to_string()], 1.5, &mut steps)
            .unwrap_err();
        assert_eq!(err.error_code(), "TYPE_ERROR");
    }

    #[test]
    fn test_larger_multiplier_keeps_more_rows() {
        let data = [1.0, 2.0, 3.0, 4.0, 9.0, 100.0];
        let mut steps = Vec::new();

        let narrow = OutlierRemover::remove_outliers(
            Table::new(df!["x" => data].unwrap()),
            &["x".to_string()],
            1.5,
            &mut steps,
        )
        .unwrap();
        let wide = OutlierRemover::remove_outliers(
            Table::new(df!["x" => data].unwrap()),
            &["x".to_string()],
            30.0,
            &mut steps,
        )
        .unwrap();

        assert!(wide.height() >= narrow.height());
    }
}
