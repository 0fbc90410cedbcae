//! Skew treatment stage.
//!
//! Measures skewness of numeric columns, picks the ones past a threshold and
//! applies a natural-log transform to them. The transform has no inverse.

use crate::error::Result;
use crate::stats::statistics;
use crate::table::Table;
use crate::types::{ColumnSkew, SkewReport};
use crate::utils::{ensure_numeric, numeric_values};
use polars::prelude::*;
use tracing::{debug, info};

pub struct SkewTreatment;

impl SkewTreatment {
    /// Skewness of each column over its non-null, non-NaN values.
    pub fn compute_skew(table: &Table, columns: &[String]) -> Result<SkewReport> {
        let mut entries = Vec::with_capacity(columns.len());
        for col in columns {
            let values = numeric_values(table.series(col)?, "skew computation")?;
            let skew = statistics::skewness(&values);
            debug!("Column '{}': skew {:.4} over {} values", col, skew, values.len());
            entries.push(ColumnSkew {
                column: col.clone(),
                skew,
            });
        }
        Ok(SkewReport { entries })
    }

    /// Columns whose absolute skew is strictly greater than `threshold`,
    /// in report order.
    pub fn select_skewed(report: &SkewReport, threshold: f64) -> Vec<String> {
        report
            .iter()
            .filter(|entry| entry.skew.abs() > threshold)
            .map(|entry| entry.column.clone())
            .collect()
    }

    /// Replace each value `v` with `ln(v)` when `v > 0` and with `0` otherwise.
    ///
    /// Nulls stay null and the output is always `Float64`.
    pub fn log_transform(
        mut table: Table,
        columns: &[String],
        processing_steps: &mut Vec<String>,
    ) -> Result<Table> {
        if columns.is_empty() {
            return Ok(table);
        }
        info!("Log-transforming {} columns", columns.len());

        for col in columns {
            let transformed = Self::log_series(table.series(col)?)?;
            table.replace_column(transformed)?;
            processing_steps.push(format!("Applied log transform to '{}'", col));
        }
        Ok(table)
    }

    fn log_series(series: &Series) -> Result<Series> {
        ensure_numeric(series, "log transform")?;
        let floats = series.cast(&DataType::Float64)?;
        let logged: Float64Chunked = floats
            .f64()?
            .apply_values(|v| if v > 0.0 { v.ln() } else { 0.0 });
        Ok(logged.into_series().with_name(series.name().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skewed_table() -> Table {
        Table::new(
            df![
                "annual_inc" => [1.0, 1.0, 1.0, 2.0, 2.0, 3.0, 50.0],
                "dti" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
                "grade" => ["A", "B", "C", "D", "E", "F", "G"],
            ]
            .unwrap(),
        )
    }

    #[test]
    fn test_compute_and_select_skewed() {
        let table = skewed_table();
        let report = SkewTreatment::compute_skew(
            &table,
            &["annual_inc".to_string(), "dti".to_string()],
        )
        .unwrap();

        assert_eq!(report.len(), 2);
        assert!(report.get("annual_inc").unwrap() > 1.0);
        assert!(report.get("dti").unwrap().abs() < 1e-9);

        let skewed = SkewTreatment::select_skewed(&report, 1.0);
        assert_eq!(skewed, vec!["annual_inc".to_string()]);
    }

    #[test]
    fn test_select_skewed_is_strict_and_symmetric() {
        let report = SkewReport {
            entries: vec![
                ColumnSkew {
                    column: "at".to_string(),
                    skew: 1.0,
                },
                ColumnSkew {
                    column: "neg".to_string(),
                    skew: -1.5,
                },
            ],
        };
        assert_eq!(SkewTreatment::select_skewed(&report, 1.0), vec!["neg".to_string()]);
    }

    #[test]
    fn test_compute_skew_ignores_nan() {
        let nan = f64::NAN;
        let with_nan = Table::new(
            df!["annual_inc" => [1.0, 1.0, 1.0, nan, 2.0, 2.0, 3.0, nan, 50.0]].unwrap(),
        );
        let cols = ["annual_inc".to_string()];

        let report = SkewTreatment::compute_skew(&with_nan, &cols).unwrap();
        let reference = SkewTreatment::compute_skew(&skewed_table(), &cols).unwrap();

        let skew = report.get("annual_inc").unwrap();
        assert!(skew.is_finite());
        assert!((skew - reference.get("annual_inc").unwrap()).abs() < 1e-12);
        assert_eq!(SkewTreatment::select_skewed(&report, 1.0), cols.to_vec());
    }

    #[test]
    fn test_compute_skew_rejects_text() {
        let err = SkewTreatment::compute_skew(&skewed_table(), &["grade".to_string()])
            .unwrap_err();
        assert_eq!(err.error_code(), "TYPE_ERROR");
    }

    #[test]
    fn test_log_transform_values() {
        let table = Table::new(
            df!["x" => [Some(std::f64::consts::E), Some(1.0), Some(0.0), Some(-3.0), None]]
                .unwrap(),
        );
        let mut steps = Vec::new();

        let table = SkewTreatment::log_transform(table, &["x".to_string()], &mut steps).unwrap();

        let x: Vec<Option<f64>> = table.series("x").unwrap().f64().unwrap().into_iter().collect();
        assert!((x[0].unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(x[1], Some(0.0));
        assert_eq!(x[2], Some(0.0));
        assert_eq!(x[3], Some(0.0));
        assert_eq!(x[4], None);
        assert_eq!(steps.len(), 1);
    }

    #[test]
    fn test_log_transform_non_positive_is_stable() {
        let table = Table::new(df!["x" => [0i64, -1, -5]].unwrap());
        let mut steps = Vec::new();
        let cols = ["x".to_string()];

        let once = SkewTreatment::log_transform(table, &cols, &mut steps).unwrap();
        let twice = SkewTreatment::log_transform(once.clone(), &cols, &mut steps).unwrap();

        for table in [&once, &twice] {
            let x = table.series("x").unwrap();
            assert_eq!(x.dtype(), &DataType::Float64);
            assert!(x.f64().unwrap().into_iter().all(|v| v == Some(0.0)));
        }
    }

    #[test]
    fn test_log_transform_rejects_text() {
        let mut steps = Vec::new();
        let err = SkewTreatment::log_transform(skewed_table(), &["grade".to_string()], &mut steps)
            .unwrap_err();
        assert_eq!(err.error_code(), "TYPE_ERROR");
    }
}
