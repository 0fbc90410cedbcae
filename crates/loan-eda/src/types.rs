//! Shared data types for the EDA pipeline.
//!
//! These are the column plans the caller hands to the stages and the
//! read-only summaries the stages hand back. Everything here is
//! serializable so it can land in the run report unchanged.

use crate::error::{EdaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============================================================================
// Column plans
// ============================================================================

/// Semantic type a column is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    /// Polars `Categorical`, the observed values become the categories.
    Categorical,
    /// Month-year text parsed to `Date` (first day of the month).
    Date,
    /// Yes/no style text parsed to `Boolean`.
    Boolean,
    /// Lenient cast to `Int64`; the column is left alone if any value fails.
    Integer,
    /// Cast to `Float64`, unparseable text becomes null.
    Float,
    /// Numeric column rounded to two fractional digits.
    Currency,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Categorical => "categorical",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Currency => "currency",
        }
    }
}

/// A column name paired with the type it should be coerced to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub semantic_type: SemanticType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
        }
    }
}

/// How nulls in a column are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationStrategy {
    /// Most frequent non-null value.
    Mode,
    /// Median of the non-null values (numeric columns only).
    Median,
}

/// Columns to impute, grouped by strategy.
///
/// A column can appear under at most one strategy; [`ImputationPlan::new`]
/// rejects overlapping lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImputationPlan {
    mode_columns: Vec<String>,
    median_columns: Vec<String>,
}

impl ImputationPlan {
    pub fn new(mode_columns: Vec<String>, median_columns: Vec<String>) -> Result<Self> {
        let mode_set: HashSet<&str> = mode_columns.iter().map(String::as_str).collect();
        if let Some(dup) = median_columns.iter().find(|c| mode_set.contains(c.as_str())) {
            return Err(EdaError::InvalidConfig(format!(
                "column '{}' is listed for both mode and median imputation",
                dup
            )));
        }

        Ok(Self {
            mode_columns,
            median_columns,
        })
    }

    pub fn mode_columns(&self) -> &[String] {
        &self.mode_columns
    }

    pub fn median_columns(&self) -> &[String] {
        &self.median_columns
    }

    /// Strategy assigned to `column`, if any.
    pub fn strategy_for(&self, column: &str) -> Option<ImputationStrategy> {
        if self.mode_columns.iter().any(|c| c == column) {
            Some(ImputationStrategy::Mode)
        } else if self.median_columns.iter().any(|c| c == column) {
            Some(ImputationStrategy::Median)
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mode_columns.is_empty() && self.median_columns.is_empty()
    }
}

// ============================================================================
// Statistics summaries
// ============================================================================

/// Name, dtype and non-null count of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub non_null_count: usize,
}

/// Summary statistics for one numeric column.
///
/// All fields except `count` are `None` when the column has no non-null
/// values; `std` is also `None` for a single value (sample std, ddof = 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescription {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Null count and percentage for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullCount {
    pub column: String,
    pub null_count: usize,
    pub null_percentage: f64,
}

/// Sorted distinct values of one categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistinctValues {
    pub column: String,
    pub values: Vec<String>,
}

// ============================================================================
// Skew and outliers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSkew {
    pub column: String,
    pub skew: f64,
}

/// Skewness per numeric column, in the order the columns were requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkewReport {
    pub entries: Vec<ColumnSkew>,
}

impl SkewReport {
    pub fn get(&self, column: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.column == column)
            .map(|e| e.skew)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnSkew> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Tukey fence for one numeric column: `[q1 - k*iqr, q3 + k*iqr]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierFence {
    pub column: String,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl OutlierFence {
    pub fn new(column: impl Into<String>, q1: f64, q3: f64, multiplier: f64) -> Self {
        let iqr = q3 - q1;
        Self {
            column: column.into(),
            q1,
            q3,
            iqr,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        }
    }

    /// Whether `value` lies inside the fence (bounds inclusive).
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imputation_plan_rejects_overlap() {
        let result = ImputationPlan::new(
            vec!["term".to_string(), "int_rate".to_string()],
            vec!["int_rate".to_string()],
        );

        assert!(matches!(result, Err(EdaError::InvalidConfig(msg)) if msg.contains("int_rate")));
    }

    #[test]
    fn test_imputation_plan_strategy_lookup() {
        let plan = ImputationPlan::new(
            vec!["term".to_string()],
            vec!["funded_amount".to_string()],
        )
        .unwrap();

        assert_eq!(plan.strategy_for("term"), Some(ImputationStrategy::Mode));
        assert_eq!(
            plan.strategy_for("funded_amount"),
            Some(ImputationStrategy::Median)
        );
        assert_eq!(plan.strategy_for("grade"), None);
        assert!(!plan.is_empty());
    }

    #[test]
    fn test_outlier_fence_bounds() {
        let fence = OutlierFence::new("x", 2.0, 4.0, 1.5);
        assert_eq!(fence.iqr, 2.0);
        assert_eq!(fence.lower, -1.0);
        assert_eq!(fence.upper, 7.0);
        assert!(fence.contains(7.0));
        assert!(fence.contains(-1.0));
        assert!(!fence.contains(100.0));
    }

    #[test]
    fn test_skew_report_lookup() {
        let report = SkewReport {
            entries: vec![
                ColumnSkew {
                    column: "a".to_string(),
                    skew: 2.5,
                },
                ColumnSkew {
                    column: "b".to_string(),
                    skew: -0.2,
                },
            ],
        };
        assert_eq!(report.get("a"), Some(2.5));
        assert_eq!(report.get("missing"), None);
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn test_semantic_type_serializes_snake_case() {
        let spec = ColumnSpec::new("grade", SemanticType::Categorical);
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("\"categorical\""));
    }
}
