use crate::stats::TableStatistics;
use crate::types::{NullCount, OutlierFence, SkewReport};
use chrono::Local;
use serde::{Deserialize, Serialize};

/// Everything measured during one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdaReport {
    /// Local time the report was generated (RFC 3339).
    pub generated_at: String,
    /// Where the raw table came from, if known.
    pub source: Option<String>,
    /// Path of the persisted table, once written.
    pub output_file: Option<String>,
    pub duration_ms: u64,

    /// Statistics after type coercion, before any cleaning.
    pub before: TableStatistics,
    /// Statistics of the final table.
    pub after: TableStatistics,

    pub dropped_columns: Vec<String>,
    pub nulls_after_imputation: Vec<NullCount>,

    pub skew: SkewReport,
    pub skew_threshold: f64,
    /// `log_transformed` came from a configured list rather than the skew
    /// threshold.
    #[serde(default)]
    pub log_columns_configured: bool,
    pub log_transformed: Vec<String>,

    pub outlier_fences: Vec<OutlierFence>,
    pub iqr_multiplier: f64,
    pub rows_removed: usize,

    pub processing_steps: Vec<String>,
}

impl EdaReport {
    /// Report skeleton stamped with the current local time; the pipeline
    /// fills in the rest as stages complete.
    pub fn new(before: TableStatistics) -> Self {
        Self {
            generated_at: Local::now().to_rfc3339(),
            source: None,
            output_file: None,
            duration_ms: 0,
            after: before.clone(),
            before,
            dropped_columns: Vec::new(),
            nulls_after_imputation: Vec::new(),
            skew: SkewReport::default(),
            skew_threshold: 0.0,
            log_columns_configured: false,
            log_transformed: Vec::new(),
            outlier_fences: Vec::new(),
            iqr_multiplier: 0.0,
            rows_removed: 0,
            processing_steps: Vec::new(),
        }
    }

    /// Why the `log_transformed` columns were chosen.
    pub fn log_selection(&self) -> String {
        if self.log_columns_configured {
            "configured list".to_string()
        } else {
            format!("|skew| > {}", self.skew_threshold)
        }
    }

    /// Rows before and after cleaning.
    pub fn row_change(&self) -> (usize, usize) {
        (self.before.shape.0, self.after.shape.0)
    }
}
