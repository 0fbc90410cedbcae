//! Loan-payments EDA pipeline.
//!
//! Cleans a raw loan-payments table in a fixed sequence of stages built on
//! Polars:
//!
//! - **Type coercion**: categorical, month-year date, boolean, integer, float
//!   and currency columns from explicit column lists
//! - **Statistics**: shape, column info, numeric summaries, category levels and
//!   null percentages, taken before and after cleaning
//! - **Null imputation**: mode or median per column
//! - **Skew treatment**: natural-log transform of columns whose skew exceeds a
//!   threshold
//! - **Outlier removal**: rows outside the Tukey IQR fences of any numeric
//!   column are dropped
//!
//! The cleaned table is written as CSV; a JSON [`EdaReport`] records what
//! each stage measured and changed.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use loan_eda::{CsvSource, Pipeline, PipelineConfig, TableWriter};
//!
//! let result = Pipeline::builder()
//!     .config(PipelineConfig::loan_payments())
//!     .build()?
//!     .run_source(&CsvSource::new("loan_payments.csv"))?;
//!
//! TableWriter::new(false).write(&result.table, "loan_payments_clean.csv")?;
//! for step in &result.steps {
//!     println!("{}", step);
//! }
//! ```
//!
//! # Configuration
//!
//! Column lists are never inferred. Start from the preset and override what
//! differs:
//!
//! ```rust,ignore
//! use loan_eda::config::{PipelineConfig, PipelineConfigBuilder};
//!
//! let config = PipelineConfigBuilder::from_config(PipelineConfig::loan_payments())
//!     .skew_threshold(0.8)
//!     .log_columns(["annual_inc", "total_payment"])
//!     .include_index(true)
//!     .build()?;
//! ```
//!
//! # Running stages directly
//!
//! Every stage is usable on its own; each takes a [`Table`] by value and
//! returns the transformed table.
//!
//! ```rust,ignore
//! use loan_eda::{OutlierRemover, SkewTreatment, Table};
//!
//! let mut steps = Vec::new();
//! let report = SkewTreatment::compute_skew(&table, &columns)?;
//! let skewed = SkewTreatment::select_skewed(&report, 1.0);
//! let table = SkewTreatment::log_transform(table, &skewed, &mut steps)?;
//! let table = OutlierRemover::remove_outliers(table, &columns, 1.5, &mut steps)?;
//! ```

pub mod coercion;
pub mod config;
pub mod error;
pub mod imputers;
pub mod outliers;
pub mod pipeline;
pub mod reporting;
pub mod skew;
pub mod source;
pub mod stats;
pub mod table;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use coercion::TypeCoercer;
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use error::{EdaError, Result as EdaResult, ResultExt};
pub use imputers::NullImputer;
pub use outliers::OutlierRemover;
pub use pipeline::{
    ClosureProgressReporter, Pipeline, PipelineBuilder, PipelineResult, PipelineStage,
    ProgressReporter, ProgressUpdate,
};
pub use reporting::{EdaReport, ReportWriter, TableWriter};
pub use skew::SkewTreatment;
pub use source::{CsvSource, InMemorySource, TableSource};
pub use stats::{StatisticsReporter, TableStatistics};
pub use table::Table;
pub use types::{
    ColumnDescription, ColumnInfo, ColumnSpec, DistinctValues, ImputationPlan,
    ImputationStrategy, NullCount, OutlierFence, SemanticType, SkewReport,
};
