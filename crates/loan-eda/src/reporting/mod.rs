//! Run report and persisted output.
//!
//! [`EdaReport`] collects everything the pipeline measured during a run.
//! [`TableWriter`] persists the cleaned table as CSV and [`ReportWriter`]
//! writes the report as pretty-printed JSON.
//!
//! # Example
//!
//! ```rust,ignore
//! use loan_eda::reporting::{ReportWriter, TableWriter};
//!
//! let result = pipeline.run(table)?;
//! TableWriter::new(true).write(&result.table, "output/loan_payments_clean.csv")?;
//! ReportWriter::write(&result.report, "output/loan_payments_report.json")?;
//! ```

mod report;
mod writer;

pub use report::EdaReport;
pub use writer::{INDEX_COLUMN, ReportWriter, TableWriter};
