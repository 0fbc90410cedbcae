//! Null imputation stage.
//!
//! Fills nulls with a column-local statistic: the most frequent value for
//! mode columns, the median for numeric median columns. Rows are never
//! added or removed.

mod statistical;

pub use statistical::NullImputer;
