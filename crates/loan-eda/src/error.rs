//! Error types for the EDA pipeline.
//!
//! Every stage returns [`Result`], so a failure anywhere aborts the run with a
//! single [`EdaError`]. Errors serialize to `{code, message}` so the run report
//! and the CLI `--json` output can carry them verbatim.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the EDA pipeline.
#[derive(Error, Debug)]
pub enum EdaError {
    /// A value in a strictly parsed column did not match the expected format.
    #[error("Failed to parse value '{value}' in column '{column}' as {format}")]
    Parse {
        column: String,
        value: String,
        format: String,
    },

    /// An operation was applied to a column whose dtype does not support it.
    #[error("Cannot apply {operation} to column '{column}' of type {dtype}")]
    IncompatibleType {
        column: String,
        operation: String,
        dtype: String,
    },

    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The table source could not be reached or read.
    #[error("Table source unavailable: {0}")]
    SourceUnavailable(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EdaError>,
    },
}

impl EdaError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EdaError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for [`EdaError::IncompatibleType`].
    pub fn incompatible(
        column: impl Into<String>,
        operation: impl Into<String>,
        dtype: &polars::prelude::DataType,
    ) -> Self {
        EdaError::IncompatibleType {
            column: column.into(),
            operation: operation.into(),
            dtype: dtype.to_string(),
        }
    }

    /// Stable error code, independent of the message text.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "PARSE_ERROR",
            Self::IncompatibleType { .. } => "TYPE_ERROR",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::SourceUnavailable(_) => "CONNECTION_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether re-running with different input or configuration could succeed.
    ///
    /// Data errors (`Parse`, `IncompatibleType`) are not recoverable without
    /// changing the column lists.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidConfig(_) | Self::SourceUnavailable(_) => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

impl Serialize for EdaError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("EdaError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, EdaError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| EdaError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::DataType;

    #[test]
    fn test_error_code() {
        let err = EdaError::Parse {
            column: "issue_date".to_string(),
            value: "2018-12".to_string(),
            format: "%b-%Y".to_string(),
        };
        assert_eq!(err.error_code(), "PARSE_ERROR");
        assert_eq!(
            EdaError::SourceUnavailable("db down".to_string()).error_code(),
            "CONNECTION_ERROR"
        );
    }

    #[test]
    fn test_incompatible_message() {
        let err = EdaError::incompatible("grade", "median imputation", &DataType::String);
        assert_eq!(err.error_code(), "TYPE_ERROR");
        assert!(err.to_string().contains("median imputation"));
        assert!(err.to_string().contains("grade"));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(EdaError::InvalidConfig("bad".to_string()).is_recoverable());
        assert!(
            EdaError::SourceUnavailable("x".to_string())
                .with_context("Loading")
                .is_recoverable()
        );
        assert!(!EdaError::ColumnNotFound("x".to_string()).is_recoverable());
    }

    #[test]
    fn test_error_serialization() {
        let error = EdaError::ColumnNotFound("term".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("term"));
    }

    #[test]
    fn test_with_context() {
        let error = EdaError::ColumnNotFound("term".to_string()).with_context("During coercion");
        assert!(error.to_string().contains("During coercion"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND");
    }
}
