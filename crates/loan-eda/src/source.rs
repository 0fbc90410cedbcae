//! Where raw tables come from.
//!
//! The pipeline only sees the [`TableSource`] trait. Database extraction lives
//! outside this crate; callers that pull rows from SQL hand the resulting
//! frame over through [`InMemorySource`].

use crate::error::{EdaError, Result, ResultExt};
use crate::table::Table;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

/// Yields the raw table the pipeline starts from.
pub trait TableSource {
    /// Human-readable description for logs and the run report.
    fn describe(&self) -> String;

    /// Load the full table. Unreachable sources fail with
    /// [`EdaError::SourceUnavailable`]; nothing is retried.
    fn load(&self) -> Result<Table>;
}

/// Comma-delimited file with a header row.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    infer_schema_length: Option<usize>,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            infer_schema_length: Some(1000),
        }
    }

    /// Rows scanned to infer column types; `None` scans the whole file.
    pub fn with_infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = rows;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableSource for CsvSource {
    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    fn load(&self) -> Result<Table> {
        if !self.path.is_file() {
            return Err(EdaError::SourceUnavailable(format!(
                "file not found: {}",
                self.path.display()
            )));
        }

        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
            .try_into_reader_with_file_path(Some(self.path.clone()))
            .context(format!("Opening {}", self.path.display()))?
            .finish()
            .context(format!("Reading {}", self.path.display()))?;

        info!(
            "Loaded {} rows x {} columns from {}",
            frame.height(),
            frame.width(),
            self.path.display()
        );
        Ok(Table::new(frame))
    }
}

/// A frame that has already been extracted elsewhere.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    frame: DataFrame,
}

impl InMemorySource {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }
}

impl TableSource for InMemorySource {
    fn describe(&self) -> String {
        format!("memory:{}x{}", self.frame.height(), self.frame.width())
    }

    fn load(&self) -> Result<Table> {
        Ok(Table::new(self.frame.clone()))
    }
}
