//! The in-memory table the stages pass along.
//!
//! A [`Table`] is a polars `DataFrame` plus a stable row index. The index is
//! assigned once when the table is created and filtered together with the
//! rows, so after outlier removal the surviving rows still carry the
//! positions they had in the source.

use crate::error::{EdaError, Result};
use polars::prelude::*;

#[derive(Debug, Clone)]
pub struct Table {
    frame: DataFrame,
    index: Vec<u64>,
}

impl Table {
    /// Wrap a frame, numbering its rows `0..height`.
    pub fn new(frame: DataFrame) -> Self {
        let index = (0..frame.height() as u64).collect();
        Self { frame, index }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// Row index, parallel to the frame's rows.
    pub fn index(&self) -> &[u64] {
        &self.index
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        self.frame.shape()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    /// Borrow a column as a series, or fail with `ColumnNotFound`.
    pub fn series(&self, name: &str) -> Result<&Series> {
        self.frame
            .column(name)
            .map(|c| c.as_materialized_series())
            .map_err(|_| EdaError::ColumnNotFound(name.to_string()))
    }

    /// Swap in a new version of an existing column, keeping its position.
    pub(crate) fn replace_column(&mut self, series: Series) -> Result<()> {
        let name = series.name().to_string();
        if !self.has_column(&name) {
            return Err(EdaError::ColumnNotFound(name));
        }
        self.frame.replace(&name, series)?;
        Ok(())
    }

    /// Keep only the rows where `keep` is true.
    pub(crate) fn retain_rows(self, keep: &[bool]) -> Result<Self> {
        let mask = BooleanChunked::from_slice("mask".into(), keep);
        let frame = self.frame.filter(&mask)?;
        let index = self
            .index
            .into_iter()
            .zip(keep.iter())
            .filter_map(|(i, &k)| k.then_some(i))
            .collect();
        Ok(Self { frame, index })
    }

    /// Remove the named columns. Every name must exist.
    pub fn drop_columns(self, columns: &[String]) -> Result<Self> {
        if let Some(missing) = columns.iter().find(|c| !self.has_column(c)) {
            return Err(EdaError::ColumnNotFound(missing.clone()));
        }
        let names: Vec<PlSmallStr> = columns.iter().map(|s| s.as_str().into()).collect();
        Ok(Self {
            frame: self.frame.drop_many(names),
            index: self.index,
        })
    }
}

impl From<DataFrame> for Table {
    fn from(frame: DataFrame) -> Self {
        Self::new(frame)
    }
}
