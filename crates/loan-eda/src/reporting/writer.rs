use super::EdaReport;
use crate::error::{Result, ResultExt};
use crate::table::Table;
use polars::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the leading column written when the row index is included.
pub const INDEX_COLUMN: &str = "index";

/// Writes a table as comma-delimited CSV with a header row.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableWriter {
    include_index: bool,
}

impl TableWriter {
    /// With `include_index`, the row index is written first as `index`.
    pub fn new(include_index: bool) -> Self {
        Self { include_index }
    }

    /// Write to `path`, creating parent directories as needed.
    pub fn write(&self, table: &Table, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(path)?;
        self.write_to(table, &mut file)?;

        info!("Table saved: {}", path.display());
        Ok(path.to_path_buf())
    }

    pub fn write_to<W: Write>(&self, table: &Table, writer: &mut W) -> Result<()> {
        let mut frame = table.frame().clone();
        if self.include_index {
            frame
                .insert_column(0, Series::new(INDEX_COLUMN.into(), table.index()))
                .context("Adding index column")?;
        }

        CsvWriter::new(writer)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(&mut frame)
            .context("Writing CSV")?;
        Ok(())
    }
}

/// Writes an [`EdaReport`] as pretty-printed JSON.
pub struct ReportWriter;

impl ReportWriter {
    pub fn write(report: &EdaReport, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", path.display());
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatisticsReporter;

    fn sample() -> Table {
        Table::new(
            df![
                "term" => [36i64, 60, 36],
                "grade" => ["A", "B", "C"],
            ]
            .unwrap(),
        )
        .retain_rows(&[true, false, true])
        .unwrap()
    }

    fn render(writer: TableWriter, table: &Table) -> String {
        let mut buf = Vec::new();
        writer.write_to(table, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_write_without_index() {
        let csv = render(TableWriter::new(false), &sample());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec!["term,grade", "36,A", "36,C"]);
    }

    #[test]
    fn test_write_with_index_keeps_original_positions() {
        let csv = render(TableWriter::new(true), &sample());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec!["index,term,grade", "0,36,A", "2,36,C"]);
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("clean.csv");

        let written = TableWriter::default().write(&sample(), &path).unwrap();

        assert_eq!(written, path);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("term,grade"));
    }

    #[test]
    fn test_report_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let stats = StatisticsReporter::snapshot(&sample()).unwrap();
        let report = EdaReport::new(stats);

        ReportWriter::write(&report, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["before"]["shape"][0], 2);
        assert!(value["generated_at"].is_string());
    }
}
