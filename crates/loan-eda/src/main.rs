//! CLI entry point for the loan-payments EDA pipeline.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use dotenv::dotenv;
use loan_eda::{
    CsvSource, EdaReport, Pipeline, PipelineConfig, ReportWriter, StatisticsReporter,
    TableSource, TableWriter, TypeCoercer,
};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Cleaning and statistics pipeline for loan-payment tables",
    long_about = "Coerces column types, imputes nulls, log-transforms skewed columns and \
                  removes IQR outliers, then writes the cleaned table as CSV.\n\n\
                  EXAMPLES:\n  \
                  # Clean with the built-in loan-payments column lists\n  \
                  loan-eda -i loan_payments.csv\n\n  \
                  # Custom column lists and a JSON run report\n  \
                  loan-eda -i data.csv -c columns.json -r report.json\n\n  \
                  # Coerce and print statistics only\n  \
                  loan-eda -i loan_payments.csv --dry-run"
)]
struct Args {
    /// Path to the CSV file to process
    #[arg(short, long)]
    input: PathBuf,

    /// JSON pipeline configuration
    ///
    /// If not specified, the loan-payments column lists are used
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the cleaned CSV
    ///
    /// Defaults to ./outputs/<input_name>_clean.csv
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a JSON run report to this path
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Write the row index as the first CSV column
    #[arg(long)]
    write_index: bool,

    /// Coerce types and print statistics without cleaning or writing anything
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Print the run report as JSON to stdout instead of a summary
    ///
    /// Disables all logs so stdout holds only JSON.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// With `json_output` no subscriber is installed, so stdout carries only
/// the JSON report.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // .env may set RUST_LOG, so load it before the subscriber reads the environment
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Loading configuration from {}", path.display()))?,
        None => PipelineConfig::loan_payments(),
    };
    if args.write_index {
        config.include_index = true;
    }

    let source = CsvSource::new(&args.input);

    if args.dry_run {
        return run_dry_run(&source, &config);
    }

    let include_index = config.include_index;
    let mut builder = Pipeline::builder().config(config);
    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }
    let pipeline = builder.build()?;

    let mut result = match pipeline.run_source(&source) {
        Ok(result) => result,
        Err(e) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            }
            error!("Pipeline failed: {}", e);
            return Err(anyhow!("Pipeline failed: {}", e));
        }
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    let written = TableWriter::new(include_index).write(&result.table, &output)?;
    result.report.output_file = Some(written.display().to_string());

    if let Some(path) = &args.report {
        ReportWriter::write(&result.report, path)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.report)?);
        return Ok(());
    }

    print_summary(&result.report);
    Ok(())
}

/// `./outputs/<input_stem>_clean.csv`
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    PathBuf::from("outputs").join(format!("{}_clean.csv", stem))
}

/// Coerce the table and print its statistics.
///
/// Uses `println!` on purpose: the statistics are the output of `--dry-run`
/// and must show regardless of log level.
fn run_dry_run(source: &CsvSource, config: &PipelineConfig) -> Result<()> {
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    let table = source.load()?;
    let mut steps = Vec::new();
    let table = TypeCoercer::new(config.date_format.clone()).coerce(
        table,
        &config.column_specs(),
        &mut steps,
    )?;
    let stats = StatisticsReporter::snapshot(&table)?;

    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Statistics after type coercion");
    println!("{}\n", "=".repeat(80));

    println!("Source: {}", source.describe());
    println!("Shape:  {} rows x {} columns", stats.shape.0, stats.shape.1);
    println!();

    println!("COLUMNS");
    println!("{}", "-".repeat(40));
    println!("{:<32} {:<16} {:>10} {:>9}", "Column", "Type", "Non-null", "Null %");
    println!("{}", "-".repeat(70));
    for (info, nulls) in stats.columns.iter().zip(&stats.nulls) {
        println!(
            "{:<32} {:<16} {:>10} {:>8.2}%",
            truncate_str(&info.name, 31),
            truncate_str(&info.dtype, 15),
            info.non_null_count,
            nulls.null_percentage
        );
    }
    println!();

    if !stats.describe.is_empty() {
        println!("NUMERIC SUMMARY");
        println!("{}", "-".repeat(40));
        println!(
            "{:<32} {:>12} {:>12} {:>12} {:>12}",
            "Column", "Mean", "Std", "Median", "Max"
        );
        for desc in &stats.describe {
            println!(
                "{:<32} {:>12} {:>12} {:>12} {:>12}",
                truncate_str(&desc.column, 31),
                fmt_opt(desc.mean),
                fmt_opt(desc.std),
                fmt_opt(desc.median),
                fmt_opt(desc.max)
            );
        }
        println!();
    }

    if !stats.distinct_values.is_empty() {
        println!("CATEGORY LEVELS");
        println!("{}", "-".repeat(40));
        for distinct in &stats.distinct_values {
            println!("  {} ({}): {}", distinct.column, distinct.values.len(), preview(&distinct.values, 8));
        }
        println!();
    }

    if !steps.is_empty() {
        println!("COERCIONS");
        println!("{}", "-".repeat(40));
        for step in &steps {
            println!("  - {}", step);
        }
        println!();
    }

    println!("{}", "=".repeat(80));
    Ok(())
}

fn print_summary(report: &EdaReport) {
    let (rows_before, rows_after) = report.row_change();

    println!();
    println!("{}", "=".repeat(80));
    println!("EDA COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    if let Some(source) = &report.source {
        println!(
            "Input:  {} ({} rows x {} columns)",
            source, rows_before, report.before.shape.1
        );
    }
    if let Some(output) = &report.output_file {
        println!(
            "Output: {} ({} rows x {} columns)",
            output, rows_after, report.after.shape.1
        );
    }
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", report.duration_ms);
    println!(
        "  Rows: {} -> {} ({} removed as outliers)",
        rows_before, rows_after, report.rows_removed
    );
    if !report.dropped_columns.is_empty() {
        println!("  Dropped columns: {}", report.dropped_columns.join(", "));
    }
    let remaining_nulls: usize = report.nulls_after_imputation.iter().map(|n| n.null_count).sum();
    println!("  Nulls left after imputation: {}", remaining_nulls);
    if !report.log_transformed.is_empty() {
        println!(
            "  Log-transformed ({}): {}",
            report.log_selection(),
            report.log_transformed.join(", ")
        );
    }
    println!();

    println!("Use --json for machine-readable output");
    println!("Use --report <path> to save the full JSON report");
    println!("{}", "=".repeat(80));
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

fn preview(values: &[String], max: usize) -> String {
    let shown: Vec<&str> = values.iter().take(max).map(String::as_str).collect();
    if values.len() > max {
        format!("{}, ...", shown.join(", "))
    } else {
        shown.join(", ")
    }
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
