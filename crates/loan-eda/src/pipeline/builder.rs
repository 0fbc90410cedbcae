//! The pipeline driver and its builder.

use crate::coercion::TypeCoercer;
use crate::config::PipelineConfig;
use crate::error::{EdaError, Result, ResultExt};
use crate::imputers::NullImputer;
use crate::outliers::OutlierRemover;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::reporting::EdaReport;
use crate::skew::SkewTreatment;
use crate::source::TableSource;
use crate::stats::StatisticsReporter;
use crate::table::Table;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Output of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// The cleaned table, ready to persist.
    pub table: Table,
    pub report: EdaReport,
    /// Human-readable log of every change made, in order.
    pub steps: Vec<String>,
}

/// Runs coercion, imputation, skew treatment and outlier removal in order.
///
/// Use [`Pipeline::builder()`] to create one.
///
/// # Example
///
/// ```rust,ignore
/// use loan_eda::{CsvSource, Pipeline, PipelineConfig};
///
/// let result = Pipeline::builder()
///     .config(PipelineConfig::loan_payments())
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run_source(&CsvSource::new("loan_payments.csv"))?;
///
/// println!("{} rows kept", result.table.height());
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    coercer: TypeCoercer,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// The pipeline may be handed to a worker thread by callers.
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load a table from `source` and run it through every stage.
    pub fn run_source(&self, source: &dyn TableSource) -> Result<PipelineResult> {
        let description = source.describe();
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            0.0,
            format!("Loading {}", description),
        ));

        let table = match source.load() {
            Ok(table) => table,
            Err(e) => return Err(self.fail(e)),
        };
        info!("Loaded {} rows x {} columns", table.height(), table.width());

        self.finish(self.execute(table, Some(description)))
    }

    /// Run an already loaded table through every stage.
    pub fn run(&self, table: Table) -> Result<PipelineResult> {
        self.finish(self.execute(table, None))
    }

    fn finish(&self, result: Result<PipelineResult>) -> Result<PipelineResult> {
        match result {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Pipeline completed successfully"));
                Ok(result)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn fail(&self, e: EdaError) -> EdaError {
        error!("Pipeline error: {}", e);
        self.report_progress(ProgressUpdate::failed(e.to_string()));
        e
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn execute(&self, table: Table, source: Option<String>) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let config = &self.config;
        let mut steps: Vec<String> = Vec::new();

        info!(
            "Starting EDA pipeline on {} rows x {} columns",
            table.height(),
            table.width()
        );

        // Step 1: coerce types
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Coercion,
            0.0,
            "Coercing column types...",
        ));
        let specs = config.column_specs();
        let table = self
            .coercer
            .coerce(table, &specs, &mut steps)
            .context("Type coercion")?;

        // Step 2: statistics of the coerced table
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Statistics,
            0.0,
            "Computing statistics...",
        ));
        let before = StatisticsReporter::snapshot(&table).context("Statistics before cleaning")?;
        for nulls in before.nulls.iter().filter(|n| n.null_count > 0) {
            debug!(
                "  {}: {} nulls ({:.2}%)",
                nulls.column, nulls.null_count, nulls.null_percentage
            );
        }

        let mut report = EdaReport::new(before);
        report.source = source;
        report.skew_threshold = config.skew_threshold;
        report.iqr_multiplier = config.iqr_multiplier;

        // Step 3: drop unwanted columns, then impute
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Imputation,
            0.0,
            "Imputing nulls...",
        ));
        let table = if config.drop_columns.is_empty() {
            table
        } else {
            let table = table.drop_columns(&config.drop_columns)?;
            info!("Dropped {} columns", config.drop_columns.len());
            steps.push(format!("Dropped columns: {}", config.drop_columns.join(", ")));
            report.dropped_columns = config.drop_columns.clone();
            table
        };

        let plan = config.imputation_plan()?;
        let table = NullImputer::apply(table, &plan, &mut steps).context("Null imputation")?;
        report.nulls_after_imputation = StatisticsReporter::null_report(&table);

        // Step 4: skew
        self.report_progress(ProgressUpdate::new(
            PipelineStage::SkewTreatment,
            0.0,
            "Treating skewed columns...",
        ));
        let skew = SkewTreatment::compute_skew(&table, &config.numeric_columns)
            .context("Skew computation")?;
        let to_transform = match &config.log_columns {
            Some(columns) => columns.clone(),
            None => SkewTreatment::select_skewed(&skew, config.skew_threshold),
        };
        info!(
            "{} of {} columns selected for log transform",
            to_transform.len(),
            skew.len()
        );
        let table = SkewTreatment::log_transform(table, &to_transform, &mut steps)
            .context("Log transform")?;
        report.skew = skew;
        report.log_columns_configured = config.log_columns.is_some();
        report.log_transformed = to_transform;

        // Step 5: outliers
        self.report_progress(ProgressUpdate::new(
            PipelineStage::OutlierRemoval,
            0.0,
            "Removing outliers...",
        ));
        let rows_before = table.height();
        let fences =
            OutlierRemover::compute_fences(&table, &config.numeric_columns, config.iqr_multiplier)
                .context("Outlier fences")?;
        let table = OutlierRemover::remove_outside(table, &fences, &mut steps)?;
        report.rows_removed = rows_before - table.height();
        report.outlier_fences = fences;

        // Step 6: final statistics
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Reporting,
            0.0,
            "Building report...",
        ));
        report.after = StatisticsReporter::snapshot(&table).context("Statistics after cleaning")?;
        report.processing_steps = steps.clone();
        report.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "EDA pipeline finished in {} ms: {:?} -> {:?}",
            report.duration_ms,
            report.before.shape,
            report.after.shape
        );

        Ok(PipelineResult {
            table,
            report,
            steps,
        })
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl PipelineBuilder {
    /// Defaults to an empty [`PipelineConfig`], which runs every stage as a no-op.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Shorthand for [`progress_reporter`](Self::progress_reporter) with a closure.
    pub fn on_progress<F>(self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter(Arc::new(ClosureProgressReporter::new(callback)))
    }

    /// Validate the configuration and build the pipeline.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| EdaError::InvalidConfig(e.to_string()))?;

        Ok(Pipeline {
            coercer: TypeCoercer::new(config.date_format.clone()),
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}
