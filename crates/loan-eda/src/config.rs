//! Configuration for the EDA pipeline.
//!
//! Column lists are supplied explicitly; nothing is inferred from the data.
//! Build a configuration with [`PipelineConfig::builder()`], start from the
//! [`PipelineConfig::loan_payments()`] preset, or load one from JSON.

use crate::error::{EdaError, Result};
use crate::types::{ColumnSpec, ImputationPlan, SemanticType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Default month-year format for date columns (`Dec-2018`).
pub const DEFAULT_DATE_FORMAT: &str = "%b-%Y";
/// Default skew threshold; columns with `|skew|` above it are log-transformed.
pub const DEFAULT_SKEW_THRESHOLD: f64 = 1.0;
/// Default Tukey multiplier for outlier fences.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// Configuration for the EDA pipeline.
///
/// Missing fields take their defaults when deserializing, so a JSON file
/// only needs the lists it cares about.
///
/// # Example
///
/// ```rust,ignore
/// use loan_eda::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .category_columns(["grade", "purpose"])
///     .date_columns(["issue_date"])
///     .median_columns(["int_rate"])
///     .numeric_columns(["annual_inc", "int_rate"])
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Columns coerced to `Categorical`.
    pub category_columns: Vec<String>,

    /// Columns parsed from month-year text to `Date`.
    pub date_columns: Vec<String>,

    /// chrono format for `date_columns`, without a day component.
    /// Default: `%b-%Y`
    pub date_format: String,

    /// Numeric columns rounded to two decimals.
    pub currency_columns: Vec<String>,

    /// Columns leniently cast to `Int64`.
    pub float_to_int_columns: Vec<String>,

    /// Columns cast to `Float64`.
    pub float_columns: Vec<String>,

    /// The single yes/no column parsed to `Boolean`.
    pub boolean_column: Option<String>,

    /// Columns removed after coercion and before imputation.
    pub drop_columns: Vec<String>,

    /// Columns whose nulls are filled with the most frequent value.
    pub mode_columns: Vec<String>,

    /// Numeric columns whose nulls are filled with the median.
    pub median_columns: Vec<String>,

    /// Numeric columns analysed for skew and outliers.
    pub numeric_columns: Vec<String>,

    /// Columns to log-transform. When `None`, the columns whose skew exceeds
    /// `skew_threshold` are used.
    pub log_columns: Option<Vec<String>>,

    /// Default: 1.0
    pub skew_threshold: f64,

    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Write the row index as a leading `index` column in the CSV output.
    /// Default: false
    pub include_index: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            category_columns: Vec::new(),
            date_columns: Vec::new(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            currency_columns: Vec::new(),
            float_to_int_columns: Vec::new(),
            float_columns: Vec::new(),
            boolean_column: None,
            drop_columns: Vec::new(),
            mode_columns: Vec::new(),
            median_columns: Vec::new(),
            numeric_columns: Vec::new(),
            log_columns: None,
            skew_threshold: DEFAULT_SKEW_THRESHOLD,
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            include_index: false,
        }
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Column lists for the loan-payments dataset.
    pub fn loan_payments() -> Self {
        Self {
            category_columns: owned(&[
                "grade",
                "sub_grade",
                "home_ownership",
                "verification_status",
                "loan_status",
                "purpose",
                "application_type",
                "employment_length",
            ]),
            date_columns: owned(&[
                "issue_date",
                "earliest_credit_line",
                "last_payment_date",
                "next_payment_date",
                "last_credit_pull_date",
            ]),
            currency_columns: owned(&["funded_amount_inv", "collection_recovery_fee"]),
            float_to_int_columns: owned(&[
                "funded_amount",
                "mths_since_last_delinq",
                "mths_since_last_record",
                "collections_12_mths_ex_med",
                "mths_since_last_major_derog",
                "term",
            ]),
            boolean_column: Some("payment_plan".to_string()),
            drop_columns: owned(&["mths_since_last_major_derog"]),
            mode_columns: owned(&[
                "last_credit_pull_date",
                "next_payment_date",
                "last_payment_date",
                "employment_length",
                "term",
            ]),
            median_columns: owned(&[
                "collections_12_mths_ex_med",
                "mths_since_last_record",
                "mths_since_last_delinq",
                "int_rate",
                "funded_amount",
            ]),
            numeric_columns: owned(&[
                "loan_amount",
                "funded_amount",
                "funded_amount_inv",
                "int_rate",
                "instalment",
                "annual_inc",
                "dti",
                "delinq_2yrs",
                "inq_last_6mths",
                "open_accounts",
                "total_accounts",
                "out_prncp",
                "out_prncp_inv",
                "total_payment",
                "total_payment_inv",
                "total_rec_prncp",
                "total_rec_int",
                "total_rec_late_fee",
                "recoveries",
                "collection_recovery_fee",
                "last_payment_amount",
                "collections_12_mths_ex_med",
            ]),
            ..Self::default()
        }
    }

    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: PipelineConfig = serde_json::from_str(&text)?;
        config
            .validate()
            .map_err(|e| EdaError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Coercion plan derived from the type lists.
    pub fn column_specs(&self) -> Vec<ColumnSpec> {
        let lists: [(&[String], SemanticType); 5] = [
            (self.category_columns.as_slice(), SemanticType::Categorical),
            (self.date_columns.as_slice(), SemanticType::Date),
            (self.currency_columns.as_slice(), SemanticType::Currency),
            (self.float_to_int_columns.as_slice(), SemanticType::Integer),
            (self.float_columns.as_slice(), SemanticType::Float),
        ];

        let mut specs: Vec<ColumnSpec> = lists
            .iter()
            .flat_map(|(names, ty)| names.iter().map(move |n| ColumnSpec::new(n.clone(), *ty)))
            .collect();
        if let Some(col) = &self.boolean_column {
            specs.push(ColumnSpec::new(col.clone(), SemanticType::Boolean));
        }
        specs
    }

    pub fn imputation_plan(&self) -> Result<ImputationPlan> {
        ImputationPlan::new(self.mode_columns.clone(), self.median_columns.clone())
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if !self.skew_threshold.is_finite() || self.skew_threshold < 0.0 {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "skew_threshold".to_string(),
                value: self.skew_threshold,
            });
        }

        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier <= 0.0 {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "iqr_multiplier".to_string(),
                value: self.iqr_multiplier,
            });
        }

        if self.date_format.trim().is_empty() {
            return Err(ConfigValidationError::EmptyDateFormat);
        }

        let specs = self.column_specs();
        let mut seen: HashMap<&str, SemanticType> = HashMap::new();
        for spec in &specs {
            if let Some(previous) = seen.insert(spec.name.as_str(), spec.semantic_type)
                && previous != spec.semantic_type
            {
                return Err(ConfigValidationError::ConflictingColumnTypes {
                    column: spec.name.clone(),
                    first: previous.as_str(),
                    second: spec.semantic_type.as_str(),
                });
            }
        }

        if let Some(col) = self
            .median_columns
            .iter()
            .find(|c| self.mode_columns.contains(c))
        {
            return Err(ConfigValidationError::ConflictingImputation(col.clone()));
        }

        let analysed = self
            .mode_columns
            .iter()
            .chain(&self.median_columns)
            .chain(&self.numeric_columns)
            .chain(self.log_columns.iter().flatten());
        for col in analysed {
            if self.drop_columns.contains(col) {
                return Err(ConfigValidationError::DroppedColumnInUse(col.clone()));
            }
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid value for '{field}': {value}")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Date format must not be empty")]
    EmptyDateFormat,

    #[error("Column '{column}' is listed as both {first} and {second}")]
    ConflictingColumnTypes {
        column: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("Column '{0}' is listed for both mode and median imputation")]
    ConflictingImputation(String),

    #[error("Column '{0}' is dropped but still used by a later stage")]
    DroppedColumnInUse(String),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    base: Option<PipelineConfig>,
    category_columns: Option<Vec<String>>,
    date_columns: Option<Vec<String>>,
    date_format: Option<String>,
    currency_columns: Option<Vec<String>>,
    float_to_int_columns: Option<Vec<String>>,
    float_columns: Option<Vec<String>>,
    boolean_column: Option<String>,
    drop_columns: Option<Vec<String>>,
    mode_columns: Option<Vec<String>>,
    median_columns: Option<Vec<String>>,
    numeric_columns: Option<Vec<String>>,
    log_columns: Option<Vec<String>>,
    skew_threshold: Option<f64>,
    iqr_multiplier: Option<f64>,
    include_index: Option<bool>,
}

fn collect<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

impl PipelineConfigBuilder {
    /// Start from an existing configuration instead of the defaults.
    pub fn from_config(config: PipelineConfig) -> Self {
        Self {
            base: Some(config),
            ..Self::default()
        }
    }

    pub fn category_columns<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.category_columns = Some(collect(names));
        self
    }

    pub fn date_columns<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.date_columns = Some(collect(names));
        self
    }

    /// Set the month-year format, e.g. `%b %Y` for `Dec 2018`.
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    pub fn currency_columns<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.currency_columns = Some(collect(names));
        self
    }

    pub fn float_to_int_columns<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        names: I,
    ) -> Self {
        self.float_to_int_columns = Some(collect(names));
        self
    }

    pub fn float_columns<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.float_columns = Some(collect(names));
        self
    }

    pub fn boolean_column(mut self, name: impl Into<String>) -> Self {
        self.boolean_column = Some(name.into());
        self
    }

    pub fn drop_columns<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.drop_columns = Some(collect(names));
        self
    }

    pub fn mode_columns<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.mode_columns = Some(collect(names));
        self
    }

    pub fn median_columns<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.median_columns = Some(collect(names));
        self
    }

    pub fn numeric_columns<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.numeric_columns = Some(collect(names));
        self
    }

    /// Log-transform exactly these columns instead of the skew selection.
    pub fn log_columns<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.log_columns = Some(collect(names));
        self
    }

    pub fn skew_threshold(mut self, threshold: f64) -> Self {
        self.skew_threshold = Some(threshold);
        self
    }

    pub fn iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = Some(multiplier);
        self
    }

    pub fn include_index(mut self, include: bool) -> Self {
        self.include_index = Some(include);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<PipelineConfig, ConfigValidationError> {
        let base = self.base.unwrap_or_default();
        let config = PipelineConfig {
            category_columns: self.category_columns.unwrap_or(base.category_columns),
            date_columns: self.date_columns.unwrap_or(base.date_columns),
            date_format: self.date_format.unwrap_or(base.date_format),
            currency_columns: self.currency_columns.unwrap_or(base.currency_columns),
            float_to_int_columns: self.float_to_int_columns.unwrap_or(base.float_to_int_columns),
            float_columns: self.float_columns.unwrap_or(base.float_columns),
            boolean_column: self.boolean_column.or(base.boolean_column),
            drop_columns: self.drop_columns.unwrap_or(base.drop_columns),
            mode_columns: self.mode_columns.unwrap_or(base.mode_columns),
            median_columns: self.median_columns.unwrap_or(base.median_columns),
            numeric_columns: self.numeric_columns.unwrap_or(base.numeric_columns),
            log_columns: self.log_columns.or(base.log_columns),
            skew_threshold: self.skew_threshold.unwrap_or(base.skew_threshold),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(base.iqr_multiplier),
            include_index: self.include_index.unwrap_or(base.include_index),
        };

        config.validate()?;
        Ok(config)
    }
}
