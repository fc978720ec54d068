//! Configuration types for the preprocessing chain.
//!
//! All policy the handlers depend on (the salary column, the currency table,
//! imputation defaults, which columns get encoded) lives here and is handed to
//! the handlers at construction time. Nothing is read from the environment.

use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Source label for the built-in currency table.
pub const BUILTIN_FX_SOURCE: &str = "builtin";

/// Fixed currency conversion table.
///
/// Each rate is the amount of the reference currency paid for one unit of the
/// keyed currency. The reference currency itself must map to `1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxRates {
    /// ISO code every salary is normalised to.
    #[serde(default = "default_reference")]
    pub reference: String,

    /// Currency code -> reference units per one unit.
    pub rates: BTreeMap<String, f64>,

    /// Where this table came from (`"builtin"` or a file path).
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_reference() -> String {
    "RUB".to_string()
}

fn default_source() -> String {
    BUILTIN_FX_SOURCE.to_string()
}

impl Default for FxRates {
    fn default() -> Self {
        let rates = [
            ("RUB", 1.0),
            ("USD", 90.0),
            ("EUR", 98.0),
            ("KZT", 0.19),
            ("BYN", 27.5),
            ("UAH", 2.2),
            ("UZS", 0.0072),
            ("GEL", 33.5),
            ("AMD", 0.23),
            ("AZN", 53.0),
        ]
        .into_iter()
        .map(|(code, rate)| (code.to_string(), rate))
        .collect();

        Self {
            reference: default_reference(),
            rates,
            source: default_source(),
        }
    }
}

impl FxRates {
    /// Load a table from a JSON file of the form
    /// `{"reference": "RUB", "rates": {"USD": 90.0, ...}}`.
    ///
    /// The reference currency is added with rate `1.0` if the file omits it.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut table: FxRates =
            serde_json::from_str(&content).map_err(|e| DataError::Malformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        table.rates.entry(table.reference.clone()).or_insert(1.0);
        table.source = path.display().to_string();
        Ok(table)
    }

    /// Rate for a currency code, if the table knows it.
    pub fn rate(&self, currency: &str) -> Option<f64> {
        self.rates.get(currency).copied()
    }

    fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        for (currency, &rate) in &self.rates {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(ConfigValidationError::InvalidRate {
                    currency: currency.clone(),
                    value: rate,
                });
            }
        }
        match self.rate(&self.reference) {
            Some(rate) if rate == 1.0 => Ok(()),
            _ => Err(ConfigValidationError::MissingReferenceRate(
                self.reference.clone(),
            )),
        }
    }
}

/// A multi-valued source column split into indicator columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiLabelSpec {
    /// Raw column name in the input file.
    pub column: String,
    /// Prefix for the generated indicator columns.
    pub prefix: String,
}

impl MultiLabelSpec {
    pub fn new(column: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            prefix: prefix.into(),
        }
    }
}

/// Configuration for the preprocessing chain.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use hh_processing::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .salary_column("Salary")
///     .numeric_fill(-1.0)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Field delimiter of the input file.
    /// Default: ','
    #[serde(default = "default_separator")]
    pub separator: char,

    /// Raw column holding the salary text.
    /// Default: "ЗП"
    pub salary_column: String,

    /// Currency table used to normalise salaries.
    /// Default: [`FxRates::default()`]
    pub fx_rates: FxRates,

    /// Sentinel category for missing categorical values.
    /// Default: "Не указано"
    pub missing_category: String,

    /// Fill value for missing or unparseable numeric features.
    /// Default: 0.0
    pub numeric_fill: f64,

    /// Derived categorical columns to one-hot encode.
    pub categorical_columns: Vec<String>,

    /// Multi-valued raw columns to split into indicator columns.
    pub multi_label_columns: Vec<MultiLabelSpec>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            salary_column: "ЗП".to_string(),
            fx_rates: FxRates::default(),
            missing_category: "Не указано".to_string(),
            numeric_fill: 0.0,
            categorical_columns: default_categorical_columns(),
            multi_label_columns: default_multi_label_columns(),
        }
    }
}

fn default_separator() -> char {
    ','
}

fn default_categorical_columns() -> Vec<String> {
    [
        "city",
        "gender",
        "education_level",
        "job_category",
        "current_job_category",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_multi_label_columns() -> Vec<MultiLabelSpec> {
    vec![
        MultiLabelSpec::new("Занятость", "employment"),
        MultiLabelSpec::new("График", "schedule"),
    ]
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if !self.separator.is_ascii() || matches!(self.separator, '"' | '\n' | '\r') {
            return Err(ConfigValidationError::InvalidSeparator(self.separator));
        }

        if self.salary_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyField("salary_column"));
        }

        if self.missing_category.trim().is_empty() {
            return Err(ConfigValidationError::EmptyField("missing_category"));
        }

        if !self.numeric_fill.is_finite() {
            return Err(ConfigValidationError::InvalidNumericFill(self.numeric_fill));
        }

        self.fx_rates.validate()
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid exchange rate for '{currency}': {value} (must be finite and positive)")]
    InvalidRate { currency: String, value: f64 },

    #[error("Reference currency '{0}' must be in the rate table with rate 1.0")]
    MissingReferenceRate(String),

    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("Invalid numeric fill value: {0} (must be finite)")]
    InvalidNumericFill(f64),

    #[error("Invalid separator {0:?} (must be a single ASCII character other than a quote or newline)")]
    InvalidSeparator(char),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    separator: Option<char>,
    salary_column: Option<String>,
    fx_rates: Option<FxRates>,
    missing_category: Option<String>,
    numeric_fill: Option<f64>,
    categorical_columns: Option<Vec<String>>,
    multi_label_columns: Option<Vec<MultiLabelSpec>>,
}

impl PipelineConfigBuilder {
    /// Set the input field delimiter.
    pub fn separator(mut self, separator: char) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Set the raw salary column name.
    pub fn salary_column(mut self, column: impl Into<String>) -> Self {
        self.salary_column = Some(column.into());
        self
    }

    /// Set the currency conversion table.
    pub fn fx_rates(mut self, rates: FxRates) -> Self {
        self.fx_rates = Some(rates);
        self
    }

    /// Set the sentinel used for missing categorical values.
    pub fn missing_category(mut self, sentinel: impl Into<String>) -> Self {
        self.missing_category = Some(sentinel.into());
        self
    }

    /// Set the fill value for missing numeric features.
    pub fn numeric_fill(mut self, value: f64) -> Self {
        self.numeric_fill = Some(value);
        self
    }

    /// Replace the list of derived categorical columns to one-hot encode.
    pub fn categorical_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the list of multi-valued columns.
    pub fn multi_label_columns(mut self, columns: Vec<MultiLabelSpec>) -> Self {
        self.multi_label_columns = Some(columns);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            separator: self.separator.unwrap_or_else(default_separator),
            salary_column: self.salary_column.unwrap_or_else(|| "ЗП".to_string()),
            fx_rates: self.fx_rates.unwrap_or_default(),
            missing_category: self
                .missing_category
                .unwrap_or_else(|| "Не указано".to_string()),
            numeric_fill: self.numeric_fill.unwrap_or(0.0),
            categorical_columns: self
                .categorical_columns
                .unwrap_or_else(default_categorical_columns),
            multi_label_columns: self
                .multi_label_columns
                .unwrap_or_else(default_multi_label_columns),
        };

        config.validate()?;
        Ok(config)
    }
}
