//! Error types for the preprocessing chain.
//!
//! Every failure raised by a handler is a [`DataError`]. Each variant belongs to
//! exactly one [`DataErrorKind`], so callers can branch on the broad category
//! (unreadable input, wrong schema, bad value) without matching every variant.
//!
//! Errors are serializable so the CLI can emit them as JSON.

use crate::config::ConfigValidationError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// Broad category of a [`DataError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataErrorKind {
    /// The input file is missing, unreadable or not parseable as delimited text.
    IoFailure,
    /// An expected column is absent or the table has the wrong shape.
    SchemaError,
    /// A field is present but cannot be parsed into its semantic type.
    ValueError,
}

/// The main error type for the preprocessing chain.
#[derive(Error, Debug)]
pub enum DataError {
    /// The input file could not be opened or read.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input file was read but is not valid delimited text.
    #[error("Malformed input '{path}': {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// A handler ran before the raw table was loaded.
    #[error("No data loaded")]
    NotLoaded,

    /// A value could not be parsed into its target type.
    #[error("Invalid value '{value}' in column '{column}' at row {row}: {reason}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
        reason: String,
    },

    /// Two row-aligned structures disagree on length.
    #[error("Row count mismatch: expected {expected}, got {actual}")]
    RowMismatch { expected: usize, actual: usize },

    /// A missing value reached the final arrays.
    #[error("Missing value in column '{column}' at row {row}")]
    MissingValue { column: String, row: usize },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigValidationError),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl DataError {
    /// Category this error belongs to.
    pub fn kind(&self) -> DataErrorKind {
        match self {
            Self::Io { .. } | Self::Malformed { .. } => DataErrorKind::IoFailure,
            Self::ColumnNotFound(_)
            | Self::NotLoaded
            | Self::RowMismatch { .. }
            | Self::Polars(_) => DataErrorKind::SchemaError,
            Self::InvalidValue { .. } | Self::MissingValue { .. } | Self::InvalidConfig(_) => {
                DataErrorKind::ValueError
            }
        }
    }

    /// Stable error code for machine consumers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "IO_ERROR",
            Self::Malformed { .. } => "MALFORMED_INPUT",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::NotLoaded => "NO_DATA_LOADED",
            Self::RowMismatch { .. } => "ROW_MISMATCH",
            Self::InvalidValue { .. } => "INVALID_VALUE",
            Self::MissingValue { .. } => "MISSING_VALUE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Polars(_) => "POLARS_ERROR",
        }
    }

    pub(crate) fn invalid_value(
        column: impl Into<String>,
        row: usize,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            column: column.into(),
            row,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Errors are serialized as a struct with `code`, `kind` and `message` fields.
impl Serialize for DataError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("DataError", 3)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for preprocessing operations.
pub type Result<T> = std::result::Result<T, DataError>;
