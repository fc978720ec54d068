//! HH Dataset Preprocessing Library
//!
//! Turns a raw HH resume export into a numeric feature matrix and a salary
//! target vector, built with Rust and Polars.
//!
//! # Overview
//!
//! The work is split into narrow stages threaded through one [`Context`]:
//!
//! - **Loading**: the CSV is read with every column kept as text
//! - **Cleaning**: column names are normalised, rows without a usable salary are dropped
//! - **Target Extraction**: salary ranges and currencies are collapsed into one number
//! - **Feature Extraction**: city, mobility, age, experience, education, job category, car
//! - **Encoding**: one-hot and multi-label indicator columns
//! - **Assembly**: a dense [`FeatureMatrix`] aligned row-for-row with the target
//!
//! The order of the stages is declared once, in [`ChainBuilder`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use hh_processing::{Pipeline, PipelineConfig};
//!
//! let (x, y) = Pipeline::builder()
//!     .config(PipelineConfig::default())
//!     .build()?
//!     .run("data/hh.csv")?;
//!
//! println!("{} rows, {} features", x.nrows(), x.ncols());
//! ```
//!
//! # Configuration
//!
//! Use [`PipelineConfig`] to change the salary column, the currency table or
//! the imputation defaults:
//!
//! ```rust,ignore
//! use hh_processing::config::*;
//!
//! let config = PipelineConfig::builder()
//!     .fx_rates(FxRates::from_json_file("rates.json".as_ref())?)
//!     .missing_category("unknown")
//!     .numeric_fill(-1.0)
//!     .build()?;
//! ```
//!
//! # Errors
//!
//! Every failure is a [`DataError`] with one of three kinds (see
//! [`DataErrorKind`]). The library never logs errors or exits the process;
//! that is left to the caller.

pub mod config;
pub mod error;
pub mod handlers;
pub mod output;
pub mod pipeline;
pub mod utils;

// Re-exports for convenient access
pub use config::{ConfigValidationError, FxRates, MultiLabelSpec, PipelineConfig, PipelineConfigBuilder};
pub use error::{DataError, DataErrorKind, Result as DataResult};
pub use handlers::{SalaryParser, TARGET_COLUMN};
pub use pipeline::{
    ChainBuilder, ClosureProgressReporter, Context, Diagnostics, FeatureMatrix, Handler, Pipeline,
    PipelineBuilder, PipelineOutput, ProgressReporter, ProgressUpdate, RunSummary, StageStatus,
    Transform,
};
