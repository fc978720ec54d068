//! Main preprocessing pipeline module.
//!
//! This module provides the `Pipeline` runner and its builder. The runner
//! creates a fresh [`Context`], folds it through the chain declared by
//! [`ChainBuilder`] and hands back the final arrays.

use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::{DataError, Result};
use crate::pipeline::chain::ChainBuilder;
use crate::pipeline::context::{Context, Diagnostics, FeatureMatrix};
use crate::pipeline::handler::{Handler, Transform};
use crate::pipeline::progress::{ClosureProgressReporter, ProgressReporter, ProgressUpdate};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub features: FeatureMatrix,
    pub target: Vec<f64>,
    pub diagnostics: Diagnostics,
}

/// Short, serializable description of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub rows: usize,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
    pub diagnostics: Diagnostics,
}

impl PipelineOutput {
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            rows: self.features.nrows(),
            feature_count: self.features.ncols(),
            feature_names: self.features.column_names().to_vec(),
            diagnostics: self.diagnostics.clone(),
        }
    }
}

/// The preprocessing pipeline runner.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use hh_processing::{Pipeline, PipelineConfig};
///
/// let (x, y) = Pipeline::builder()
///     .config(PipelineConfig::default())
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.fraction() * 100.0, update.message);
///     })
///     .build()?
///     .run("data/hh.csv")?;
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the chain over `input` and return `(feature_matrix, target_vector)`.
    ///
    /// Fails with the first error any handler raises. Nothing is written to disk.
    pub fn run(&self, input: impl AsRef<Path>) -> Result<(FeatureMatrix, Vec<f64>)> {
        let output = self.run_detailed(input)?;
        Ok((output.features, output.target))
    }

    /// Like [`run`](Self::run) but also returns the run diagnostics.
    pub fn run_detailed(&self, input: impl AsRef<Path>) -> Result<PipelineOutput> {
        let start_time = Instant::now();
        let input = input.as_ref();
        info!("Starting preprocessing pipeline for {}", input.display());

        let chain = ChainBuilder::new(self.config.clone()).build();
        let ctx = self.execute(&chain, Context::new(input))?;

        let (Some(features), Some(target)) = (ctx.feature_matrix, ctx.target_vector) else {
            return Err(DataError::NotLoaded);
        };
        if features.nrows() != target.len() {
            return Err(DataError::RowMismatch {
                expected: features.nrows(),
                actual: target.len(),
            });
        }

        info!(
            "Pipeline finished in {:.2?}: {} rows, {} features",
            start_time.elapsed(),
            features.nrows(),
            features.ncols()
        );

        Ok(PipelineOutput {
            features,
            target,
            diagnostics: ctx.diagnostics,
        })
    }

    /// Fold the context through `chain`, reporting progress around each stage.
    fn execute(&self, chain: &[Handler], ctx: Context) -> Result<Context> {
        let total = chain.len();
        chain
            .iter()
            .enumerate()
            .try_fold(ctx, |ctx, (index, handler)| {
                let position = index + 1;
                let name = handler.name();
                debug!("Step {}/{}: {}", position, total, name);
                self.report_progress(ProgressUpdate::started(name, position, total));

                let ctx = handler.transform(ctx)?;

                self.report_progress(ProgressUpdate::finished(
                    name,
                    position,
                    total,
                    ctx.raw_table.height(),
                    ctx.raw_table.width(),
                ));
                Ok(ctx)
            })
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use hh_processing::{ProgressReporter, ProgressUpdate};
    /// use std::sync::Arc;
    ///
    /// struct StderrReporter;
    ///
    /// impl ProgressReporter for StderrReporter {
    ///     fn report(&self, update: ProgressUpdate) {
    ///         eprintln!("{}: {}", update.stage, update.message);
    ///     }
    /// }
    ///
    /// let pipeline = Pipeline::builder()
    ///     .progress_reporter(Arc::new(StderrReporter))
    ///     .build()?;
    /// ```
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// This is a convenience method for simple progress handling.
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}
