//! Progress reporting for the handler chain.
//!
//! The runner emits one update before and one after every handler. Updates
//! are purely informational; the chain runs synchronously and cannot be
//! interrupted between stages.
//!
//! # Example
//!
//! ```rust,ignore
//! use hh_processing::Pipeline;
//!
//! let (x, y) = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{}/{}] {}", update.position, update.total, update.message);
//!     })
//!     .build()?
//!     .run("hh.csv")?;
//! ```

use serde::Serialize;

/// Whether a stage is starting or has just finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Started,
    Finished,
}

/// A single progress event.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressUpdate {
    /// Name of the handler this update refers to.
    pub stage: &'static str,
    /// 1-based position of the handler in the chain.
    pub position: usize,
    /// Number of handlers in the chain.
    pub total: usize,
    pub status: StageStatus,
    /// Human-readable message describing current activity
    pub message: String,
}

impl ProgressUpdate {
    /// Update announcing that a stage is about to run.
    pub fn started(stage: &'static str, position: usize, total: usize) -> Self {
        Self {
            stage,
            position,
            total,
            status: StageStatus::Started,
            message: format!("Running {}", stage),
        }
    }

    /// Update reporting the table shape after a stage ran.
    pub fn finished(
        stage: &'static str,
        position: usize,
        total: usize,
        rows: usize,
        columns: usize,
    ) -> Self {
        Self {
            stage,
            position,
            total,
            status: StageStatus::Finished,
            message: format!("{} complete ({} rows x {} columns)", stage, rows, columns),
        }
    }

    /// Overall progress (0.0 - 1.0).
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        let done = match self.status {
            StageStatus::Started => self.position.saturating_sub(1),
            StageStatus::Finished => self.position,
        };
        (done as f32 / self.total as f32).clamp(0.0, 1.0)
    }
}

/// Trait for receiving progress updates from the runner.
pub trait ProgressReporter: Send + Sync {
    /// Called before and after every handler.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_fraction() {
        assert_eq!(ProgressUpdate::started("loader", 1, 4).fraction(), 0.0);
        assert_eq!(ProgressUpdate::finished("loader", 1, 4, 10, 3).fraction(), 0.25);
        assert_eq!(ProgressUpdate::finished("assembler", 4, 4, 10, 3).fraction(), 1.0);
        assert_eq!(ProgressUpdate::started("x", 1, 0).fraction(), 1.0);
    }

    #[test]
    fn test_closure_reporter() {
        let seen = Mutex::new(Vec::new());
        let reporter = ClosureProgressReporter::new(|update: ProgressUpdate| {
            seen.lock().unwrap().push(update.stage);
        });

        reporter.report(ProgressUpdate::started("loader", 1, 2));
        reporter.report(ProgressUpdate::finished("loader", 1, 2, 5, 2));

        assert_eq!(*seen.lock().unwrap(), vec!["loader", "loader"]);
    }

    #[test]
    fn test_update_serialization() {
        let update = ProgressUpdate::finished("row_cleaner", 3, 13, 4, 12);
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("\"status\":\"finished\""));
        assert!(json.contains("4 rows x 12 columns"));
    }
}
