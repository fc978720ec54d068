//! Pipeline module.
//!
//! The context threaded through the chain, the handler contract, the chain
//! declaration and the runner that drives it.

mod builder;
pub mod chain;
pub mod context;
pub mod handler;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder, PipelineOutput, RunSummary};
pub use chain::ChainBuilder;
pub use context::{Context, Diagnostics, FeatureMatrix, MAX_DROPPED_EXAMPLES};
pub use handler::{Handler, Transform};
pub use progress::{ClosureProgressReporter, ProgressReporter, ProgressUpdate, StageStatus};
