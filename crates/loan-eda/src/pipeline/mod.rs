//! Pipeline module.
//!
//! The [`Pipeline`] driver runs every stage in a fixed order and reports
//! progress along the way.

mod builder;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder, PipelineResult};
pub use progress::{ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate};
