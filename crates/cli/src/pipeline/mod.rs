//! Service orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{Pipeline, PipelineConfig, ReplaySettings};
pub use stats::PipelineStats;
