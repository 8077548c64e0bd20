//! # Ingestion Pipeline
//!
//! Turns raw broker payloads into classified, persisted, broadcast readings.
//!
//! Responsibilities:
//! - Decode payloads (JSON object, single-quoted object, bare number)
//! - Normalize to centimeters per the deployment's unit convention
//! - Classify against danger / warning thresholds
//! - Hand the reading to persistence, then to live subscribers
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{IngestionConfig, IngestionPipeline};
//!
//! let pipeline = IngestionPipeline::new(
//!     IngestionConfig::from_blueprint(&blueprint),
//!     gateway,
//!     broadcaster,
//! );
//! let summary = pipeline.run(rx, cancel, None).await;
//! ```

mod classifier;
mod error;
mod metrics;
mod normalizer;
mod parser;
mod pipeline;

// Re-exports
pub use classifier::{classify, StatusClassifier};
pub use error::{IngestionError, ParseError, Result, ValidationError};
pub use metrics::{IngestionMetrics, MetricsSnapshot};
pub use normalizer::{normalize, UnitNormalizer};
pub use parser::decode;
pub use pipeline::{
    IngestionConfig, IngestionPipeline, MessageOutcome, ProcessedReading, RunSummary,
};
