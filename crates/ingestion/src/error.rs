//! Ingestion error types
//!
//! Every variant is a per-message failure: the message is logged and dropped,
//! and the pipeline moves on to the next one.

use contracts::{NormalizationMode, SourceField};
use thiserror::Error;

/// Payload could not be turned into a raw reading
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Not a JSON object, not a single-quoted object, not a bare number
    #[error("undecodable payload: not a JSON object, single-quoted object or bare number")]
    InvalidPayload,

    /// Decoded, but no usable numeric distance field
    #[error("invalid distance: {}", describe_field(.field))]
    InvalidDistance {
        /// First candidate field present, `None` if none was present
        field: Option<SourceField>,
    },
}

fn describe_field(field: &Option<SourceField>) -> String {
    match field {
        Some(field) => format!("field '{field}' is not numeric"),
        None => "none of 'distance', 'msg', 'value' present".to_string(),
    }
}

/// Raw value could not become a canonical reading
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Negative or non-finite after normalization
    #[error("distance out of range: raw value {raw_value} normalizes to {normalized} ({mode})")]
    OutOfRange {
        raw_value: f64,
        normalized: f64,
        mode: NormalizationMode,
    },
}

/// Ingestion error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestionError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl IngestionError {
    /// Short label for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse_error",
            Self::Validation(_) => "validation_error",
        }
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
