//! Unit normalization
//!
//! Converts a raw value to centimeters using the deployment's unit convention,
//! then enforces the reading invariants (finite, non-negative).

use chrono::{DateTime, Utc};
use contracts::{NormalizationMode, RawReading, Reading};

use crate::error::ValidationError;

/// Convert a raw value to centimeters
///
/// `mm_to_cm` divides by 10 and rounds to 2 decimal places.
pub fn normalize(raw_value: f64, mode: NormalizationMode) -> Result<f64, ValidationError> {
    let normalized = match mode {
        NormalizationMode::Direct => raw_value,
        NormalizationMode::MmToCm => round_cm(raw_value / 10.0),
    };

    if normalized.is_finite() && normalized >= 0.0 {
        Ok(normalized)
    } else {
        Err(ValidationError::OutOfRange {
            raw_value,
            normalized,
            mode,
        })
    }
}

fn round_cm(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Normalizer bound to one unit convention
#[derive(Debug, Clone, Copy)]
pub struct UnitNormalizer {
    mode: NormalizationMode,
}

impl UnitNormalizer {
    pub fn new(mode: NormalizationMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> NormalizationMode {
        self.mode
    }

    /// Build a canonical reading stamped with the message arrival time
    pub fn to_reading(
        &self,
        raw: RawReading,
        timestamp: DateTime<Utc>,
    ) -> Result<Reading, ValidationError> {
        let distance_cm = normalize(raw.raw_value, self.mode)?;
        Reading::try_new(distance_cm, timestamp).ok_or(ValidationError::OutOfRange {
            raw_value: raw.raw_value,
            normalized: distance_cm,
            mode: self.mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SourceField;

    #[test]
    fn direct_keeps_value() {
        assert_eq!(normalize(42.0, NormalizationMode::Direct), Ok(42.0));
        assert_eq!(normalize(0.0, NormalizationMode::Direct), Ok(0.0));
    }

    #[test]
    fn millimeters_to_centimeters() {
        assert_eq!(normalize(123.0, NormalizationMode::MmToCm), Ok(12.3));
        assert_eq!(normalize(50.0, NormalizationMode::MmToCm), Ok(5.0));
        assert_eq!(normalize(1.234, NormalizationMode::MmToCm), Ok(0.12));
    }

    #[test]
    fn negative_and_non_finite_rejected() {
        for mode in [NormalizationMode::Direct, NormalizationMode::MmToCm] {
            assert!(matches!(
                normalize(-1.0, mode),
                Err(ValidationError::OutOfRange { .. })
            ));
            assert!(normalize(f64::NAN, mode).is_err());
            assert!(normalize(f64::INFINITY, mode).is_err());
        }
    }

    #[test]
    fn reading_carries_arrival_time() {
        let normalizer = UnitNormalizer::new(NormalizationMode::MmToCm);
        let at = Utc::now();
        let reading = normalizer
            .to_reading(
                RawReading {
                    raw_value: 250.0,
                    source_field: SourceField::Value,
                },
                at,
            )
            .unwrap();
        assert_eq!(reading.distance_cm(), 25.0);
        assert_eq!(reading.timestamp(), at);
    }
}
