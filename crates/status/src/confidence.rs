//! Confidence normalisation and the human-validation threshold.
//!
//! The vision backend reports confidence either as a fraction (`0.92`) or as a
//! percentage (`92`). Everything past this module works on fractions only.

use serde::Serialize;

use solarwatch_core::ValueObject;

/// Below this normalised confidence a prediction needs human confirmation.
///
/// Fixed policy; not configurable per call.
pub const HUMAN_VALIDATION_THRESHOLD: f64 = 0.65;

/// Lower bound of the `high` confidence band.
pub const HIGH_CONFIDENCE: f64 = 0.80;

/// A confidence score in \[0, 1\].
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Confidence(f64);

impl ValueObject for Confidence {}

impl Confidence {
    /// `None` unless `value` is finite and within \[0, 1\].
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_below_validation_threshold(self) -> bool {
        self.0 < HUMAN_VALIDATION_THRESHOLD
    }

    pub fn band(self) -> ConfidenceBand {
        if self.0 >= HIGH_CONFIDENCE {
            ConfidenceBand::High
        } else if self.0 >= HUMAN_VALIDATION_THRESHOLD {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

/// Normalise a raw confidence: values above 1 are read as percentages.
///
/// Returns `None` when the result falls outside \[0, 1\] (negative input,
/// percentages above 100, NaN or infinities).
pub fn normalize_confidence(raw: f64) -> Option<Confidence> {
    let value = if raw > 1.0 { raw / 100.0 } else { raw };
    Confidence::new(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn percentages_are_scaled() {
        assert_eq!(normalize_confidence(92.0).map(Confidence::value), Some(0.92));
        assert_eq!(normalize_confidence(100.0).map(Confidence::value), Some(1.0));
        assert_eq!(normalize_confidence(0.0).map(Confidence::value), Some(0.0));
    }

    #[test]
    fn out_of_range_is_rejected() {
        assert_eq!(normalize_confidence(-0.1), None);
        assert_eq!(normalize_confidence(100.5), None);
        assert_eq!(normalize_confidence(f64::NAN), None);
        assert_eq!(normalize_confidence(f64::INFINITY), None);
    }

    #[test]
    fn bands() {
        assert_eq!(Confidence::new(0.80).unwrap().band(), ConfidenceBand::High);
        assert_eq!(Confidence::new(0.65).unwrap().band(), ConfidenceBand::Medium);
        assert_eq!(Confidence::new(0.649).unwrap().band(), ConfidenceBand::Low);
        assert!(!Confidence::new(0.65).unwrap().is_below_validation_threshold());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: fractions in (0, 1] are returned unchanged.
        #[test]
        fn fractions_pass_through(c in 1e-9f64..=1.0f64) {
            prop_assert_eq!(normalize_confidence(c).map(Confidence::value), Some(c));
        }

        /// Property: values in (1, 100] are read as percentages.
        #[test]
        fn percentages_are_divided(c in 1.000_001f64..=100.0f64) {
            prop_assert_eq!(normalize_confidence(c).map(Confidence::value), Some(c / 100.0));
        }

        /// Property: anything outside [0, 100] is rejected.
        #[test]
        fn outside_range_is_none(
            c in prop_oneof![-1.0e6f64..-1e-9f64, 100.000_001f64..1.0e6f64]
        ) {
            prop_assert_eq!(normalize_confidence(c), None);
        }
    }
}
