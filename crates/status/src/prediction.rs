//! Past vision predictions and their assessment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use solarwatch_core::PredictionId;

use crate::confidence::{Confidence, ConfidenceBand, normalize_confidence};
use crate::status::{Cleanliness, PanelStatus, VisionLabel};

/// Suspicious predictions accumulated before retraining is recommended.
pub const RETRAINING_THRESHOLD: usize = 500;

/// One entry of a panel's prediction history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: Option<PredictionId>,
    pub predicted_class: Option<VisionLabel>,
    /// Raw, fraction or percentage.
    pub confidence: Option<f64>,
    /// Backend processing status (`completed`, `pending`, ...), passed through.
    pub status: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub processing_time_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionAssessment {
    pub confidence_normalized: Option<Confidence>,
    pub confidence_band: Option<ConfidenceBand>,
    /// Normalised confidence below the human-validation threshold.
    pub is_suspicious: bool,
    pub implied_status: Option<PanelStatus>,
}

pub fn assess_prediction(record: &PredictionRecord) -> PredictionAssessment {
    let confidence_normalized = record.confidence.and_then(normalize_confidence);
    PredictionAssessment {
        confidence_normalized,
        confidence_band: confidence_normalized.map(Confidence::band),
        is_suspicious: confidence_normalized.is_some_and(Confidence::is_below_validation_threshold),
        implied_status: record
            .predicted_class
            .as_ref()
            .and_then(VisionLabel::implied_cleanliness)
            .map(Cleanliness::status),
    }
}

/// Newest first; undated entries keep their relative order at the end.
pub fn sort_newest_first(records: &mut [PredictionRecord]) {
    records.sort_by(|a, b| match (a.timestamp, b.timestamp) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => core::cmp::Ordering::Less,
        (None, Some(_)) => core::cmp::Ordering::Greater,
        (None, None) => core::cmp::Ordering::Equal,
    });
}

pub fn should_trigger_retraining(suspicious: usize, threshold: usize) -> bool {
    suspicious >= threshold
}
