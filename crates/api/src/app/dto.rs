use serde::{Deserialize, Serialize};

use solarwatch_core::PredictionId;
use solarwatch_status::{
    ClassificationResult, Notification, PanelSnapshot, PredictionAssessment, PredictionRecord,
    ValidationOutcome, VisionLabel,
};

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /panels/:id/validation`; the panel comes from the path.
#[derive(Debug, Deserialize)]
pub struct ValidationRequest {
    #[serde(default)]
    pub prediction_id: Option<PredictionId>,
    pub is_correct: bool,
    #[serde(default)]
    pub corrected_class: Option<VisionLabel>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct PanelView {
    pub snapshot: PanelSnapshot,
    pub classification: ClassificationResult,
}

#[derive(Debug, Serialize)]
pub struct FleetView {
    pub count: usize,
    pub panels: Vec<PanelView>,
}

#[derive(Debug, Serialize)]
pub struct PanelDetailView {
    pub snapshot: PanelSnapshot,
    pub classification: ClassificationResult,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Serialize)]
pub struct PredictionView {
    #[serde(flatten)]
    pub record: PredictionRecord,
    pub assessment: PredictionAssessment,
}

#[derive(Debug, Serialize)]
pub struct HistorySummary {
    pub count: usize,
    /// Suspicious predictions on this page.
    pub suspicious: usize,
    /// Distinct suspicious predictions seen by this service so far.
    pub suspicious_accumulated: usize,
    pub retraining_threshold: usize,
    pub retraining_recommended: bool,
}

#[derive(Debug, Serialize)]
pub struct HistoryView {
    pub panel_id: String,
    pub predictions: Vec<PredictionView>,
    pub summary: HistorySummary,
}

#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    #[serde(flatten)]
    pub outcome: ValidationOutcome,
    pub command_dispatched: bool,
}
