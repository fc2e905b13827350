//! Backend payload adapter.
//!
//! The backend and its older clients disagree on field names (`panel_id` vs
//! `id`, `water_level` vs `water`, ...) and on value shapes (numbers as
//! strings, naive timestamps). This module is the only place those variants
//! are resolved; everything past it sees a typed [`PanelSnapshot`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use solarwatch_core::{DomainError, PanelId, PredictionId};
use solarwatch_status::{
    Action, PanelSnapshot, PanelStatus, PredictionRecord, ReportedState, VisionLabel, WaterLevel,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("panel payload has no panel_id")]
    MissingPanelId,

    #[error(transparent)]
    InvalidId(#[from] DomainError),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Panel JSON as the backend sends it. Every alias is kept as its own field
/// because payloads routinely carry several of them at once.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPanelPayload {
    pub panel_id: Option<Value>,
    pub id: Option<Value>,

    pub final_state: Option<Value>,
    pub status: Option<Value>,
    pub last_status: Option<Value>,

    pub action: Option<Value>,
    pub last_action: Option<Value>,
    pub action_status: Option<Value>,

    pub vision_result: Option<Value>,
    pub predicted_class: Option<Value>,
    pub ml_prediction: Option<Value>,

    pub confidence: Option<Value>,
    pub last_confidence: Option<Value>,
    pub ml_confidence: Option<Value>,

    pub humidity: Option<Value>,
    pub light: Option<Value>,
    pub temperature: Option<Value>,

    pub water_level: Option<Value>,
    pub water: Option<Value>,

    pub timestamp: Option<Value>,
    pub last_update: Option<Value>,
    pub updated_at: Option<Value>,
    #[serde(rename = "lastChecked")]
    pub last_checked: Option<Value>,
}

impl RawPanelPayload {
    pub fn into_snapshot(self) -> Result<PanelSnapshot, AdapterError> {
        let raw_id = first(&[&self.panel_id, &self.id], text).ok_or(AdapterError::MissingPanelId)?;
        let mut snapshot = PanelSnapshot::new(PanelId::new(raw_id)?);

        let mut vision = first(
            &[&self.vision_result, &self.predicted_class, &self.ml_prediction],
            text,
        );

        // `final_state` is taken as sent. The looser `status` fields only count
        // when they name a status; a vision label there feeds the fallback.
        snapshot.final_state = match first(&[&self.final_state], text) {
            Some(state) => Some(ReportedState::from(state)),
            None => {
                let loose = first(&[&self.status, &self.last_status], text);
                match loose.as_deref().and_then(PanelStatus::parse) {
                    Some(status) => Some(ReportedState::Known(status)),
                    None => {
                        if let Some(label) = loose {
                            if vision.is_none() && VisionLabel::from(label.as_str()).is_recognized() {
                                vision = Some(label);
                            } else {
                                debug!(status = %label, "ignoring non-status `status` field");
                            }
                        }
                        None
                    }
                }
            }
        };

        snapshot.action = first(&[&self.action], text).map(Action::from);
        snapshot.last_action = first(&[&self.last_action], text);
        snapshot.action_status = first(&[&self.action_status], text);
        snapshot.vision_result = vision.map(VisionLabel::from);
        snapshot.confidence = first(
            &[&self.confidence, &self.last_confidence, &self.ml_confidence],
            number,
        );
        snapshot.humidity = first(&[&self.humidity], number);
        snapshot.light = first(&[&self.light], number);
        snapshot.temperature = first(&[&self.temperature], number);
        snapshot.water_level = first(&[&self.water_level, &self.water], text).map(WaterLevel::from);
        snapshot.timestamp = first(
            &[&self.timestamp, &self.last_update, &self.updated_at, &self.last_checked],
            instant,
        );

        Ok(snapshot)
    }
}

/// One prediction-history entry as the backend sends it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPrediction {
    pub id: Option<Value>,
    pub prediction_id: Option<Value>,
    pub predicted_class: Option<Value>,
    pub vision_result: Option<Value>,
    pub confidence: Option<Value>,
    pub ml_confidence: Option<Value>,
    pub status: Option<Value>,
    pub timestamp: Option<Value>,
    pub created_at: Option<Value>,
    pub image_url: Option<Value>,
    pub processing_time_ms: Option<Value>,
}

impl RawPrediction {
    /// Never fails; unusable fields come out as `None`.
    pub fn into_record(self) -> PredictionRecord {
        PredictionRecord {
            id: first(&[&self.id, &self.prediction_id], text)
                .and_then(|raw| PredictionId::new(raw).ok()),
            predicted_class: first(&[&self.predicted_class, &self.vision_result], text)
                .map(VisionLabel::from),
            confidence: first(&[&self.confidence, &self.ml_confidence], number),
            status: first(&[&self.status], text),
            timestamp: first(&[&self.timestamp, &self.created_at], instant),
            image_url: first(&[&self.image_url], text),
            processing_time_ms: first(&[&self.processing_time_ms], number),
        }
    }
}

pub fn adapt_panel(value: Value) -> Result<PanelSnapshot, AdapterError> {
    serde_json::from_value::<RawPanelPayload>(value)
        .map_err(|e| AdapterError::Malformed(e.to_string()))?
        .into_snapshot()
}

/// Adapt a fleet listing, skipping entries that cannot be adapted.
pub fn adapt_panels(values: Vec<Value>) -> Vec<PanelSnapshot> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match adapt_panel(value) {
            Ok(snapshot) => Some(snapshot),
            Err(error) => {
                warn!(index, %error, "skipping panel payload");
                None
            }
        })
        .collect()
}

pub fn adapt_predictions(values: Vec<Value>) -> Vec<PredictionRecord> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<RawPrediction>(value) {
            Ok(raw) => Some(raw.into_record()),
            Err(error) => {
                warn!(%error, "skipping prediction payload");
                None
            }
        })
        .collect()
}

/// Items of a list response: either a bare array or an object wrapping one
/// under any of `keys`.
pub fn list_items(body: Value, keys: &[&str]) -> Option<Vec<Value>> {
    match body {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => keys.iter().find_map(|k| match map.remove(*k) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        }),
        _ => None,
    }
}

/// Overlay the newest prediction of `history` onto `snapshot`.
///
/// Only the vision label, confidence and timestamp are replaced. A
/// prediction's `status` is a job state, never the panel's `final_state`. A
/// prediction older than the snapshot is ignored.
pub fn merge_latest_prediction(
    mut snapshot: PanelSnapshot,
    history: &[PredictionRecord],
) -> PanelSnapshot {
    let Some(latest) = history
        .iter()
        .filter(|r| r.timestamp.is_some())
        .max_by_key(|r| r.timestamp)
        .or_else(|| history.first())
    else {
        return snapshot;
    };

    if let (Some(at), Some(current)) = (latest.timestamp, snapshot.timestamp) {
        if at < current {
            return snapshot;
        }
    }

    if let Some(label) = &latest.predicted_class {
        snapshot.vision_result = Some(label.clone());
    }
    if latest.confidence.is_some() {
        snapshot.confidence = latest.confidence;
    }
    if latest.timestamp.is_some() {
        snapshot.timestamp = latest.timestamp;
    }
    snapshot
}

fn first<T>(candidates: &[&Option<Value>], parse: impl Fn(&Value) -> Option<T>) -> Option<T> {
    candidates.iter().filter_map(|c| c.as_ref()).find_map(parse)
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// RFC 3339, naive ISO 8601 (read as UTC) or epoch milliseconds.
fn instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                        .ok()
                        .map(|n| n.and_utc())
                })
        }
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use solarwatch_status::{PanelStatus, classify};

    #[test]
    fn legacy_mock_shape_is_adapted() {
        let s = adapt_panel(json!({
            "panel_id": "P-2",
            "last_status": "dusty",
            "last_confidence": 82.5,
            "last_update": "2025-05-02T08:30:00Z",
            "id": "P-2",
            "status": "dusty",
            "lastChecked": "2025-05-02T08:30:00Z",
            "efficiency": 88
        }))
        .unwrap();
        assert_eq!(s.panel_id.as_str(), "P-2");
        assert_eq!(s.final_state, None);
        assert_eq!(s.vision_result, Some(VisionLabel::Dusty));
        assert_eq!(s.confidence, Some(82.5));
        assert_eq!(s.timestamp, Some(Utc.with_ymd_and_hms(2025, 5, 2, 8, 30, 0).unwrap()));
        assert_eq!(classify(&s).canonical_status, PanelStatus::Dirty);
    }

    #[test]
    fn status_alias_feeds_final_state_when_it_is_a_status() {
        let s = adapt_panel(json!({"id": 7, "status": "BLOCKED_WATER", "water": "VIDE"})).unwrap();
        assert_eq!(s.panel_id.as_str(), "7");
        assert_eq!(s.final_state, Some(ReportedState::Known(PanelStatus::BlockedWater)));
        assert_eq!(s.water_level, Some(WaterLevel::Empty));
    }

    #[test]
    fn explicit_final_state_is_kept_even_if_unrecognized() {
        let s = adapt_panel(json!({"panel_id": "P-1", "final_state": "healthy", "status": "clean"}))
            .unwrap();
        assert_eq!(s.final_state, Some(ReportedState::Unrecognized("healthy".to_string())));
    }

    #[test]
    fn action_outcome_fields_are_carried() {
        let s = adapt_panel(json!({"panel_id": "P-4", "last_action": "cleaning_completed"})).unwrap();
        assert_eq!(s.last_action.as_deref(), Some("cleaning_completed"));
        assert!(s.cleaning_completed());

        let s = adapt_panel(json!({"panel_id": "P-4", "action_status": "completed"})).unwrap();
        assert_eq!(s.action_status.as_deref(), Some("completed"));
        assert!(s.cleaning_completed());
    }

    #[test]
    fn stringly_numbers_and_naive_timestamps() {
        let s = adapt_panel(json!({
            "panel_id": "P-9",
            "ml_confidence": "0.71",
            "humidity": "83.5",
            "light": null,
            "updated_at": "2025-05-02T08:30:00.250"
        }))
        .unwrap();
        assert_eq!(s.confidence, Some(0.71));
        assert_eq!(s.humidity, Some(83.5));
        assert_eq!(s.light, None);
        assert!(s.timestamp.is_some());
    }

    #[test]
    fn missing_or_blank_id_is_an_error() {
        assert_eq!(adapt_panel(json!({"status": "clean"})).unwrap_err(), AdapterError::MissingPanelId);
        assert_eq!(adapt_panel(json!({"panel_id": "  "})).unwrap_err(), AdapterError::MissingPanelId);
        assert!(matches!(adapt_panel(json!("P-1")), Err(AdapterError::Malformed(_))));
    }

    #[test]
    fn fleet_adaptation_skips_bad_entries() {
        let panels = adapt_panels(vec![json!({"panel_id": "A"}), json!({"status": "x"}), json!({"id": "B"})]);
        let ids: Vec<_> = panels.iter().map(|p| p.panel_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn list_items_accepts_wrapped_lists() {
        assert_eq!(list_items(json!([1]), &["predictions"]), Some(vec![json!(1)]));
        assert_eq!(
            list_items(json!({"predictions": [1, 2]}), &["history", "predictions"]),
            Some(vec![json!(1), json!(2)])
        );
        assert_eq!(list_items(json!({"detail": "x"}), &["predictions"]), None);
    }

    #[test]
    fn newest_prediction_is_merged() {
        let at = |h| Some(Utc.with_ymd_and_hms(2025, 5, 2, h, 0, 0).unwrap());
        let history = adapt_predictions(vec![
            json!({"id": "a", "predicted_class": "clean", "confidence": 0.9, "timestamp": "2025-05-02T07:00:00Z"}),
            json!({"id": "b", "predicted_class": "Bird-drop", "confidence": 61, "timestamp": "2025-05-02T09:00:00Z"}),
        ]);
        let mut snapshot = PanelSnapshot::new(PanelId::new("P-1").unwrap());
        snapshot.timestamp = at(8);

        let merged = merge_latest_prediction(snapshot.clone(), &history);
        assert_eq!(merged.vision_result, Some(VisionLabel::BirdDrop));
        assert_eq!(merged.confidence, Some(61.0));
        assert_eq!(merged.timestamp, at(9));

        snapshot.timestamp = at(10);
        let stale = merge_latest_prediction(snapshot.clone(), &history);
        assert_eq!(stale, snapshot);
    }

    #[test]
    fn prediction_status_never_becomes_final_state() {
        let snapshot = adapt_panel(json!({"panel_id": "P-1", "action": "blocked_water"})).unwrap();
        let history = adapt_predictions(vec![
            json!({"predicted_class": "clean", "status": "clean", "confidence": 0.9}),
        ]);

        let merged = merge_latest_prediction(snapshot, &history);
        assert_eq!(merged.final_state, None);
        assert_eq!(merged.vision_result, Some(VisionLabel::Clean));
        assert_eq!(classify(&merged).canonical_status, PanelStatus::BlockedWater);
    }
}
