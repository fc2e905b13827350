//! `PanelSnapshot`: the latest known state of one panel, in one typed shape.
//!
//! Snapshots are produced by the backend adapter and are read-only to this
//! crate. The `with_*` builders exist for callers assembling snapshots by hand
//! (demo data, tests).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use solarwatch_core::{Entity, PanelId};

use crate::status::{Action, ReportedState, VisionLabel, WaterLevel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSnapshot {
    pub panel_id: PanelId,

    /// Decision made by the backend, absent until one exists.
    pub final_state: Option<ReportedState>,

    /// Last command dispatched to the device.
    pub action: Option<Action>,

    /// Vision model label.
    pub vision_result: Option<VisionLabel>,

    /// Raw confidence, either in \[0, 1\] or in (1, 100\].
    pub confidence: Option<f64>,

    /// Relative humidity, %.
    pub humidity: Option<f64>,

    /// Illuminance, lux.
    pub light: Option<f64>,

    /// °C.
    pub temperature: Option<f64>,

    pub water_level: Option<WaterLevel>,

    /// Last device-reported action outcome (`cleaning_completed`, ...).
    #[serde(default)]
    pub last_action: Option<String>,

    /// Status of the last dispatched action (`pending`, `completed`, ...).
    #[serde(default)]
    pub action_status: Option<String>,

    pub timestamp: Option<DateTime<Utc>>,
}

impl PanelSnapshot {
    pub fn new(panel_id: PanelId) -> Self {
        Self {
            panel_id,
            final_state: None,
            action: None,
            vision_result: None,
            confidence: None,
            humidity: None,
            light: None,
            temperature: None,
            water_level: None,
            last_action: None,
            action_status: None,
            timestamp: None,
        }
    }

    pub fn with_final_state(mut self, state: impl Into<ReportedState>) -> Self {
        self.final_state = Some(state.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<Action>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_vision_result(mut self, label: impl Into<VisionLabel>) -> Self {
        self.vision_result = Some(label.into());
        self
    }

    pub fn with_confidence(mut self, raw: f64) -> Self {
        self.confidence = Some(raw);
        self
    }

    pub fn with_humidity(mut self, pct: f64) -> Self {
        self.humidity = Some(pct);
        self
    }

    pub fn with_light(mut self, lux: f64) -> Self {
        self.light = Some(lux);
        self
    }

    pub fn with_temperature(mut self, celsius: f64) -> Self {
        self.temperature = Some(celsius);
        self
    }

    pub fn with_water_level(mut self, level: impl Into<WaterLevel>) -> Self {
        self.water_level = Some(level.into());
        self
    }

    pub fn with_last_action(mut self, action: impl Into<String>) -> Self {
        self.last_action = Some(action.into());
        self
    }

    pub fn with_action_status(mut self, status: impl Into<String>) -> Self {
        self.action_status = Some(status.into());
        self
    }

    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }

    /// The device reported its last cleaning run as finished.
    pub fn cleaning_completed(&self) -> bool {
        let is = |field: &Option<String>, value: &str| {
            field.as_deref().is_some_and(|v| v.eq_ignore_ascii_case(value))
        };
        is(&self.last_action, "cleaning_completed") || is(&self.action_status, "completed")
    }
}

impl Entity for PanelSnapshot {
    type Id = PanelId;

    fn id(&self) -> &Self::Id {
        &self.panel_id
    }
}
