//! In-memory backend for local runs and tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use solarwatch_core::PanelId;
use solarwatch_status::{FeedbackRecord, PanelSnapshot, PredictionRecord};

use crate::client::{BackendError, CleaningCommand, PanelBackend};
use crate::payload::{adapt_panels, adapt_predictions};
use crate::session::SessionContext;

/// Panels, histories, and the writes made against them.
///
/// - No IO
/// - Histories are stored newest first
/// - Availability toggles simulate backend and device-bridge outages
#[derive(Debug, Default)]
pub struct InMemoryPanelBackend {
    panels: RwLock<BTreeMap<PanelId, PanelSnapshot>>,
    history: RwLock<HashMap<PanelId, Vec<PredictionRecord>>>,
    feedback: Mutex<Vec<FeedbackRecord>>,
    commands: Mutex<Vec<CleaningCommand>>,
    unavailable: AtomicBool,
    commands_unavailable: AtomicBool,
}

impl InMemoryPanelBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Three-panel demo fleet with a short history each.
    pub fn demo() -> Self {
        let now = Utc::now();
        let ago = |minutes: i64| (now - Duration::minutes(minutes)).to_rfc3339();

        let panels = adapt_panels(vec![
            json!({"panel_id": "P-1", "last_status": "clean", "last_confidence": 98.2, "last_update": ago(5),
                   "humidity": 42.0, "light": 820.0, "temperature": 24.5, "water_level": "OK"}),
            json!({"panel_id": "P-2", "last_status": "dusty", "last_confidence": 82.5, "last_update": ago(12),
                   "action": "start_clean", "humidity": 55.0, "light": 640.0, "temperature": 29.0, "water_level": "OK"}),
            json!({"panel_id": "P-3", "last_status": "damaged", "last_confidence": 91.1, "last_update": ago(30),
                   "humidity": 84.0, "light": 90.0, "temperature": 37.5, "water": "VIDE"}),
        ]);

        let mut history = HashMap::new();
        for (panel, entries) in [
            ("P-1", vec![("clean", 98.2, 5), ("clean", 0.95, 65), ("dusty", 0.61, 125)]),
            ("P-2", vec![("dusty", 82.5, 12), ("dusty", 0.58, 72), ("clean", 0.9, 132)]),
            ("P-3", vec![("damaged", 91.1, 30), ("bird_drop", 0.64, 90)]),
        ] {
            let records = adapt_predictions(
                entries
                    .into_iter()
                    .enumerate()
                    .map(|(i, (label, confidence, minutes))| {
                        json!({
                            "id": format!("{panel}-pred-{i}"),
                            "predicted_class": label,
                            "confidence": confidence,
                            "status": "completed",
                            "timestamp": ago(minutes),
                            "processing_time_ms": 140 + 10 * i,
                        })
                    })
                    .collect(),
            );
            if let Ok(id) = PanelId::new(panel) {
                history.insert(id, records);
            }
        }

        Self {
            panels: RwLock::new(panels.into_iter().map(|p| (p.panel_id.clone(), p)).collect()),
            history: RwLock::new(history),
            ..Self::default()
        }
    }

    pub fn with_panel(mut self, snapshot: PanelSnapshot) -> Self {
        self.panels.get_mut().insert(snapshot.panel_id.clone(), snapshot);
        self
    }

    /// Replace a panel's history; `records` are expected newest first.
    pub fn with_history(mut self, panel_id: PanelId, records: Vec<PredictionRecord>) -> Self {
        self.history.get_mut().insert(panel_id, records);
        self
    }

    pub async fn upsert_panel(&self, snapshot: PanelSnapshot) {
        self.panels.write().await.insert(snapshot.panel_id.clone(), snapshot);
    }

    /// Make every call fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make only the device-command relay fail.
    pub fn set_commands_unavailable(&self, unavailable: bool) {
        self.commands_unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn recorded_feedback(&self) -> Vec<FeedbackRecord> {
        self.feedback.lock().await.clone()
    }

    pub async fn recorded_commands(&self) -> Vec<CleaningCommand> {
        self.commands.lock().await.clone()
    }

    fn check_available(&self) -> Result<(), BackendError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(BackendError::Unavailable("in-memory backend switched off".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PanelBackend for InMemoryPanelBackend {
    async fn list_panels(&self, _session: &SessionContext) -> Result<Vec<PanelSnapshot>, BackendError> {
        self.check_available()?;
        Ok(self.panels.read().await.values().cloned().collect())
    }

    async fn get_panel(
        &self,
        _session: &SessionContext,
        panel_id: &PanelId,
    ) -> Result<PanelSnapshot, BackendError> {
        self.check_available()?;
        self.panels
            .read()
            .await
            .get(panel_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("panel {panel_id}")))
    }

    async fn prediction_history(
        &self,
        _session: &SessionContext,
        panel_id: &PanelId,
        limit: usize,
    ) -> Result<Vec<PredictionRecord>, BackendError> {
        self.check_available()?;
        if !self.panels.read().await.contains_key(panel_id) {
            return Err(BackendError::NotFound(format!("panel {panel_id}")));
        }
        Ok(self
            .history
            .read()
            .await
            .get(panel_id)
            .map(|records| records.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn submit_feedback(
        &self,
        _session: &SessionContext,
        feedback: &FeedbackRecord,
    ) -> Result<(), BackendError> {
        self.check_available()?;
        info!(panel_id = %feedback.panel_id, is_correct = feedback.is_correct, "feedback recorded");
        self.feedback.lock().await.push(feedback.clone());
        Ok(())
    }

    async fn send_cleaning_command(
        &self,
        _session: &SessionContext,
        command: &CleaningCommand,
    ) -> Result<(), BackendError> {
        self.check_available()?;
        if self.commands_unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("device bridge switched off".to_string()));
        }
        info!(device_id = %command.device_id, action = command.action.as_str(), "cleaning command recorded");
        self.commands.lock().await.push(command.clone());
        Ok(())
    }

    async fn health(&self, _session: &SessionContext) -> Result<Value, BackendError> {
        self.check_available()?;
        Ok(json!({
            "status": "ok",
            "backend": "in_memory",
            "panels": self.panels.read().await.len(),
        }))
    }
}
