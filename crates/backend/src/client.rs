//! The backend boundary as a trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use solarwatch_core::PanelId;
use solarwatch_status::{FeedbackRecord, NextAction, PanelSnapshot, PanelStatus, PredictionRecord, ValidationOutcome};

use crate::payload::AdapterError;
use crate::session::SessionContext;

#[derive(Debug, Error)]
pub enum BackendError {
    /// Backend unreachable, timed out, or failing with a server error.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The relayed token was refused (401).
    #[error("backend refused credentials: {0}")]
    Unauthorized(String),

    /// The relayed token lacks access (403).
    #[error("backend denied access: {0}")]
    Forbidden(String),

    /// The backend answered with a client error.
    #[error("backend rejected request ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("unexpected backend response: {0}")]
    Decode(String),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("invalid backend configuration: {0}")]
    Config(String),
}

/// Device command relayed through the backend's message bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningCommand {
    pub device_id: PanelId,
    pub final_state: PanelStatus,
    pub action: NextAction,
}

impl CleaningCommand {
    pub fn from_outcome(outcome: &ValidationOutcome) -> Self {
        Self {
            device_id: outcome.feedback.panel_id.clone(),
            final_state: outcome.resolved_status,
            action: outcome.next_action,
        }
    }
}

/// Read and write access to the panel backend.
///
/// Every call carries the caller's [`SessionContext`]; implementations relay
/// it and never cache it. No implementation retries on its own.
#[async_trait]
pub trait PanelBackend: Send + Sync {
    /// Fleet listing. Entries that cannot be adapted are skipped.
    async fn list_panels(&self, session: &SessionContext) -> Result<Vec<PanelSnapshot>, BackendError>;

    async fn get_panel(
        &self,
        session: &SessionContext,
        panel_id: &PanelId,
    ) -> Result<PanelSnapshot, BackendError>;

    /// At most `limit` predictions, in the order the backend returns them.
    async fn prediction_history(
        &self,
        session: &SessionContext,
        panel_id: &PanelId,
        limit: usize,
    ) -> Result<Vec<PredictionRecord>, BackendError>;

    async fn submit_feedback(
        &self,
        session: &SessionContext,
        feedback: &FeedbackRecord,
    ) -> Result<(), BackendError>;

    async fn send_cleaning_command(
        &self,
        session: &SessionContext,
        command: &CleaningCommand,
    ) -> Result<(), BackendError>;

    /// Backend health body, passed through.
    async fn health(&self, session: &SessionContext) -> Result<Value, BackendError>;
}
