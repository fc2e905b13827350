//! Service wiring: backend selection, realtime channel, snapshot freshness.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};
use tracing::{info, warn};

use solarwatch_backend::{
    BackendError, HttpPanelBackend, InMemoryPanelBackend, PanelBackend, SessionContext,
    merge_latest_prediction,
};
use solarwatch_core::PanelId;
use solarwatch_status::{
    ClassificationResult, Locale, PanelSnapshot, PredictionRecord, assess_prediction,
    sort_newest_first,
};

use crate::app::poller::{Freshness, SnapshotTracker};
use crate::app::retraining::SuspiciousLedger;
use crate::config::ApiConfig;

/// History entries fetched to find the newest prediction; backends do not
/// agree on ordering.
const LATEST_PREDICTION_WINDOW: usize = 20;

/// Realtime message broadcast via SSE.
#[derive(Debug, Clone, Serialize)]
pub struct RealtimeMessage {
    pub panel_id: PanelId,
    pub topic: String,
    pub payload: serde_json::Value,
}

/// A panel as currently known: the backend snapshot with the newest
/// prediction merged in.
#[derive(Debug, Clone)]
pub struct PanelState {
    pub snapshot: PanelSnapshot,
    pub latest_prediction: Option<PredictionRecord>,
}

pub struct AppServices {
    backend: Arc<dyn PanelBackend>,
    realtime_tx: broadcast::Sender<RealtimeMessage>,
    tracker: SnapshotTracker,
    suspicious: SuspiciousLedger,
    default_locale: Locale,
}

impl AppServices {
    pub fn new(backend: Arc<dyn PanelBackend>) -> Self {
        // Lossy: slow SSE clients miss messages instead of slowing the poller.
        let (realtime_tx, _realtime_rx) = broadcast::channel::<RealtimeMessage>(256);
        Self {
            backend,
            realtime_tx,
            tracker: SnapshotTracker::default(),
            suspicious: SuspiciousLedger::default(),
            default_locale: Locale::default(),
        }
    }

    pub fn with_default_locale(mut self, locale: Locale) -> Self {
        self.default_locale = locale;
        self
    }

    pub fn with_retraining_threshold(mut self, threshold: usize) -> Self {
        self.suspicious = SuspiciousLedger::with_threshold(threshold);
        self
    }

    pub fn backend(&self) -> &dyn PanelBackend {
        self.backend.as_ref()
    }

    pub fn realtime_tx(&self) -> &broadcast::Sender<RealtimeMessage> {
        &self.realtime_tx
    }

    pub fn tracker(&self) -> &SnapshotTracker {
        &self.tracker
    }

    pub fn suspicious(&self) -> &SuspiciousLedger {
        &self.suspicious
    }

    pub fn default_locale(&self) -> Locale {
        self.default_locale
    }

    /// Fetch a panel and overlay its newest prediction.
    ///
    /// The history lookup is best-effort: if it fails the bare snapshot is used.
    pub async fn panel_state(
        &self,
        session: &SessionContext,
        panel_id: &PanelId,
    ) -> Result<PanelState, BackendError> {
        let snapshot = self.backend.get_panel(session, panel_id).await?;

        let mut history = match self
            .backend
            .prediction_history(session, panel_id, LATEST_PREDICTION_WINDOW)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                warn!(panel_id = %panel_id, error = %e, "prediction history unavailable; using bare snapshot");
                Vec::new()
            }
        };
        sort_newest_first(&mut history);
        for record in &history {
            self.suspicious.record(record, &assess_prediction(record));
        }

        Ok(PanelState {
            snapshot: merge_latest_prediction(snapshot, &history),
            latest_prediction: history.into_iter().next(),
        })
    }

    /// Broadcast `result` only if `snapshot` is newer than anything already
    /// published for its panel. Returns whether it was broadcast.
    pub fn publish_if_fresh(&self, snapshot: &PanelSnapshot, result: &ClassificationResult) -> bool {
        match self.tracker.observe(snapshot) {
            Freshness::New => {
                self.publish_classified(result);
                true
            }
            Freshness::Unchanged => false,
            Freshness::Stale => {
                tracing::debug!(panel_id = %snapshot.panel_id, "discarding stale snapshot");
                false
            }
        }
    }

    /// Broadcast a `panel.classified` event (lossy; no backpressure).
    fn publish_classified(&self, result: &ClassificationResult) {
        let payload = match serde_json::to_value(result) {
            Ok(v) => v,
            Err(e) => {
                warn!(panel_id = %result.panel_id, error = %e, "failed to serialize classification");
                return;
            }
        };
        let _ = self.realtime_tx.send(RealtimeMessage {
            panel_id: result.panel_id.clone(),
            topic: "panel.classified".to_string(),
            payload,
        });
    }
}

/// Pick the backend from configuration.
pub fn build_services(config: &ApiConfig) -> Result<AppServices, BackendError> {
    let backend: Arc<dyn PanelBackend> = match &config.backend_url {
        Some(url) => {
            info!(backend_url = %url, timeout_secs = config.backend_timeout.as_secs(), "using HTTP panel backend");
            Arc::new(HttpPanelBackend::with_timeout(url, config.backend_timeout)?)
        }
        None => {
            info!("BACKEND_URL not set; serving the in-memory demo fleet");
            Arc::new(InMemoryPanelBackend::demo())
        }
    };
    Ok(AppServices::new(backend)
        .with_default_locale(config.default_locale)
        .with_retraining_threshold(config.retraining_threshold))
}

/// SSE stream of realtime messages, optionally for a single panel.
pub fn panel_sse_stream(
    services: Arc<AppServices>,
    panel_filter: Option<PanelId>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime_tx().subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(m) if panel_filter.as_ref().is_none_or(|p| *p == m.panel_id) => {
            let data = serde_json::to_string(&m.payload).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event(m.topic).data(data)))
        }
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
