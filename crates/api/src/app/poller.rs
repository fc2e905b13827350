//! Background fleet poller.
//!
//! Every tick the poller lists the fleet, drops snapshots older than what it
//! has already seen for the same panel, classifies the rest and broadcasts a
//! `panel.classified` event for each.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use solarwatch_backend::{BackendError, SessionContext};
use solarwatch_core::{Entity, PanelId};
use solarwatch_status::{PanelSnapshot, StatusClassifier};

use crate::app::services::AppServices;

/// Upper bound for the failure backoff.
const MAX_BACKOFF: Duration = Duration::from_secs(300);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// First sighting, newer than anything seen, or undated.
    New,
    /// Same timestamp as the newest seen.
    Unchanged,
    /// Older than the newest seen; must be discarded.
    Stale,
}

/// Last-write-wins bookkeeping per panel, keyed by snapshot timestamp.
#[derive(Debug, Default)]
pub struct SnapshotTracker {
    latest: Mutex<HashMap<PanelId, DateTime<Utc>>>,
}

impl SnapshotTracker {
    pub fn observe(&self, snapshot: &PanelSnapshot) -> Freshness {
        let Some(at) = snapshot.timestamp else {
            return Freshness::New;
        };
        // A poisoned map only loses freshness history; keep accepting.
        let Ok(mut latest) = self.latest.lock() else {
            return Freshness::New;
        };
        match latest.get(snapshot.id()) {
            Some(seen) if at < *seen => Freshness::Stale,
            Some(seen) if at == *seen => Freshness::Unchanged,
            _ => {
                latest.insert(snapshot.id().clone(), at);
                Freshness::New
            }
        }
    }
}

pub struct FleetPoller {
    services: Arc<AppServices>,
    interval: Duration,
    session: SessionContext,
    shutdown: Arc<Notify>,
}

impl FleetPoller {
    pub fn new(services: Arc<AppServices>, interval: Duration, session: SessionContext) -> Self {
        Self {
            services,
            interval,
            session,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Notify this to stop the poller after its current tick.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(interval_secs = self.interval.as_secs(), "fleet poller started");

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut consecutive_failures = 0u32;

            loop {
                tokio::select! {
                    _ = self.shutdown.notified() => break,
                    _ = ticker.tick() => {}
                }

                match poll_once(&self.services, &self.session).await {
                    Ok(published) => {
                        if consecutive_failures > 0 {
                            tracing::info!(after_failures = consecutive_failures, "fleet poll recovered");
                        }
                        consecutive_failures = 0;
                        tracing::debug!(published, "fleet poll complete");
                    }
                    Err(e) => {
                        consecutive_failures += 1;
                        let delay = backoff(self.interval, consecutive_failures);
                        tracing::warn!(
                            error = %e,
                            failures = consecutive_failures,
                            backoff_ms = delay.as_millis() as u64,
                            "fleet poll failed"
                        );
                        tokio::select! {
                            _ = self.shutdown.notified() => break,
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                }
            }

            tracing::info!("fleet poller stopped");
        })
    }
}

/// One poll: returns how many classifications were broadcast.
pub async fn poll_once(services: &AppServices, session: &SessionContext) -> Result<usize, BackendError> {
    let snapshots = services.backend().list_panels(session).await?;
    let classifier = StatusClassifier::new(services.default_locale());

    let published = snapshots
        .iter()
        .filter(|snapshot| services.publish_if_fresh(snapshot, &classifier.classify(snapshot)))
        .count();
    Ok(published)
}

/// Extra wait after `attempt` consecutive failures: `base * 2^(attempt-1)`, capped.
fn backoff(base: Duration, attempt: u32) -> Duration {
    let pow = 1u32 << attempt.saturating_sub(1).min(10);
    base.saturating_mul(pow).min(MAX_BACKOFF)
}
