//! Accumulated suspicious predictions, the input to the retraining trigger.
//!
//! Predictions are counted once per id, however many history pages repeat
//! them. Entries without an id cannot be de-duplicated and are not counted.

use std::collections::HashSet;
use std::sync::Mutex;

use solarwatch_core::PredictionId;
use solarwatch_status::{
    PredictionAssessment, PredictionRecord, RETRAINING_THRESHOLD, should_trigger_retraining,
};

#[derive(Debug)]
pub struct SuspiciousLedger {
    seen: Mutex<HashSet<PredictionId>>,
    threshold: usize,
}

impl Default for SuspiciousLedger {
    fn default() -> Self {
        Self::with_threshold(RETRAINING_THRESHOLD)
    }
}

impl SuspiciousLedger {
    pub fn with_threshold(threshold: usize) -> Self {
        Self {
            seen: Mutex::new(HashSet::new()),
            threshold,
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Record a suspicious prediction; returns the accumulated count.
    pub fn record(&self, record: &PredictionRecord, assessment: &PredictionAssessment) -> usize {
        let Ok(mut seen) = self.seen.lock() else {
            return 0;
        };
        if assessment.is_suspicious {
            if let Some(id) = &record.id {
                seen.insert(id.clone());
            }
        }
        seen.len()
    }

    pub fn accumulated(&self) -> usize {
        self.seen.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn retraining_recommended(&self) -> bool {
        should_trigger_retraining(self.accumulated(), self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solarwatch_status::assess_prediction;

    fn record(id: Option<&str>, confidence: f64) -> PredictionRecord {
        PredictionRecord {
            id: id.map(|i| PredictionId::new(i).unwrap()),
            predicted_class: None,
            confidence: Some(confidence),
            status: None,
            timestamp: None,
            image_url: None,
            processing_time_ms: None,
        }
    }

    #[test]
    fn counts_each_suspicious_prediction_once() {
        let ledger = SuspiciousLedger::with_threshold(2);
        for r in [
            record(Some("a"), 0.4),
            record(Some("a"), 0.4),
            record(Some("b"), 0.9),
            record(None, 0.1),
        ] {
            ledger.record(&r, &assess_prediction(&r));
        }
        assert_eq!(ledger.accumulated(), 1);
        assert!(!ledger.retraining_recommended());

        let c = record(Some("c"), 30.0);
        assert_eq!(ledger.record(&c, &assess_prediction(&c)), 2);
        assert!(ledger.retraining_recommended());
    }

    #[test]
    fn default_threshold_is_the_policy_constant() {
        assert_eq!(SuspiciousLedger::default().threshold(), RETRAINING_THRESHOLD);
    }
}
