//! Validation Gate: turns an operator's confirm/correct decision into the
//! feedback record and follow-up action to relay upstream.
//!
//! Pure and stateless; "already submitted" tracking belongs to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use solarwatch_core::{PanelId, PredictionId, ValueObject};

use crate::classifier::ClassificationResult;
use crate::status::{Cleanliness, PanelStatus, VisionLabel};

/// Operator input for one pending validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationDecision {
    pub panel_id: PanelId,
    #[serde(default)]
    pub prediction_id: Option<PredictionId>,
    pub is_correct: bool,
    #[serde(default)]
    pub corrected_class: Option<VisionLabel>,
}

impl ValidationDecision {
    pub fn confirm(panel_id: PanelId) -> Self {
        Self {
            panel_id,
            prediction_id: None,
            is_correct: true,
            corrected_class: None,
        }
    }

    pub fn reject(panel_id: PanelId) -> Self {
        Self {
            is_correct: false,
            ..Self::confirm(panel_id)
        }
    }

    pub fn with_prediction_id(mut self, id: PredictionId) -> Self {
        self.prediction_id = Some(id);
        self
    }

    pub fn with_corrected_class(mut self, label: impl Into<VisionLabel>) -> Self {
        self.corrected_class = Some(label.into());
        self
    }
}

/// Command to relay to the device layer once a validation resolves.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    StartClean,
    Wait,
}

impl NextAction {
    pub fn as_str(self) -> &'static str {
        match self {
            NextAction::StartClean => "start_clean",
            NextAction::Wait => "wait",
        }
    }
}

/// Body of the backend's feedback endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub panel_id: PanelId,
    pub prediction_id: Option<PredictionId>,
    pub is_correct: bool,
    pub predicted_class: Option<VisionLabel>,
    pub corrected_class: Option<VisionLabel>,
    pub confidence_normalized: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationOutcome {
    pub resolved_status: PanelStatus,
    pub next_action: NextAction,
    pub feedback: FeedbackRecord,
}

impl ValueObject for ValidationOutcome {}

/// Caller errors; rejected and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("no validation pending")]
    NoValidationPending,

    #[error("decision for panel {decision} does not match classification of panel {classified}")]
    PanelMismatch {
        decision: PanelId,
        classified: PanelId,
    },

    #[error("corrected_class is required: no prior clean/dirty label to infer from")]
    CorrectionRequired,

    #[error("nothing to confirm: the prediction implies neither clean nor dirty")]
    NothingToConfirm,

    #[error("corrected_class repeats the rejected prediction")]
    CorrectionMatchesPrediction,
}

impl PreconditionError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            PreconditionError::NoValidationPending => "no_validation_pending",
            PreconditionError::PanelMismatch { .. } => "panel_mismatch",
            PreconditionError::CorrectionRequired => "correction_required",
            PreconditionError::NothingToConfirm => "nothing_to_confirm",
            PreconditionError::CorrectionMatchesPrediction => "correction_matches_prediction",
        }
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct ValidationGate;

impl ValidationGate {
    pub fn evaluate(
        decision: &ValidationDecision,
        prior: &ClassificationResult,
    ) -> Result<ValidationOutcome, PreconditionError> {
        if !prior.requires_human_validation {
            return Err(PreconditionError::NoValidationPending);
        }
        if decision.panel_id != prior.panel_id {
            return Err(PreconditionError::PanelMismatch {
                decision: decision.panel_id.clone(),
                classified: prior.panel_id.clone(),
            });
        }

        // Feedback describes the recorded label, so inference starts from it;
        // the status only stands in when no label was seen.
        let implied = match &prior.predicted_class {
            Some(label) => label.implied_cleanliness(),
            None => prior.canonical_status.implied_cleanliness(),
        };

        let (resolved_status, corrected_class) = if decision.is_correct {
            let cleanliness = implied.ok_or(PreconditionError::NothingToConfirm)?;
            let label = prior
                .predicted_class
                .clone()
                .unwrap_or_else(|| cleanliness.label());
            (cleanliness.status(), label)
        } else {
            let corrected = match (&decision.corrected_class, implied) {
                (Some(label), _) => label.clone(),
                (None, Some(cleanliness)) => cleanliness.opposite().label(),
                (None, None) => return Err(PreconditionError::CorrectionRequired),
            };
            if prior.predicted_class.as_ref() == Some(&corrected) {
                return Err(PreconditionError::CorrectionMatchesPrediction);
            }
            let status = corrected
                .implied_cleanliness()
                .map_or(PanelStatus::Unknown, Cleanliness::status);
            (status, corrected)
        };

        let next_action = if resolved_status == PanelStatus::Dirty {
            NextAction::StartClean
        } else {
            NextAction::Wait
        };

        Ok(ValidationOutcome {
            resolved_status,
            next_action,
            feedback: FeedbackRecord {
                panel_id: prior.panel_id.clone(),
                prediction_id: decision.prediction_id.clone(),
                is_correct: decision.is_correct,
                predicted_class: prior.predicted_class.clone(),
                corrected_class: Some(corrected_class),
                confidence_normalized: prior.confidence_normalized.map(|c| c.value()),
                timestamp: prior.observed_at,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::snapshot::PanelSnapshot;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn id() -> PanelId {
        PanelId::new("P-7").unwrap()
    }

    fn uncertain() -> ClassificationResult {
        classify(
            &PanelSnapshot::new(id())
                .with_final_state("need_human_validation")
                .with_vision_result("Dusty")
                .with_confidence(58.0)
                .with_timestamp(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()),
        )
    }

    #[test]
    fn correction_to_dirty_starts_cleaning() {
        let decision = ValidationDecision::reject(id()).with_corrected_class("Dirty");
        let out = ValidationGate::evaluate(&decision, &uncertain()).unwrap();
        assert_eq!(out.resolved_status, PanelStatus::Dirty);
        assert_eq!(out.next_action, NextAction::StartClean);
        assert_eq!(out.feedback.corrected_class, Some(VisionLabel::Dirty));
        assert_eq!(out.feedback.predicted_class, Some(VisionLabel::Dusty));
        assert_eq!(out.feedback.confidence_normalized, Some(0.58));
    }

    #[test]
    fn rejected_when_nothing_pending() {
        let prior = classify(
            &PanelSnapshot::new(id())
                .with_action("start_clean")
                .with_vision_result("dirty")
                .with_confidence(92.0),
        );
        let err = ValidationGate::evaluate(&ValidationDecision::confirm(id()), &prior).unwrap_err();
        assert_eq!(err, PreconditionError::NoValidationPending);
        assert_eq!(err.to_string(), "no validation pending");
    }

    #[test]
    fn confirm_uses_predicted_label() {
        let out = ValidationGate::evaluate(&ValidationDecision::confirm(id()), &uncertain()).unwrap();
        assert_eq!(out.resolved_status, PanelStatus::Dirty);
        assert_eq!(out.next_action, NextAction::StartClean);
        assert_eq!(out.feedback.corrected_class, Some(VisionLabel::Dusty));
        assert!(out.feedback.is_correct);
    }

    #[test]
    fn rejection_without_class_infers_opposite() {
        let out = ValidationGate::evaluate(&ValidationDecision::reject(id()), &uncertain()).unwrap();
        assert_eq!(out.resolved_status, PanelStatus::Clean);
        assert_eq!(out.next_action, NextAction::Wait);
        assert_eq!(out.feedback.corrected_class, Some(VisionLabel::Clean));
    }

    #[test]
    fn rejection_without_anything_to_infer_needs_a_class() {
        let prior = classify(&PanelSnapshot::new(id()).with_final_state("need_human_validation"));
        let err = ValidationGate::evaluate(&ValidationDecision::reject(id()), &prior).unwrap_err();
        assert_eq!(err, PreconditionError::CorrectionRequired);

        let err = ValidationGate::evaluate(&ValidationDecision::confirm(id()), &prior).unwrap_err();
        assert_eq!(err, PreconditionError::NothingToConfirm);
    }

    #[test]
    fn rejection_infers_from_the_recorded_label_not_the_status() {
        let prior = classify(
            &PanelSnapshot::new(id())
                .with_final_state("clean")
                .with_vision_result("dirty")
                .with_confidence(0.5),
        );
        assert!(prior.requires_human_validation);

        let out = ValidationGate::evaluate(&ValidationDecision::reject(id()), &prior).unwrap();
        assert_eq!(out.feedback.predicted_class, Some(VisionLabel::Dirty));
        assert_eq!(out.feedback.corrected_class, Some(VisionLabel::Clean));
        assert_eq!(out.resolved_status, PanelStatus::Clean);
        assert_eq!(out.next_action, NextAction::Wait);

        let confirmed = ValidationGate::evaluate(&ValidationDecision::confirm(id()), &prior).unwrap();
        assert_eq!(confirmed.resolved_status, PanelStatus::Dirty);
    }

    #[test]
    fn correction_repeating_the_prediction_is_rejected() {
        let decision = ValidationDecision::reject(id()).with_corrected_class("dusty");
        let err = ValidationGate::evaluate(&decision, &uncertain()).unwrap_err();
        assert_eq!(err, PreconditionError::CorrectionMatchesPrediction);
        assert_eq!(err.code(), "correction_matches_prediction");
    }

    #[test]
    fn damage_label_needs_an_explicit_correction() {
        let prior = classify(
            &PanelSnapshot::new(id())
                .with_final_state("dirty")
                .with_vision_result("damaged")
                .with_confidence(0.4),
        );
        let err = ValidationGate::evaluate(&ValidationDecision::reject(id()), &prior).unwrap_err();
        assert_eq!(err, PreconditionError::CorrectionRequired);
    }

    #[test]
    fn correction_to_damaged_resolves_unknown_and_waits() {
        let decision = ValidationDecision::reject(id()).with_corrected_class("damaged");
        let out = ValidationGate::evaluate(&decision, &uncertain()).unwrap();
        assert_eq!(out.resolved_status, PanelStatus::Unknown);
        assert_eq!(out.next_action, NextAction::Wait);
    }

    #[test]
    fn panel_mismatch_is_rejected() {
        let decision = ValidationDecision::confirm(PanelId::new("P-8").unwrap());
        let err = ValidationGate::evaluate(&decision, &uncertain()).unwrap_err();
        assert_eq!(err.code(), "panel_mismatch");
    }

    #[test]
    fn decision_deserializes_with_optional_fields() {
        let d: ValidationDecision =
            serde_json::from_str(r#"{"panel_id":"P-7","is_correct":false,"corrected_class":"Bird-drop"}"#)
                .unwrap();
        assert_eq!(d.corrected_class, Some(VisionLabel::BirdDrop));
        assert_eq!(d.prediction_id, None);
    }

    fn any_decision() -> impl Strategy<Value = ValidationDecision> {
        (
            any::<bool>(),
            proptest::option::of("(clean|dirty|dusty|bird_drop|damaged)"),
        )
            .prop_map(|(is_correct, corrected)| ValidationDecision {
                panel_id: id(),
                prediction_id: Some(PredictionId::new("pred-1").unwrap()),
                is_correct,
                corrected_class: corrected.map(VisionLabel::from),
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the gate is idempotent down to the serialized bytes.
        #[test]
        fn evaluate_is_idempotent(decision in any_decision()) {
            let prior = uncertain();
            let first = ValidationGate::evaluate(&decision, &prior);
            let second = ValidationGate::evaluate(&decision, &prior);
            prop_assert_eq!(&first, &second);
            if let (Ok(a), Ok(b)) = (first, second) {
                prop_assert_eq!(serde_json::to_vec(&a).unwrap(), serde_json::to_vec(&b).unwrap());
            }
        }

        /// Property: a rejection never records the rejected label as the correction.
        #[test]
        fn rejection_never_echoes_the_prediction(decision in any_decision()) {
            if let Ok(out) = ValidationGate::evaluate(&decision, &uncertain()) {
                if !out.feedback.is_correct {
                    prop_assert_ne!(&out.feedback.corrected_class, &out.feedback.predicted_class);
                }
            }
        }

        /// Property: start_clean is only ever issued for a dirty resolution.
        #[test]
        fn start_clean_iff_dirty(decision in any_decision()) {
            if let Ok(out) = ValidationGate::evaluate(&decision, &uncertain()) {
                prop_assert_eq!(
                    out.next_action == NextAction::StartClean,
                    out.resolved_status == PanelStatus::Dirty
                );
            }
        }
    }
}
