//! Status classifier: one snapshot in, one canonical status out.
//!
//! Precedence (first match wins):
//! 1. a recognized `final_state` from the backend is authoritative;
//! 2. `blocked_<reason>` actions map to the matching blocked status;
//! 3. `start_clean` takes the vision label as clean/dirty, defaulting to dirty;
//! 4. `wait` maps to `wait`;
//! 5. otherwise the vision label decides, or `unknown` without one.
//!
//! Human validation is required when the status is `need_human_validation` or
//! the normalised confidence is below [`HUMAN_VALIDATION_THRESHOLD`].
//!
//! [`HUMAN_VALIDATION_THRESHOLD`]: crate::confidence::HUMAN_VALIDATION_THRESHOLD

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use solarwatch_core::{PanelId, ValueObject};

use crate::advisory::{SensorAdvisory, sensor_advisories};
use crate::confidence::{Confidence, normalize_confidence};
use crate::locale::Locale;
use crate::quality::DataQualityWarning;
use crate::snapshot::PanelSnapshot;
use crate::status::{Action, Cleanliness, PanelStatus, ReportedState, VisionLabel};

/// Which precedence rule produced the status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    FinalState,
    BlockedAction,
    CleaningAction,
    WaitAction,
    VisionFallback,
}

/// Derived, ephemeral view of a snapshot. Never cached or stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    /// Panel the source snapshot belongs to.
    pub panel_id: PanelId,
    pub canonical_status: PanelStatus,
    pub requires_human_validation: bool,
    pub confidence_normalized: Option<Confidence>,
    /// Localised; presentation only.
    pub display_reason: String,
    pub rule: DecisionRule,
    /// Vision label the classification saw, if any.
    pub predicted_class: Option<VisionLabel>,
    /// Timestamp of the source snapshot.
    pub observed_at: Option<DateTime<Utc>>,
    pub advisories: Vec<SensorAdvisory>,
    pub warnings: Vec<DataQualityWarning>,
}

impl ValueObject for ClassificationResult {}

/// Reason text selected alongside the status.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Reason {
    Status(PanelStatus),
    GenericBlock,
    DamageReported,
}

impl Reason {
    fn text(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Reason::Status(s), _) => s.describe(locale),
            (Reason::GenericBlock, Locale::En) => "blocking condition detected",
            (Reason::GenericBlock, Locale::Fr) => "Condition bloquante détectée",
            (Reason::DamageReported, Locale::En) => {
                "physical damage reported, manual inspection required"
            }
            (Reason::DamageReported, Locale::Fr) => {
                "Dommage physique signalé, inspection manuelle requise"
            }
        }
    }
}

struct Decision {
    status: PanelStatus,
    rule: DecisionRule,
    reason: Reason,
}

impl Decision {
    fn new(status: PanelStatus, rule: DecisionRule) -> Self {
        Self {
            status,
            rule,
            reason: Reason::Status(status),
        }
    }
}

/// Stateless classifier; the locale only affects display text.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct StatusClassifier {
    locale: Locale,
}

impl StatusClassifier {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn classify(&self, snapshot: &PanelSnapshot) -> ClassificationResult {
        let mut warnings = Vec::new();

        let decision = decide(snapshot, &mut warnings);

        let confidence_normalized = snapshot.confidence.and_then(|raw| {
            let normalized = normalize_confidence(raw);
            if normalized.is_none() {
                warnings.push(DataQualityWarning::ConfidenceOutOfRange { raw });
            }
            normalized
        });

        for (sensor, value) in [
            ("humidity", snapshot.humidity),
            ("light", snapshot.light),
            ("temperature", snapshot.temperature),
        ] {
            if value.is_some_and(|v| !v.is_finite()) {
                warnings.push(DataQualityWarning::NonFiniteSensor { sensor });
            }
        }

        let advisories = sensor_advisories(snapshot);

        let requires_human_validation = decision.status == PanelStatus::NeedHumanValidation
            || confidence_normalized.is_some_and(Confidence::is_below_validation_threshold);

        for w in &warnings {
            warn!(panel_id = %snapshot.panel_id, warning = %w, "data quality warning");
        }

        let display_reason = self.display_reason(&decision, &advisories, &warnings);

        ClassificationResult {
            panel_id: snapshot.panel_id.clone(),
            canonical_status: decision.status,
            requires_human_validation,
            confidence_normalized,
            display_reason,
            rule: decision.rule,
            predicted_class: snapshot.vision_result.clone(),
            observed_at: snapshot.timestamp,
            advisories,
            warnings,
        }
    }

    fn display_reason(
        &self,
        decision: &Decision,
        advisories: &[SensorAdvisory],
        warnings: &[DataQualityWarning],
    ) -> String {
        let mut reason = decision.reason.text(self.locale).to_string();

        // Diagnostics only explain a degraded result.
        if decision.status == PanelStatus::Unknown {
            if let Some(first) = warnings.first() {
                reason.push_str(&format!(" ({first})"));
            }
        }

        for advisory in advisories {
            reason.push_str("; ");
            reason.push_str(advisory.message(self.locale));
        }
        reason
    }
}

/// Classify with the default (English) locale.
pub fn classify(snapshot: &PanelSnapshot) -> ClassificationResult {
    StatusClassifier::default().classify(snapshot)
}

fn decide(snapshot: &PanelSnapshot, warnings: &mut Vec<DataQualityWarning>) -> Decision {
    // Rule 1: the backend's decision is authoritative.
    match &snapshot.final_state {
        Some(ReportedState::Known(status)) => {
            return Decision::new(*status, DecisionRule::FinalState);
        }
        Some(ReportedState::Unrecognized(value)) => {
            warnings.push(DataQualityWarning::UnrecognizedFinalState {
                value: value.clone(),
            });
        }
        None => {}
    }

    match &snapshot.action {
        // Rule 2.
        Some(Action::Blocked(reason)) => {
            return match reason.status() {
                Some(status) => Decision::new(status, DecisionRule::BlockedAction),
                None => Decision {
                    status: PanelStatus::Wait,
                    rule: DecisionRule::BlockedAction,
                    reason: Reason::GenericBlock,
                },
            };
        }
        // Rule 3: a cleaning run only starts on soiled panels, so anything but
        // an explicit clean label reads as dirty.
        Some(Action::StartClean) => {
            let status = match &snapshot.vision_result {
                Some(VisionLabel::Clean) => PanelStatus::Clean,
                Some(label) => {
                    note_unrecognized_label(label, warnings);
                    PanelStatus::Dirty
                }
                None => PanelStatus::Dirty,
            };
            return Decision::new(status, DecisionRule::CleaningAction);
        }
        // Rule 4.
        Some(Action::Wait) => return Decision::new(PanelStatus::Wait, DecisionRule::WaitAction),
        Some(Action::Unrecognized(value)) => {
            warnings.push(DataQualityWarning::UnrecognizedAction {
                value: value.clone(),
            });
        }
        Some(Action::Stop) | None => {}
    }

    // Rule 5.
    match &snapshot.vision_result {
        Some(label) => match label.implied_cleanliness() {
            Some(Cleanliness::Clean) => Decision::new(PanelStatus::Clean, DecisionRule::VisionFallback),
            Some(Cleanliness::Dirty) => Decision::new(PanelStatus::Dirty, DecisionRule::VisionFallback),
            None if *label == VisionLabel::Damaged => Decision {
                status: PanelStatus::Unknown,
                rule: DecisionRule::VisionFallback,
                reason: Reason::DamageReported,
            },
            None => {
                note_unrecognized_label(label, warnings);
                Decision::new(PanelStatus::Unknown, DecisionRule::VisionFallback)
            }
        },
        None => Decision::new(PanelStatus::Unknown, DecisionRule::VisionFallback),
    }
}

fn note_unrecognized_label(label: &VisionLabel, warnings: &mut Vec<DataQualityWarning>) {
    if let VisionLabel::Other(value) = label {
        warnings.push(DataQualityWarning::UnrecognizedVisionLabel {
            value: value.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::SensorAdvisory;
    use proptest::prelude::*;

    fn panel() -> PanelSnapshot {
        PanelSnapshot::new(PanelId::new("P-1").unwrap())
    }

    #[test]
    fn start_clean_with_dirty_label_and_high_confidence() {
        let s = panel()
            .with_action("start_clean")
            .with_vision_result("Dirty")
            .with_confidence(92.0);
        let r = classify(&s);
        assert_eq!(r.canonical_status, PanelStatus::Dirty);
        assert_eq!(r.confidence_normalized.map(Confidence::value), Some(0.92));
        assert!(!r.requires_human_validation);
        assert_eq!(r.rule, DecisionRule::CleaningAction);
    }

    #[test]
    fn explicit_validation_state_requires_human() {
        let s = panel()
            .with_final_state("need_human_validation")
            .with_vision_result("Dirty")
            .with_confidence(65.0);
        let r = classify(&s);
        assert_eq!(r.canonical_status, PanelStatus::NeedHumanValidation);
        assert!(r.requires_human_validation);
        assert_eq!(r.confidence_normalized.map(Confidence::value), Some(0.65));
    }

    #[test]
    fn blocked_humidity_with_humid_air_carries_advisory() {
        let s = panel().with_action("blocked_humidity").with_humidity(86.0);
        let r = classify(&s);
        assert_eq!(r.canonical_status, PanelStatus::BlockedHumidity);
        assert_eq!(r.advisories, vec![SensorAdvisory::HighHumidity]);
        assert!(r.display_reason.contains("high humidity"));
        assert!(!r.requires_human_validation);
    }

    #[test]
    fn blocked_water_beats_clean_vision() {
        let s = panel().with_action("blocked_water").with_vision_result("clean");
        assert_eq!(classify(&s).canonical_status, PanelStatus::BlockedWater);
    }

    #[test]
    fn unknown_block_reason_is_a_generic_block() {
        let s = panel().with_action("blocked_wind");
        let r = classify(&s);
        assert_eq!(r.canonical_status, PanelStatus::Wait);
        assert_eq!(r.rule, DecisionRule::BlockedAction);
        assert_eq!(r.display_reason, "blocking condition detected");
    }

    #[test]
    fn start_clean_without_label_is_dirty() {
        let r = classify(&panel().with_action("start_clean"));
        assert_eq!(r.canonical_status, PanelStatus::Dirty);
    }

    #[test]
    fn wait_action() {
        let r = classify(&panel().with_action("WAIT").with_vision_result("dirty"));
        assert_eq!(r.canonical_status, PanelStatus::Wait);
    }

    #[test]
    fn stop_falls_back_to_vision() {
        let r = classify(&panel().with_action("idle").with_vision_result("Dusty"));
        assert_eq!(r.canonical_status, PanelStatus::Dirty);
        assert_eq!(r.rule, DecisionRule::VisionFallback);
    }

    #[test]
    fn empty_snapshot_degrades_to_unknown() {
        let r = classify(&panel());
        assert_eq!(r.canonical_status, PanelStatus::Unknown);
        assert!(!r.requires_human_validation);
        assert_eq!(r.confidence_normalized, None);
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn malformed_fields_degrade_with_diagnostics() {
        let s = panel()
            .with_final_state("healthy")
            .with_vision_result("glare")
            .with_confidence(250.0)
            .with_temperature(f64::NAN);
        let r = classify(&s);
        assert_eq!(r.canonical_status, PanelStatus::Unknown);
        assert!(!r.requires_human_validation);
        assert_eq!(r.confidence_normalized, None);
        assert_eq!(
            r.warnings,
            vec![
                DataQualityWarning::UnrecognizedFinalState { value: "healthy".to_string() },
                DataQualityWarning::UnrecognizedVisionLabel { value: "glare".to_string() },
                DataQualityWarning::ConfidenceOutOfRange { raw: 250.0 },
                DataQualityWarning::NonFiniteSensor { sensor: "temperature" },
            ]
        );
        assert!(r.display_reason.starts_with("status not determined (unrecognized final_state"));
    }

    #[test]
    fn damaged_label_is_unknown_with_inspection_reason() {
        let r = classify(&panel().with_vision_result("damaged"));
        assert_eq!(r.canonical_status, PanelStatus::Unknown);
        assert!(r.display_reason.contains("manual inspection"));
    }

    #[test]
    fn low_confidence_requires_human_even_when_clean() {
        let r = classify(&panel().with_vision_result("clean").with_confidence(0.4));
        assert_eq!(r.canonical_status, PanelStatus::Clean);
        assert!(r.requires_human_validation);
    }

    #[test]
    fn french_reasons() {
        let r = StatusClassifier::new(Locale::Fr)
            .classify(&panel().with_final_state("blocked_water").with_water_level("VIDE"));
        assert_eq!(
            r.display_reason,
            "Réservoir vide, impossible de nettoyer; nettoyage impossible, réservoir vide"
        );
    }

    fn any_action() -> impl Strategy<Value = Option<Action>> {
        prop_oneof![
            Just(None),
            Just(Some(Action::StartClean)),
            Just(Some(Action::Wait)),
            Just(Some(Action::Stop)),
            "(humidity|light|temperature|water|wind)".prop_map(|r| Some(Action::from(format!("blocked_{r}")))),
            "[a-z]{1,8}".prop_map(|a| Some(Action::from(a))),
        ]
    }

    fn any_label() -> impl Strategy<Value = Option<VisionLabel>> {
        prop_oneof![
            Just(None),
            "(Clean|Dirty|Dusty|Bird-drop|Snow-Covered|damaged|glare)".prop_map(|l| Some(VisionLabel::from(l))),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: a recognized final_state always wins.
        #[test]
        fn final_state_is_authoritative(
            idx in 0usize..PanelStatus::ALL.len(),
            action in any_action(),
            label in any_label(),
            confidence in proptest::option::of(0.0f64..=100.0f64),
        ) {
            let status = PanelStatus::ALL[idx];
            let mut s = panel().with_final_state(status.as_str().to_uppercase());
            s.action = action;
            s.vision_result = label;
            s.confidence = confidence;
            let r = classify(&s);
            prop_assert_eq!(r.canonical_status, status);
            prop_assert_eq!(r.rule, DecisionRule::FinalState);
        }

        /// Property: blocked_water always yields blocked_water without a final_state.
        #[test]
        fn blocked_water_wins_over_vision(label in any_label()) {
            let mut s = panel().with_action("blocked_water");
            s.vision_result = label;
            prop_assert_eq!(classify(&s).canonical_status, PanelStatus::BlockedWater);
        }

        /// Property: low confidence always requests human validation.
        #[test]
        fn low_confidence_requires_validation(
            action in any_action(),
            label in any_label(),
            confidence in 0.0f64..0.65f64,
        ) {
            let mut s = panel().with_confidence(confidence);
            s.action = action;
            s.vision_result = label;
            prop_assert!(classify(&s).requires_human_validation);
        }

        /// Property: classification is deterministic.
        #[test]
        fn classify_is_deterministic(
            action in any_action(),
            label in any_label(),
            confidence in proptest::option::of(-10.0f64..=150.0f64),
            humidity in proptest::option::of(0.0f64..=100.0f64),
        ) {
            let mut s = panel();
            s.action = action;
            s.vision_result = label;
            s.confidence = confidence;
            s.humidity = humidity;
            prop_assert_eq!(classify(&s), classify(&s));
        }
    }
}
