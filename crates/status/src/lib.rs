//! `solarwatch-status`
//!
//! **Responsibility:** turn a panel snapshot into one canonical status and
//! decide whether a human has to confirm it.
//!
//! This crate is the single place where panel status policy lives:
//! - It performs no IO and holds no shared state; every call is a pure function.
//! - It never fails on partial data; malformed fields degrade to `unknown`/`None`
//!   and are reported as data-quality warnings.
//! - Sending feedback or commands upstream is the caller's job; the validation
//!   gate only computes what to send.

pub mod advisory;
pub mod classifier;
pub mod confidence;
pub mod locale;
pub mod notification;
pub mod prediction;
pub mod quality;
pub mod snapshot;
pub mod status;
pub mod validation;

pub use advisory::{SensorAdvisory, sensor_advisories};
pub use classifier::{ClassificationResult, DecisionRule, StatusClassifier, classify};
pub use confidence::{
    Confidence, ConfidenceBand, HUMAN_VALIDATION_THRESHOLD, normalize_confidence,
};
pub use locale::Locale;
pub use notification::{Notification, NotificationKind, Severity, notifications};
pub use prediction::{
    PredictionAssessment, PredictionRecord, RETRAINING_THRESHOLD, assess_prediction,
    should_trigger_retraining, sort_newest_first,
};
pub use quality::DataQualityWarning;
pub use snapshot::PanelSnapshot;
pub use status::{Action, BlockReason, Cleanliness, PanelStatus, ReportedState, VisionLabel, WaterLevel};
pub use validation::{
    FeedbackRecord, NextAction, PreconditionError, ValidationDecision, ValidationGate,
    ValidationOutcome,
};
