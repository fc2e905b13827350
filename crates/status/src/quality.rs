//! Data-quality warnings raised while classifying a snapshot.
//!
//! These are never fatal: the classifier records them, logs them, and keeps
//! going with the field treated as absent.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    #[error("unrecognized final_state {value:?}")]
    UnrecognizedFinalState { value: String },

    #[error("unrecognized action {value:?}")]
    UnrecognizedAction { value: String },

    #[error("unrecognized vision label {value:?}")]
    UnrecognizedVisionLabel { value: String },

    #[error("confidence {raw} outside [0, 1] after normalisation")]
    ConfidenceOutOfRange { raw: f64 },

    #[error("non-finite {sensor} reading ignored")]
    NonFiniteSensor { sensor: &'static str },
}
