//! Domain error model.

use thiserror::Error;

/// Domain-level error.
///
/// Deterministic input failures only; transport concerns belong to the
/// backend crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was empty or whitespace only.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
