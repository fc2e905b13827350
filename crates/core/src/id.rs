//! Strongly-typed identifiers used across the domain.
//!
//! Identifiers are owned by the external backend and arrive as opaque strings
//! (`"P-1"`, `"esp32-panel-07"`), so they wrap a trimmed, non-empty `String`
//! rather than a UUID.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a physical panel (stable across snapshots).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PanelId(String);

/// Identifier of a single vision-model prediction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PredictionId(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Build an identifier, rejecting empty or whitespace-only input.
            pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
                let raw = raw.into();
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: empty", $name)));
                }
                if trimmed.len() == raw.len() {
                    Ok(Self(raw))
                } else {
                    Ok(Self(trimmed.to_string()))
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

impl_string_newtype!(PanelId, "PanelId");
impl_string_newtype!(PredictionId, "PredictionId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_id_is_trimmed() {
        let id: PanelId = "  P-1 ".parse().unwrap();
        assert_eq!(id.as_str(), "P-1");
        assert_eq!(id.to_string(), "P-1");
    }

    #[test]
    fn blank_ids_are_rejected() {
        assert!(matches!(PanelId::new("   "), Err(DomainError::InvalidId(_))));
        assert!(matches!(PredictionId::new(""), Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn ids_deserialize_through_validation() {
        let ok: PanelId = serde_json::from_str("\"P-2\"").unwrap();
        assert_eq!(ok.as_str(), "P-2");
        assert!(serde_json::from_str::<PanelId>("\"\"").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"P-2\"");
    }
}
