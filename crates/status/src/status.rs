//! Closed vocabularies shared by the classifier and the validation gate.
//!
//! Backend payloads carry these values as loosely-cased strings. Each type here
//! parses case-insensitively and keeps an explicit "unrecognized" variant so that
//! nothing downstream has to fall back to substring matching.

use serde::{Deserialize, Serialize};

use crate::locale::Locale;

/// Canonical panel status (closed set).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelStatus {
    Clean,
    Dirty,
    Wait,
    BlockedHumidity,
    BlockedLight,
    BlockedTemperature,
    BlockedWater,
    NeedHumanValidation,
    Unknown,
}

impl PanelStatus {
    pub const ALL: [PanelStatus; 9] = [
        PanelStatus::Clean,
        PanelStatus::Dirty,
        PanelStatus::Wait,
        PanelStatus::BlockedHumidity,
        PanelStatus::BlockedLight,
        PanelStatus::BlockedTemperature,
        PanelStatus::BlockedWater,
        PanelStatus::NeedHumanValidation,
        PanelStatus::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PanelStatus::Clean => "clean",
            PanelStatus::Dirty => "dirty",
            PanelStatus::Wait => "wait",
            PanelStatus::BlockedHumidity => "blocked_humidity",
            PanelStatus::BlockedLight => "blocked_light",
            PanelStatus::BlockedTemperature => "blocked_temperature",
            PanelStatus::BlockedWater => "blocked_water",
            PanelStatus::NeedHumanValidation => "need_human_validation",
            PanelStatus::Unknown => "unknown",
        }
    }

    /// Case-insensitive parse; `None` for anything outside the closed set.
    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(needle))
    }

    pub fn is_blocked(self) -> bool {
        matches!(
            self,
            PanelStatus::BlockedHumidity
                | PanelStatus::BlockedLight
                | PanelStatus::BlockedTemperature
                | PanelStatus::BlockedWater
        )
    }

    /// `Some` only for `clean`/`dirty`.
    pub fn implied_cleanliness(self) -> Option<Cleanliness> {
        match self {
            PanelStatus::Clean => Some(Cleanliness::Clean),
            PanelStatus::Dirty => Some(Cleanliness::Dirty),
            _ => None,
        }
    }

    pub fn describe(self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => match self {
                PanelStatus::Clean => "panel clean, no cleaning needed",
                PanelStatus::Dirty => "panel dirty, cleaning recommended",
                PanelStatus::Wait => "waiting for better conditions",
                PanelStatus::BlockedHumidity => "humidity too high, measurement impossible",
                PanelStatus::BlockedLight => "insufficient light, measurement impossible",
                PanelStatus::BlockedTemperature => "unsuitable temperature, measurement impossible",
                PanelStatus::BlockedWater => "tank empty, cleaning impossible",
                PanelStatus::NeedHumanValidation => "AI vision uncertain, human validation requested",
                PanelStatus::Unknown => "status not determined",
            },
            Locale::Fr => match self {
                PanelStatus::Clean => "Panneau propre, aucun nettoyage nécessaire",
                PanelStatus::Dirty => "Panneau sale, nettoyage recommandé",
                PanelStatus::Wait => "En attente de meilleures conditions",
                PanelStatus::BlockedHumidity => "Humidité trop élevée, mesure impossible",
                PanelStatus::BlockedLight => "Luminosité insuffisante, mesure impossible",
                PanelStatus::BlockedTemperature => "Température inadéquate, mesure impossible",
                PanelStatus::BlockedWater => "Réservoir vide, impossible de nettoyer",
                PanelStatus::NeedHumanValidation => {
                    "Vision IA incertaine, validation humaine demandée"
                }
                PanelStatus::Unknown => "Statut non déterminé",
            },
        }
    }
}

impl core::fmt::Display for PanelStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary cleanliness implied by a status or a vision label.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cleanliness {
    Clean,
    Dirty,
}

impl Cleanliness {
    pub fn status(self) -> PanelStatus {
        match self {
            Cleanliness::Clean => PanelStatus::Clean,
            Cleanliness::Dirty => PanelStatus::Dirty,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Cleanliness::Clean => Cleanliness::Dirty,
            Cleanliness::Dirty => Cleanliness::Clean,
        }
    }

    pub fn label(self) -> VisionLabel {
        match self {
            Cleanliness::Clean => VisionLabel::Clean,
            Cleanliness::Dirty => VisionLabel::Dirty,
        }
    }
}

/// The backend's `final_state`, as received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReportedState {
    Known(PanelStatus),
    Unrecognized(String),
}

impl ReportedState {
    pub fn known(&self) -> Option<PanelStatus> {
        match self {
            ReportedState::Known(s) => Some(*s),
            ReportedState::Unrecognized(_) => None,
        }
    }
}

impl From<&str> for ReportedState {
    fn from(raw: &str) -> Self {
        match PanelStatus::parse(raw) {
            Some(s) => ReportedState::Known(s),
            None => ReportedState::Unrecognized(raw.trim().to_string()),
        }
    }
}

impl From<String> for ReportedState {
    fn from(raw: String) -> Self {
        ReportedState::from(raw.as_str())
    }
}

impl From<PanelStatus> for ReportedState {
    fn from(status: PanelStatus) -> Self {
        ReportedState::Known(status)
    }
}

impl From<ReportedState> for String {
    fn from(value: ReportedState) -> Self {
        match value {
            ReportedState::Known(s) => s.as_str().to_string(),
            ReportedState::Unrecognized(raw) => raw,
        }
    }
}

/// Condition that prevented an automatic cleaning action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockReason {
    Humidity,
    Light,
    Temperature,
    Water,
    Other(String),
}

impl BlockReason {
    pub fn as_str(&self) -> &str {
        match self {
            BlockReason::Humidity => "humidity",
            BlockReason::Light => "light",
            BlockReason::Temperature => "temperature",
            BlockReason::Water => "water",
            BlockReason::Other(raw) => raw,
        }
    }

    /// Matching `blocked_<reason>` status, `None` for unrecognized reasons.
    pub fn status(&self) -> Option<PanelStatus> {
        match self {
            BlockReason::Humidity => Some(PanelStatus::BlockedHumidity),
            BlockReason::Light => Some(PanelStatus::BlockedLight),
            BlockReason::Temperature => Some(PanelStatus::BlockedTemperature),
            BlockReason::Water => Some(PanelStatus::BlockedWater),
            BlockReason::Other(_) => None,
        }
    }

    fn parse(suffix: &str) -> Self {
        match suffix.to_ascii_lowercase().as_str() {
            "humidity" => BlockReason::Humidity,
            "light" => BlockReason::Light,
            "temperature" => BlockReason::Temperature,
            "water" => BlockReason::Water,
            _ => BlockReason::Other(suffix.to_string()),
        }
    }
}

/// Last command dispatched to the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    StartClean,
    Wait,
    /// `stop` or `idle`.
    Stop,
    Blocked(BlockReason),
    Unrecognized(String),
}

impl Action {
    pub fn as_string(&self) -> String {
        match self {
            Action::StartClean => "start_clean".to_string(),
            Action::Wait => "wait".to_string(),
            Action::Stop => "stop".to_string(),
            Action::Blocked(reason) => format!("blocked_{}", reason.as_str()),
            Action::Unrecognized(raw) => raw.clone(),
        }
    }
}

impl From<&str> for Action {
    fn from(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        match lower.as_str() {
            "start_clean" => Action::StartClean,
            "wait" => Action::Wait,
            "stop" | "idle" => Action::Stop,
            _ => match lower.strip_prefix("blocked_") {
                Some(_) => Action::Blocked(BlockReason::parse(&trimmed["blocked_".len()..])),
                None => Action::Unrecognized(trimmed.to_string()),
            },
        }
    }
}

impl From<String> for Action {
    fn from(raw: String) -> Self {
        Action::from(raw.as_str())
    }
}

impl From<Action> for String {
    fn from(value: Action) -> Self {
        value.as_string()
    }
}

/// Label produced by the external vision model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VisionLabel {
    Clean,
    Dirty,
    Dusty,
    BirdDrop,
    SnowCovered,
    Damaged,
    Other(String),
}

impl VisionLabel {
    pub fn as_str(&self) -> &str {
        match self {
            VisionLabel::Clean => "clean",
            VisionLabel::Dirty => "dirty",
            VisionLabel::Dusty => "dusty",
            VisionLabel::BirdDrop => "bird_drop",
            VisionLabel::SnowCovered => "snow_covered",
            VisionLabel::Damaged => "damaged",
            VisionLabel::Other(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, VisionLabel::Other(_))
    }

    /// Soiling labels imply `dirty`; damage and unrecognized labels imply nothing.
    pub fn implied_cleanliness(&self) -> Option<Cleanliness> {
        match self {
            VisionLabel::Clean => Some(Cleanliness::Clean),
            VisionLabel::Dirty
            | VisionLabel::Dusty
            | VisionLabel::BirdDrop
            | VisionLabel::SnowCovered => Some(Cleanliness::Dirty),
            VisionLabel::Damaged | VisionLabel::Other(_) => None,
        }
    }
}

impl From<&str> for VisionLabel {
    fn from(raw: &str) -> Self {
        let trimmed = raw.trim();
        let key: String = trimmed
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        match key.as_str() {
            "clean" => VisionLabel::Clean,
            "dirty" => VisionLabel::Dirty,
            "dusty" | "dust" => VisionLabel::Dusty,
            "bird_drop" | "bird_drops" | "bird_dropping" => VisionLabel::BirdDrop,
            "snow_covered" | "snow" => VisionLabel::SnowCovered,
            "damaged" | "physical_damage" => VisionLabel::Damaged,
            _ => VisionLabel::Other(trimmed.to_string()),
        }
    }
}

impl From<String> for VisionLabel {
    fn from(raw: String) -> Self {
        VisionLabel::from(raw.as_str())
    }
}

impl From<VisionLabel> for String {
    fn from(value: VisionLabel) -> Self {
        value.as_str().to_string()
    }
}

impl core::fmt::Display for VisionLabel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cleaning-water tank level reported by the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WaterLevel {
    Ok,
    /// `VIDE` or `LOW`.
    Empty,
    Other(String),
}

impl WaterLevel {
    pub fn is_empty(&self) -> bool {
        matches!(self, WaterLevel::Empty)
    }
}

impl From<&str> for WaterLevel {
    fn from(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "OK" => WaterLevel::Ok,
            "VIDE" | "LOW" => WaterLevel::Empty,
            _ => WaterLevel::Other(trimmed.to_string()),
        }
    }
}

impl From<String> for WaterLevel {
    fn from(raw: String) -> Self {
        WaterLevel::from(raw.as_str())
    }
}

impl From<WaterLevel> for String {
    fn from(value: WaterLevel) -> Self {
        match value {
            WaterLevel::Ok => "OK".to_string(),
            WaterLevel::Empty => "VIDE".to_string(),
            WaterLevel::Other(raw) => raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(PanelStatus::parse("Blocked_Water"), Some(PanelStatus::BlockedWater));
        assert_eq!(PanelStatus::parse(" NEED_HUMAN_VALIDATION "), Some(PanelStatus::NeedHumanValidation));
        assert_eq!(PanelStatus::parse("healthy"), None);
    }

    #[test]
    fn every_status_round_trips_through_as_str() {
        for s in PanelStatus::ALL {
            assert_eq!(PanelStatus::parse(s.as_str()), Some(s));
        }
    }

    #[test]
    fn actions_are_tagged() {
        assert_eq!(Action::from("START_CLEAN"), Action::StartClean);
        assert_eq!(Action::from("idle"), Action::Stop);
        assert_eq!(Action::from("blocked_water"), Action::Blocked(BlockReason::Water));
        assert_eq!(
            Action::from("blocked_wind"),
            Action::Blocked(BlockReason::Other("wind".to_string()))
        );
        assert_eq!(Action::from("reboot"), Action::Unrecognized("reboot".to_string()));
        // Only the prefixed form counts as a block.
        assert_eq!(Action::from("blocked"), Action::Unrecognized("blocked".to_string()));
    }

    #[test]
    fn vision_labels_accept_backend_spellings() {
        assert_eq!(VisionLabel::from("Dirty"), VisionLabel::Dirty);
        assert_eq!(VisionLabel::from("Bird-drop"), VisionLabel::BirdDrop);
        assert_eq!(VisionLabel::from("Snow-Covered"), VisionLabel::SnowCovered);
        assert_eq!(VisionLabel::from("Physical Damage"), VisionLabel::Damaged);
        assert_eq!(VisionLabel::from("Electrical-damage"), VisionLabel::Other("Electrical-damage".to_string()));
        assert_eq!(VisionLabel::Dusty.implied_cleanliness(), Some(Cleanliness::Dirty));
        assert_eq!(VisionLabel::Damaged.implied_cleanliness(), None);
    }

    #[test]
    fn water_level_variants() {
        assert!(WaterLevel::from("vide").is_empty());
        assert!(WaterLevel::from("LOW").is_empty());
        assert_eq!(WaterLevel::from("ok"), WaterLevel::Ok);
        assert_eq!(WaterLevel::from("HALF"), WaterLevel::Other("HALF".to_string()));
    }

    #[test]
    fn unrecognized_text_survives_serde() {
        let a: Action = serde_json::from_str("\"self_test\"").unwrap();
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"self_test\"");
        let r: ReportedState = serde_json::from_str("\"healthy\"").unwrap();
        assert_eq!(r, ReportedState::Unrecognized("healthy".to_string()));
        assert_eq!(serde_json::to_string(&PanelStatus::BlockedLight).unwrap(), "\"blocked_light\"");
    }
}
