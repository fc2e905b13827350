//! Operator notifications derived from a snapshot and its classification.

use serde::Serialize;

use crate::advisory::SensorAdvisory;
use crate::classifier::ClassificationResult;
use crate::locale::Locale;
use crate::snapshot::PanelSnapshot;
use crate::status::{Action, PanelStatus};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    WaterEmpty,
    HighHumidity,
    LowLight,
    ExtremeTemp,
    HumanValidation,
    CleaningDone,
    ReadyToClean,
    SystemBlocked,
    AllGood,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub severity: Severity,
    pub title: &'static str,
    pub message: &'static str,
}

impl NotificationKind {
    pub fn severity(self) -> Severity {
        match self {
            NotificationKind::WaterEmpty
            | NotificationKind::ExtremeTemp
            | NotificationKind::SystemBlocked => Severity::Critical,
            NotificationKind::HighHumidity | NotificationKind::LowLight => Severity::Warning,
            NotificationKind::HumanValidation | NotificationKind::ReadyToClean => Severity::Info,
            NotificationKind::CleaningDone | NotificationKind::AllGood => Severity::Success,
        }
    }

    fn text(self, locale: Locale) -> (&'static str, &'static str) {
        use NotificationKind::*;
        match locale {
            Locale::En => match self {
                WaterEmpty => ("Tank empty!", "Cleaning impossible."),
                HighHumidity => ("Humidity too high", "Measurement impossible in humid conditions."),
                LowLight => ("Insufficient light", "Suboptimal analysis conditions."),
                ExtremeTemp => ("Extreme temperature", "Operating conditions at their limits."),
                HumanValidation => ("Uncertain AI validation", "Human confirmation required."),
                CleaningDone => ("Cleaning complete", "Operation completed successfully."),
                ReadyToClean => ("Ready to clean", "Dirty panel detected, cleaning in progress."),
                SystemBlocked => ("System blocked", "Resolve the blocking conditions."),
                AllGood => ("System operational", "All conditions are optimal."),
            },
            Locale::Fr => match self {
                WaterEmpty => ("Réservoir vide !", "Nettoyage impossible."),
                HighHumidity => ("Humidité trop élevée", "Mesure impossible en conditions humides."),
                LowLight => ("Luminosité insuffisante", "Conditions d'analyse suboptimales."),
                ExtremeTemp => ("Température extrême", "Conditions de fonctionnement limites."),
                HumanValidation => ("Validation IA incertaine", "Confirmation humaine requise."),
                CleaningDone => ("Nettoyage terminé", "Opération réalisée avec succès."),
                ReadyToClean => ("Prêt pour nettoyage", "Panneau sale détecté, nettoyage en cours."),
                SystemBlocked => ("Système bloqué", "Résoudre les conditions bloquantes."),
                AllGood => ("Système opérationnel", "Toutes les conditions sont optimales."),
            },
        }
    }

    pub fn notification(self, locale: Locale) -> Notification {
        let (title, message) = self.text(locale);
        Notification {
            kind: self,
            severity: self.severity(),
            title,
            message,
        }
    }
}

/// Notifications in display order; `all_good` only when nothing else applies.
pub fn notifications(
    snapshot: &PanelSnapshot,
    result: &ClassificationResult,
    locale: Locale,
) -> Vec<Notification> {
    let mut kinds = Vec::new();

    for advisory in &result.advisories {
        kinds.push(match advisory {
            SensorAdvisory::EmptyTank => NotificationKind::WaterEmpty,
            SensorAdvisory::HighHumidity => NotificationKind::HighHumidity,
            SensorAdvisory::LowLight => NotificationKind::LowLight,
            SensorAdvisory::ExtremeTemperature => NotificationKind::ExtremeTemp,
        });
    }
    // Tank first, then the weather readings.
    kinds.sort_by_key(|k| *k != NotificationKind::WaterEmpty);

    if result.requires_human_validation {
        kinds.push(NotificationKind::HumanValidation);
    }
    if snapshot.cleaning_completed() {
        kinds.push(NotificationKind::CleaningDone);
    }
    if result.canonical_status == PanelStatus::Dirty && snapshot.action == Some(Action::StartClean) {
        kinds.push(NotificationKind::ReadyToClean);
    }
    if result.canonical_status.is_blocked() {
        kinds.push(NotificationKind::SystemBlocked);
    }
    if kinds.is_empty() {
        kinds.push(NotificationKind::AllGood);
    }

    kinds.into_iter().map(|k| k.notification(locale)).collect()
}
