//! Sensor-driven advisories.
//!
//! Advisories are informational: they enrich the display reason and the
//! notification list but never change the canonical status.

use serde::Serialize;

use crate::locale::Locale;
use crate::snapshot::PanelSnapshot;

/// Humidity above this (%) makes vision measurements unreliable.
pub const HUMIDITY_LIMIT_PCT: f64 = 80.0;
/// Light below this (lux) degrades analysis.
pub const LOW_LIGHT_LUX: f64 = 100.0;
pub const TEMPERATURE_MAX_C: f64 = 35.0;
pub const TEMPERATURE_MIN_C: f64 = 5.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorAdvisory {
    HighHumidity,
    LowLight,
    ExtremeTemperature,
    EmptyTank,
}

impl SensorAdvisory {
    pub fn message(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (SensorAdvisory::HighHumidity, Locale::En) => {
                "measurement may be imprecise due to high humidity"
            }
            (SensorAdvisory::HighHumidity, Locale::Fr) => {
                "mesure possiblement imprécise à cause de l'humidité élevée"
            }
            (SensorAdvisory::LowLight, Locale::En) => "low light, suboptimal analysis conditions",
            (SensorAdvisory::LowLight, Locale::Fr) => {
                "luminosité insuffisante, conditions d'analyse suboptimales"
            }
            (SensorAdvisory::ExtremeTemperature, Locale::En) => "extreme temperature",
            (SensorAdvisory::ExtremeTemperature, Locale::Fr) => "température extrême",
            (SensorAdvisory::EmptyTank, Locale::En) => "cleaning impossible, tank empty",
            (SensorAdvisory::EmptyTank, Locale::Fr) => "nettoyage impossible, réservoir vide",
        }
    }
}

/// Evaluate the sensor thresholds. Non-finite readings are ignored.
pub fn sensor_advisories(snapshot: &PanelSnapshot) -> Vec<SensorAdvisory> {
    let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
    let mut out = Vec::new();

    if finite(snapshot.humidity).is_some_and(|h| h > HUMIDITY_LIMIT_PCT) {
        out.push(SensorAdvisory::HighHumidity);
    }
    if finite(snapshot.light).is_some_and(|l| l < LOW_LIGHT_LUX) {
        out.push(SensorAdvisory::LowLight);
    }
    if finite(snapshot.temperature).is_some_and(|t| t > TEMPERATURE_MAX_C || t < TEMPERATURE_MIN_C) {
        out.push(SensorAdvisory::ExtremeTemperature);
    }
    if snapshot.water_level.as_ref().is_some_and(|w| w.is_empty()) {
        out.push(SensorAdvisory::EmptyTank);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use solarwatch_core::PanelId;

    fn snapshot() -> PanelSnapshot {
        PanelSnapshot::new(PanelId::new("P-1").unwrap())
    }

    #[test]
    fn thresholds_are_strict() {
        let s = snapshot()
            .with_humidity(80.0)
            .with_light(100.0)
            .with_temperature(35.0)
            .with_water_level("OK");
        assert!(sensor_advisories(&s).is_empty());

        let s = snapshot().with_temperature(4.9);
        assert_eq!(sensor_advisories(&s), vec![SensorAdvisory::ExtremeTemperature]);
    }

    #[test]
    fn all_advisories_in_fixed_order() {
        let s = snapshot()
            .with_humidity(91.0)
            .with_light(12.0)
            .with_temperature(41.0)
            .with_water_level("LOW");
        assert_eq!(
            sensor_advisories(&s),
            vec![
                SensorAdvisory::HighHumidity,
                SensorAdvisory::LowLight,
                SensorAdvisory::ExtremeTemperature,
                SensorAdvisory::EmptyTank,
            ]
        );
    }

    #[test]
    fn non_finite_readings_are_ignored() {
        let s = snapshot().with_humidity(f64::INFINITY).with_light(f64::NAN);
        assert!(sensor_advisories(&s).is_empty());
    }
}
