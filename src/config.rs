/// Sensor registry loader - parses sensors.toml
///
/// Separates sensor metadata from code, making it easy to add sensors,
/// move them between barangays, or retire them without recompiling the
/// service. The optional `[prediction]` section overrides the built-in
/// scoring constants.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

use crate::model::SensorType;
use crate::predict::PredictionConfig;

/// Sensor metadata loaded from the sensors.toml configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct SensorConfig {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,

    // Geographic placement
    pub municipality: String,
    pub barangay: Option<String>,
    pub latitude: f64,
    pub longitude: f64,

    /// Inactive sensors stay in the registry but are skipped by polling.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Root configuration structure for TOML parsing
#[derive(Debug, Deserialize)]
struct SensorRegistry {
    sensor: Vec<SensorConfig>,
    #[serde(default)]
    prediction: PredictionConfig,
}

const CONFIG_PATH: &str = "sensors.toml";

fn load_registry() -> SensorRegistry {
    let contents = fs::read_to_string(CONFIG_PATH)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", CONFIG_PATH, e));

    toml::from_str(&contents).unwrap_or_else(|e| panic!("Failed to parse {}: {}", CONFIG_PATH, e))
}

/// Loads the sensor registry from sensors.toml.
///
/// # Panics
/// Panics if the configuration file is missing, malformed, or contains
/// invalid data. This is intentional — the service cannot operate without
/// valid sensor metadata.
///
/// # File Location
/// Expects `sensors.toml` in the current working directory (project root
/// when running via `cargo run`).
pub fn load_config() -> Vec<SensorConfig> {
    load_registry().sensor
}

/// Loads the prediction constants, falling back to built-in defaults when
/// the `[prediction]` section is absent.
pub fn load_prediction_config() -> PredictionConfig {
    load_registry().prediction
}

/// Loads the sensor registry and builds a lookup map keyed by sensor id.
///
/// Useful for O(1) sensor lookups during warehousing and endpoint queries.
pub fn load_config_map() -> HashMap<String, SensorConfig> {
    load_config()
        .into_iter()
        .map(|s| (s.id.clone(), s))
        .collect()
}

/// Active sensors registered for a municipality (case-insensitive).
pub fn sensors_for_municipality<'a>(
    sensors: &'a [SensorConfig],
    municipality: &str,
) -> Vec<&'a SensorConfig> {
    sensors
        .iter()
        .filter(|s| s.active && s.municipality.eq_ignore_ascii_case(municipality))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locations::find_location;

    #[test]
    fn test_load_config_succeeds() {
        let sensors = load_config();
        assert!(sensors.len() >= 12, "Should have at least 12 sensors");
    }

    #[test]
    fn test_all_sensors_have_required_fields() {
        let sensors = load_config();
        for sensor in sensors {
            assert!(!sensor.id.is_empty(), "Sensor id must not be empty");
            assert!(!sensor.name.is_empty(), "Name must not be empty");
            assert!(sensor.latitude >= -90.0 && sensor.latitude <= 90.0);
            assert!(sensor.longitude >= -180.0 && sensor.longitude <= 180.0);
        }
    }

    #[test]
    fn test_every_sensor_municipality_is_registered() {
        // A sensor pointing at an unregistered municipality would warehouse
        // readings no prediction request can ever reach.
        for sensor in load_config() {
            assert!(
                find_location(&sensor.municipality).is_some(),
                "sensor '{}' references unregistered municipality '{}'",
                sensor.id,
                sensor.municipality
            );
        }
    }

    #[test]
    fn test_no_duplicate_sensor_ids() {
        let sensors = load_config();
        let mut seen = std::collections::HashSet::new();
        for sensor in &sensors {
            assert!(
                seen.insert(sensor.id.clone()),
                "duplicate sensor id '{}' in sensors.toml",
                sensor.id
            );
        }
    }

    #[test]
    fn test_config_map_lookup() {
        let map = load_config_map();
        assert!(map.contains_key("VGN-RF-01"), "Should contain the Vigan rain gauge");

        let gauge = &map["VGN-RF-01"];
        assert_eq!(gauge.sensor_type, SensorType::Rainfall);
        assert_eq!(gauge.municipality, "Vigan City");
    }

    #[test]
    fn test_sensors_for_municipality_filters_inactive() {
        let sensors = vec![
            SensorConfig {
                id: "A".to_string(),
                name: "active".to_string(),
                sensor_type: SensorType::Rainfall,
                municipality: "Santa".to_string(),
                barangay: None,
                latitude: 17.49,
                longitude: 120.43,
                active: true,
            },
            SensorConfig {
                id: "B".to_string(),
                name: "retired".to_string(),
                sensor_type: SensorType::Rainfall,
                municipality: "Santa".to_string(),
                barangay: None,
                latitude: 17.49,
                longitude: 120.43,
                active: false,
            },
        ];

        let found = sensors_for_municipality(&sensors, "santa");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "A");
    }

    #[test]
    fn test_prediction_section_defaults_when_absent() {
        let registry: SensorRegistry = toml::from_str(
            r#"
            [[sensor]]
            id = "X-1"
            name = "Test gauge"
            type = "water_level"
            municipality = "Santa"
            latitude = 17.49
            longitude = 120.43
            "#,
        )
        .expect("minimal registry should parse");

        assert_eq!(registry.prediction, PredictionConfig::default());
        assert!(registry.sensor[0].active, "active should default to true");
    }

    #[test]
    fn test_prediction_section_overrides_constants() {
        let registry: SensorRegistry = toml::from_str(
            r#"
            [[sensor]]
            id = "X-1"
            name = "Test gauge"
            type = "rainfall"
            municipality = "Santa"
            latitude = 17.49
            longitude = 120.43

            [prediction]
            target_flood_level_m = 2.2
            rainfall_24h_tiers = [{ at_least = 40.0, points = 35 }]
            "#,
        )
        .expect("registry with overrides should parse");

        assert_eq!(registry.prediction.target_flood_level_m, 2.2);
        assert_eq!(registry.prediction.rainfall_24h_tiers.points_for(45.0), 35);
        // Untouched constants keep their defaults.
        assert_eq!(registry.prediction.rainfall_to_rise_factor, 0.02);
    }
}
