/// Shared data types for the flood risk monitoring service.
///
/// Everything that crosses a module boundary lives here: sensor readings
/// as they come out of the ingest layer, the derived feature vector the
/// prediction strategies consume, the prediction result returned to the
/// caller, and the severity scale shared by prediction and alerting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sensor parameters
// ---------------------------------------------------------------------------

/// The environmental parameters this service monitors.
///
/// Wire names (`rainfall`, `water_level`, ...) match the `parameter`
/// column in `sensor_raw.readings` and the sensor registry's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Rainfall,
    WaterLevel,
    Humidity,
    Temperature,
    WindSpeed,
}

impl SensorType {
    /// Wire name used in the database and in `sensors.toml`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Rainfall => "rainfall",
            SensorType::WaterLevel => "water_level",
            SensorType::Humidity => "humidity",
            SensorType::Temperature => "temperature",
            SensorType::WindSpeed => "wind_speed",
        }
    }

    /// Parses a wire name. Returns `None` for unknown parameters.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "rainfall" => Some(SensorType::Rainfall),
            "water_level" => Some(SensorType::WaterLevel),
            "humidity" => Some(SensorType::Humidity),
            "temperature" => Some(SensorType::Temperature),
            "wind_speed" => Some(SensorType::WindSpeed),
            _ => None,
        }
    }

    /// Measurement unit for this parameter.
    pub fn unit(&self) -> &'static str {
        match self {
            SensorType::Rainfall => "mm",
            SensorType::WaterLevel => "m",
            SensorType::Humidity => "%",
            SensorType::Temperature => "°C",
            SensorType::WindSpeed => "km/h",
        }
    }

    /// All parameters, in registry order.
    pub fn all() -> &'static [SensorType] {
        &[
            SensorType::Rainfall,
            SensorType::WaterLevel,
            SensorType::Humidity,
            SensorType::Temperature,
            SensorType::WindSpeed,
        ]
    }
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// A single sensor measurement, immutable once warehoused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    pub sensor_id: String,
    pub sensor_type: SensorType,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub municipality: String,
    pub barangay: Option<String>,
}

// ---------------------------------------------------------------------------
// Feature vector
// ---------------------------------------------------------------------------

/// Aggregated numeric inputs consumed by the prediction strategies.
///
/// Derived per request by `analysis::features`; never persisted. Rainfall
/// fields are window totals in mm; water level is the latest reading in m.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub rainfall_24h: f64,
    pub rainfall_48h: f64,
    pub rainfall_72h: f64,
    pub rainfall_7d: f64,
    pub water_level: f64,
    pub water_level_change_24h: f64,
    pub humidity: f64,
    pub temperature: f64,
    /// Estimated from recent rainfall; see `analysis::features::estimate_soil_saturation`.
    pub soil_saturation: f64,
    pub elevation_m: f64,
    pub historical_floods_count: u32,
    pub month: u32,
    pub day_of_year: u32,
}

/// Number of model input features; artifacts are validated against this.
pub const MODEL_FEATURE_COUNT: usize = 13;

impl FeatureVector {
    /// Flattens the vector into the fixed feature order the trained
    /// artifacts were fitted on. Changing this order invalidates every
    /// saved artifact.
    pub fn to_model_input(&self) -> Vec<f64> {
        vec![
            self.rainfall_24h,
            self.rainfall_48h,
            self.rainfall_72h,
            self.rainfall_7d,
            self.water_level,
            self.water_level_change_24h,
            self.humidity,
            self.temperature,
            self.soil_saturation,
            self.elevation_m,
            self.historical_floods_count as f64,
            self.month as f64,
            self.day_of_year as f64,
        ]
    }

    /// An all-zero vector for a location with no sensor coverage.
    /// Month and day-of-year are still taken from the request time.
    pub fn empty(month: u32, day_of_year: u32) -> Self {
        Self {
            rainfall_24h: 0.0,
            rainfall_48h: 0.0,
            rainfall_72h: 0.0,
            rainfall_7d: 0.0,
            water_level: 0.0,
            water_level_change_24h: 0.0,
            humidity: 0.0,
            temperature: 0.0,
            soil_saturation: 50.0,
            elevation_m: 0.0,
            historical_floods_count: 0,
            month,
            day_of_year,
        }
    }
}

// ---------------------------------------------------------------------------
// Severity scale
// ---------------------------------------------------------------------------

/// Ordinal flood risk category, shared by prediction and alerting.
///
/// Levels 1..5 correspond to the PAGASA-style advisory ladder the
/// original deployment used; 0 means no elevated risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Normal,
    Advisory,
    Watch,
    Warning,
    Emergency,
    Catastrophic,
}

impl Severity {
    /// Maps a probability percentage onto the severity ladder.
    ///
    /// Thresholds are `>=`-inclusive and the highest met wins: 30/50/70/85/95
    /// map to Advisory..Catastrophic; anything below 30 is Normal.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= 95.0 {
            Severity::Catastrophic
        } else if probability >= 85.0 {
            Severity::Emergency
        } else if probability >= 70.0 {
            Severity::Warning
        } else if probability >= 50.0 {
            Severity::Watch
        } else if probability >= 30.0 {
            Severity::Advisory
        } else {
            Severity::Normal
        }
    }

    /// Constructs from an integer level, clamping out-of-range input.
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Severity::Normal,
            1 => Severity::Advisory,
            2 => Severity::Watch,
            3 => Severity::Warning,
            4 => Severity::Emergency,
            _ => Severity::Catastrophic,
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            Severity::Normal => 0,
            Severity::Advisory => 1,
            Severity::Watch => 2,
            Severity::Warning => 3,
            Severity::Emergency => 4,
            Severity::Catastrophic => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Normal => "Normal",
            Severity::Advisory => "Advisory",
            Severity::Watch => "Watch",
            Severity::Warning => "Warning",
            Severity::Emergency => "Emergency",
            Severity::Catastrophic => "Catastrophic",
        }
    }

    /// Canned impact assessment text. Normal and Advisory share the
    /// "no significant flooding" wording.
    pub fn impact(&self) -> &'static str {
        match self {
            Severity::Normal | Severity::Advisory => "No significant flooding expected.",
            Severity::Watch => "Possible minor flooding in low-lying areas.",
            Severity::Warning => "Moderate flooding likely. Some roads may be impassable.",
            Severity::Emergency => {
                "Severe flooding expected with significant infrastructure impact."
            }
            Severity::Catastrophic => {
                "Catastrophic flooding expected. Immediate evacuation recommended."
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Prediction result
// ---------------------------------------------------------------------------

/// The outcome of one flood-probability request. JSON-serializable; built
/// fresh per request and never persisted by this component.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    /// Flood probability percentage, truncated to an integer in [0, 100].
    pub probability: u8,
    /// Severity level 0..5 matching `severity`.
    pub severity_level: u8,
    pub severity: String,
    pub impact: String,
    /// Estimated hours until flood stage; present only when probability
    /// is at least 60 and the rise-rate estimate is positive.
    pub hours_to_flood: Option<f64>,
    pub contributing_factors: Vec<String>,
    /// Which strategy produced the probability ("heuristic" or "model").
    pub strategy: String,
    pub generated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Ingest errors
// ---------------------------------------------------------------------------

/// Errors from the weather ingest path.
#[derive(Debug)]
pub enum WeatherError {
    /// Transport-level failure (connect, timeout, non-2xx status).
    Http(String),
    /// Response arrived but did not match the expected structure.
    ParseError(String),
    /// Structurally valid response with no usable observations.
    NoDataAvailable(String),
}

impl std::fmt::Display for WeatherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherError::Http(msg) => write!(f, "weather API request failed: {}", msg),
            WeatherError::ParseError(msg) => write!(f, "weather response parse error: {}", msg),
            WeatherError::NoDataAvailable(msg) => write!(f, "no weather data available: {}", msg),
        }
    }
}

impl std::error::Error for WeatherError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_type_round_trip() {
        for t in SensorType::all() {
            assert_eq!(SensorType::from_str(t.as_str()), Some(*t));
        }
        assert_eq!(SensorType::from_str("soil_moisture"), None);
    }

    #[test]
    fn test_severity_thresholds_are_inclusive() {
        assert_eq!(Severity::from_probability(29.9), Severity::Normal);
        assert_eq!(Severity::from_probability(30.0), Severity::Advisory);
        assert_eq!(Severity::from_probability(50.0), Severity::Watch);
        assert_eq!(Severity::from_probability(70.0), Severity::Warning);
        assert_eq!(Severity::from_probability(85.0), Severity::Emergency);
        assert_eq!(Severity::from_probability(94.9), Severity::Emergency);
        assert_eq!(Severity::from_probability(95.0), Severity::Catastrophic);
        assert_eq!(Severity::from_probability(100.0), Severity::Catastrophic);
    }

    #[test]
    fn test_severity_level_round_trip() {
        for level in 0..=5u8 {
            assert_eq!(Severity::from_level(level).level(), level);
        }
        // Out-of-range input clamps to the top of the ladder.
        assert_eq!(Severity::from_level(9), Severity::Catastrophic);
    }

    #[test]
    fn test_model_input_has_declared_feature_count() {
        let features = FeatureVector::empty(6, 158);
        assert_eq!(features.to_model_input().len(), MODEL_FEATURE_COUNT);
    }

    #[test]
    fn test_empty_vector_defaults_soil_saturation_to_midrange() {
        let features = FeatureVector::empty(1, 1);
        assert_eq!(features.soil_saturation, 50.0);
        assert_eq!(features.rainfall_24h, 0.0);
    }
}
