/// Open-Meteo forecast API client.
///
/// Retrieves current meteorological conditions (temperature, humidity,
/// precipitation, wind) per monitored municipality and maps them onto the
/// registered sensors. Water level has no remote source here — stage
/// sensors report through the `POST /reading` endpoint instead.
///
/// API documentation: https://open-meteo.com/en/docs
/// The request always asks for `timeformat=unixtime` so timestamps come
/// back as UTC epochs regardless of the location's timezone.

use chrono::DateTime;
use serde::Deserialize;

use crate::config::SensorConfig;
use crate::model::{SensorReading, SensorType, WeatherError};

const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Parameters requested from the `current` endpoint, in API naming.
const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,precipitation,wind_speed_10m";

// ============================================================================
// Open-Meteo API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub current: Option<CurrentConditions>,
}

/// Current conditions block. Every measurement is optional — the API
/// omits fields it cannot provide for a location.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentConditions {
    /// Unix epoch seconds (UTC).
    pub time: i64,
    pub temperature_2m: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
    /// Precipitation since the previous observation interval, in mm.
    pub precipitation: Option<f64>,
    pub wind_speed_10m: Option<f64>,
}

impl CurrentConditions {
    /// The observed value for a sensor type, if this response carries one.
    pub fn value_for(&self, sensor_type: SensorType) -> Option<f64> {
        match sensor_type {
            SensorType::Temperature => self.temperature_2m,
            SensorType::Humidity => self.relative_humidity_2m,
            SensorType::Rainfall => self.precipitation,
            SensorType::WindSpeed => self.wind_speed_10m,
            SensorType::WaterLevel => None,
        }
    }
}

// ============================================================================
// URL construction
// ============================================================================

/// Builds the current-conditions request URL for a coordinate pair.
pub fn build_current_url(latitude: f64, longitude: f64) -> String {
    format!(
        "{}?latitude={}&longitude={}&current={}&wind_speed_unit=kmh&timeformat=unixtime&timezone=UTC",
        OPEN_METEO_BASE_URL,
        latitude,
        longitude,
        urlencoding::encode(CURRENT_FIELDS)
    )
}

// ============================================================================
// Fetching and parsing
// ============================================================================

/// Fetches current conditions for a coordinate pair.
pub fn fetch_current(
    client: &reqwest::blocking::Client,
    latitude: f64,
    longitude: f64,
) -> Result<CurrentConditions, WeatherError> {
    let url = build_current_url(latitude, longitude);

    let response = client
        .get(&url)
        .header("Accept", "application/json")
        .send()
        .map_err(|e| WeatherError::Http(e.to_string()))?;

    if !response.status().is_success() {
        return Err(WeatherError::Http(format!(
            "Open-Meteo returned status {}",
            response.status()
        )));
    }

    let body = response.text().map_err(|e| WeatherError::Http(e.to_string()))?;
    parse_current_response(&body)
}

/// Parses a forecast response body into the current-conditions block.
///
/// # Errors
/// - `WeatherError::ParseError` — malformed or unexpected JSON structure.
/// - `WeatherError::NoDataAvailable` — valid JSON without a `current` block.
pub fn parse_current_response(json: &str) -> Result<CurrentConditions, WeatherError> {
    let response: ForecastResponse = serde_json::from_str(json)
        .map_err(|e| WeatherError::ParseError(format!("JSON deserialization failed: {}", e)))?;

    response
        .current
        .ok_or_else(|| WeatherError::NoDataAvailable("response has no 'current' block".to_string()))
}

/// Maps current conditions onto a municipality's registered sensors,
/// producing one reading per sensor whose parameter the response carries.
/// Sensors for parameters the API omitted are skipped, not errored.
///
/// # Errors
/// - `WeatherError::ParseError` — epoch timestamp out of range.
/// - `WeatherError::NoDataAvailable` — no registered sensor matched any
///   observed parameter.
pub fn readings_from_conditions(
    conditions: &CurrentConditions,
    sensors: &[&SensorConfig],
) -> Result<Vec<SensorReading>, WeatherError> {
    let timestamp = DateTime::from_timestamp(conditions.time, 0).ok_or_else(|| {
        WeatherError::ParseError(format!("epoch {} out of range", conditions.time))
    })?;

    let readings: Vec<SensorReading> = sensors
        .iter()
        .filter_map(|sensor| {
            conditions.value_for(sensor.sensor_type).map(|value| SensorReading {
                sensor_id: sensor.id.clone(),
                sensor_type: sensor.sensor_type,
                value,
                timestamp,
                municipality: sensor.municipality.clone(),
                barangay: sensor.barangay.clone(),
            })
        })
        .collect();

    if readings.is_empty() {
        return Err(WeatherError::NoDataAvailable(
            "no registered sensor matched the observed parameters".to_string(),
        ));
    }

    Ok(readings)
}

// ============================================================================
// Tests
// ============================================================================
