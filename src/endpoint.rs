/// HTTP endpoint for predictions and sensor data
///
/// Provides a simple REST API for dashboards and field tooling to query
/// flood risk and submit stage readings.
///
/// Endpoints:
/// - GET  /health - Service health check
/// - GET  /predict?municipality={name}&barangay={name} - On-demand prediction
/// - GET  /location/{municipality} - Latest readings and monitoring state
/// - POST /reading - Submit a sensor reading

use chrono::{DateTime, Utc};
use postgres::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;

use crate::alert::thresholds::{check_reading, upsert_alert, ThresholdSettings};
use crate::analysis::features::build_feature_vector;
use crate::config::SensorConfig;
use crate::locations::find_location;
use crate::model::SensorReading;
use crate::predict::Predictor;

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Latest reading for one parameter in a location response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadingData {
    pub sensor_id: String,
    pub parameter: String,
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
}

/// Monitoring state for JSON response
#[derive(Debug, Serialize, Deserialize)]
pub struct MonitoringStateData {
    pub last_poll_attempted: Option<DateTime<Utc>>,
    pub last_poll_succeeded: Option<DateTime<Utc>>,
    pub consecutive_failures: i32,
}

/// Complete location data response
#[derive(Debug, Serialize)]
pub struct LocationDataResponse {
    pub municipality: String,
    pub province: String,
    pub elevation_m: f64,
    pub historical_floods_count: u32,

    /// Latest reading per parameter
    pub readings: Vec<ReadingData>,

    /// Polling state, if this municipality has been polled
    pub monitoring_state: Option<MonitoringStateData>,

    /// Data freshness
    pub last_updated: Option<DateTime<Utc>>,
    pub staleness_minutes: Option<i64>,
}

/// Body of POST /reading
#[derive(Debug, Deserialize)]
pub struct AddReadingRequest {
    pub sensor_id: String,
    pub value: f64,
    /// Defaults to the server clock when omitted.
    pub timestamp: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Data Fetching
// ---------------------------------------------------------------------------

/// Fetch all relational data for a municipality from the database
pub fn fetch_location_data(
    client: &mut Client,
    municipality: &str,
) -> Result<LocationDataResponse, String> {
    let location = find_location(municipality)
        .ok_or_else(|| format!("Municipality '{}' not found in location registry", municipality))?;

    let readings = fetch_latest_readings(client, location.municipality)?;
    let monitoring_state = fetch_monitoring_state(client, location.municipality)?;

    let last_updated = readings.iter().map(|r| r.timestamp).max();
    let staleness_minutes = last_updated.map(|dt| (Utc::now() - dt).num_minutes());

    Ok(LocationDataResponse {
        municipality: location.municipality.to_string(),
        province: location.province.to_string(),
        elevation_m: location.elevation_m,
        historical_floods_count: location.historical_floods_count,
        readings,
        monitoring_state,
        last_updated,
        staleness_minutes,
    })
}

/// Latest reading per parameter for a municipality
fn fetch_latest_readings(client: &mut Client, municipality: &str) -> Result<Vec<ReadingData>, String> {
    let rows = client
        .query(
            "SELECT DISTINCT ON (parameter)
                sensor_id,
                parameter,
                value::float8,
                reading_time
             FROM sensor_raw.readings
             WHERE municipality = $1
             ORDER BY parameter, reading_time DESC",
            &[&municipality],
        )
        .map_err(|e| format!("Database query failed: {}", e))?;

    let mut readings = Vec::new();

    for row in rows {
        let parameter: String = row.get(1);
        let unit = crate::model::SensorType::from_str(&parameter)
            .map(|t| t.unit().to_string())
            .unwrap_or_default();

        readings.push(ReadingData {
            sensor_id: row.get(0),
            parameter,
            value: row.get(2),
            unit,
            timestamp: row.get(3),
        });
    }

    Ok(readings)
}

/// Fetch monitoring state for a municipality
fn fetch_monitoring_state(
    client: &mut Client,
    municipality: &str,
) -> Result<Option<MonitoringStateData>, String> {
    let row = client
        .query_opt(
            "SELECT last_poll_attempted, last_poll_succeeded, consecutive_failures
             FROM sensor_raw.monitoring_state
             WHERE municipality = $1",
            &[&municipality],
        )
        .map_err(|e| format!("Failed to fetch monitoring state: {}", e))?;

    Ok(row.map(|row| MonitoringStateData {
        last_poll_attempted: row.get(0),
        last_poll_succeeded: row.get(1),
        consecutive_failures: row.get(2),
    }))
}

// ---------------------------------------------------------------------------
// Query string parsing
// ---------------------------------------------------------------------------

/// Splits a request URL into path and decoded query parameters.
pub fn parse_url(url: &str) -> (&str, HashMap<String, String>) {
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, query),
        None => (url, ""),
    };

    let mut params = HashMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = urlencoding::decode(key).map(|k| k.into_owned()).unwrap_or_default();
        let value = urlencoding::decode(value)
            .map(|v| v.into_owned())
            .unwrap_or_default();
        // "+" is a space in query strings.
        params.insert(key, value.replace('+', " "));
    }

    (path, params)
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Start HTTP endpoint server on the specified port
pub fn start_endpoint_server(
    port: u16,
    mut client: Client,
    predictor: Predictor,
    sensors: HashMap<String, SensorConfig>,
) -> Result<(), String> {
    let server = tiny_http::Server::http(format!("0.0.0.0:{}", port))
        .map_err(|e| format!("Failed to start HTTP server: {}", e))?;

    println!("📡 HTTP endpoint listening on http://0.0.0.0:{}", port);
    println!("   GET  /health - Service health check");
    println!("   GET  /predict?municipality={{name}} - Flood prediction");
    println!("   GET  /location/{{municipality}} - Latest readings");
    println!("   POST /reading - Submit a sensor reading\n");

    for mut request in server.incoming_requests() {
        let url = request.url().to_string();
        let (path, params) = parse_url(&url);

        let response = if path == "/health" {
            handle_health()
        } else if path == "/predict" {
            handle_predict(&mut client, &predictor, &params)
        } else if let Some(municipality) = path.strip_prefix("/location/") {
            let municipality = urlencoding::decode(municipality)
                .map(|m| m.into_owned())
                .unwrap_or_else(|_| municipality.to_string());
            handle_location_query(&mut client, &municipality)
        } else if path == "/reading" && request.method() == &tiny_http::Method::Post {
            let mut body = String::new();
            match request.as_reader().read_to_string(&mut body) {
                Ok(_) => handle_add_reading(&mut client, &sensors, &body),
                Err(e) => create_response(
                    400,
                    serde_json::json!({ "error": format!("unreadable request body: {}", e) }),
                ),
            }
        } else {
            create_response(
                404,
                serde_json::json!({
                    "error": "Not found",
                    "available_endpoints": ["/health", "/predict", "/location/{municipality}", "/reading"]
                }),
            )
        };

        if let Err(e) = request.respond(response) {
            eprintln!("Failed to send response: {}", e);
        }
    }

    Ok(())
}

/// Handle /health endpoint
fn handle_health() -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    create_response(
        200,
        serde_json::json!({
            "status": "ok",
            "service": "floodrisk_service",
            "version": "0.1.0"
        }),
    )
}

/// Handle /predict endpoint
fn handle_predict(
    client: &mut Client,
    predictor: &Predictor,
    params: &HashMap<String, String>,
) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let municipality = params.get("municipality").map(String::as_str);
    let barangay = params.get("barangay").map(String::as_str);
    let now = Utc::now();

    match build_feature_vector(client, municipality, barangay, now) {
        Ok(features) => {
            let result = predictor.predict(&features, now);
            create_response(200, serde_json::to_value(&result).unwrap())
        }
        Err(e) => create_response(
            500,
            serde_json::json!({ "error": format!("feature aggregation failed: {}", e) }),
        ),
    }
}

/// Handle /location/{municipality} endpoint
fn handle_location_query(
    client: &mut Client,
    municipality: &str,
) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    match fetch_location_data(client, municipality) {
        Ok(data) => create_response(200, serde_json::to_value(&data).unwrap()),
        Err(e) => create_response(
            404,
            serde_json::json!({
                "error": e,
                "municipality": municipality
            }),
        ),
    }
}

/// Handle POST /reading endpoint
fn handle_add_reading(
    client: &mut Client,
    sensors: &HashMap<String, SensorConfig>,
    body: &str,
) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let request: AddReadingRequest = match serde_json::from_str(body) {
        Ok(request) => request,
        Err(e) => {
            return create_response(
                400,
                serde_json::json!({ "error": format!("invalid request body: {}", e) }),
            );
        }
    };

    let Some(sensor) = sensors.get(&request.sensor_id) else {
        return create_response(
            404,
            serde_json::json!({
                "error": format!("Sensor with id '{}' does not exist", request.sensor_id)
            }),
        );
    };

    let reading = SensorReading {
        sensor_id: sensor.id.clone(),
        sensor_type: sensor.sensor_type,
        value: request.value,
        timestamp: request.timestamp.unwrap_or_else(Utc::now),
        municipality: sensor.municipality.clone(),
        barangay: sensor.barangay.clone(),
    };

    let insert = client.execute(
        "INSERT INTO sensor_raw.readings
         (sensor_id, parameter, value, reading_time, municipality, barangay)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (sensor_id, reading_time) DO NOTHING",
        &[
            &reading.sensor_id,
            &reading.sensor_type.as_str(),
            &reading.value,
            &reading.timestamp,
            &reading.municipality,
            &reading.barangay,
        ],
    );

    if let Err(e) = insert {
        return create_response(
            500,
            serde_json::json!({ "error": format!("failed to warehouse reading: {}", e) }),
        );
    }

    // Threshold evaluation happens on the write path, same as daemon polls.
    if let Some(thresholds) = ThresholdSettings::defaults_for(reading.sensor_type) {
        if let Some(alert) = check_reading(&reading, &thresholds) {
            if let Err(e) = upsert_alert(client, &reading, &alert) {
                eprintln!("Failed to persist threshold alert: {}", e);
            }
        }
    }

    create_response(201, serde_json::to_value(&reading).unwrap())
}

/// Create HTTP response with JSON body
fn create_response(status_code: u16, json: serde_json::Value) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let body = serde_json::to_string_pretty(&json).unwrap();
    let bytes = body.into_bytes();

    tiny_http::Response::from_data(bytes)
        .with_status_code(tiny_http::StatusCode::from(status_code))
        .with_header(
            tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap(),
        )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
