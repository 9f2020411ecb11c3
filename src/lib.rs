/// floodrisk_service: municipal flood risk monitoring and prediction.
///
/// # Module structure
///
/// ```text
/// floodrisk_service
/// ├── model       — shared data types (SensorReading, FeatureVector, Severity, …)
/// ├── config      — sensor registry configuration loader (sensors.toml)
/// ├── locations   — municipality registry with elevation and flood history
/// ├── db          — validated PostgreSQL connection bootstrap
/// ├── daemon      — main daemon loop (startup, polling, warehousing, alerting)
/// ├── endpoint    — HTTP API for predictions and sensor data
/// ├── ingest
/// │   ├── open_meteo — Open-Meteo API: URL construction + JSON parsing
/// │   └── fixtures (test only) — representative API response payloads
/// ├── alert
/// │   └── thresholds — per-parameter severity evaluation + alert persistence
/// ├── analysis
/// │   └── features   — windowed aggregation and feature vector assembly
/// └── predict
///     ├── heuristic  — tiered additive scoring + hours-to-flood proxy
///     ├── model      — trained-artifact scoring strategy
///     ├── artifact   — JSON model artifacts (scaler + linear coefficients)
///     └── training   — gradient-descent fitting used by bin/train_model
/// ```

/// Public modules
pub mod alert;
pub mod analysis;
pub mod config;
pub mod daemon;
pub mod db;
pub mod endpoint;
pub mod ingest;
pub mod locations;
pub mod model;
pub mod predict;
