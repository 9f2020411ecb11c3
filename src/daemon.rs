/// Core daemon implementation for the flood risk monitoring service
///
/// This module implements the main daemon loop that:
/// 1. Validates database connectivity and schemas on startup
/// 2. Detects staleness of existing data
/// 3. Continuously polls the weather API per monitored municipality
/// 4. Warehouses readings and maintains monitoring state
/// 5. Evaluates per-parameter alert thresholds on every warehoused reading

use chrono::{DateTime, Duration, Utc};
use postgres::Client;
use std::collections::BTreeSet;
use std::error::Error;
use std::sync::mpsc;
use threadpool::ThreadPool;

use crate::alert::thresholds::{check_reading, upsert_alert, ThresholdSettings};
use crate::config::{self, SensorConfig};
use crate::db;
use crate::ingest::open_meteo;
use crate::locations::find_location;
use crate::model::{SensorReading, WeatherError};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Daemon configuration
pub struct DaemonConfig {
    /// How often to poll the weather API (default: 15 minutes, matching
    /// the Open-Meteo model update cadence)
    pub poll_interval_minutes: u64,

    /// Maximum age of data before considered stale (default: 60 minutes)
    pub staleness_threshold_minutes: u64,

    /// Worker threads for parallel weather collection
    pub collection_threads: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            poll_interval_minutes: 15,
            staleness_threshold_minutes: 60,
            collection_threads: 4,
        }
    }
}

// ---------------------------------------------------------------------------
// Daemon State
// ---------------------------------------------------------------------------

/// Main daemon state
pub struct Daemon {
    config: DaemonConfig,
    sensors: Vec<SensorConfig>,
    client: Option<Client>,
    http: reqwest::blocking::Client,
}

impl Daemon {
    /// Create a new daemon instance with default configuration
    pub fn new() -> Self {
        Self::with_config(DaemonConfig::default())
    }

    /// Create daemon with custom configuration
    pub fn with_config(config: DaemonConfig) -> Self {
        Self {
            config,
            sensors: Vec::new(),
            client: None,
            http: reqwest::blocking::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::blocking::Client::new()),
        }
    }

    /// Initialize daemon: validate database and load the sensor registry
    pub fn initialize(&mut self) -> Result<(), Box<dyn Error>> {
        // Validate database schemas
        let client = db::connect_and_verify(db::REQUIRED_SCHEMAS)?;
        self.client = Some(client);

        // Load sensor registry
        self.sensors = config::load_config();

        if self.sensors.is_empty() {
            return Err("No sensors configured in sensors.toml".into());
        }

        Ok(())
    }

    pub fn get_sensors(&self) -> &[SensorConfig] {
        &self.sensors
    }

    /// Distinct municipalities with at least one active sensor.
    pub fn monitored_municipalities(&self) -> Vec<String> {
        let set: BTreeSet<String> = self
            .sensors
            .iter()
            .filter(|s| s.active)
            .map(|s| s.municipality.clone())
            .collect();
        set.into_iter().collect()
    }

    /// Check staleness of warehoused data for a municipality.
    /// `Ok(None)` means no readings exist at all.
    pub fn check_staleness(&mut self, municipality: &str) -> Result<Option<Duration>, Box<dyn Error>> {
        let client = self.client.as_mut().ok_or("Daemon not initialized")?;

        let row = client.query_one(
            "SELECT MAX(reading_time) as latest
             FROM sensor_raw.readings
             WHERE municipality = $1",
            &[&municipality],
        )?;

        let latest: Option<DateTime<Utc>> = row.get(0);
        match latest {
            Some(dt) => Ok(Some(Utc::now() - dt)),
            None => Ok(None),
        }
    }

    /// Check if a municipality's data is missing or older than the
    /// staleness threshold.
    pub fn needs_poll(&mut self, municipality: &str) -> Result<bool, Box<dyn Error>> {
        match self.check_staleness(municipality)? {
            None => Ok(true),
            Some(staleness) => {
                Ok(staleness.num_minutes() > self.config.staleness_threshold_minutes as i64)
            }
        }
    }

    /// Warehouse readings into the database (idempotent)
    pub fn warehouse_readings(&mut self, readings: &[SensorReading]) -> Result<usize, Box<dyn Error>> {
        let client = self.client.as_mut().ok_or("Daemon not initialized")?;

        let mut inserted = 0;

        for reading in readings {
            // Use INSERT ... ON CONFLICT DO NOTHING for idempotency
            let rows_affected = client.execute(
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
            )?;

            inserted += rows_affected as usize;
        }

        Ok(inserted)
    }

    /// Update monitoring state after a successful poll
    pub fn update_monitoring_state(
        &mut self,
        municipality: &str,
        latest_reading_time: Option<DateTime<Utc>>,
    ) -> Result<(), Box<dyn Error>> {
        let client = self.client.as_mut().ok_or("Daemon not initialized")?;

        client.execute(
            "INSERT INTO sensor_raw.monitoring_state
             (municipality, last_poll_attempted, last_poll_succeeded, latest_reading_time, consecutive_failures)
             VALUES ($1, $2, $2, $3, 0)
             ON CONFLICT (municipality) DO UPDATE SET
                last_poll_attempted = EXCLUDED.last_poll_attempted,
                last_poll_succeeded = EXCLUDED.last_poll_succeeded,
                latest_reading_time = EXCLUDED.latest_reading_time,
                consecutive_failures = 0",
            &[&municipality, &Utc::now(), &latest_reading_time],
        )?;

        Ok(())
    }

    /// Record a polling failure
    pub fn record_failure(&mut self, municipality: &str) -> Result<(), Box<dyn Error>> {
        let client = self.client.as_mut().ok_or("Daemon not initialized")?;

        client.execute(
            "INSERT INTO sensor_raw.monitoring_state
             (municipality, last_poll_attempted, consecutive_failures)
             VALUES ($1, $2, 1)
             ON CONFLICT (municipality) DO UPDATE SET
                last_poll_attempted = EXCLUDED.last_poll_attempted,
                consecutive_failures = monitoring_state.consecutive_failures + 1",
            &[&municipality, &Utc::now()],
        )?;

        Ok(())
    }

    /// Evaluate threshold alerts for freshly warehoused readings.
    /// Returns the number of alert rows written.
    pub fn evaluate_thresholds(&mut self, readings: &[SensorReading]) -> Result<usize, Box<dyn Error>> {
        let client = self.client.as_mut().ok_or("Daemon not initialized")?;

        let mut written = 0;
        for reading in readings {
            let Some(thresholds) = ThresholdSettings::defaults_for(reading.sensor_type) else {
                continue;
            };
            if let Some(alert) = check_reading(reading, &thresholds) {
                if upsert_alert(client, reading, &alert)? {
                    println!("   🚨 {} — {}", reading.municipality, alert.title);
                    written += 1;
                }
            }
        }

        Ok(written)
    }

    /// Fetch current weather for every monitored municipality in parallel.
    ///
    /// Collection runs on the thread pool; database writes stay on the
    /// caller's thread since the postgres client is not shareable.
    pub fn collect_weather(&self) -> Vec<(String, Result<Vec<SensorReading>, WeatherError>)> {
        let municipalities = self.monitored_municipalities();
        let pool = ThreadPool::new(self.config.collection_threads.max(1));
        let (tx, rx) = mpsc::channel();

        let mut jobs = 0;
        for municipality in municipalities {
            let Some(location) = find_location(&municipality) else {
                // Registry drift: sensor references a municipality the
                // location registry no longer carries. Skip, don't poll.
                eprintln!("   ⚠ {} not in location registry, skipping", municipality);
                continue;
            };

            let sensors: Vec<SensorConfig> = self
                .sensors
                .iter()
                .filter(|s| s.active && s.municipality.eq_ignore_ascii_case(&municipality))
                .cloned()
                .collect();
            if sensors.is_empty() {
                continue;
            }

            let tx = tx.clone();
            let http = self.http.clone();
            let (latitude, longitude) = (location.latitude, location.longitude);

            pool.execute(move || {
                let result = open_meteo::fetch_current(&http, latitude, longitude).and_then(
                    |conditions| {
                        let refs: Vec<&SensorConfig> = sensors.iter().collect();
                        open_meteo::readings_from_conditions(&conditions, &refs)
                    },
                );
                // Receiver hang-up just means the daemon is shutting down.
                let _ = tx.send((municipality, result));
            });
            jobs += 1;
        }
        drop(tx);

        let mut results = Vec::with_capacity(jobs);
        for received in rx {
            results.push(received);
        }
        results
    }

    /// Run one full poll cycle: collect, warehouse, update state, alert.
    /// Returns total readings inserted.
    pub fn poll_cycle(&mut self) -> Result<usize, Box<dyn Error>> {
        let mut total_inserted = 0;

        for (municipality, result) in self.collect_weather() {
            match result {
                Ok(readings) => {
                    let inserted = self.warehouse_readings(&readings)?;
                    let latest = readings.iter().map(|r| r.timestamp).max();
                    self.update_monitoring_state(&municipality, latest)?;
                    self.evaluate_thresholds(&readings)?;
                    total_inserted += inserted;
                }
                Err(e) => {
                    eprintln!("   ✗ {} — poll failed: {}", municipality, e);
                    self.record_failure(&municipality)?;
                }
            }
        }

        Ok(total_inserted)
    }

    /// Main daemon loop (runs indefinitely)
    pub fn run(&mut self) -> Result<(), Box<dyn Error>> {
        println!("🚀 Starting daemon loop...");
        println!("   Poll interval: {} minutes", self.config.poll_interval_minutes);
        println!("   Monitoring {} municipalities", self.monitored_municipalities().len());

        loop {
            let start = Utc::now();

            match self.poll_cycle() {
                Ok(inserted) => {
                    println!("✓ Poll complete: {} new readings", inserted);
                }
                Err(e) => {
                    eprintln!("✗ Poll error: {}", e);
                }
            }

            // Sleep until next poll interval
            let elapsed = (Utc::now() - start).num_seconds();
            let sleep_seconds = (self.config.poll_interval_minutes * 60) as i64 - elapsed;

            if sleep_seconds > 0 {
                std::thread::sleep(std::time::Duration::from_secs(sleep_seconds as u64));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
