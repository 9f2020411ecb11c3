//! Seeds synthetic sensor readings for local development and dashboard
//! demos. Generates an hourly series per active sensor with a
//! deterministic per-sensor pattern, so repeated runs are idempotent and
//! two developers seed identical databases.
//!
//! Usage:
//!   cargo run --bin seed_readings              # 7 days of hourly readings
//!   cargo run --bin seed_readings -- --days 30

use chrono::{Duration, Timelike, Utc};
use std::env;

use floodrisk_service::config;
use floodrisk_service::db;
use floodrisk_service::model::SensorType;

fn main() {
    println!("🌱 Seeding synthetic sensor readings");
    println!("====================================\n");

    let args: Vec<String> = env::args().collect();
    let mut days: i64 = 7;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" if i + 1 < args.len() => {
                days = args[i + 1].parse().unwrap_or(7);
                i += 2;
            }
            _ => {
                eprintln!("Usage: seed_readings [--days N]");
                std::process::exit(1);
            }
        }
    }

    let mut client = match db::connect_and_verify(db::REQUIRED_SCHEMAS) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ Database not ready:\n\n{}\n", e);
            std::process::exit(1);
        }
    };

    let sensors = config::load_config();
    // Anchor to the top of the hour so repeated runs hit the same rows.
    let end = Utc::now()
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .expect("truncating to the hour is always valid");

    let mut total = 0usize;
    for sensor in sensors.iter().filter(|s| s.active) {
        let mut inserted = 0usize;
        for hour in 0..(days * 24) {
            let timestamp = end - Duration::hours(hour);
            let value = synthetic_value(&sensor.id, sensor.sensor_type, hour);

            let rows = client
                .execute(
                    "INSERT INTO sensor_raw.readings
                     (sensor_id, parameter, value, reading_time, municipality, barangay)
                     VALUES ($1, $2, $3, $4, $5, $6)
                     ON CONFLICT (sensor_id, reading_time) DO NOTHING",
                    &[
                        &sensor.id,
                        &sensor.sensor_type.as_str(),
                        &value,
                        &timestamp,
                        &sensor.municipality,
                        &sensor.barangay,
                    ],
                )
                .unwrap_or_else(|e| {
                    eprintln!("❌ Insert failed for {}: {}", sensor.id, e);
                    std::process::exit(1);
                });
            inserted += rows as usize;
        }
        println!("   ✓ {} — {} readings", sensor.id, inserted);
        total += inserted;
    }

    println!("\n✓ Seeded {} readings across {} sensors", total, sensors.len());
}

/// Deterministic synthetic value: a daily cycle plus a per-sensor phase
/// offset derived from the id, shaped to each parameter's typical range.
fn synthetic_value(sensor_id: &str, sensor_type: SensorType, hours_ago: i64) -> f64 {
    let phase: i64 = sensor_id.bytes().map(|b| b as i64).sum::<i64>() % 24;
    let cycle = (((hours_ago + phase) as f64) * std::f64::consts::TAU / 24.0).sin();

    match sensor_type {
        // Occasional showers: positive half of the cycle only.
        SensorType::Rainfall => (cycle * 6.0).max(0.0),
        SensorType::WaterLevel => 0.8 + 0.3 * cycle,
        SensorType::Humidity => 75.0 + 15.0 * cycle,
        SensorType::Temperature => 29.0 + 4.0 * cycle,
        SensorType::WindSpeed => (12.0 + 8.0 * cycle).max(0.0),
    }
}
