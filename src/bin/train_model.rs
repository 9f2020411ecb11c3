//! Trains the flood classifier and hours-to-flood regressor from a
//! labeled flood history CSV and writes the JSON artifacts the daemon's
//! model strategy loads.
//!
//! Usage:
//!   cargo run --bin train_model -- --input data/flood_history.csv
//!   cargo run --bin train_model -- --input history.csv --out data/models
//!
//! Expected CSV header (feature columns in model order):
//!   rainfall_24h,rainfall_48h,rainfall_72h,rainfall_7d,water_level,
//!   water_level_change_24h,humidity,temperature,soil_saturation,
//!   elevation_m,historical_floods_count,month,day_of_year,
//!   flood_occurred,hours_to_flood
//!
//! `flood_occurred` is 0/1; `hours_to_flood` may be blank for rows where
//! no flood followed. The regressor is fitted only on flood rows, same as
//! the deployed pipeline.

use ndarray::{Array1, Array2};
use serde::Deserialize;
use std::env;
use std::path::Path;

use floodrisk_service::model::MODEL_FEATURE_COUNT;
use floodrisk_service::predict::artifact::{CLASSIFIER_FILE, REGRESSOR_FILE};
use floodrisk_service::predict::training::{self, TrainConfig};

/// Minimum flood rows before a regressor is worth fitting.
const MIN_REGRESSOR_ROWS: usize = 10;

/// Every Nth row is held out for evaluation.
const TEST_STRIDE: usize = 5;

#[derive(Debug, Deserialize)]
struct HistoryRow {
    rainfall_24h: f64,
    rainfall_48h: f64,
    rainfall_72h: f64,
    rainfall_7d: f64,
    water_level: f64,
    water_level_change_24h: f64,
    humidity: f64,
    temperature: f64,
    soil_saturation: f64,
    elevation_m: f64,
    historical_floods_count: f64,
    month: f64,
    day_of_year: f64,
    flood_occurred: u8,
    hours_to_flood: Option<f64>,
}

impl HistoryRow {
    fn features(&self) -> [f64; MODEL_FEATURE_COUNT] {
        [
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
            self.historical_floods_count,
            self.month,
            self.day_of_year,
        ]
    }
}

fn main() {
    println!("🧮 Flood Model Training");
    println!("=======================\n");

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    let mut input: Option<String> = None;
    let mut out_dir = "data/models".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--input" if i + 1 < args.len() => {
                input = Some(args[i + 1].clone());
                i += 2;
            }
            "--out" if i + 1 < args.len() => {
                out_dir = args[i + 1].clone();
                i += 2;
            }
            _ => {
                eprintln!("Usage: train_model --input HISTORY_CSV [--out MODEL_DIR]");
                std::process::exit(1);
            }
        }
    }

    let Some(input) = input else {
        eprintln!("Error: --input is required");
        eprintln!("Usage: train_model --input HISTORY_CSV [--out MODEL_DIR]");
        std::process::exit(1);
    };

    // Load labeled history
    println!("📖 Reading {}...", input);
    let rows = match read_history(&input) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("❌ Failed to read history: {}", e);
            std::process::exit(1);
        }
    };

    if rows.len() < TEST_STRIDE * 2 {
        eprintln!("❌ Not enough rows to train ({} found)", rows.len());
        std::process::exit(1);
    }
    println!("   {} labeled rows\n", rows.len());

    // Deterministic split: every Nth row held out for evaluation
    let (train_rows, test_rows): (Vec<_>, Vec<_>) = rows
        .iter()
        .enumerate()
        .partition(|(i, _)| i % TEST_STRIDE != 0);
    let train_rows: Vec<&HistoryRow> = train_rows.into_iter().map(|(_, r)| r).collect();
    let test_rows: Vec<&HistoryRow> = test_rows.into_iter().map(|(_, r)| r).collect();

    // Train classifier
    println!("🎯 Training flood classifier ({} rows)...", train_rows.len());
    let x_train = feature_matrix(&train_rows);
    let y_train = Array1::from_iter(train_rows.iter().map(|r| r.flood_occurred as f64));
    let classifier = training::train_classifier(&x_train, &y_train, &TrainConfig::default());

    // Evaluate on the held-out rows
    let y_test = Array1::from_iter(test_rows.iter().map(|r| r.flood_occurred as f64));
    let probabilities = Array1::from_iter(test_rows.iter().map(|r| {
        classifier
            .predict_proba(&r.features())
            .expect("artifact fitted on the same feature order")
    }));
    println!(
        "   Held-out accuracy: {:.1}% ({} rows)\n",
        training::accuracy(&y_test, &probabilities) * 100.0,
        test_rows.len()
    );

    // Train regressor on flood rows only
    let flood_rows: Vec<&HistoryRow> = rows
        .iter()
        .filter(|r| r.flood_occurred == 1 && r.hours_to_flood.is_some())
        .collect();

    let regressor = if flood_rows.len() >= MIN_REGRESSOR_ROWS {
        println!("⏱  Training hours-to-flood regressor ({} flood rows)...", flood_rows.len());
        let x_flood = feature_matrix(&flood_rows);
        let y_flood = Array1::from_iter(flood_rows.iter().map(|r| r.hours_to_flood.unwrap()));
        let regressor = training::train_regressor(&x_flood, &y_flood, &TrainConfig::default());

        let predictions = Array1::from_iter(flood_rows.iter().map(|r| {
            regressor
                .predict(&r.features())
                .expect("artifact fitted on the same feature order")
        }));
        println!(
            "   Training MSE: {:.2}\n",
            training::mean_squared_error(&y_flood, &predictions)
        );
        Some(regressor)
    } else {
        println!(
            "⏱  Skipping regressor: only {} flood rows (need {})\n",
            flood_rows.len(),
            MIN_REGRESSOR_ROWS
        );
        None
    };

    // Save artifacts
    println!("💾 Saving artifacts to {}/...", out_dir);
    if let Err(e) = std::fs::create_dir_all(&out_dir) {
        eprintln!("❌ Cannot create model directory: {}", e);
        std::process::exit(1);
    }

    let classifier_path = Path::new(&out_dir).join(CLASSIFIER_FILE);
    if let Err(e) = classifier.save(&classifier_path) {
        eprintln!("❌ Failed to save classifier: {}", e);
        std::process::exit(1);
    }
    println!("   ✓ {}", classifier_path.display());

    if let Some(regressor) = regressor {
        let regressor_path = Path::new(&out_dir).join(REGRESSOR_FILE);
        if let Err(e) = regressor.save(&regressor_path) {
            eprintln!("❌ Failed to save regressor: {}", e);
            std::process::exit(1);
        }
        println!("   ✓ {}", regressor_path.display());
    }

    println!("\n✓ Training complete");
}

fn read_history(path: &str) -> Result<Vec<HistoryRow>, Box<dyn std::error::Error>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

fn feature_matrix(rows: &[&HistoryRow]) -> Array2<f64> {
    let mut flat = Vec::with_capacity(rows.len() * MODEL_FEATURE_COUNT);
    for row in rows {
        flat.extend_from_slice(&row.features());
    }
    Array2::from_shape_vec((rows.len(), MODEL_FEATURE_COUNT), flat)
        .expect("row-major feature layout")
}
