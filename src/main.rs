//! Flood Risk Monitoring Service - Main Daemon
//!
//! A server-side daemon that continuously:
//! 1. Ingests weather observations per monitored municipality
//! 2. Validates and warehouses readings in PostgreSQL
//! 3. Evaluates per-parameter alert thresholds
//! 4. Provides an HTTP endpoint for on-demand flood predictions
//!
//! Usage:
//!   cargo run --release                    # Start daemon without HTTP endpoint
//!   cargo run --release -- --endpoint 8080 # Start with HTTP endpoint on port 8080
//!
//! Environment:
//!   DATABASE_URL - PostgreSQL connection string

use floodrisk_service::config;
use floodrisk_service::daemon::Daemon;
use floodrisk_service::endpoint;
use floodrisk_service::predict::Predictor;
use std::env;

fn main() {
    println!("🌊 Flood Risk Monitoring Service");
    println!("=================================\n");

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    let mut endpoint_port: Option<u16> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--endpoint" => {
                if i + 1 < args.len() {
                    endpoint_port = args[i + 1].parse().ok();
                    i += 2;
                } else {
                    eprintln!("Error: --endpoint requires a port number");
                    std::process::exit(1);
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("Usage: {} [--endpoint PORT]", args[0]);
                std::process::exit(1);
            }
        }
    }

    // Create daemon with default configuration
    let mut daemon = Daemon::new();

    // Initialize: validate database and load the sensor registry
    println!("📊 Initializing daemon...");
    if let Err(e) = daemon.initialize() {
        eprintln!("\n❌ Initialization failed: {}\n", e);
        std::process::exit(1);
    }
    println!("✓ Daemon initialized\n");

    // Check data freshness per municipality
    println!("📋 Checking data freshness...");
    let mut immediate_poll_needed = false;

    for municipality in daemon.monitored_municipalities() {
        match daemon.check_staleness(&municipality) {
            Ok(None) => {
                println!("   {} - No data found", municipality);
                immediate_poll_needed = true;
            }
            Ok(Some(staleness)) => {
                let hours = staleness.num_hours();
                if hours > 1 {
                    println!("   {} - Data is {} hours old (stale)", municipality, hours);
                    immediate_poll_needed = true;
                } else {
                    println!(
                        "   {} - Data is fresh ({} min old)",
                        municipality,
                        staleness.num_minutes()
                    );
                }
            }
            Err(e) => {
                eprintln!("   {} - Error checking staleness: {}", municipality, e);
            }
        }
    }

    // Run an immediate poll round when anything is missing or stale
    if immediate_poll_needed {
        println!("\n📥 Running immediate poll round...");
        match daemon.poll_cycle() {
            Ok(inserted) => println!("   ✓ Inserted {} readings\n", inserted),
            Err(e) => eprintln!("   ✗ Initial poll failed: {}\n", e),
        }
    }

    // Start HTTP endpoint if requested (in background thread)
    if let Some(port) = endpoint_port {
        println!("🚀 Starting HTTP endpoint server...");

        // The endpoint gets its own database connection and predictor
        match floodrisk_service::db::connect_with_validation() {
            Ok(client) => {
                let prediction_config = config::load_prediction_config();
                let predictor = Predictor::from_config(prediction_config);
                let sensors = config::load_config_map();

                std::thread::spawn(move || {
                    if let Err(e) = endpoint::start_endpoint_server(port, client, predictor, sensors)
                    {
                        eprintln!("❌ Endpoint server error: {}", e);
                    }
                });
                println!("   Endpoint running on http://0.0.0.0:{}\n", port);
            }
            Err(e) => {
                eprintln!("❌ Failed to connect to database for endpoint: {}", e);
                eprintln!("   Continuing without HTTP endpoint\n");
            }
        }
    }

    // Run the main monitoring loop
    println!("🔄 Starting continuous monitoring loop...");
    println!("   Press Ctrl+C to stop\n");

    if let Err(e) = daemon.run() {
        eprintln!("\n❌ Daemon error: {}", e);
        std::process::exit(1);
    }
}
