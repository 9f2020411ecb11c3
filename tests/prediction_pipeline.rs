/// Integration tests for the prediction pipeline
///
/// These tests exercise the full pure path without a database:
/// 1. Weather payload → parsed conditions → sensor readings
/// 2. Readings → windowed aggregates → feature vector
/// 3. Feature vector → strategy chain → prediction result
///
/// The model-failure tests verify the fallback contract: a predictor
/// whose artifacts are missing or broken must produce exactly the same
/// result as direct heuristic invocation with identical inputs.

use chrono::{TimeZone, Utc};

use floodrisk_service::analysis::features::{
    assemble_features, resolve_filter, RawAggregates, WindowStats,
};
use floodrisk_service::model::{FeatureVector, MODEL_FEATURE_COUNT};
use floodrisk_service::predict::artifact::{
    FeatureScaler, LinearArtifact, CLASSIFIER_FILE,
};
use floodrisk_service::predict::{PredictionConfig, Predictor};

fn fixed_now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 3, 6, 0, 0).unwrap()
}

fn monsoon_aggregates() -> RawAggregates {
    // A wet 72 hours in a riverside municipality: steady rain with a
    // rising stage. Values are mm per hourly observation.
    let rain_last_24: Vec<f64> = vec![2.5; 24]; // 60mm
    let rain_25_to_48: Vec<f64> = vec![1.25; 24]; // 30mm
    let rain_49_to_72: Vec<f64> = vec![1.25; 24]; // 30mm

    let rain_24h: Vec<f64> = rain_last_24.clone();
    let rain_48h: Vec<f64> = [rain_last_24.clone(), rain_25_to_48.clone()].concat();
    let rain_72h: Vec<f64> = [rain_48h.clone(), rain_49_to_72.clone()].concat();

    RawAggregates {
        rainfall_24h: WindowStats::from_values(&rain_24h),
        rainfall_48h: WindowStats::from_values(&rain_48h),
        rainfall_72h: WindowStats::from_values(&rain_72h),
        rainfall_7d: WindowStats::from_values(&rain_72h),
        water_level_latest: Some(1.6),
        water_level_24h: WindowStats::from_values(&[1.3, 1.45, 1.6]),
        water_level_prev_24h: WindowStats::from_values(&[0.9, 1.0, 1.1]),
        humidity_24h: WindowStats::from_values(&[93.0, 95.0, 97.0]),
        temperature_24h: WindowStats::from_values(&[26.0, 27.0, 28.0]),
    }
}

// ---------------------------------------------------------------------------
// Aggregation → features
// ---------------------------------------------------------------------------

#[test]
fn test_monsoon_aggregates_assemble_into_expected_features() {
    let (_, location) = resolve_filter(Some("Santa"), None);
    let features = assemble_features(&monsoon_aggregates(), location, fixed_now());

    assert!((features.rainfall_24h - 60.0).abs() < 1e-9);
    assert!((features.rainfall_72h - 120.0).abs() < 1e-9);
    assert_eq!(features.water_level, 1.6);
    assert!((features.water_level_change_24h - 0.45).abs() < 1e-9);
    assert_eq!(features.humidity, 95.0);
    assert_eq!(features.elevation_m, 4.0, "registry context flows through");
    assert_eq!(features.historical_floods_count, 11);
    assert_eq!(features.to_model_input().len(), MODEL_FEATURE_COUNT);
}

#[test]
fn test_sparse_coverage_never_errors_and_scores_low() {
    // No sensors reported at all: zero features, low probability, no crash.
    let empty = RawAggregates {
        rainfall_24h: WindowStats::empty(),
        rainfall_48h: WindowStats::empty(),
        rainfall_72h: WindowStats::empty(),
        rainfall_7d: WindowStats::empty(),
        water_level_latest: None,
        water_level_24h: WindowStats::empty(),
        water_level_prev_24h: WindowStats::empty(),
        humidity_24h: WindowStats::empty(),
        temperature_24h: WindowStats::empty(),
    };
    let features = assemble_features(&empty, None, fixed_now());
    let result = Predictor::heuristic_only(PredictionConfig::default())
        .predict(&features, fixed_now());

    assert_eq!(result.probability, 0);
    assert_eq!(result.severity_level, 0);
    assert_eq!(result.severity, "Normal");
    assert!(result.hours_to_flood.is_none());
}

// ---------------------------------------------------------------------------
// Documented scoring examples
// ---------------------------------------------------------------------------

#[test]
fn test_moderate_rain_scores_advisory() {
    // 60mm in 24h and nothing else: only the top rainfall tier fires.
    let mut features = FeatureVector::empty(8, 215);
    features.soil_saturation = 0.0;
    features.rainfall_24h = 60.0;

    let result = Predictor::heuristic_only(PredictionConfig::default())
        .predict(&features, fixed_now());

    assert_eq!(result.probability, 30);
    assert_eq!(result.severity_level, 1);
    assert_eq!(result.severity, "Advisory");
    assert_eq!(result.impact, "No significant flooding expected.");
}

#[test]
fn test_saturated_signals_score_catastrophic() {
    let mut features = FeatureVector::empty(8, 215);
    features.rainfall_24h = 60.0;
    features.rainfall_72h = 120.0;
    features.water_level = 1.6;
    features.humidity = 95.0;

    let result = Predictor::heuristic_only(PredictionConfig::default())
        .predict(&features, fixed_now());

    // 30 + 25 + 30 + 15 = 100
    assert_eq!(result.probability, 100);
    assert_eq!(result.severity_level, 5);
    assert_eq!(result.severity, "Catastrophic");
    assert!(result.impact.contains("evacuation"));
    assert!(!result.contributing_factors.is_empty());
}

#[test]
fn test_full_pipeline_from_aggregates_to_result() {
    let (_, location) = resolve_filter(Some("Santa"), None);
    let features = assemble_features(&monsoon_aggregates(), location, fixed_now());
    let result = Predictor::heuristic_only(PredictionConfig::default())
        .predict(&features, fixed_now());

    // 60mm/24h (30) + 120mm/72h (25) + 1.6m (30) + 95% (15) = 100
    assert_eq!(result.probability, 100);
    assert_eq!(result.severity_level, 5);

    let hours = result.hours_to_flood.expect("gate met with active rain");
    assert!((1.0..=48.0).contains(&hours));

    // Santa floods often; the factor list should say so.
    assert!(result
        .contributing_factors
        .iter()
        .any(|f| f.contains("history of frequent flooding")));
}

// ---------------------------------------------------------------------------
// Probability and ETA properties
// ---------------------------------------------------------------------------

#[test]
fn test_probability_bounded_over_input_grid() {
    let predictor = Predictor::heuristic_only(PredictionConfig::default());

    for rain_24 in [0.0, 10.0, 60.0, 400.0] {
        for rain_72 in [0.0, 50.0, 300.0] {
            for level in [0.0, 0.8, 2.5] {
                for humidity in [0.0, 70.0, 100.0] {
                    let mut features = FeatureVector::empty(8, 215);
                    features.rainfall_24h = rain_24;
                    features.rainfall_72h = rain_72;
                    features.water_level = level;
                    features.humidity = humidity;

                    let result = predictor.predict(&features, fixed_now());
                    assert!(result.probability <= 100);

                    if let Some(hours) = result.hours_to_flood {
                        assert!(
                            (1.0..=48.0).contains(&hours),
                            "hours out of range: {}",
                            hours
                        );
                        assert!(result.probability >= 60, "ETA surfaced below the gate");
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Fallback contract
// ---------------------------------------------------------------------------

fn wet_features() -> FeatureVector {
    let mut features = FeatureVector::empty(8, 215);
    features.rainfall_24h = 55.0;
    features.rainfall_72h = 80.0;
    features.water_level = 1.1;
    features.humidity = 88.0;
    features
}

#[test]
fn test_missing_artifacts_fall_back_to_heuristic_equivalence() {
    let heuristic_predictor = Predictor::heuristic_only(PredictionConfig::default());

    let mut config = PredictionConfig::default();
    config.model_dir = "/nonexistent/floodrisk/models".to_string();
    let degraded_predictor = Predictor::from_config(config);

    let features = wet_features();
    let now = fixed_now();

    let expected = heuristic_predictor.predict(&features, now);
    let actual = degraded_predictor.predict(&features, now);

    assert_eq!(
        serde_json::to_value(&actual).unwrap(),
        serde_json::to_value(&expected).unwrap(),
        "missing artifacts must reproduce the heuristic result exactly"
    );
    assert_eq!(actual.strategy, "heuristic");
}

#[test]
fn test_malformed_artifact_falls_back_to_heuristic_equivalence() {
    let dir = std::env::temp_dir().join("floodrisk_malformed_artifact");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(CLASSIFIER_FILE), "{ not valid json").unwrap();

    let mut config = PredictionConfig::default();
    config.model_dir = dir.to_string_lossy().into_owned();
    let degraded_predictor = Predictor::from_config(config.clone());

    let features = wet_features();
    let now = fixed_now();

    let expected = Predictor::heuristic_only(config).predict(&features, now);
    let actual = degraded_predictor.predict(&features, now);

    assert_eq!(
        serde_json::to_value(&actual).unwrap(),
        serde_json::to_value(&expected).unwrap()
    );

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_wrong_dimension_artifact_falls_back_at_score_time() {
    // A structurally valid artifact fitted on the wrong feature count
    // loads fine but must fail at scoring time and fall through.
    let dir = std::env::temp_dir().join("floodrisk_wrong_dim_artifact");
    std::fs::create_dir_all(&dir).unwrap();

    let stale = LinearArtifact {
        scaler: FeatureScaler {
            means: vec![0.0; 4],
            stds: vec![1.0; 4],
        },
        weights: vec![0.1; 4],
        intercept: 0.0,
        feature_count: 4,
    };
    stale.save(&dir.join(CLASSIFIER_FILE)).unwrap();

    let mut config = PredictionConfig::default();
    config.model_dir = dir.to_string_lossy().into_owned();
    let degraded_predictor = Predictor::from_config(config.clone());

    let features = wet_features();
    let now = fixed_now();

    let expected = Predictor::heuristic_only(config).predict(&features, now);
    let actual = degraded_predictor.predict(&features, now);

    assert_eq!(actual.strategy, "heuristic");
    assert_eq!(
        serde_json::to_value(&actual).unwrap(),
        serde_json::to_value(&expected).unwrap()
    );

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_healthy_artifact_takes_precedence_over_heuristic() {
    let dir = std::env::temp_dir().join("floodrisk_healthy_artifact");
    std::fs::create_dir_all(&dir).unwrap();

    // Weights of zero with a positive intercept: always predicts
    // sigmoid(2.0) ≈ 88% regardless of input.
    let classifier = LinearArtifact {
        scaler: FeatureScaler {
            means: vec![0.0; MODEL_FEATURE_COUNT],
            stds: vec![1.0; MODEL_FEATURE_COUNT],
        },
        weights: vec![0.0; MODEL_FEATURE_COUNT],
        intercept: 2.0,
        feature_count: MODEL_FEATURE_COUNT,
    };
    classifier.save(&dir.join(CLASSIFIER_FILE)).unwrap();

    let mut config = PredictionConfig::default();
    config.model_dir = dir.to_string_lossy().into_owned();
    let predictor = Predictor::from_config(config);

    let result = predictor.predict(&wet_features(), fixed_now());
    assert_eq!(result.strategy, "model");
    assert_eq!(result.probability, 88);
    assert_eq!(result.severity_level, 4);
    // No regressor artifact and the heuristic didn't run: no ETA.
    assert!(result.hours_to_flood.is_none());

    std::fs::remove_dir_all(&dir).ok();
}
