/// Flood probability prediction.
///
/// The cascading "try the trained model, fall back to the formula" pattern
/// is expressed as an ordered list of strategies sharing one contract
/// (`ScoringStrategy`): each takes a `FeatureVector` and returns a
/// `RiskScore` or an error. The `Predictor` tries them in order and the
/// heuristic closes the chain, so a prediction request can degrade but
/// never fail. Model artifacts are an explicit constructed dependency of
/// the `Predictor`, not module-level state.

pub mod artifact;
pub mod heuristic;
pub mod model;
pub mod training;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;

use crate::model::{FeatureVector, PredictionResult, Severity};
use self::heuristic::HeuristicStrategy;
use self::model::ModelStrategy;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// One scoring tier: values at or above `at_least` earn `points`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Tier {
    pub at_least: f64,
    pub points: u32,
}

/// Point tiers for a single heuristic signal. Comparisons are
/// `>=`-inclusive on the lower bound and the highest satisfied tier wins,
/// so a signal contributes at most one tier's points.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct TierTable {
    pub tiers: Vec<Tier>,
}

impl TierTable {
    pub fn points_for(&self, value: f64) -> u32 {
        self.tiers
            .iter()
            .filter(|t| value >= t.at_least)
            .max_by(|a, b| a.at_least.total_cmp(&b.at_least))
            .map(|t| t.points)
            .unwrap_or(0)
    }
}

/// Prediction constants.
///
/// The tier bounds and the rainfall-to-rise conversion are inherited from
/// the deployed scoring rules without a cited hydrological basis; they are
/// kept configurable rather than reinterpreted. Loaded from the
/// `[prediction]` section of `sensors.toml` when present, otherwise these
/// defaults apply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub rainfall_24h_tiers: TierTable,
    pub rainfall_72h_tiers: TierTable,
    pub water_level_tiers: TierTable,
    pub humidity_tiers: TierTable,

    /// Water level at which flooding is assumed to begin, in meters.
    pub target_flood_level_m: f64,
    /// Conversion from rainfall rate (mm/h) to water level rise (m/h).
    pub rainfall_to_rise_factor: f64,
    /// Minimum probability before an hours-to-flood estimate is surfaced.
    pub eta_probability_gate: f64,
    pub eta_min_hours: f64,
    pub eta_max_hours: f64,

    /// Directory containing trained model artifacts.
    pub model_dir: String,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            rainfall_24h_tiers: TierTable {
                tiers: vec![
                    Tier { at_least: 50.0, points: 30 },
                    Tier { at_least: 30.0, points: 20 },
                    Tier { at_least: 15.0, points: 10 },
                ],
            },
            rainfall_72h_tiers: TierTable {
                tiers: vec![
                    Tier { at_least: 100.0, points: 25 },
                    Tier { at_least: 60.0, points: 15 },
                    Tier { at_least: 30.0, points: 8 },
                ],
            },
            water_level_tiers: TierTable {
                tiers: vec![
                    Tier { at_least: 1.5, points: 30 },
                    Tier { at_least: 1.0, points: 20 },
                    Tier { at_least: 0.5, points: 10 },
                ],
            },
            humidity_tiers: TierTable {
                tiers: vec![
                    Tier { at_least: 90.0, points: 15 },
                    Tier { at_least: 75.0, points: 10 },
                    Tier { at_least: 60.0, points: 5 },
                ],
            },
            target_flood_level_m: 1.8,
            rainfall_to_rise_factor: 0.02,
            eta_probability_gate: 60.0,
            eta_min_hours: 1.0,
            eta_max_hours: 48.0,
            model_dir: "data/models".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Strategy contract
// ---------------------------------------------------------------------------

/// Uniform strategy output: a probability percentage and an optional
/// hours-to-flood estimate. The `Predictor` applies severity mapping,
/// the ETA gate, and clamping afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskScore {
    pub probability: f64,
    pub hours_to_flood: Option<f64>,
}

/// Why a strategy could not produce a score.
#[derive(Debug)]
pub struct StrategyError(pub String);

impl std::fmt::Display for StrategyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for StrategyError {}

/// A single flood-probability estimator. Implementations must be pure
/// with respect to their inputs: same features, same score.
pub trait ScoringStrategy {
    fn name(&self) -> &'static str;
    fn score(&self, features: &FeatureVector) -> Result<RiskScore, StrategyError>;
}

// ---------------------------------------------------------------------------
// Predictor
// ---------------------------------------------------------------------------

/// Ordered strategy list with a guaranteed heuristic floor.
pub struct Predictor {
    config: PredictionConfig,
    strategies: Vec<Box<dyn ScoringStrategy + Send + Sync>>,
}

impl Predictor {
    /// Heuristic scoring only. Used directly in tests and as the shape
    /// every other construction degrades to.
    pub fn heuristic_only(config: PredictionConfig) -> Self {
        let strategies: Vec<Box<dyn ScoringStrategy + Send + Sync>> =
            vec![Box::new(HeuristicStrategy::new(config.clone()))];
        Self { config, strategies }
    }

    /// Model strategy from `config.model_dir` with heuristic fallback.
    ///
    /// A missing or unreadable classifier artifact is logged and the
    /// predictor degrades to heuristic-only; construction never fails.
    pub fn from_config(config: PredictionConfig) -> Self {
        let mut strategies: Vec<Box<dyn ScoringStrategy + Send + Sync>> = Vec::new();

        match ModelStrategy::load(Path::new(&config.model_dir)) {
            Ok(strategy) => strategies.push(Box::new(strategy)),
            Err(e) => {
                eprintln!("⚠ Model artifacts unavailable ({}), using heuristic scoring", e);
            }
        }

        strategies.push(Box::new(HeuristicStrategy::new(config.clone())));
        Self { config, strategies }
    }

    /// Runs the strategy chain and assembles the final result.
    ///
    /// Strategies are tried in order; a failing strategy is logged and the
    /// next one is consulted. If every registered strategy fails, the
    /// heuristic formula is evaluated directly — a prediction request
    /// always returns a result.
    pub fn predict(&self, features: &FeatureVector, now: DateTime<Utc>) -> PredictionResult {
        for strategy in &self.strategies {
            match strategy.score(features) {
                Ok(score) => return self.finish(strategy.name(), score, features, now),
                Err(e) => {
                    eprintln!("⚠ Strategy '{}' failed: {} (falling back)", strategy.name(), e);
                }
            }
        }

        let score = heuristic::score(features, &self.config);
        self.finish("heuristic", score, features, now)
    }

    fn finish(
        &self,
        strategy: &str,
        score: RiskScore,
        features: &FeatureVector,
        now: DateTime<Utc>,
    ) -> PredictionResult {
        let probability = score.probability.clamp(0.0, 100.0);
        let severity = Severity::from_probability(probability);

        // The ETA gate applies to both strategies: an estimate from the
        // regression artifact is discarded below the gate.
        let hours_to_flood = if probability >= self.config.eta_probability_gate {
            score
                .hours_to_flood
                .map(|h| h.clamp(self.config.eta_min_hours, self.config.eta_max_hours))
        } else {
            None
        };

        PredictionResult {
            probability: probability as u8,
            severity_level: severity.level(),
            severity: severity.label().to_string(),
            impact: severity.impact().to_string(),
            hours_to_flood,
            contributing_factors: contributing_factors(features, probability),
            strategy: strategy.to_string(),
            generated_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// Contributing factors
// ---------------------------------------------------------------------------

/// Human-readable factors behind the score, matched against fixed
/// reporting thresholds. A high probability with no individually notable
/// signal gets a generic explanation rather than an empty list.
pub fn contributing_factors(features: &FeatureVector, probability: f64) -> Vec<String> {
    let mut factors = Vec::new();

    if features.rainfall_24h > 30.0 {
        factors.push(format!(
            "Heavy rainfall in the last 24 hours ({:.1}mm)",
            features.rainfall_24h
        ));
    }
    if features.water_level > 1.0 {
        factors.push(format!("Elevated water level ({:.2}m)", features.water_level));
    }
    if features.soil_saturation > 80.0 {
        factors.push("High soil saturation limiting water absorption".to_string());
    }
    if features.historical_floods_count > 3 {
        factors.push("Area has history of frequent flooding".to_string());
    }
    if factors.is_empty() && probability > 30.0 {
        factors.push("Multiple minor factors contributing to flood risk".to_string());
    }

    factors
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
