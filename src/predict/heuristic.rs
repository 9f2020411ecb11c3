/// Tiered additive flood scoring.
///
/// Four signals — 24h rainfall, 72h rainfall, current water level, and
/// humidity standing in for soil saturation — each contribute the points
/// of the highest tier they satisfy. The sum, capped at 100, is the flood
/// probability. The hours-to-flood estimate is a crude linear proxy
/// (rainfall rate times a fixed rise conversion), kept exactly as the
/// deployed rules define it.

use crate::model::FeatureVector;

use super::{PredictionConfig, RiskScore, ScoringStrategy, StrategyError};

/// The formula-based strategy. Infallible; closes every strategy chain.
pub struct HeuristicStrategy {
    config: PredictionConfig,
}

impl HeuristicStrategy {
    pub fn new(config: PredictionConfig) -> Self {
        Self { config }
    }
}

impl ScoringStrategy for HeuristicStrategy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn score(&self, features: &FeatureVector) -> Result<RiskScore, StrategyError> {
        Ok(score(features, &self.config))
    }
}

/// Computes the heuristic risk score. Pure: no clock, no I/O.
pub fn score(features: &FeatureVector, config: &PredictionConfig) -> RiskScore {
    let points = config.rainfall_24h_tiers.points_for(features.rainfall_24h)
        + config.rainfall_72h_tiers.points_for(features.rainfall_72h)
        + config.water_level_tiers.points_for(features.water_level)
        + config.humidity_tiers.points_for(features.humidity);

    let probability = points.min(100) as f64;
    let hours_to_flood = estimate_hours_to_flood(features, probability, config);

    RiskScore { probability, hours_to_flood }
}

/// Linear hours-to-flood proxy, computed only at or above the probability
/// gate:
///
/// ```text
/// level_difference = max(0, target_flood_level - water_level)
/// rise_rate        = (rainfall_24h / 24) * rainfall_to_rise_factor
/// hours            = clamp(level_difference / rise_rate, min, max)
/// ```
///
/// Returns `None` when the rise rate is not positive — with no rain there
/// is no defensible estimate.
pub fn estimate_hours_to_flood(
    features: &FeatureVector,
    probability: f64,
    config: &PredictionConfig,
) -> Option<f64> {
    if probability < config.eta_probability_gate {
        return None;
    }

    let level_difference = (config.target_flood_level_m - features.water_level).max(0.0);
    let rainfall_rate = features.rainfall_24h / 24.0;
    let rise_rate = rainfall_rate * config.rainfall_to_rise_factor;

    if rise_rate <= 0.0 {
        return None;
    }

    Some((level_difference / rise_rate).clamp(config.eta_min_hours, config.eta_max_hours))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> FeatureVector {
        let mut f = FeatureVector::empty(7, 190);
        f.soil_saturation = 0.0;
        f
    }

    #[test]
    fn test_single_tier_rainfall_only() {
        // 60mm in 24h fires only the top rainfall tier: 30 points.
        let mut f = features();
        f.rainfall_24h = 60.0;
        let result = score(&f, &PredictionConfig::default());
        assert_eq!(result.probability, 30.0);
        assert!(result.hours_to_flood.is_none(), "below the ETA gate");
    }

    #[test]
    fn test_all_signals_maxed_caps_at_100() {
        let mut f = features();
        f.rainfall_24h = 60.0;
        f.rainfall_72h = 120.0;
        f.water_level = 1.6;
        f.humidity = 95.0;
        let result = score(&f, &PredictionConfig::default());
        // 30 + 25 + 30 + 15 = 100, capped.
        assert_eq!(result.probability, 100.0);
    }

    #[test]
    fn test_probability_monotone_in_each_signal() {
        let config = PredictionConfig::default();
        let base = {
            let mut f = features();
            f.rainfall_24h = 20.0;
            f.rainfall_72h = 40.0;
            f.water_level = 0.7;
            f.humidity = 65.0;
            f
        };
        let base_probability = score(&base, &config).probability;

        for step in [1.0, 10.0, 40.0, 100.0] {
            let mut f = base.clone();
            f.rainfall_24h += step;
            assert!(score(&f, &config).probability >= base_probability);

            let mut f = base.clone();
            f.rainfall_72h += step;
            assert!(score(&f, &config).probability >= base_probability);

            let mut f = base.clone();
            f.water_level += step / 10.0;
            assert!(score(&f, &config).probability >= base_probability);

            let mut f = base.clone();
            f.humidity = (f.humidity + step).min(100.0);
            assert!(score(&f, &config).probability >= base_probability);
        }
    }

    #[test]
    fn test_zero_inputs_score_zero() {
        let result = score(&features(), &PredictionConfig::default());
        assert_eq!(result.probability, 0.0);
        assert!(result.hours_to_flood.is_none());
    }

    #[test]
    fn test_eta_present_and_clamped_when_gate_met() {
        let config = PredictionConfig::default();
        let mut f = features();
        f.rainfall_24h = 60.0;
        f.rainfall_72h = 120.0;
        f.water_level = 0.2;
        f.humidity = 95.0;

        let result = score(&f, &config);
        assert!(result.probability >= config.eta_probability_gate);

        let hours = result.hours_to_flood.expect("gate met and rain falling");
        assert!((config.eta_min_hours..=config.eta_max_hours).contains(&hours));

        // level_difference = 1.6, rise_rate = (60/24) * 0.02 = 0.05 m/h
        // => 32 hours, inside the clamp range.
        assert!((hours - 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_eta_none_when_no_rain_even_at_high_probability() {
        let config = PredictionConfig::default();
        let mut f = features();
        // Water level and humidity alone can clear the gate with zero rain.
        f.water_level = 1.6;
        f.humidity = 95.0;
        f.rainfall_72h = 120.0;

        let result = score(&f, &config);
        assert!(result.probability >= config.eta_probability_gate);
        assert!(result.hours_to_flood.is_none(), "rise rate is zero without 24h rainfall");
    }

    #[test]
    fn test_eta_clamps_to_minimum_when_water_already_at_target() {
        let config = PredictionConfig::default();
        let mut f = features();
        f.rainfall_24h = 60.0;
        f.rainfall_72h = 120.0;
        f.water_level = 2.5; // already past the target level
        f.humidity = 95.0;

        let hours = score(&f, &config).hours_to_flood.expect("raining hard");
        assert_eq!(hours, config.eta_min_hours);
    }
}
