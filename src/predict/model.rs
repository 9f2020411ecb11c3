/// Trained-model scoring strategy.
///
/// Wraps the classifier artifact (flood probability) and, when present,
/// the regression artifact (hours to flood). Any failure — missing file,
/// malformed JSON, dimension drift between artifact and feature vector —
/// surfaces as a `StrategyError` so the `Predictor` falls through to the
/// heuristic; model problems are never the caller's problem.

use std::path::Path;

use crate::model::{FeatureVector, MODEL_FEATURE_COUNT};

use super::artifact::{ArtifactError, LinearArtifact, CLASSIFIER_FILE, REGRESSOR_FILE};
use super::{RiskScore, ScoringStrategy, StrategyError};

/// Probability above which the regression artifact is consulted for an
/// hours-to-flood estimate.
const REGRESSOR_PROBABILITY_FLOOR: f64 = 50.0;

pub struct ModelStrategy {
    classifier: LinearArtifact,
    regressor: Option<LinearArtifact>,
}

impl ModelStrategy {
    /// Loads artifacts from a model directory.
    ///
    /// The classifier is required. A missing regressor file is normal
    /// (the regressor can only be trained once flood outcomes exist) and
    /// leaves ETA estimation to the heuristic clamp; a present-but-broken
    /// regressor is reported and likewise skipped.
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        let classifier = LinearArtifact::load(&dir.join(CLASSIFIER_FILE))?;

        let regressor_path = dir.join(REGRESSOR_FILE);
        let regressor = if regressor_path.exists() {
            match LinearArtifact::load(&regressor_path) {
                Ok(artifact) => Some(artifact),
                Err(e) => {
                    eprintln!("⚠ Regression artifact unusable ({}), skipping ETA model", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self { classifier, regressor })
    }

    /// Builds a strategy from already-loaded artifacts (tests, training).
    pub fn from_artifacts(classifier: LinearArtifact, regressor: Option<LinearArtifact>) -> Self {
        Self { classifier, regressor }
    }
}

impl ScoringStrategy for ModelStrategy {
    fn name(&self) -> &'static str {
        "model"
    }

    fn score(&self, features: &FeatureVector) -> Result<RiskScore, StrategyError> {
        let input = features.to_model_input();
        if input.len() != MODEL_FEATURE_COUNT {
            return Err(StrategyError(format!(
                "feature vector has {} entries, expected {}",
                input.len(),
                MODEL_FEATURE_COUNT
            )));
        }

        let probability = self
            .classifier
            .predict_proba(&input)
            .map_err(|e| StrategyError(format!("classifier: {}", e)))?
            * 100.0;

        let hours_to_flood = if probability > REGRESSOR_PROBABILITY_FLOOR {
            match &self.regressor {
                Some(regressor) => match regressor.predict(&input) {
                    Ok(hours) => Some(hours.max(0.0)),
                    Err(e) => {
                        // A broken regressor degrades the estimate, not the score.
                        eprintln!("⚠ ETA regressor failed: {}", e);
                        None
                    }
                },
                None => None,
            }
        } else {
            None
        };

        Ok(RiskScore { probability, hours_to_flood })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::artifact::FeatureScaler;

    fn scaler() -> FeatureScaler {
        FeatureScaler {
            means: vec![0.0; MODEL_FEATURE_COUNT],
            stds: vec![1.0; MODEL_FEATURE_COUNT],
        }
    }

    /// A classifier whose decision depends only on the 24h rainfall column.
    fn rain_sensitive_classifier(weight: f64, intercept: f64) -> LinearArtifact {
        let mut weights = vec![0.0; MODEL_FEATURE_COUNT];
        weights[0] = weight;
        LinearArtifact {
            scaler: scaler(),
            weights,
            intercept,
            feature_count: MODEL_FEATURE_COUNT,
        }
    }

    #[test]
    fn test_score_scales_probability_to_percent() {
        // Intercept 0, zero features -> sigmoid(0) = 0.5 -> 50%.
        let strategy = ModelStrategy::from_artifacts(rain_sensitive_classifier(1.0, 0.0), None);
        let features = FeatureVector::empty(6, 160);
        let mut f = features.clone();
        f.soil_saturation = 0.0;

        let score = strategy.score(&f).unwrap();
        assert!((score.probability - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_regressor_consulted_only_above_floor() {
        let regressor = LinearArtifact {
            scaler: scaler(),
            weights: vec![0.0; MODEL_FEATURE_COUNT],
            intercept: 12.0,
            feature_count: MODEL_FEATURE_COUNT,
        };

        let mut f = FeatureVector::empty(6, 160);
        f.soil_saturation = 0.0;

        // Strong positive intercept -> probability near 100 -> regressor used.
        let strategy = ModelStrategy::from_artifacts(
            rain_sensitive_classifier(0.0, 10.0),
            Some(regressor.clone()),
        );
        assert_eq!(strategy.score(&f).unwrap().hours_to_flood, Some(12.0));

        // Strong negative intercept -> probability near 0 -> regressor idle.
        let strategy = ModelStrategy::from_artifacts(
            rain_sensitive_classifier(0.0, -10.0),
            Some(regressor),
        );
        assert_eq!(strategy.score(&f).unwrap().hours_to_flood, None);
    }

    #[test]
    fn test_regressor_output_clamped_non_negative() {
        let regressor = LinearArtifact {
            scaler: scaler(),
            weights: vec![0.0; MODEL_FEATURE_COUNT],
            intercept: -3.0,
            feature_count: MODEL_FEATURE_COUNT,
        };
        let strategy = ModelStrategy::from_artifacts(
            rain_sensitive_classifier(0.0, 10.0),
            Some(regressor),
        );
        let f = FeatureVector::empty(6, 160);
        assert_eq!(strategy.score(&f).unwrap().hours_to_flood, Some(0.0));
    }

    #[test]
    fn test_dimension_drift_is_a_strategy_error() {
        // Artifact fitted on a different feature count than the live vector.
        let classifier = LinearArtifact {
            scaler: FeatureScaler {
                means: vec![0.0; 4],
                stds: vec![1.0; 4],
            },
            weights: vec![0.0; 4],
            intercept: 0.0,
            feature_count: 4,
        };
        let strategy = ModelStrategy::from_artifacts(classifier, None);
        let f = FeatureVector::empty(6, 160);
        assert!(strategy.score(&f).is_err());
    }

    #[test]
    fn test_load_from_missing_directory_fails() {
        let missing = Path::new("/nonexistent/floodrisk/models");
        assert!(ModelStrategy::load(missing).is_err());
    }
}
