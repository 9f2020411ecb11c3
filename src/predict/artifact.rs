/// Trained model artifacts.
///
/// An artifact is a JSON document holding a fitted feature scaler plus
/// linear coefficients — the classifier reads it through a sigmoid, the
/// regressor reads it raw. Artifacts are produced by `bin/train_model`
/// and loaded lazily by `ModelStrategy`; nothing in this module touches
/// the database or the network.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

/// Classifier artifact filename inside the model directory.
pub const CLASSIFIER_FILE: &str = "flood_classifier.json";
/// Hours-to-flood regressor artifact filename.
pub const REGRESSOR_FILE: &str = "flood_eta_regressor.json";

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("artifact not readable: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("artifact inconsistent: {0}")]
    Inconsistent(String),

    #[error("feature dimension mismatch: artifact expects {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

// ---------------------------------------------------------------------------
// Feature scaling
// ---------------------------------------------------------------------------

/// Standardization parameters fitted on the training set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl FeatureScaler {
    /// Standardizes one input row. A zero or negative fitted std (constant
    /// training column) passes the centered value through unscaled.
    pub fn transform(&self, input: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        if input.len() != self.means.len() {
            return Err(ArtifactError::DimensionMismatch {
                expected: self.means.len(),
                got: input.len(),
            });
        }

        Ok(input
            .iter()
            .zip(self.means.iter().zip(self.stds.iter()))
            .map(|(&x, (&mean, &std))| {
                let divisor = if std > 0.0 { std } else { 1.0 };
                (x - mean) / divisor
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Linear artifact
// ---------------------------------------------------------------------------

/// A fitted linear model over standardized features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearArtifact {
    pub scaler: FeatureScaler,
    pub weights: Vec<f64>,
    pub intercept: f64,
    /// Feature order fingerprint; checked against the live feature count.
    pub feature_count: usize,
}

impl LinearArtifact {
    /// Loads and validates an artifact from disk.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let file = File::open(path)?;
        let artifact: LinearArtifact = serde_json::from_reader(BufReader::new(file))?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Writes the artifact as pretty JSON (stable diffs under version control).
    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        self.validate()?;
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if self.weights.len() != self.feature_count
            || self.scaler.means.len() != self.feature_count
            || self.scaler.stds.len() != self.feature_count
        {
            return Err(ArtifactError::Inconsistent(format!(
                "feature_count {} does not match weights ({}) / scaler ({})",
                self.feature_count,
                self.weights.len(),
                self.scaler.means.len()
            )));
        }
        if self.weights.iter().any(|w| !w.is_finite()) || !self.intercept.is_finite() {
            return Err(ArtifactError::Inconsistent(
                "non-finite coefficients".to_string(),
            ));
        }
        Ok(())
    }

    /// Linear decision value over standardized features.
    pub fn decision(&self, input: &[f64]) -> Result<f64, ArtifactError> {
        let scaled = self.scaler.transform(input)?;
        let dot: f64 = scaled.iter().zip(self.weights.iter()).map(|(x, w)| x * w).sum();
        Ok(dot + self.intercept)
    }

    /// Classifier readout: P(flood) in [0, 1].
    pub fn predict_proba(&self, input: &[f64]) -> Result<f64, ArtifactError> {
        Ok(sigmoid(self.decision(input)?))
    }

    /// Regressor readout: raw linear value.
    pub fn predict(&self, input: &[f64]) -> Result<f64, ArtifactError> {
        self.decision(input)
    }
}

/// Numerically stable logistic function.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let exp_z = z.exp();
        exp_z / (1.0 + exp_z)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
