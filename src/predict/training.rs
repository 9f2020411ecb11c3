/// Model fitting routines used by the training binary.
///
/// Both artifacts are linear models fitted by batch gradient descent over
/// standardized features: logistic loss for the flood classifier, squared
/// loss for the hours-to-flood regressor. Deliberately small — the feature
/// space is thirteen columns and retraining happens offline from a labeled
/// CSV, so convergence speed is not a concern.

use ndarray::{Array1, Array2, Axis};

use super::artifact::{sigmoid, FeatureScaler, LinearArtifact};

/// Gradient descent parameters.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub learning_rate: f64,
    pub max_iter: usize,
    /// Stop once the cost improves by less than this between iterations.
    pub tolerance: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            max_iter: 2000,
            tolerance: 1e-8,
        }
    }
}

// ---------------------------------------------------------------------------
// Scaling
// ---------------------------------------------------------------------------

/// Fits standardization parameters column-wise on the training matrix.
pub fn fit_scaler(x: &Array2<f64>) -> FeatureScaler {
    let means = x
        .mean_axis(Axis(0))
        .map(|m| m.to_vec())
        .unwrap_or_else(|| vec![0.0; x.ncols()]);
    let stds = x.std_axis(Axis(0), 0.0).to_vec();
    FeatureScaler { means, stds }
}

/// Standardizes every row of `x` with the fitted scaler. Constant columns
/// (zero std) are centered but not divided.
pub fn apply_scaler(scaler: &FeatureScaler, x: &Array2<f64>) -> Array2<f64> {
    let mut scaled = x.clone();
    for (j, mut column) in scaled.axis_iter_mut(Axis(1)).enumerate() {
        let mean = scaler.means[j];
        let std = if scaler.stds[j] > 0.0 { scaler.stds[j] } else { 1.0 };
        column.mapv_inplace(|v| (v - mean) / std);
    }
    scaled
}

// ---------------------------------------------------------------------------
// Fitting
// ---------------------------------------------------------------------------

/// Fits logistic regression on standardized features.
/// `y` must contain 0.0 / 1.0 labels.
pub fn fit_logistic(x: &Array2<f64>, y: &Array1<f64>, config: &TrainConfig) -> (Array1<f64>, f64) {
    let n_samples = x.nrows() as f64;
    let mut weights = Array1::<f64>::zeros(x.ncols());
    let mut bias = 0.0;
    let mut prev_cost = f64::INFINITY;

    for _ in 0..config.max_iter {
        let linear = x.dot(&weights) + bias;
        let predictions = linear.mapv(sigmoid);
        let errors = &predictions - y;

        let gradient = x.t().dot(&errors) / n_samples;
        weights.scaled_add(-config.learning_rate, &gradient);
        bias -= config.learning_rate * errors.sum() / n_samples;

        let cost = log_loss(y, &predictions);
        if (prev_cost - cost).abs() < config.tolerance {
            break;
        }
        prev_cost = cost;
    }

    (weights, bias)
}

/// Fits ordinary least squares by gradient descent on standardized features.
pub fn fit_linear(x: &Array2<f64>, y: &Array1<f64>, config: &TrainConfig) -> (Array1<f64>, f64) {
    let n_samples = x.nrows() as f64;
    let mut weights = Array1::<f64>::zeros(x.ncols());
    let mut bias = 0.0;
    let mut prev_cost = f64::INFINITY;

    for _ in 0..config.max_iter {
        let predictions = x.dot(&weights) + bias;
        let errors = &predictions - y;

        let gradient = x.t().dot(&errors) / n_samples;
        weights.scaled_add(-config.learning_rate, &gradient);
        bias -= config.learning_rate * errors.sum() / n_samples;

        let cost = mean_squared_error(y, &predictions);
        if (prev_cost - cost).abs() < config.tolerance {
            break;
        }
        prev_cost = cost;
    }

    (weights, bias)
}

/// Fits scaler + logistic coefficients and packages them as an artifact.
pub fn train_classifier(x: &Array2<f64>, y: &Array1<f64>, config: &TrainConfig) -> LinearArtifact {
    let scaler = fit_scaler(x);
    let scaled = apply_scaler(&scaler, x);
    let (weights, intercept) = fit_logistic(&scaled, y, config);
    LinearArtifact {
        feature_count: x.ncols(),
        weights: weights.to_vec(),
        intercept,
        scaler,
    }
}

/// Fits scaler + linear coefficients and packages them as an artifact.
pub fn train_regressor(x: &Array2<f64>, y: &Array1<f64>, config: &TrainConfig) -> LinearArtifact {
    let scaler = fit_scaler(x);
    let scaled = apply_scaler(&scaler, x);
    let (weights, intercept) = fit_linear(&scaled, y, config);
    LinearArtifact {
        feature_count: x.ncols(),
        weights: weights.to_vec(),
        intercept,
        scaler,
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Binary cross-entropy with probability clipping.
pub fn log_loss(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let eps = 1e-15;
    let n = y_true.len() as f64;

    -y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&y, &p)| {
            let p = p.clamp(eps, 1.0 - eps);
            y * p.ln() + (1.0 - y) * (1.0 - p).ln()
        })
        .sum::<f64>()
        / n
}

pub fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / n
}

/// Fraction of labels predicted correctly at the 0.5 threshold.
pub fn accuracy(y_true: &Array1<f64>, probabilities: &Array1<f64>) -> f64 {
    let correct = y_true
        .iter()
        .zip(probabilities.iter())
        .filter(|&(&y, &p)| (p >= 0.5) == (y >= 0.5))
        .count();
    correct as f64 / y_true.len() as f64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
