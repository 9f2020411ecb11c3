/// Alerting layer: threshold evaluation and alert persistence.

pub mod thresholds;
