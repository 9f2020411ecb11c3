/// Per-parameter threshold alerting.
///
/// Every warehoused reading is checked against its parameter's five-step
/// threshold ladder (Advisory..Catastrophic). Comparisons are
/// `>=`-inclusive and the highest exceeded step wins. Alerts are
/// per-parameter, per-municipality: an existing active alert is raised in
/// place when a new reading exceeds its severity, and left untouched
/// otherwise — de-escalation is a human decision, not an automatic one.

use postgres::Client;

use crate::model::{SensorReading, SensorType, Severity};

// ---------------------------------------------------------------------------
// Threshold settings
// ---------------------------------------------------------------------------

/// Ascending alert thresholds for one sensor parameter, in that
/// parameter's unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdSettings {
    pub advisory: f64,
    pub watch: f64,
    pub warning: f64,
    pub emergency: f64,
    pub catastrophic: f64,
}

impl ThresholdSettings {
    /// Built-in thresholds per parameter.
    ///
    /// Rainfall follows the PAGASA rainfall advisory bands (mm observed
    /// per hour); wind speed follows the cyclone wind signal bands (km/h).
    /// Water level steps toward the assumed 1.8m flood level. Humidity and
    /// temperature carry no alert ladder of their own — they only feed the
    /// prediction pipeline.
    pub fn defaults_for(sensor_type: SensorType) -> Option<Self> {
        match sensor_type {
            SensorType::Rainfall => Some(Self {
                advisory: 7.5,
                watch: 15.0,
                warning: 30.0,
                emergency: 50.0,
                catastrophic: 75.0,
            }),
            SensorType::WaterLevel => Some(Self {
                advisory: 0.9,
                watch: 1.2,
                warning: 1.5,
                emergency: 1.8,
                catastrophic: 2.2,
            }),
            SensorType::WindSpeed => Some(Self {
                advisory: 39.0,
                watch: 62.0,
                warning: 89.0,
                emergency: 118.0,
                catastrophic: 185.0,
            }),
            SensorType::Humidity | SensorType::Temperature => None,
        }
    }

    /// The ladder must ascend or severity resolution is meaningless.
    pub fn is_ordered(&self) -> bool {
        self.advisory < self.watch
            && self.watch < self.warning
            && self.warning < self.emergency
            && self.emergency < self.catastrophic
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Alert produced by a threshold exceedance.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdAlert {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

/// Evaluates one reading against its parameter's thresholds. Returns
/// `None` below the advisory step.
pub fn check_reading(
    reading: &SensorReading,
    thresholds: &ThresholdSettings,
) -> Option<ThresholdAlert> {
    let severity = if reading.value >= thresholds.catastrophic {
        Severity::Catastrophic
    } else if reading.value >= thresholds.emergency {
        Severity::Emergency
    } else if reading.value >= thresholds.warning {
        Severity::Warning
    } else if reading.value >= thresholds.watch {
        Severity::Watch
    } else if reading.value >= thresholds.advisory {
        Severity::Advisory
    } else {
        return None;
    };

    let parameter = parameter_title(reading.sensor_type);
    Some(ThresholdAlert {
        severity,
        title: format!("{} Alert: {}", parameter, severity.label()),
        message: format!(
            "{} has reached {}{} in {}, which exceeds the {} threshold.",
            parameter,
            reading.value,
            reading.sensor_type.unit(),
            reading.municipality,
            severity.label()
        ),
    })
}

fn parameter_title(sensor_type: SensorType) -> &'static str {
    match sensor_type {
        SensorType::Rainfall => "Rainfall",
        SensorType::WaterLevel => "Water Level",
        SensorType::Humidity => "Humidity",
        SensorType::Temperature => "Temperature",
        SensorType::WindSpeed => "Wind Speed",
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Warehouses an alert with raise-in-place semantics.
///
/// If an active alert already exists for the same parameter and
/// municipality, it is updated only when the new severity is strictly
/// higher; otherwise a new alert row is inserted. Returns whether a row
/// was written.
pub fn upsert_alert(
    client: &mut Client,
    reading: &SensorReading,
    alert: &ThresholdAlert,
) -> Result<bool, postgres::Error> {
    let parameter = reading.sensor_type.as_str();
    let severity_level = alert.severity.level() as i32;

    let existing = client.query_opt(
        "SELECT id, severity_level
         FROM alerting.flood_alerts
         WHERE parameter = $1 AND municipality = $2 AND active
         ORDER BY issued_at DESC
         LIMIT 1",
        &[&parameter, &reading.municipality],
    )?;

    match existing {
        Some(row) => {
            let id: i32 = row.get(0);
            let current_level: i32 = row.get(1);
            if severity_level > current_level {
                client.execute(
                    "UPDATE alerting.flood_alerts
                     SET severity_level = $1, title = $2, description = $3, updated_at = now()
                     WHERE id = $4",
                    &[&severity_level, &alert.title, &alert.message, &id],
                )?;
                Ok(true)
            } else {
                Ok(false)
            }
        }
        None => {
            client.execute(
                "INSERT INTO alerting.flood_alerts
                 (parameter, municipality, severity_level, title, description, active)
                 VALUES ($1, $2, $3, $4, $5, true)",
                &[
                    &parameter,
                    &reading.municipality,
                    &severity_level,
                    &alert.title,
                    &alert.message,
                ],
            )?;
            Ok(true)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
