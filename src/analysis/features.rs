/// Feature aggregation over warehoused sensor readings.
///
/// Gathers windowed aggregate statistics (sum/avg/max/min) per sensor
/// type — 24h, 48h, 72h, and 7d lookbacks ending at the request time —
/// and assembles them into the `FeatureVector` the scoring strategies
/// consume. Sparse sensor coverage is expected: a window with no readings
/// aggregates to zeros, it never errors. Aggregation is read-only from
/// this module's perspective.

use chrono::{DateTime, Datelike, Duration, Utc};
use postgres::types::ToSql;
use postgres::Client;

use crate::locations::{find_location, Location};
use crate::model::{FeatureVector, SensorType};

// ---------------------------------------------------------------------------
// Window statistics
// ---------------------------------------------------------------------------

/// Aggregate statistics for one sensor type over one time window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub sum: f64,
    pub avg: f64,
    pub max: f64,
    pub min: f64,
    pub count: i64,
}

impl WindowStats {
    /// The zero aggregate an empty window produces.
    pub fn empty() -> Self {
        Self { sum: 0.0, avg: 0.0, max: 0.0, min: 0.0, count: 0 }
    }

    /// In-memory aggregation, used by tests and the seed tooling.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::empty();
        }
        let sum: f64 = values.iter().sum();
        Self {
            sum,
            avg: sum / values.len() as f64,
            max: values.iter().cloned().fold(f64::MIN, f64::max),
            min: values.iter().cloned().fold(f64::MAX, f64::min),
            count: values.len() as i64,
        }
    }
}

// ---------------------------------------------------------------------------
// Location filter
// ---------------------------------------------------------------------------

/// Optional municipality/barangay restriction on the aggregation queries.
#[derive(Debug, Clone, Default)]
pub struct LocationFilter {
    pub municipality: Option<String>,
    pub barangay: Option<String>,
}

/// Resolves request parameters into a filter plus registry context.
///
/// A municipality not present in the registry is ignored — the filter is
/// simply not applied and the prediction runs province-wide. Barangay
/// names are free-form in the readings table and pass through untouched.
pub fn resolve_filter(
    municipality: Option<&str>,
    barangay: Option<&str>,
) -> (LocationFilter, Option<&'static Location>) {
    let location = municipality.and_then(find_location);

    let filter = LocationFilter {
        municipality: location.map(|l| l.municipality.to_string()),
        barangay: location.and(barangay).map(|b| b.to_string()),
    };

    (filter, location)
}

// ---------------------------------------------------------------------------
// Database aggregation
// ---------------------------------------------------------------------------

/// Aggregates one sensor type over `(end - lookback, end]`.
/// An empty window yields `WindowStats::empty()`, not an error.
pub fn aggregate_window(
    client: &mut Client,
    sensor_type: SensorType,
    end: DateTime<Utc>,
    lookback: Duration,
    filter: &LocationFilter,
) -> Result<WindowStats, postgres::Error> {
    let start = end - lookback;
    let parameter = sensor_type.as_str();

    let mut query = String::from(
        "SELECT COALESCE(SUM(value), 0)::float8,
                COALESCE(AVG(value), 0)::float8,
                COALESCE(MAX(value), 0)::float8,
                COALESCE(MIN(value), 0)::float8,
                COUNT(*)
         FROM sensor_raw.readings
         WHERE parameter = $1
           AND reading_time > $2
           AND reading_time <= $3",
    );

    let mut params: Vec<&(dyn ToSql + Sync)> = vec![&parameter, &start, &end];
    if let Some(municipality) = &filter.municipality {
        query.push_str(&format!(" AND municipality = ${}", params.len() + 1));
        params.push(municipality);
    }
    if let Some(barangay) = &filter.barangay {
        query.push_str(&format!(" AND barangay = ${}", params.len() + 1));
        params.push(barangay);
    }

    let row = client.query_one(&query, &params)?;
    Ok(WindowStats {
        sum: row.get(0),
        avg: row.get(1),
        max: row.get(2),
        min: row.get(3),
        count: row.get(4),
    })
}

/// Most recent reading of a sensor type within the lookback, if any.
pub fn latest_value(
    client: &mut Client,
    sensor_type: SensorType,
    end: DateTime<Utc>,
    lookback: Duration,
    filter: &LocationFilter,
) -> Result<Option<f64>, postgres::Error> {
    let start = end - lookback;
    let parameter = sensor_type.as_str();

    let mut query = String::from(
        "SELECT value::float8
         FROM sensor_raw.readings
         WHERE parameter = $1
           AND reading_time > $2
           AND reading_time <= $3",
    );

    let mut params: Vec<&(dyn ToSql + Sync)> = vec![&parameter, &start, &end];
    if let Some(municipality) = &filter.municipality {
        query.push_str(&format!(" AND municipality = ${}", params.len() + 1));
        params.push(municipality);
    }
    if let Some(barangay) = &filter.barangay {
        query.push_str(&format!(" AND barangay = ${}", params.len() + 1));
        params.push(barangay);
    }
    query.push_str(" ORDER BY reading_time DESC LIMIT 1");

    let rows = client.query(&query, &params)?;
    Ok(rows.first().map(|row| row.get(0)))
}

// ---------------------------------------------------------------------------
// Feature vector assembly
// ---------------------------------------------------------------------------

/// Everything the assembly step needs, gathered in one read pass.
#[derive(Debug, Clone)]
pub struct RawAggregates {
    pub rainfall_24h: WindowStats,
    pub rainfall_48h: WindowStats,
    pub rainfall_72h: WindowStats,
    pub rainfall_7d: WindowStats,
    pub water_level_latest: Option<f64>,
    pub water_level_24h: WindowStats,
    /// Water level over the 24h window preceding the current one.
    pub water_level_prev_24h: WindowStats,
    pub humidity_24h: WindowStats,
    pub temperature_24h: WindowStats,
}

/// Queries all windows for a location filter in one pass.
pub fn gather_aggregates(
    client: &mut Client,
    now: DateTime<Utc>,
    filter: &LocationFilter,
) -> Result<RawAggregates, postgres::Error> {
    Ok(RawAggregates {
        rainfall_24h: aggregate_window(client, SensorType::Rainfall, now, Duration::hours(24), filter)?,
        rainfall_48h: aggregate_window(client, SensorType::Rainfall, now, Duration::hours(48), filter)?,
        rainfall_72h: aggregate_window(client, SensorType::Rainfall, now, Duration::hours(72), filter)?,
        rainfall_7d: aggregate_window(client, SensorType::Rainfall, now, Duration::days(7), filter)?,
        water_level_latest: latest_value(client, SensorType::WaterLevel, now, Duration::hours(24), filter)?,
        water_level_24h: aggregate_window(client, SensorType::WaterLevel, now, Duration::hours(24), filter)?,
        water_level_prev_24h: aggregate_window(
            client,
            SensorType::WaterLevel,
            now - Duration::hours(24),
            Duration::hours(24),
            filter,
        )?,
        humidity_24h: aggregate_window(client, SensorType::Humidity, now, Duration::hours(24), filter)?,
        temperature_24h: aggregate_window(client, SensorType::Temperature, now, Duration::hours(24), filter)?,
    })
}

/// Pure assembly of the feature vector from gathered aggregates and
/// registry context. Missing data produces zero/default features, so
/// callers tolerate sparse sensor coverage by construction.
pub fn assemble_features(
    aggregates: &RawAggregates,
    location: Option<&Location>,
    now: DateTime<Utc>,
) -> FeatureVector {
    let date = now.date_naive();

    // Level change only makes sense when both windows actually had data.
    let water_level_change_24h =
        if aggregates.water_level_24h.count > 0 && aggregates.water_level_prev_24h.count > 0 {
            aggregates.water_level_24h.avg - aggregates.water_level_prev_24h.avg
        } else {
            0.0
        };

    let has_rainfall_data = aggregates.rainfall_24h.count > 0 || aggregates.rainfall_48h.count > 0;

    FeatureVector {
        rainfall_24h: aggregates.rainfall_24h.sum,
        rainfall_48h: aggregates.rainfall_48h.sum,
        rainfall_72h: aggregates.rainfall_72h.sum,
        rainfall_7d: aggregates.rainfall_7d.sum,
        water_level: aggregates.water_level_latest.unwrap_or(0.0),
        water_level_change_24h,
        humidity: aggregates.humidity_24h.avg,
        temperature: aggregates.temperature_24h.avg,
        soil_saturation: estimate_soil_saturation(
            aggregates.rainfall_24h.sum,
            aggregates.rainfall_48h.sum,
            has_rainfall_data,
        ),
        elevation_m: location.map(|l| l.elevation_m).unwrap_or(0.0),
        historical_floods_count: location.map(|l| l.historical_floods_count).unwrap_or(0),
        month: date.month(),
        day_of_year: date.ordinal(),
    }
}

/// Builds the feature vector for a prediction request: resolve the
/// location, gather windows, assemble.
pub fn build_feature_vector(
    client: &mut Client,
    municipality: Option<&str>,
    barangay: Option<&str>,
    now: DateTime<Utc>,
) -> Result<FeatureVector, postgres::Error> {
    let (filter, location) = resolve_filter(municipality, barangay);
    let aggregates = gather_aggregates(client, now, &filter)?;
    Ok(assemble_features(&aggregates, location, now))
}

/// Soil saturation estimate from recent rainfall. Without any rainfall
/// data the estimate defaults to mid-range rather than bone-dry.
pub fn estimate_soil_saturation(rainfall_24h: f64, rainfall_48h: f64, has_data: bool) -> f64 {
    if !has_data {
        return 50.0;
    }
    ((rainfall_24h * 2.0 + rainfall_48h) / 3.0 * 10.0).clamp(0.0, 100.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn empty_aggregates() -> RawAggregates {
        RawAggregates {
            rainfall_24h: WindowStats::empty(),
            rainfall_48h: WindowStats::empty(),
            rainfall_72h: WindowStats::empty(),
            rainfall_7d: WindowStats::empty(),
            water_level_latest: None,
            water_level_24h: WindowStats::empty(),
            water_level_prev_24h: WindowStats::empty(),
            humidity_24h: WindowStats::empty(),
            temperature_24h: WindowStats::empty(),
        }
    }

    #[test]
    fn test_window_stats_from_values() {
        let stats = WindowStats::from_values(&[2.0, 4.0, 6.0]);
        assert_eq!(stats.sum, 12.0);
        assert_eq!(stats.avg, 4.0);
        assert_eq!(stats.max, 6.0);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.count, 3);
    }

    #[test]
    fn test_window_stats_empty_input() {
        assert_eq!(WindowStats::from_values(&[]), WindowStats::empty());
    }

    #[test]
    fn test_assemble_with_no_data_yields_defaults() {
        let now = Utc.with_ymd_and_hms(2026, 8, 3, 6, 0, 0).unwrap();
        let features = assemble_features(&empty_aggregates(), None, now);

        assert_eq!(features.rainfall_24h, 0.0);
        assert_eq!(features.water_level, 0.0);
        assert_eq!(features.water_level_change_24h, 0.0);
        assert_eq!(features.soil_saturation, 50.0, "no rainfall data -> mid-range estimate");
        assert_eq!(features.month, 8);
        assert_eq!(features.day_of_year, 215);
    }

    #[test]
    fn test_assemble_uses_registry_context() {
        let now = Utc.with_ymd_and_hms(2026, 8, 3, 6, 0, 0).unwrap();
        let location = find_location("Santa").unwrap();
        let features = assemble_features(&empty_aggregates(), Some(location), now);

        assert_eq!(features.elevation_m, 4.0);
        assert_eq!(features.historical_floods_count, 11);
    }

    #[test]
    fn test_level_change_requires_both_windows() {
        let now = Utc.with_ymd_and_hms(2026, 8, 3, 6, 0, 0).unwrap();

        let mut aggregates = empty_aggregates();
        aggregates.water_level_24h = WindowStats::from_values(&[1.2, 1.4]);
        // No readings in the preceding window: change stays zero.
        let features = assemble_features(&aggregates, None, now);
        assert_eq!(features.water_level_change_24h, 0.0);

        aggregates.water_level_prev_24h = WindowStats::from_values(&[0.8, 1.0]);
        let features = assemble_features(&aggregates, None, now);
        assert!((features.water_level_change_24h - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_soil_saturation_estimate() {
        // (10*2 + 10) / 3 * 10 = 100, clamped exactly at the ceiling.
        assert_eq!(estimate_soil_saturation(10.0, 10.0, true), 100.0);
        assert_eq!(estimate_soil_saturation(0.0, 0.0, true), 0.0);
        assert_eq!(estimate_soil_saturation(0.0, 0.0, false), 50.0);
        assert_eq!(estimate_soil_saturation(3.0, 3.0, true), 30.0);
    }

    #[test]
    fn test_resolve_filter_drops_unknown_municipality() {
        let (filter, location) = resolve_filter(Some("Nowhere City"), Some("Poblacion"));
        assert!(filter.municipality.is_none(), "unknown municipality is ignored");
        assert!(filter.barangay.is_none(), "barangay filter needs a resolved municipality");
        assert!(location.is_none());
    }

    #[test]
    fn test_resolve_filter_canonicalizes_known_municipality() {
        let (filter, location) = resolve_filter(Some("vigan city"), Some("Pagpandayan"));
        assert_eq!(filter.municipality.as_deref(), Some("Vigan City"));
        assert_eq!(filter.barangay.as_deref(), Some("Pagpandayan"));
        assert_eq!(location.unwrap().municipality, "Vigan City");
    }
}
