/// Test fixtures: representative JSON payloads from the Open-Meteo API.
///
/// These fixtures are structurally complete but truncated to the minimum
/// needed to exercise the parser. They reflect the real envelope returned
/// by:
///   https://api.open-meteo.com/v1/forecast?current=...&timeformat=unixtime
///
/// Response shape:
///   response.latitude / .longitude — echo of the requested coordinates
///   response.current_units        — unit strings per requested field
///   response.current
///     .time                — unix epoch seconds (because timeformat=unixtime)
///     .interval            — observation interval in seconds
///     .temperature_2m      — °C
///     .relative_humidity_2m — %
///     .precipitation       — mm over the interval
///     .wind_speed_10m      — km/h
///
/// Fields the API cannot provide for a location are omitted entirely
/// rather than sent as null. Parsers must treat every measurement as
/// optional.

/// Monsoon-season observation with all four requested fields present.
/// 6.2mm of rain in the interval with 88% humidity.
#[cfg(test)]
pub(crate) fn fixture_current_full_json() -> &'static str {
    r#"{
      "latitude": 17.5,
      "longitude": 120.4375,
      "generationtime_ms": 0.102,
      "utc_offset_seconds": 0,
      "timezone": "UTC",
      "timezone_abbreviation": "UTC",
      "elevation": 5.0,
      "current_units": {
        "time": "unixtime",
        "interval": "seconds",
        "temperature_2m": "°C",
        "relative_humidity_2m": "%",
        "precipitation": "mm",
        "wind_speed_10m": "km/h"
      },
      "current": {
        "time": 1754877600,
        "interval": 900,
        "temperature_2m": 28.4,
        "relative_humidity_2m": 88,
        "precipitation": 6.2,
        "wind_speed_10m": 14.3
      }
    }"#
}

/// Observation where the API omitted precipitation and wind — simulates a
/// model run with partial coverage. Parser must skip the absent fields.
#[cfg(test)]
pub(crate) fn fixture_current_sparse_json() -> &'static str {
    r#"{
      "latitude": 17.1875,
      "longitude": 120.4375,
      "generationtime_ms": 0.087,
      "utc_offset_seconds": 0,
      "timezone": "UTC",
      "timezone_abbreviation": "UTC",
      "elevation": 17.0,
      "current_units": {
        "time": "unixtime",
        "interval": "seconds",
        "temperature_2m": "°C",
        "relative_humidity_2m": "%"
      },
      "current": {
        "time": 1754877600,
        "interval": 900,
        "temperature_2m": 30.1,
        "relative_humidity_2m": 71
      }
    }"#
}

/// Structurally valid response with no `current` block at all — returned
/// when the request asked only for hourly series. Parser must report
/// NoDataAvailable, not a parse error.
#[cfg(test)]
pub(crate) fn fixture_no_current_block_json() -> &'static str {
    r#"{
      "latitude": 17.0625,
      "longitude": 120.4375,
      "generationtime_ms": 0.064,
      "utc_offset_seconds": 0,
      "timezone": "UTC",
      "timezone_abbreviation": "UTC",
      "elevation": 8.0
    }"#
}

/// Dry-season observation: all fields present, zero precipitation.
/// Useful for asserting that a zero reading is a reading, not a gap.
#[cfg(test)]
pub(crate) fn fixture_current_dry_json() -> &'static str {
    r#"{
      "latitude": 17.5,
      "longitude": 120.375,
      "generationtime_ms": 0.093,
      "utc_offset_seconds": 0,
      "timezone": "UTC",
      "timezone_abbreviation": "UTC",
      "elevation": 6.0,
      "current_units": {
        "time": "unixtime",
        "interval": "seconds",
        "temperature_2m": "°C",
        "relative_humidity_2m": "%",
        "precipitation": "mm",
        "wind_speed_10m": "km/h"
      },
      "current": {
        "time": 1754877600,
        "interval": 900,
        "temperature_2m": 33.6,
        "relative_humidity_2m": 58,
        "precipitation": 0.0,
        "wind_speed_10m": 9.7
      }
    }"#
}
