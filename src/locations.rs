/// Location registry for the monitored province.
///
/// Defines the canonical list of municipalities covered by this service,
/// along with the geographic context the prediction pipeline needs
/// (elevation, flood history). This is the single source of truth for
/// location names — other modules should resolve locations from here
/// rather than hardcoding strings.

// ---------------------------------------------------------------------------
// Location metadata
// ---------------------------------------------------------------------------

/// Metadata for a single monitored municipality.
pub struct Location {
    /// Municipality name as used in the sensor registry and the readings table.
    pub municipality: &'static str,
    pub province: &'static str,
    /// Human-readable description of the location's flood exposure.
    pub description: &'static str,
    /// WGS84 latitude.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
    /// Representative elevation above sea level in meters.
    pub elevation_m: f64,
    /// Recorded flood events in the last ten years.
    pub historical_floods_count: u32,
    pub population: u32,
}

/// All municipalities monitored by this service, ordered north to south
/// along the coastal plain.
///
/// Sources:
///   - Coordinates and population: provincial disaster risk office records
///   - Flood history: provincial DRRM incident logs, 2016-2025
pub static LOCATION_REGISTRY: &[Location] = &[
    Location {
        municipality: "Vigan City",
        province: "Ilocos Sur",
        description: "Provincial capital on the Mestizo River delta. Low-lying \
                      heritage district floods when the river backs up during \
                      sustained southwest-monsoon rain.",
        latitude: 17.5747,
        longitude: 120.3869,
        elevation_m: 6.0,
        historical_floods_count: 7,
        population: 53_879,
    },
    Location {
        municipality: "Santa",
        province: "Ilocos Sur",
        description: "Riverside municipality at the mouth of the Abra River. \
                      First to flood when upstream catchments release; rising \
                      water level here typically leads Vigan by several hours.",
        latitude: 17.4906,
        longitude: 120.4311,
        elevation_m: 4.0,
        historical_floods_count: 11,
        population: 16_293,
    },
    Location {
        municipality: "Narvacan",
        province: "Ilocos Sur",
        description: "Coastal plain crossed by several creeks draining the \
                      eastern uplands. Flash-flood prone during short intense \
                      rainfall rather than sustained events.",
        latitude: 17.4217,
        longitude: 120.4733,
        elevation_m: 12.0,
        historical_floods_count: 5,
        population: 43_891,
    },
    Location {
        municipality: "Candon City",
        province: "Ilocos Sur",
        description: "Commercial center on elevated ground. Flooding is mostly \
                      confined to the riverside barangays along the Darapidap \
                      outflow.",
        latitude: 17.1964,
        longitude: 120.4467,
        elevation_m: 17.0,
        historical_floods_count: 3,
        population: 60_493,
    },
    Location {
        municipality: "Santa Lucia",
        province: "Ilocos Sur",
        description: "Inland municipality on the Buaya River floodplain. \
                      Slow-onset flooding from accumulated multi-day rainfall.",
        latitude: 17.1395,
        longitude: 120.4367,
        elevation_m: 15.0,
        historical_floods_count: 4,
        population: 15_800,
    },
    Location {
        municipality: "Santa Cruz",
        province: "Ilocos Sur",
        description: "Southern coastal municipality with broad low-lying rice \
                      land. Drains poorly; standing floodwater persists days \
                      after heavy rain ends.",
        latitude: 17.0864,
        longitude: 120.4575,
        elevation_m: 8.0,
        historical_floods_count: 6,
        population: 39_868,
    },
];

/// Returns every registered municipality name, in registry order.
pub fn all_municipalities() -> Vec<&'static str> {
    LOCATION_REGISTRY.iter().map(|l| l.municipality).collect()
}

/// Looks up a location by municipality name (case-insensitive).
/// Returns `None` if not registered.
pub fn find_location(municipality: &str) -> Option<&'static Location> {
    LOCATION_REGISTRY
        .iter()
        .find(|l| l.municipality.eq_ignore_ascii_case(municipality))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
