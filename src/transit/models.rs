//! Transit API payloads and the views built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::config::{
    BOUNDS_LAT_BUFFER, BOUNDS_LNG_BUFFER, DEFAULT_BOUNDS_EAST, DEFAULT_BOUNDS_NORTH,
    DEFAULT_BOUNDS_SOUTH, DEFAULT_BOUNDS_WEST, MAX_DEPARTURES, MAX_DEPARTURES_PER_CATEGORY,
};

/// Products shown on the live map.
const MAP_PRODUCTS: [&str; 4] = ["subway", "suburban", "regional", "tram"];

/// Geographic area polled for train positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub west: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Visible area plus a margin, so trains entering the view are already known.
    pub fn widened(self) -> Self {
        BoundingBox {
            north: self.north + BOUNDS_LAT_BUFFER,
            south: self.south - BOUNDS_LAT_BUFFER,
            west: self.west - BOUNDS_LNG_BUFFER,
            east: self.east + BOUNDS_LNG_BUFFER,
        }
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        BoundingBox {
            north: DEFAULT_BOUNDS_NORTH,
            south: DEFAULT_BOUNDS_SOUTH,
            west: DEFAULT_BOUNDS_WEST,
            east: DEFAULT_BOUNDS_EAST,
        }
    }
}

// Upstream payloads. Every field is optional upstream, so nothing here is required
// beyond the containing arrays.

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LineRef {
    pub name: Option<String>,
    pub product: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct StopRef {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GeoPoint {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Stopover {
    pub stop: Option<StopRef>,
    pub arrival: Option<String>,
    pub departure_delay: Option<i64>,
    pub arrival_platform: Option<String>,
    pub departure_platform: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Movement {
    pub trip_id: Option<String>,
    pub direction: Option<String>,
    pub line: Option<LineRef>,
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub next_stopovers: Vec<Stopover>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RadarResponse {
    #[serde(default)]
    pub movements: Vec<Movement>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LocationResult {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDeparture {
    pub line: Option<LineRef>,
    pub destination: Option<StopRef>,
    pub direction: Option<String>,
    pub planned_when: Option<String>,
    pub when: Option<String>,
    pub delay: Option<i64>,
    pub platform: Option<String>,
    pub planned_platform: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DeparturesResponse {
    #[serde(default)]
    pub departures: Vec<RawDeparture>,
}

/// A train currently moving on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Train {
    pub trip_id: String,
    pub lat: f64,
    pub lng: f64,
    pub line_name: String,
    pub product: String,
    pub direction: Option<String>,
    /// Delay at the next stop, in seconds
    pub delay: i64,
    pub next_station: Option<String>,
    /// Whole minutes until arrival at the next stop
    pub minutes_to_next_station: Option<i64>,
    pub platform: Option<String>,
}

impl RadarResponse {
    /// Map-relevant trains with a known position.
    pub(crate) fn into_trains(self, now: DateTime<Utc>) -> Vec<Train> {
        self.movements
            .into_iter()
            .filter_map(|movement| {
                let line = movement.line?;
                let product = line.product.filter(|p| MAP_PRODUCTS.contains(&p.as_str()))?;
                let line_name = line.name?;
                let location = movement.location?;
                let (lat, lng) = (location.latitude?, location.longitude?);
                let next = movement.next_stopovers.into_iter().next().unwrap_or_default();
                Some(Train {
                    trip_id: movement.trip_id.unwrap_or_default(),
                    lat,
                    lng,
                    line_name,
                    product,
                    direction: movement.direction,
                    delay: next.departure_delay.unwrap_or(0),
                    next_station: next.stop.and_then(|s| s.name),
                    minutes_to_next_station: next
                        .arrival
                        .as_deref()
                        .and_then(|arrival| minutes_until(arrival, now)),
                    platform: next.arrival_platform.or(next.departure_platform),
                })
            })
            .collect()
    }
}

/// Whole minutes from `now` until an RFC 3339 timestamp, never negative.
pub(crate) fn minutes_until(timestamp: &str, now: DateTime<Utc>) -> Option<i64> {
    let at = DateTime::parse_from_rfc3339(timestamp).ok()?;
    let seconds = (at.with_timezone(&Utc) - now).num_seconds();
    // Round to the nearest minute
    Some(((seconds as f64) / 60.0).round().max(0.0) as i64)
}

/// Picks the station id from a location search: the first stop, else the first hit.
pub(crate) fn best_station_match(locations: &[LocationResult]) -> Option<String> {
    locations
        .iter()
        .find(|l| l.kind.as_deref() == Some("stop"))
        .or_else(|| locations.first())
        .and_then(|l| l.id.clone())
}

/// Departure board category, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, Serialize)]
pub enum DepartureCategory {
    #[strum(serialize = "U-Bahn")]
    #[serde(rename = "U-Bahn")]
    UBahn,
    #[strum(serialize = "Regional")]
    Regional,
    #[strum(serialize = "S-Bahn")]
    #[serde(rename = "S-Bahn")]
    SBahn,
    #[strum(serialize = "Tram")]
    Tram,
    #[strum(serialize = "Bus")]
    Bus,
    #[strum(serialize = "other")]
    #[serde(rename = "other")]
    Other,
}

impl DepartureCategory {
    /// Classifies by product, falling back to the line name prefix.
    pub fn classify(product: Option<&str>, line_name: Option<&str>) -> Self {
        let name = line_name.unwrap_or("");
        match product {
            Some("subway") => DepartureCategory::UBahn,
            _ if name.starts_with('U') => DepartureCategory::UBahn,
            Some("suburban") => DepartureCategory::SBahn,
            _ if name.starts_with('S') => DepartureCategory::SBahn,
            Some("regional") => DepartureCategory::Regional,
            _ if name.starts_with("RE") || name.starts_with("RB") => DepartureCategory::Regional,
            Some("tram") => DepartureCategory::Tram,
            Some("bus") => DepartureCategory::Bus,
            _ => DepartureCategory::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Departure {
    pub line: String,
    pub destination: String,
    pub planned_time: Option<String>,
    pub actual_time: Option<String>,
    /// Delay in seconds
    pub delay: i64,
    pub platform: Option<String>,
    pub product: Option<String>,
    pub category: DepartureCategory,
}

impl From<RawDeparture> for Departure {
    fn from(raw: RawDeparture) -> Self {
        let line = raw.line.unwrap_or_default();
        let category = DepartureCategory::classify(line.product.as_deref(), line.name.as_deref());
        Departure {
            line: line.name.unwrap_or_else(|| "Unknown".to_string()),
            destination: raw
                .destination
                .and_then(|d| d.name)
                .or(raw.direction)
                .unwrap_or_else(|| "Unknown".to_string()),
            planned_time: raw.planned_when,
            actual_time: raw.when,
            delay: raw.delay.unwrap_or(0),
            platform: raw.platform.or(raw.planned_platform),
            product: line.product,
            category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartureGroup {
    pub category: DepartureCategory,
    pub departures: Vec<Departure>,
}

/// Departure board of one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationDepartures {
    pub station_id: String,
    pub station_name: String,
    /// Soonest departures across all categories
    pub departures: Vec<Departure>,
    /// Non-empty categories in display order, each capped
    pub grouped: Vec<DepartureGroup>,
}

impl StationDepartures {
    pub(crate) fn build(station_id: String, station_name: String, raw: Vec<RawDeparture>) -> Self {
        use strum::IntoEnumIterator;

        let all: Vec<Departure> = raw.into_iter().map(Departure::from).collect();
        let grouped = DepartureCategory::iter()
            .filter_map(|category| {
                let departures: Vec<Departure> = all
                    .iter()
                    .filter(|d| d.category == category)
                    .take(MAX_DEPARTURES_PER_CATEGORY)
                    .cloned()
                    .collect();
                (!departures.is_empty()).then_some(DepartureGroup {
                    category,
                    departures,
                })
            })
            .collect();
        let departures = all.into_iter().take(MAX_DEPARTURES).collect();
        StationDepartures {
            station_id,
            station_name,
            departures,
            grouped,
        }
    }
}
