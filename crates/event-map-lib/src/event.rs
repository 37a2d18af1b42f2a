//! Event records and the date/coordinate helpers shared by the rest of the crate

use crate::LoadError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use geo::Point;
use serde::{Deserialize, Serialize};

/// Format of every date string handled by the catalog (ISO-8601 calendar date)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Coordinates closer than this (in degrees, per axis) are the same place.
///
/// Coordinates go through JSON and the map widget's own projection, so exact
/// float equality is not reliable.
pub const COORD_TOLERANCE_DEG: f64 = 1e-5;

/// A single dated, geolocated event as supplied by the data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub title: String,
    pub location: String,
    /// `YYYY-MM-DD`, compared as a plain string
    pub date: String,
    pub lat: f64,
    pub lon: f64,
}

impl EventRecord {
    /// Position in WGS84 (x = longitude, y = latitude)
    #[inline]
    pub fn position(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

/// Stable identifier of an event: its index in the sorted catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub(crate) usize);

impl EventId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Whether two positions are equal within [`COORD_TOLERANCE_DEG`]
#[inline]
pub fn coords_match(a: Point<f64>, b: Point<f64>) -> bool {
    (a.x() - b.x()).abs() < COORD_TOLERANCE_DEG && (a.y() - b.y()).abs() < COORD_TOLERANCE_DEG
}

/// Format a date the way the catalog stores it
pub fn iso_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Today's calendar date in UTC
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Normalize date-picker input to `YYYY-MM-DD`.
///
/// Accepts a plain calendar date, an RFC 3339 timestamp (its UTC date is used)
/// or a naive `YYYY-MM-DDTHH:MM[:SS]` timestamp. Returns `None` for anything else.
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return Some(iso_date(date));
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(iso_date(stamp.with_timezone(&Utc).date_naive()));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|stamp| iso_date(stamp.date()))
}

/// Parse the JSON array served by the data source
pub fn parse_events(bytes: &[u8]) -> Result<Vec<EventRecord>, LoadError> {
    profiling::scope!("parse_events");
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_is_lon_lat() {
        let event = EventRecord {
            title: "Concert".to_string(),
            location: "Kaliningrad".to_string(),
            date: "2024-06-15".to_string(),
            lat: 54.71,
            lon: 20.45,
        };
        let p = event.position();
        assert_eq!(p.x(), 20.45);
        assert_eq!(p.y(), 54.71);
    }

    #[test]
    fn test_coords_match_tolerance() {
        let a = Point::new(20.45, 54.71);
        assert!(coords_match(a, Point::new(20.450_004, 54.709_996)));
        assert!(!coords_match(a, Point::new(20.4501, 54.71)));
        assert!(!coords_match(a, Point::new(20.45, 54.7102)));
    }

    #[test]
    fn test_normalize_plain_date() {
        assert_eq!(normalize_date("2024-06-10"), Some("2024-06-10".to_string()));
        assert_eq!(normalize_date("  2024-06-10 \n"), Some("2024-06-10".to_string()));
    }

    #[test]
    fn test_normalize_timestamps() {
        assert_eq!(
            normalize_date("2024-06-10T23:30:00Z"),
            Some("2024-06-10".to_string())
        );
        // 01:00 at +03:00 is still the previous day in UTC
        assert_eq!(
            normalize_date("2024-06-11T01:00:00+03:00"),
            Some("2024-06-10".to_string())
        );
        assert_eq!(
            normalize_date("2024-06-10T08:15"),
            Some("2024-06-10".to_string())
        );
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("tomorrow"), None);
        assert_eq!(normalize_date("2024-02-30"), None);
        assert_eq!(normalize_date("10.06.2024"), None);
    }

    #[test]
    fn test_parse_events() {
        let json = br#"[
            {"title": "Fair", "location": "Central square", "date": "2024-06-15", "lat": 54.71, "lon": 20.51},
            {"title": "Walk", "location": "Embankment", "date": "2024-06-01", "lat": 54.70, "lon": 20.49}
        ]"#;
        let events = parse_events(json).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "Fair");
        assert_eq!(events[1].date, "2024-06-01");
    }

    #[test]
    fn test_parse_events_rejects_non_array() {
        let err = parse_events(br#"{"title": "Fair"}"#).unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }
}
