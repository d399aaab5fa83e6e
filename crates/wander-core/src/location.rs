//! Geographic primitives: the reference point used for distance weighting and
//! the full location record returned by the geolocation provider.

use serde::{Deserialize, Serialize};

/// A `(lat, lng)` pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Planar Euclidean distance in degrees.
    ///
    /// Only meaningful over a small region (one city's search radius); this is
    /// not a geodesic distance.
    #[must_use]
    pub fn planar_distance(&self, other: &Coordinates) -> f64 {
        (self.lat - other.lat).hypot(self.lng - other.lng)
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Location of the current device as reported by the geolocation provider.
///
/// String fields the provider omitted are empty rather than absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country_name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub postal: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub time_zone: String,
    /// Provider's local time for the device, e.g. `2024-05-01T09:30:00-07:00`.
    #[serde(default)]
    pub timestamp: String,
}

impl LocationRecord {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Calendar date of `timestamp` as `YYYYMMDD`, if the timestamp starts
    /// with an ISO-8601 date.
    #[must_use]
    pub fn compact_date(&self) -> Option<String> {
        let date = self.timestamp.get(0..10)?;
        let parsed = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
        Some(parsed.format("%Y%m%d").to_string())
    }
}
