//! Wire types for the Foursquare v2 and ipdata JSON responses, plus their
//! conversions into the provider-neutral `wander-core` model.
//!
//! Foursquare wraps every response in a `{"meta": {...}, "response": {...}}`
//! envelope; [`FoursquareEnvelope`] captures that pattern generically.

use serde::Deserialize;
use wander_core::{
    ContactInfo, DetailPayload, LocationRecord, OpeningHours, RawVenue, Timeframe, VenueLocation,
};

// ---------------------------------------------------------------------------
// Foursquare envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct FoursquareEnvelope<T> {
    pub meta: FoursquareMeta,
    pub response: T,
}

/// The `meta` block. `code` mirrors the HTTP status; `429` means the hourly or
/// daily quota is exhausted.
#[derive(Debug, Deserialize)]
pub struct FoursquareMeta {
    pub code: u16,
    #[serde(default, rename = "errorType")]
    pub error_type: Option<String>,
    #[serde(default, rename = "errorDetail")]
    pub error_detail: Option<String>,
}

// ---------------------------------------------------------------------------
// venues/explore
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ExploreResponse {
    #[serde(default)]
    pub groups: Vec<ExploreGroup>,
}

/// A recommendation group. Items are kept as raw JSON so that one malformed
/// venue does not fail the whole page.
#[derive(Debug, Deserialize)]
pub struct ExploreGroup {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct WireVenue {
    pub id: String,
    pub name: String,
    pub location: WireLocation,
}

#[derive(Debug, Deserialize)]
pub struct WireLocation {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, rename = "formattedAddress")]
    pub formatted_address: Vec<String>,
}

impl From<WireVenue> for RawVenue {
    fn from(wire: WireVenue) -> Self {
        RawVenue {
            id: wire.id,
            name: wire.name,
            location: VenueLocation {
                lat: wire.location.lat,
                lng: wire.location.lng,
                formatted_address: wire.location.formatted_address,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// venues/{id}
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct VenueDetailResponse {
    pub venue: WireVenueDetail,
}

#[derive(Debug, Default, Deserialize)]
pub struct WireVenueDetail {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "canonicalUrl")]
    pub canonical_url: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub contact: WireContact,
    #[serde(default)]
    pub hours: Option<WireHours>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireContact {
    #[serde(default)]
    pub formatted_phone: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub facebook_username: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireHours {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub timeframes: Vec<WireTimeframe>,
}

#[derive(Debug, Deserialize)]
pub struct WireTimeframe {
    #[serde(default)]
    pub days: String,
    #[serde(default)]
    pub open: Vec<WireOpenSegment>,
}

#[derive(Debug, Deserialize)]
pub struct WireOpenSegment {
    #[serde(rename = "renderedTime")]
    pub rendered_time: String,
}

impl From<WireVenueDetail> for DetailPayload {
    fn from(wire: WireVenueDetail) -> Self {
        DetailPayload {
            description: wire.description,
            url: wire.url,
            canonical_url: wire.canonical_url,
            rating: wire.rating,
            contact: ContactInfo {
                formatted_phone: wire.contact.formatted_phone,
                phone: wire.contact.phone,
                facebook_username: wire.contact.facebook_username,
                facebook: wire.contact.facebook,
                instagram: wire.contact.instagram,
                twitter: wire.contact.twitter,
            },
            hours: wire.hours.map(|h| OpeningHours {
                status: h.status,
                timeframes: h
                    .timeframes
                    .into_iter()
                    .map(|t| Timeframe {
                        days: t.days,
                        open: t.open.into_iter().map(|o| o.rendered_time).collect(),
                    })
                    .collect(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// ipdata
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct IpdataResponse {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub postal: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub time_zone: Option<IpdataTimeZone>,
}

#[derive(Debug, Deserialize)]
pub struct IpdataTimeZone {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub current_time: Option<String>,
}

impl IpdataResponse {
    /// Converts into a [`LocationRecord`], or `None` when the response carries
    /// no coordinates.
    #[must_use]
    pub fn into_location(self) -> Option<LocationRecord> {
        let latitude = self.latitude?;
        let longitude = self.longitude?;
        let (time_zone, timestamp) = self
            .time_zone
            .map(|tz| {
                (
                    tz.name.unwrap_or_default(),
                    tz.current_time.unwrap_or_default(),
                )
            })
            .unwrap_or_default();
        Some(LocationRecord {
            city: self.city.unwrap_or_default(),
            country_name: self.country_name.unwrap_or_default(),
            latitude,
            longitude,
            postal: self.postal.unwrap_or_default(),
            region: self.region.unwrap_or_default(),
            time_zone,
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn venue_detail_converts_rendered_hours_and_contacts() {
        let wire: WireVenueDetail = serde_json::from_value(serde_json::json!({
            "canonicalUrl": "https://foursquare.com/v/abc",
            "rating": 9.1,
            "contact": { "formattedPhone": "(510) 555-0100", "instagram": "cafe" },
            "hours": {
                "status": "Open until 6:00 PM",
                "timeframes": [
                    { "days": "Mon–Sun", "open": [ { "renderedTime": "6:00 AM–6:00 PM" } ] }
                ]
            }
        }))
        .unwrap();
        let payload = DetailPayload::from(wire);
        assert_eq!(
            payload.canonical_url.as_deref(),
            Some("https://foursquare.com/v/abc")
        );
        assert_eq!(payload.contact.instagram.as_deref(), Some("cafe"));
        let hours = payload.hours.unwrap();
        assert_eq!(hours.timeframes[0].open, vec!["6:00 AM–6:00 PM"]);
    }

    #[test]
    fn ipdata_without_coordinates_is_rejected() {
        let wire: IpdataResponse =
            serde_json::from_value(serde_json::json!({ "city": "Berkeley" })).unwrap();
        assert!(wire.into_location().is_none());
    }

    #[test]
    fn ipdata_missing_strings_become_empty() {
        let wire: IpdataResponse = serde_json::from_value(serde_json::json!({
            "latitude": 37.87,
            "longitude": -122.27,
            "time_zone": { "name": "America/Los_Angeles", "current_time": "2024-05-01T09:30:00-07:00" }
        }))
        .unwrap();
        let record = wire.into_location().unwrap();
        assert_eq!(record.city, "");
        assert_eq!(record.time_zone, "America/Los_Angeles");
        assert_eq!(record.compact_date().as_deref(), Some("20240501"));
    }
}
