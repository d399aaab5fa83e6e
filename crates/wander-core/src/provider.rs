//! Seams between the suggestion core and its external collaborators.
//!
//! Implementations live in `wander-providers`; tests substitute in-memory fakes.

use async_trait::async_trait;

use crate::error::SuggestError;
use crate::location::LocationRecord;
use crate::venue::{DetailPayload, RawVenue};

/// Default search radius: about 10 miles.
pub const DEFAULT_RADIUS_METERS: u32 = 16_000;
pub const MAX_RADIUS_METERS: u32 = 100_000;
pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 50;

/// Parameters of one venue search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub query: String,
    pub radius_meters: u32,
    pub limit: u32,
}

impl SearchParams {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            radius_meters: DEFAULT_RADIUS_METERS,
            limit: DEFAULT_LIMIT,
        }
    }

    #[must_use]
    pub fn with_radius(mut self, radius_meters: u32) -> Self {
        self.radius_meters = radius_meters.clamp(1, MAX_RADIUS_METERS);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, MAX_LIMIT);
        self
    }
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Looks up where the current device is.
    async fn lookup_location(&self) -> Result<LocationRecord, SuggestError>;
}

#[async_trait]
pub trait VenueSearchProvider: Send + Sync {
    /// Searches for venues near `location` matching `params.query`.
    ///
    /// An empty vector is a successful search with no matches.
    async fn search_venues(
        &self,
        location: &LocationRecord,
        params: &SearchParams,
    ) -> Result<Vec<RawVenue>, SuggestError>;
}

#[async_trait]
pub trait DetailProvider: Send + Sync {
    /// Fetches the extended attribute payload for one venue.
    async fn fetch_details(&self, venue_id: &str) -> Result<DetailPayload, SuggestError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_params_default_to_ten_miles_and_fifty_results() {
        let params = SearchParams::new("coffee");
        assert_eq!(params.radius_meters, 16_000);
        assert_eq!(params.limit, 50);
    }

    #[test]
    fn search_params_clamp_out_of_range_values() {
        let params = SearchParams::new("tacos")
            .with_radius(250_000)
            .with_limit(0);
        assert_eq!(params.radius_meters, MAX_RADIUS_METERS);
        assert_eq!(params.limit, 1);

        let params = SearchParams::new("tacos").with_limit(500);
        assert_eq!(params.limit, MAX_LIMIT);
    }
}
