//! Query pipeline: locate, search with a bounded retry, order, navigate.

use std::collections::HashSet;

use wander_core::{
    AppConfig, LocationProvider, LocationRecord, RawVenue, SearchParams, SuggestError,
    VenueSearchProvider, DEFAULT_LIMIT, DEFAULT_RADIUS_METERS,
};

use crate::navigator::Navigator;
use crate::ordering::{order_suggestions, DEFAULT_SMOOTHING};
use crate::session::SuggestionSession;

const DEFAULT_SEARCH_ATTEMPTS: u32 = 3;

/// Tunables for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    pub radius_meters: u32,
    pub limit: u32,
    pub smoothing: f64,
    /// Total search attempts while the provider returns nothing usable.
    pub search_attempts: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            radius_meters: DEFAULT_RADIUS_METERS,
            limit: DEFAULT_LIMIT,
            smoothing: DEFAULT_SMOOTHING,
            search_attempts: DEFAULT_SEARCH_ATTEMPTS,
        }
    }
}

impl QueryOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            radius_meters: config.search_radius_meters,
            limit: config.search_limit,
            smoothing: config.smoothing,
            search_attempts: config.search_attempts,
        }
    }

    fn search_params(&self, query: &str) -> SearchParams {
        SearchParams::new(query)
            .with_radius(self.radius_meters)
            .with_limit(self.limit)
    }
}

/// Outcome of a successful query.
#[derive(Debug, Clone)]
pub struct Suggestions {
    pub location: LocationRecord,
    /// Search results in provider order, duplicates removed.
    pub raw_venues: Vec<RawVenue>,
    pub session: SuggestionSession,
}

/// Runs a full query from the device's current location.
///
/// # Errors
///
/// - [`SuggestError::QuotaExceeded`] / [`SuggestError::Timeout`] from any
///   provider, immediately.
/// - [`SuggestError::ProviderUnavailable`] if the location lookup fails.
/// - [`SuggestError::NoResults`] if every search attempt came back empty.
pub async fn run_query(
    locator: &dyn LocationProvider,
    search: &dyn VenueSearchProvider,
    query: &str,
    options: &QueryOptions,
) -> Result<Suggestions, SuggestError> {
    let location = locator.lookup_location().await.inspect_err(|e| {
        tracing::warn!(error = %e, "location lookup failed");
    })?;
    suggest_near(location, search, query, options).await
}

/// Runs a query around an already known location.
///
/// # Errors
///
/// Same as [`run_query`], minus the location lookup.
pub async fn suggest_near(
    location: LocationRecord,
    search: &dyn VenueSearchProvider,
    query: &str,
    options: &QueryOptions,
) -> Result<Suggestions, SuggestError> {
    let params = options.search_params(query);
    let mut raw_venues =
        search_with_retry(search, &location, &params, options.search_attempts).await?;

    let mut seen = HashSet::new();
    raw_venues.retain(|v| seen.insert(v.id.clone()));

    let reference = location.coordinates();
    let ordered = order_suggestions(raw_venues.clone(), reference, options.smoothing);
    let navigator = Navigator::start(ordered)?;
    tracing::info!(
        query,
        venues = navigator.total(),
        city = %location.city,
        "suggestions ready"
    );

    Ok(Suggestions {
        location,
        raw_venues,
        session: SuggestionSession::new(query, reference, navigator),
    })
}

/// Searches up to `attempts` times, retrying only while the provider returns
/// no venues or is unavailable.
///
/// # Errors
///
/// Quota and timeout errors are returned on the first occurrence. Returns
/// [`SuggestError::NoResults`] once the attempts are used up.
pub async fn search_with_retry(
    search: &dyn VenueSearchProvider,
    location: &LocationRecord,
    params: &SearchParams,
    attempts: u32,
) -> Result<Vec<RawVenue>, SuggestError> {
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        match search.search_venues(location, params).await {
            Ok(venues) if !venues.is_empty() => return Ok(venues),
            Ok(_) => {
                tracing::info!(
                    attempt,
                    attempts,
                    query = %params.query,
                    "search returned no venues"
                );
            }
            Err(e) if e.is_retry_later() => {
                tracing::warn!(error = %e, query = %params.query, "search aborted");
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(
                    attempt,
                    attempts,
                    error = %e,
                    query = %params.query,
                    "search provider unavailable, treating as empty"
                );
            }
        }
    }
    Err(SuggestError::NoResults)
}
