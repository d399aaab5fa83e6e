//! HTTP client for the Foursquare Places v2 API.
//!
//! Wraps `reqwest` with credential handling, the `meta.code` envelope check,
//! and typed deserialization. A `429` (either as the HTTP status or in
//! `meta.code`) is surfaced as [`ProviderError::QuotaExceeded`] and is never
//! retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use wander_core::{
    DetailPayload, DetailProvider, LocationRecord, RawVenue, SearchParams, SuggestError,
    VenueSearchProvider,
};

use crate::error::ProviderError;
use crate::retry::retry_with_backoff;
use crate::types::{ExploreResponse, FoursquareEnvelope, VenueDetailResponse, WireVenue};

const DEFAULT_BASE_URL: &str = "https://api.foursquare.com/";
const PROVIDER: &str = "foursquare";

/// `errorType` values Foursquare uses for throttling besides `meta.code == 429`.
const QUOTA_ERROR_TYPES: &[&str] = &["quota_exceeded", "rate_limit_exceeded"];

#[derive(Clone)]
pub struct FoursquareCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for FoursquareCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FoursquareCredentials")
            .field("client_id", &"[redacted]")
            .field("client_secret", &"[redacted]")
            .finish()
    }
}

/// Client for the Foursquare venue explore and venue detail endpoints.
///
/// Use [`FoursquareClient::new`] for production or
/// [`FoursquareClient::with_base_url`] to point at a mock server in tests.
pub struct FoursquareClient {
    client: Client,
    credentials: FoursquareCredentials,
    base_url: Url,
    open_now: bool,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl FoursquareClient {
    /// Creates a client pointed at the production Foursquare API.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        credentials: FoursquareCredentials,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ProviderError> {
        Self::with_base_url(credentials, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`ProviderError::InvalidBaseUrl`] if `base_url` does
    /// not parse.
    pub fn with_base_url(
        credentials: FoursquareCredentials,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so request segments land after the
        // base path.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ProviderError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            credentials,
            base_url,
            open_now: true,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Restricts explore results to venues open right now (default `true`).
    #[must_use]
    pub fn open_now(mut self, open_now: bool) -> Self {
        self.open_now = open_now;
        self
    }

    /// Enables back-off retries for transient failures.
    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Searches for recommended venues near `location`.
    ///
    /// Venues are read from the first recommendation group. Items that do not
    /// carry a well-formed venue are skipped with a warning.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::QuotaExceeded`] on a `429` signal.
    /// - [`ProviderError::Api`] if `meta.code` reports any other failure.
    /// - [`ProviderError::Http`] / [`ProviderError::UnexpectedStatus`] on
    ///   network failure or 5xx after retries.
    /// - [`ProviderError::Deserialize`] if the envelope shape is unexpected.
    pub async fn explore(
        &self,
        location: &LocationRecord,
        params: &SearchParams,
    ) -> Result<Vec<RawVenue>, ProviderError> {
        let ll = format!("{},{}", location.latitude, location.longitude);
        let radius = params.radius_meters.to_string();
        let limit = params.limit.to_string();
        let version = version_param(location);

        let mut extra: Vec<(&str, &str)> = vec![
            ("ll", ll.as_str()),
            ("radius", radius.as_str()),
            ("query", params.query.as_str()),
            ("limit", limit.as_str()),
        ];
        if !location.city.trim().is_empty() {
            extra.push(("near", location.city.as_str()));
        }
        if self.open_now {
            extra.push(("openNow", "1"));
        }

        let url = self.build_url(&["v2", "venues", "explore"], &version, &extra)?;
        let body = self.request_json(&url).await?;
        Self::check_meta(&body)?;

        let envelope: FoursquareEnvelope<ExploreResponse> =
            serde_json::from_value(body).map_err(|e| ProviderError::Deserialize {
                context: format!("explore(query={})", params.query),
                source: e,
            })?;

        let venues = envelope
            .response
            .groups
            .into_iter()
            .next()
            .map(|group| group.items)
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter_map(|(idx, item)| {
                let venue = item.get("venue").cloned().unwrap_or(serde_json::Value::Null);
                serde_json::from_value::<WireVenue>(venue)
                    .map_err(|e| {
                        tracing::warn!(
                            index = idx,
                            error = %e,
                            "explore: skipping malformed venue"
                        );
                    })
                    .ok()
            })
            .map(RawVenue::from)
            .collect();

        Ok(venues)
    }

    /// Fetches the full detail record for one venue.
    ///
    /// # Errors
    ///
    /// Same as [`FoursquareClient::explore`].
    pub async fn venue_details(
        &self,
        venue_id: &str,
        version: &str,
    ) -> Result<DetailPayload, ProviderError> {
        let url = self.build_url(&["v2", "venues", venue_id], version, &[])?;
        let body = self.request_json(&url).await?;
        Self::check_meta(&body)?;

        let envelope: FoursquareEnvelope<VenueDetailResponse> = serde_json::from_value(body)
            .map_err(|e| ProviderError::Deserialize {
                context: format!("venue_details(id={venue_id})"),
                source: e,
            })?;

        Ok(envelope.response.venue.into())
    }

    /// Builds the request URL from path segments plus credentials, API
    /// version, and any extra query parameters. Each segment is
    /// percent-encoded as a single path component.
    fn build_url(
        &self,
        segments: &[&str],
        version: &str,
        extra: &[(&str, &str)],
    ) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ProviderError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("client_id", &self.credentials.client_id);
            pairs.append_pair("client_secret", &self.credentials.client_secret);
            pairs.append_pair("v", version);
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Sends a GET request and parses the body as JSON, retrying transient
    /// failures.
    ///
    /// HTTP 429 short-circuits to [`ProviderError::QuotaExceeded`]; 5xx
    /// becomes [`ProviderError::UnexpectedStatus`]. Other 4xx bodies are
    /// still parsed because Foursquare reports errors inside `meta`.
    async fn request_json(&self, url: &Url) -> Result<serde_json::Value, ProviderError> {
        // The query string carries the client secret; log and report the path only.
        let context = url.path().to_string();
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            let context = context.clone();
            async move {
                let response = self.client.get(url).send().await?;
                let status = response.status();
                if status == StatusCode::TOO_MANY_REQUESTS {
                    return Err(ProviderError::QuotaExceeded(format!(
                        "HTTP 429 from {context}"
                    )));
                }
                if status.is_server_error() {
                    return Err(ProviderError::UnexpectedStatus {
                        status: status.as_u16(),
                        context,
                    });
                }
                let body = response.text().await?;
                serde_json::from_str(&body)
                    .map_err(|e| ProviderError::Deserialize { context, source: e })
            }
        })
        .await
    }

    /// Checks `meta.code` and converts failures into typed errors.
    fn check_meta(body: &serde_json::Value) -> Result<(), ProviderError> {
        let Some(meta) = body.get("meta") else {
            return Ok(());
        };
        let code = meta
            .get("code")
            .and_then(serde_json::Value::as_u64)
            .and_then(|c| u16::try_from(c).ok())
            .unwrap_or(200);
        if code == 200 {
            return Ok(());
        }
        let error_type = meta
            .get("errorType")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown_error");
        let detail = meta
            .get("errorDetail")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(error_type)
            .to_string();
        if code == 429 || QUOTA_ERROR_TYPES.contains(&error_type) {
            return Err(ProviderError::QuotaExceeded(detail));
        }
        Err(ProviderError::Api {
            code,
            message: detail,
        })
    }
}

/// The `v` version parameter: the location's local date as `YYYYMMDD`,
/// falling back to today's UTC date.
fn version_param(location: &LocationRecord) -> String {
    location
        .compact_date()
        .unwrap_or_else(today_version)
}

fn today_version() -> String {
    chrono::Utc::now().format("%Y%m%d").to_string()
}

#[async_trait]
impl VenueSearchProvider for FoursquareClient {
    async fn search_venues(
        &self,
        location: &LocationRecord,
        params: &SearchParams,
    ) -> Result<Vec<RawVenue>, SuggestError> {
        self.explore(location, params)
            .await
            .map_err(|e| e.into_suggest_error(PROVIDER))
    }
}

#[async_trait]
impl DetailProvider for FoursquareClient {
    async fn fetch_details(&self, venue_id: &str) -> Result<DetailPayload, SuggestError> {
        self.venue_details(venue_id, &today_version())
            .await
            .map_err(|e| e.into_suggest_error(PROVIDER))
    }
}
