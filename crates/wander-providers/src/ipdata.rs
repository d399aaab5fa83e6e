//! Device geolocation through ipdata.
//!
//! The public IP is discovered first from a plain-text echo endpoint, then
//! looked up with `GET {base}/{ip}?api-key=...`.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use wander_core::{LocationProvider, LocationRecord, SuggestError};

use crate::error::ProviderError;
use crate::retry::retry_with_backoff;
use crate::types::IpdataResponse;

const DEFAULT_BASE_URL: &str = "https://api.ipdata.co/";
const DEFAULT_IP_ECHO_URL: &str = "http://ip.42.pl/raw";
const PROVIDER: &str = "ipdata";

pub struct IpdataClient {
    client: Client,
    api_key: String,
    base_url: Url,
    ip_echo_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl IpdataClient {
    /// Creates a client pointed at the production ipdata API.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, ProviderError> {
        Self::with_urls(
            api_key,
            timeout_secs,
            user_agent,
            DEFAULT_BASE_URL,
            DEFAULT_IP_ECHO_URL,
        )
    }

    /// Creates a client with custom lookup and IP-echo URLs (for testing with
    /// wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`ProviderError::InvalidBaseUrl`] if either URL does
    /// not parse.
    pub fn with_urls(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
        ip_echo_url: &str,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let parse = |raw: &str| {
            Url::parse(raw).map_err(|e| ProviderError::InvalidBaseUrl {
                url: raw.to_string(),
                reason: e.to_string(),
            })
        };
        let base_url = parse(&format!("{}/", base_url.trim_end_matches('/')))?;
        let ip_echo_url = parse(ip_echo_url)?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            ip_echo_url,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Enables back-off retries for transient failures.
    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Discovers this machine's public IP address.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::Http`] on network failure or non-2xx status.
    /// - [`ProviderError::Api`] if the echo endpoint returns something that
    ///   is not an IP address.
    pub async fn public_ip(&self) -> Result<IpAddr, ProviderError> {
        let text = retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self
                .client
                .get(self.ip_echo_url.clone())
                .send()
                .await?
                .error_for_status()?;
            Ok::<String, ProviderError>(response.text().await?)
        })
        .await?;

        text.trim().parse::<IpAddr>().map_err(|_| ProviderError::Api {
            code: 200,
            message: format!("IP echo returned '{}'", text.trim()),
        })
    }

    /// Looks up the location of `ip`.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::QuotaExceeded`] on HTTP 429, or 403 mentioning a quota.
    /// - [`ProviderError::Api`] on any other non-2xx status or a response
    ///   without coordinates.
    /// - [`ProviderError::Http`] / [`ProviderError::UnexpectedStatus`] on
    ///   network failure or 5xx after retries.
    /// - [`ProviderError::Deserialize`] if the body is not the expected JSON.
    pub async fn lookup(&self, ip: IpAddr) -> Result<LocationRecord, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ProviderError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .push(&ip.to_string());
        url.query_pairs_mut().append_pair("api-key", &self.api_key);
        let context = format!("ipdata lookup({ip})");

        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            let context = context.clone();
            async move {
                let response = self.client.get(url).send().await?;
                let status = response.status();
                if status.is_server_error() {
                    return Err(ProviderError::UnexpectedStatus {
                        status: status.as_u16(),
                        context,
                    });
                }
                let body = response.text().await?;
                classify_status(status, &body)?;
                Ok(body)
            }
        })
        .await?;

        let wire: IpdataResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Deserialize {
                context: context.clone(),
                source: e,
            })?;

        wire.into_location().ok_or_else(|| ProviderError::Api {
            code: 200,
            message: format!("{context}: response has no coordinates"),
        })
    }
}

/// Maps ipdata's non-2xx statuses. ipdata answers quota exhaustion with 403
/// and a message about the quota; plain 403 means a bad key.
fn classify_status(status: StatusCode, body: &str) -> Result<(), ProviderError> {
    if status.is_success() {
        return Ok(());
    }
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned))
        .unwrap_or_else(|| body.trim().to_string());
    if status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && message.to_lowercase().contains("quota"))
    {
        return Err(ProviderError::QuotaExceeded(message));
    }
    Err(ProviderError::Api {
        code: status.as_u16(),
        message,
    })
}

#[async_trait]
impl LocationProvider for IpdataClient {
    async fn lookup_location(&self) -> Result<LocationRecord, SuggestError> {
        let ip = self
            .public_ip()
            .await
            .map_err(|e| e.into_suggest_error(PROVIDER))?;
        tracing::debug!(%ip, "resolved public IP");
        self.lookup(ip)
            .await
            .map_err(|e| e.into_suggest_error(PROVIDER))
    }
}
