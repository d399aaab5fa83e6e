use thiserror::Error;
use wander_core::SuggestError;

/// Errors returned by the provider HTTP clients.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider signalled that the usage quota is exhausted.
    #[error("usage quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The provider answered with an application-level error.
    #[error("API error {code}: {message}")]
    Api { code: u16, message: String },

    /// A 5xx status from the provider.
    #[error("unexpected HTTP status {status} from {context}")]
    UnexpectedStatus { status: u16, context: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ProviderError {
    /// Converts into the core failure taxonomy on behalf of `provider`.
    ///
    /// Quota stays quota, timeouts stay timeouts, and everything else becomes
    /// `ProviderUnavailable`.
    #[must_use]
    pub fn into_suggest_error(self, provider: &str) -> SuggestError {
        match self {
            ProviderError::QuotaExceeded(message) => SuggestError::quota(provider, message),
            ProviderError::Http(e) if e.is_timeout() => SuggestError::Timeout {
                provider: provider.to_string(),
            },
            other => SuggestError::unavailable(provider, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_maps_to_quota_exceeded() {
        let err = ProviderError::QuotaExceeded("quota_exceeded".to_string());
        assert_eq!(
            err.into_suggest_error("foursquare"),
            SuggestError::quota("foursquare", "quota_exceeded")
        );
    }

    #[test]
    fn api_and_decode_failures_map_to_unavailable() {
        let api = ProviderError::Api {
            code: 400,
            message: "param_error".to_string(),
        };
        assert!(matches!(
            api.into_suggest_error("foursquare"),
            SuggestError::ProviderUnavailable { ref provider, .. } if provider == "foursquare"
        ));

        let source = serde_json::from_str::<()>("nope").unwrap_err();
        let decode = ProviderError::Deserialize {
            context: "/v2/venues/explore".to_string(),
            source,
        };
        assert!(matches!(
            decode.into_suggest_error("foursquare"),
            SuggestError::ProviderUnavailable { .. }
        ));
    }
}
