use thiserror::Error;

/// Errors raised while loading [`crate::AppConfig`] from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Failure kinds that cross from the providers into the suggestion core.
///
/// Provider clients convert their transport-level errors into one of these
/// variants before returning, so callers never see a raw HTTP or JSON error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuggestError {
    /// The provider reported that its usage quota is exhausted. Never retried.
    #[error("{provider} usage quota exceeded: {message}")]
    QuotaExceeded { provider: String, message: String },

    /// The search succeeded but matched nothing (after the bounded retry loop).
    #[error("no venues matched the query")]
    NoResults,

    /// Network, decode, or API failure from a provider.
    #[error("{provider} provider unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    /// The provider call did not complete within the configured timeout.
    #[error("{provider} request timed out")]
    Timeout { provider: String },
}

impl SuggestError {
    pub fn quota(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QuotaExceeded {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn unavailable(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// `true` for failures that must abort the current request with no state
    /// change: quota exhaustion and timeouts.
    #[must_use]
    pub fn is_retry_later(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. } | Self::Timeout { .. })
    }

    /// The message shown to the user. Only two user-visible states exist.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        if self.is_retry_later() {
            "The venue service is busy right now. Please try again later."
        } else {
            "No matches nearby. Try a different search."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_and_timeout_ask_the_user_to_retry_later() {
        let quota = SuggestError::quota("foursquare", "429");
        let timeout = SuggestError::Timeout {
            provider: "foursquare".to_string(),
        };
        assert!(quota.is_retry_later());
        assert!(timeout.is_retry_later());
        assert_eq!(quota.user_message(), timeout.user_message());
    }

    #[test]
    fn no_results_and_unavailable_prompt_a_new_search() {
        let unavailable = SuggestError::unavailable("ipdata", "connection refused");
        assert!(!unavailable.is_retry_later());
        assert!(!SuggestError::NoResults.is_retry_later());
        assert_eq!(
            unavailable.user_message(),
            SuggestError::NoResults.user_message()
        );
    }

    #[test]
    fn display_includes_provider_name() {
        let err = SuggestError::quota("foursquare", "quota_exceeded");
        assert_eq!(
            err.to_string(),
            "foursquare usage quota exceeded: quota_exceeded"
        );
    }
}
