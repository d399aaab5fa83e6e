use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub foursquare_client_id: String,
    pub foursquare_client_secret: String,
    pub ipdata_api_key: String,
    pub search_radius_meters: u32,
    pub search_limit: u32,
    pub search_attempts: u32,
    pub open_now: bool,
    /// Blend between inverse-distance (0.0) and uniform (1.0) ordering.
    pub smoothing: f64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub session_ttl_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("foursquare_client_id", &"[redacted]")
            .field("foursquare_client_secret", &"[redacted]")
            .field("ipdata_api_key", &"[redacted]")
            .field("search_radius_meters", &self.search_radius_meters)
            .field("search_limit", &self.search_limit)
            .field("search_attempts", &self.search_attempts)
            .field("open_now", &self.open_now)
            .field("smoothing", &self.smoothing)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .finish()
    }
}
