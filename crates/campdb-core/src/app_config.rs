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
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Base URL of the upstream campground search API.
    pub search_base_url: String,
    pub search_request_timeout_secs: u64,
    pub search_user_agent: String,
    pub search_page_size: u32,
    pub search_max_retries: u32,
    /// Base delay for linear retry backoff: `base_ms * attempt`.
    pub search_retry_backoff_base_ms: u64,
    pub search_inter_page_delay_ms: u64,
    /// Bound on concurrently scanned regions.
    pub scan_max_concurrent_regions: usize,
    /// Base URL of the reverse-geocoding provider.
    pub geocode_base_url: String,
    pub geocode_request_timeout_secs: u64,
    pub geocode_user_agent: String,
    pub geocode_max_retries: u32,
    pub geocode_retry_backoff_base_ms: u64,
    /// Per-worker minimum interval between geocode requests.
    pub geocode_min_interval_ms: u64,
    pub geocode_workers: usize,
    pub db_write_max_retries: u32,
    pub db_write_retry_backoff_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("search_base_url", &self.search_base_url)
            .field(
                "search_request_timeout_secs",
                &self.search_request_timeout_secs,
            )
            .field("search_user_agent", &self.search_user_agent)
            .field("search_page_size", &self.search_page_size)
            .field("search_max_retries", &self.search_max_retries)
            .field(
                "search_retry_backoff_base_ms",
                &self.search_retry_backoff_base_ms,
            )
            .field(
                "search_inter_page_delay_ms",
                &self.search_inter_page_delay_ms,
            )
            .field(
                "scan_max_concurrent_regions",
                &self.scan_max_concurrent_regions,
            )
            .field("geocode_base_url", &self.geocode_base_url)
            .field(
                "geocode_request_timeout_secs",
                &self.geocode_request_timeout_secs,
            )
            .field("geocode_user_agent", &self.geocode_user_agent)
            .field("geocode_max_retries", &self.geocode_max_retries)
            .field(
                "geocode_retry_backoff_base_ms",
                &self.geocode_retry_backoff_base_ms,
            )
            .field("geocode_min_interval_ms", &self.geocode_min_interval_ms)
            .field("geocode_workers", &self.geocode_workers)
            .field("db_write_max_retries", &self.db_write_max_retries)
            .field("db_write_retry_backoff_ms", &self.db_write_retry_backoff_ms)
            .finish()
    }
}
