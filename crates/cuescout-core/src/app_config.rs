#[derive(Clone)]
pub struct AppConfig {
    /// Required only for database-backed commands; geocode-only usage runs
    /// without it.
    pub database_url: Option<String>,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub geocoder_base_url: String,
    pub geocoder_timeout_secs: u64,
    /// Minimum spacing between calls to the geocoding provider.
    pub geocoder_min_interval_ms: u64,
    pub geocoder_user_agent: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &self.database_url.as_ref().map(|_| "[redacted]"))
            .field("log_level", &self.log_level)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("geocoder_base_url", &self.geocoder_base_url)
            .field("geocoder_timeout_secs", &self.geocoder_timeout_secs)
            .field("geocoder_min_interval_ms", &self.geocoder_min_interval_ms)
            .field("geocoder_user_agent", &self.geocoder_user_agent)
            .finish()
    }
}
