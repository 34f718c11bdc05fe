use crate::geo::Viewport;

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

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Base URL of the provider map service, e.g. `http://localhost:8081/api/map`.
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Providers requested per page, within `1..=100`.
    pub page_size: u32,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Map region shown before the user moves the map.
    pub initial_viewport: Viewport,
}
