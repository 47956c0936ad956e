use std::net::SocketAddr;
use std::path::PathBuf;

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
    pub airtable_base_id: Option<String>,
    pub airtable_api_token: Option<String>,
    pub airtable_table_name: String,
    pub airtable_base_url: String,
    pub fetch_timeout_secs: u64,
    pub fetch_max_retries: u32,
    pub fetch_retry_backoff_ms: u64,
    pub fallback_path: Option<PathBuf>,
    pub rate_limit_per_minute: usize,
}

impl AppConfig {
    /// Returns `(base_id, api_token)` when both are configured.
    #[must_use]
    pub fn airtable_credentials(&self) -> Option<(&str, &str)> {
        match (&self.airtable_base_id, &self.airtable_api_token) {
            (Some(base), Some(token)) => Some((base.as_str(), token.as_str())),
            _ => None,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("airtable_base_id", &self.airtable_base_id)
            .field(
                "airtable_api_token",
                &self.airtable_api_token.as_ref().map(|_| "[redacted]"),
            )
            .field("airtable_table_name", &self.airtable_table_name)
            .field("airtable_base_url", &self.airtable_base_url)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("fetch_max_retries", &self.fetch_max_retries)
            .field("fetch_retry_backoff_ms", &self.fetch_retry_backoff_ms)
            .field("fallback_path", &self.fallback_path)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish()
    }
}
