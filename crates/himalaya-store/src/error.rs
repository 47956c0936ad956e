use thiserror::Error;

/// Errors returned by the Airtable client.
#[derive(Debug, Error)]
pub enum AirtableError {
    /// Network, TLS or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 401/403: the token is missing, revoked, or lacks table scope.
    #[error("Airtable rejected credentials (HTTP {status})")]
    Unauthorized { status: u16 },

    /// HTTP 404: unknown base or table.
    #[error("Airtable table not found: {url}")]
    NotFound { url: String },

    #[error("rate limited by Airtable (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid Airtable base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("pagination limit reached: exceeded {max_pages} pages")]
    PaginationLimit { max_pages: usize },
}

/// Errors raised while assembling a [`crate::LocationStore`] from configuration.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Airtable(#[from] AirtableError),

    #[error(transparent)]
    Config(#[from] himalaya_core::ConfigError),
}
