//! HTTP client for the Airtable list-records endpoint.
//!
//! Authenticates with a bearer token, follows the `offset` cursor across
//! pages, and maps non-2xx responses onto typed [`AirtableError`] variants.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::error::AirtableError;
use crate::retry::retry_with_backoff;
use crate::types::{AirtableRecord, ListRecordsResponse};

const DEFAULT_BASE_URL: &str = "https://api.airtable.com/v0/";

/// Airtable's maximum page size.
const PAGE_SIZE: u32 = 100;

/// Guards against an offset cursor that never terminates.
pub(crate) const MAX_PAGES: usize = 50;

/// Client for one Airtable table.
///
/// Use [`AirtableClient::new`] for production or
/// [`AirtableClient::with_base_url`] to point at a mock server in tests.
pub struct AirtableClient {
    client: Client,
    api_token: String,
    table_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl AirtableClient {
    /// Creates a client for `table_name` in `base_id` on the public Airtable API.
    ///
    /// # Errors
    ///
    /// Returns [`AirtableError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_id: &str,
        api_token: &str,
        table_name: &str,
        timeout_secs: u64,
    ) -> Result<Self, AirtableError> {
        Self::with_base_url(DEFAULT_BASE_URL, base_id, api_token, table_name, timeout_secs)
    }

    /// Creates a client with a custom API root (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`AirtableError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`AirtableError::InvalidBaseUrl`] if
    /// `base_url` is not a valid hierarchical URL.
    pub fn with_base_url(
        base_url: &str,
        base_id: &str,
        api_token: &str,
        table_name: &str,
        timeout_secs: u64,
    ) -> Result<Self, AirtableError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent("himalaya/0.1 (research-archive)")
            .build()?;

        let invalid = |reason: String| AirtableError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason,
        };

        let mut table_url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        table_url
            .path_segments_mut()
            .map_err(|()| invalid("URL cannot be a base".to_owned()))?
            .pop_if_empty()
            .push(base_id)
            .push(table_name);

        Ok(Self {
            client,
            api_token: api_token.to_owned(),
            table_url,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Sets how many extra attempts transient failures get, and the base
    /// back-off delay between them.
    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Fetches one page of records, starting at `offset` when given.
    ///
    /// # Errors
    ///
    /// - [`AirtableError::Unauthorized`] on HTTP 401/403 (not retried).
    /// - [`AirtableError::NotFound`] on HTTP 404 (not retried).
    /// - [`AirtableError::RateLimited`] on HTTP 429 after all retries.
    /// - [`AirtableError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`AirtableError::Http`] on network failure after all retries.
    /// - [`AirtableError::Deserialize`] if the body does not parse.
    pub async fn list_records_page(
        &self,
        offset: Option<&str>,
    ) -> Result<ListRecordsResponse, AirtableError> {
        let url = self.page_url(offset);

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(url.clone())
                    .bearer_auth(&self.api_token)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .send()
                    .await?;
                let status = response.status();

                if status == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(30);
                    return Err(AirtableError::RateLimited { retry_after_secs });
                }

                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                    return Err(AirtableError::Unauthorized {
                        status: status.as_u16(),
                    });
                }

                if status == StatusCode::NOT_FOUND {
                    return Err(AirtableError::NotFound {
                        url: url.to_string(),
                    });
                }

                if !status.is_success() {
                    return Err(AirtableError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<ListRecordsResponse>(&body).map_err(|e| {
                    AirtableError::Deserialize {
                        context: format!("list records page from {url}"),
                        source: e,
                    }
                })
            }
        })
        .await
    }

    /// Fetches every record in the table, following `offset` cursors.
    ///
    /// All-or-nothing: a failure on any page discards the earlier pages, so
    /// callers never see a partial collection.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::list_records_page`].
    /// Returns [`AirtableError::PaginationLimit`] past [`MAX_PAGES`] pages.
    pub async fn list_all_records(&self) -> Result<Vec<AirtableRecord>, AirtableError> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        let mut page_count = 0usize;

        loop {
            page_count += 1;
            if page_count > MAX_PAGES {
                return Err(AirtableError::PaginationLimit {
                    max_pages: MAX_PAGES,
                });
            }

            let page = self.list_records_page(offset.as_deref()).await?;
            tracing::debug!(
                page = page_count,
                records = page.records.len(),
                has_more = page.offset.is_some(),
                "fetched Airtable page"
            );
            records.extend(page.records);

            match page.offset {
                Some(next) if !next.is_empty() => offset = Some(next),
                _ => break,
            }
        }

        Ok(records)
    }

    /// Builds the request URL for one page. The token travels in the
    /// `Authorization` header, never in the URL.
    fn page_url(&self, offset: Option<&str>) -> Url {
        let mut url = self.table_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("pageSize", &PAGE_SIZE.to_string());
            if let Some(offset) = offset {
                pairs.append_pair("offset", offset);
            }
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> AirtableClient {
        AirtableClient::with_base_url(base_url, "appBASE", "pat-test", "Locations", 5)
            .expect("client construction should not fail")
    }

    #[test]
    fn page_url_appends_base_and_table() {
        let client = test_client("https://api.airtable.com/v0/");
        assert_eq!(
            client.page_url(None).as_str(),
            "https://api.airtable.com/v0/appBASE/Locations?pageSize=100"
        );
    }

    #[test]
    fn page_url_without_trailing_slash() {
        let client = test_client("https://api.airtable.com/v0");
        assert_eq!(
            client.page_url(Some("itr123/rec456")).as_str(),
            "https://api.airtable.com/v0/appBASE/Locations?pageSize=100&offset=itr123%2Frec456"
        );
    }

    #[test]
    fn page_url_encodes_table_name() {
        let client = AirtableClient::with_base_url(
            "https://api.airtable.com/v0/",
            "appBASE",
            "t",
            "Research Sites",
            5,
        )
        .unwrap();
        assert!(
            client.page_url(None).as_str().contains("/appBASE/Research%20Sites?"),
            "table name should be percent-encoded: {}",
            client.page_url(None)
        );
    }

    #[test]
    fn page_url_never_contains_token() {
        let client = test_client("https://api.airtable.com/v0/");
        assert!(!client.page_url(Some("x")).as_str().contains("pat-test"));
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let result = AirtableClient::with_base_url("not a url", "appBASE", "t", "Locations", 5);
        assert!(matches!(result, Err(AirtableError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn rejects_cannot_be_a_base_url() {
        let result =
            AirtableClient::with_base_url("mailto:ops@example.org", "appBASE", "t", "Locations", 5);
        assert!(matches!(result, Err(AirtableError::InvalidBaseUrl { .. })));
    }
}
