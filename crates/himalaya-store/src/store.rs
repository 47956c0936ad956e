//! The location store: one load attempt against Airtable, with the built-in
//! or file-provided collection as the answer whenever that attempt fails.
//!
//! `load` never returns an error. Every failure mode collapses into a
//! [`FallbackReason`] so the caller always has something to render.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use himalaya_core::{fallback_locations, load_fallback_file, AppConfig, Location};

use crate::client::AirtableClient;
use crate::error::{AirtableError, StoreError};
use crate::normalize::normalize_record;

/// Why the fallback collection was served instead of live data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    /// No Airtable credentials are configured.
    Unconfigured,
    /// The whole load exceeded its time budget.
    Timeout,
    /// The request failed or the response was unusable.
    Transport(String),
    /// Airtable answered with zero records.
    Empty,
}

impl FallbackReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::Unconfigured => "unconfigured",
            FallbackReason::Timeout => "timeout",
            FallbackReason::Transport(_) => "transport",
            FallbackReason::Empty => "empty",
        }
    }
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::Transport(detail) => write!(f, "transport: {detail}"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Where a loaded collection came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    Airtable,
    Fallback(FallbackReason),
}

impl DataOrigin {
    /// Short label for API envelopes and CLI output.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            DataOrigin::Airtable => "airtable",
            DataOrigin::Fallback(_) => "fallback",
        }
    }
}

/// One completed load.
#[derive(Debug, Clone)]
pub struct LoadedLocations {
    pub locations: Vec<Location>,
    pub origin: DataOrigin,
    pub loaded_at: DateTime<Utc>,
}

impl LoadedLocations {
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, DataOrigin::Fallback(_))
    }
}

pub struct LocationStore {
    client: Option<AirtableClient>,
    fallback: Arc<[Location]>,
    load_timeout: Duration,
}

impl LocationStore {
    /// `client: None` means the store always serves `fallback`.
    #[must_use]
    pub fn new(
        client: Option<AirtableClient>,
        fallback: Vec<Location>,
        load_timeout: Duration,
    ) -> Self {
        Self {
            client,
            fallback: fallback.into(),
            load_timeout,
        }
    }

    /// Builds the store described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if `HIMALAYA_FALLBACK_PATH` names a file
    /// that cannot be read or fails validation, and [`StoreError::Airtable`]
    /// if the HTTP client cannot be built from the configured base URL.
    pub fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        let fallback = match &config.fallback_path {
            Some(path) => load_fallback_file(path)?,
            None => fallback_locations(),
        };

        let client = match config.airtable_credentials() {
            Some((base_id, token)) => Some(
                AirtableClient::with_base_url(
                    &config.airtable_base_url,
                    base_id,
                    token,
                    &config.airtable_table_name,
                    config.fetch_timeout_secs,
                )?
                .with_retry_policy(config.fetch_max_retries, config.fetch_retry_backoff_ms),
            ),
            None => None,
        };

        Ok(Self::new(
            client,
            fallback,
            Duration::from_secs(config.fetch_timeout_secs),
        ))
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Performs one load. Always yields a collection.
    pub async fn load(&self) -> LoadedLocations {
        let Some(client) = &self.client else {
            tracing::info!("Airtable credentials not configured; serving fallback locations");
            return self.fallback_with(FallbackReason::Unconfigured);
        };

        let attempt = tokio::time::timeout(self.load_timeout, client.list_all_records()).await;
        let fetched = match attempt {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    timeout_ms = u64::try_from(self.load_timeout.as_millis()).unwrap_or(u64::MAX),
                    "Airtable load timed out; serving fallback locations"
                );
                return self.fallback_with(FallbackReason::Timeout);
            }
        };

        let records = match fetched {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "Airtable load failed; serving fallback locations");
                return self.fallback_with(reason_for(&e));
            }
        };

        if records.is_empty() {
            tracing::warn!("Airtable returned no records; serving fallback locations");
            return self.fallback_with(FallbackReason::Empty);
        }

        let now = Utc::now();
        let fetched_count = records.len();
        let locations = dedupe_by_id(
            records
                .into_iter()
                .map(|record| normalize_record(record, now))
                .collect(),
        );
        tracing::info!(
            fetched = fetched_count,
            kept = locations.len(),
            "loaded locations from Airtable"
        );

        LoadedLocations {
            locations,
            origin: DataOrigin::Airtable,
            loaded_at: now,
        }
    }

    fn fallback_with(&self, reason: FallbackReason) -> LoadedLocations {
        LoadedLocations {
            locations: self.fallback.to_vec(),
            origin: DataOrigin::Fallback(reason),
            loaded_at: Utc::now(),
        }
    }
}

fn reason_for(err: &AirtableError) -> FallbackReason {
    match err {
        AirtableError::Http(e) if e.is_timeout() => FallbackReason::Timeout,
        other => FallbackReason::Transport(other.to_string()),
    }
}

/// Keeps the first record for each id, preserving order.
fn dedupe_by_id(locations: Vec<Location>) -> Vec<Location> {
    let mut seen = HashSet::with_capacity(locations.len());
    locations
        .into_iter()
        .filter(|loc| {
            let fresh = seen.insert(loc.id.clone());
            if !fresh {
                tracing::warn!(id = %loc.id, "dropping duplicate location id");
            }
            fresh
        })
        .collect()
}
