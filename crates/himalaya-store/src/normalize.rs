//! Normalization from raw Airtable records to [`himalaya_core::Location`].
//!
//! Records are never rejected: every missing or malformed cell falls back to
//! a defined default so the filter engine can treat its input as well-formed.
//!
//! ## Observed cell shapes
//!
//! - Numbers arrive as JSON numbers, but hand-edited bases sometimes store
//!   them as text (`"8848"`). Both are accepted.
//! - Multi-select columns arrive as arrays of strings; single-line text
//!   columns used for tags arrive as comma-separated strings.
//! - Attachment columns arrive as arrays of `{url, filename, ...}` objects;
//!   URL columns arrive as strings or arrays of strings.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

use himalaya_core::{Link, Location, LocationType};

use crate::types::AirtableRecord;

/// Column names in the Airtable `Locations` table.
mod column {
    pub const NAME: &str = "Location Name";
    pub const TYPE: &str = "Location Type";
    pub const REGION: &str = "Region";
    pub const COUNTRY: &str = "Country";
    pub const LATITUDE: &str = "Latitude";
    pub const LONGITUDE: &str = "Longitude";
    pub const ELEVATION: &str = "Altitude/Elevation";
    pub const SHORT_DESCRIPTION: &str = "Short Description";
    pub const FULL_HISTORY: &str = "Full History";
    pub const SIGNIFICANCE: &str = "Historical Significance";
    pub const CLIMATE_ZONE: &str = "Climate Zone";
    pub const FLORA: &str = "Flora Tags";
    pub const FAUNA: &str = "Fauna Tags";
    pub const PHOTOS: &str = "Photo URLs";
    pub const PHOTO_GEOLOCATIONS: &str = "Photo Geolocations";
    pub const VIDEOS: &str = "Videos";
    pub const DOCUMENTS: &str = "Documents";
    pub const NEWS: &str = "News Articles";
    pub const RESEARCH_HISTORY: &str = "Research History";
    pub const GEOLOGICAL_FORMATION: &str = "Geological Formation";
    pub const LOCAL_LEGENDS: &str = "Local Legends";
    pub const LANGUAGES: &str = "Language Tags";
    pub const LAST_UPDATED: &str = "Last Updated";
    pub const RESEARCHER: &str = "Researcher Name";
    pub const RESEARCH_NOTES: &str = "Research Notes";
}

pub const DEFAULT_NAME: &str = "Unnamed location";
pub const DEFAULT_REGION: &str = "Nepal";
pub const DEFAULT_CLIMATE_ZONE: &str = "Alpine";
pub const DEFAULT_LANGUAGE: &str = "English";
pub const DEFAULT_RESEARCHER: &str = "Unknown";

/// Normalizes one Airtable record. `now` stamps records that carry neither a
/// `Last Updated` cell nor a creation time.
#[must_use]
pub fn normalize_record(record: AirtableRecord, now: DateTime<Utc>) -> Location {
    let f = &record.fields;

    let name = text(f, column::NAME).unwrap_or_else(|| {
        tracing::warn!(record_id = %record.id, "record has no name; using placeholder");
        DEFAULT_NAME.to_string()
    });

    let location_type = text(f, column::TYPE).map_or_else(LocationType::default, |raw| {
        raw.parse::<LocationType>().unwrap_or_else(|e| {
            tracing::warn!(record_id = %record.id, error = %e, "defaulting location type");
            LocationType::default()
        })
    });

    let last_updated = text(f, column::LAST_UPDATED)
        .as_deref()
        .and_then(parse_timestamp)
        .or_else(|| record.created_time.as_deref().and_then(parse_timestamp))
        .unwrap_or(now);

    Location {
        name,
        location_type,
        region: text(f, column::REGION).unwrap_or_else(|| DEFAULT_REGION.to_string()),
        country: text(f, column::COUNTRY).unwrap_or_default(),
        latitude: coordinate(f, column::LATITUDE, 90.0, &record.id).unwrap_or(0.0),
        longitude: coordinate(f, column::LONGITUDE, 180.0, &record.id).unwrap_or(0.0),
        elevation: number(f, column::ELEVATION).and_then(to_elevation),
        short_description: text(f, column::SHORT_DESCRIPTION).unwrap_or_default(),
        full_history: text(f, column::FULL_HISTORY).unwrap_or_default(),
        local_legends: text(f, column::LOCAL_LEGENDS).unwrap_or_default(),
        geological_formation: text(f, column::GEOLOGICAL_FORMATION).unwrap_or_default(),
        research_history: text(f, column::RESEARCH_HISTORY).unwrap_or_default(),
        historical_significance: tag_list(f, column::SIGNIFICANCE).unwrap_or_default(),
        climate_zone: text(f, column::CLIMATE_ZONE)
            .unwrap_or_else(|| DEFAULT_CLIMATE_ZONE.to_string()),
        flora_tags: tag_list(f, column::FLORA).unwrap_or_default(),
        fauna_tags: tag_list(f, column::FAUNA).unwrap_or_default(),
        photo_urls: links(f, column::PHOTOS),
        photo_geolocations: f
            .get(column::PHOTO_GEOLOCATIONS)
            .and_then(Value::as_bool)
            .unwrap_or(false),
        video_urls: links(f, column::VIDEOS),
        document_urls: links(f, column::DOCUMENTS),
        news_article_urls: links(f, column::NEWS),
        languages: tag_list(f, column::LANGUAGES)
            .unwrap_or_else(|| vec![DEFAULT_LANGUAGE.to_string()]),
        last_updated,
        researcher_name: text(f, column::RESEARCHER)
            .unwrap_or_else(|| DEFAULT_RESEARCHER.to_string()),
        research_notes: text(f, column::RESEARCH_NOTES).unwrap_or_default(),
        id: record.id,
    }
}

/// Non-blank trimmed text. Numbers are rendered as text.
fn text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match fields.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

/// A coordinate within `[-limit, limit]`. Out-of-range cells are treated as
/// absent, the same bounds fallback files are validated against.
fn coordinate(
    fields: &Map<String, Value>,
    key: &str,
    limit: f64,
    record_id: &str,
) -> Option<f64> {
    let value = number(fields, key)?;
    if value.abs() > limit {
        tracing::warn!(record_id, column = key, value, "coordinate out of range; ignoring");
        return None;
    }
    Some(value)
}

/// Negative readings are data-entry errors and are treated as absent.
fn to_elevation(meters: f64) -> Option<u32> {
    if meters < 0.0 || meters > f64::from(u32::MAX) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(meters.round() as u32)
}

/// `None` when the cell is absent, so callers can choose their own default.
fn tag_list(fields: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    let tags = match fields.get(key)? {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect(),
        _ => return None,
    };
    Some(tags)
}

fn links(fields: &Map<String, Value>, key: &str) -> Vec<Link> {
    match fields.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(link_from_value).collect(),
        Some(Value::String(s)) => s
            .split([',', '\n'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Link::from)
            .collect(),
        _ => Vec::new(),
    }
}

fn link_from_value(value: &Value) -> Option<Link> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(Link::from(s.trim())),
        Value::Object(obj) => {
            let url = obj.get("url").and_then(Value::as_str)?.trim();
            if url.is_empty() {
                return None;
            }
            let title = ["title", "filename"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_str))
                .map(ToOwned::to_owned);
            Some(Link {
                url: url.to_owned(),
                title,
            })
        }
        _ => None,
    }
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
