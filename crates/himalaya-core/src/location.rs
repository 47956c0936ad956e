//! Canonical location schema shared by the store, the filter engine and the
//! rendering surfaces.
//!
//! Records reaching this type have already been defaulted at the store
//! boundary: text fields are never `null`, tag lists are never absent, and
//! `name` is never blank. Only `elevation` stays optional, because "unknown"
//! and "sea level" must filter differently.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of researched site. Drives the type facet and the marker color.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum LocationType {
    #[default]
    Valley,
    Peak,
    Village,
    #[serde(rename = "Archaeological Site")]
    ArchaeologicalSite,
    Lake,
    Pass,
}

impl LocationType {
    pub const ALL: [LocationType; 6] = [
        LocationType::Valley,
        LocationType::Peak,
        LocationType::Village,
        LocationType::ArchaeologicalSite,
        LocationType::Lake,
        LocationType::Pass,
    ];

    /// Display name, identical to the serialized form and to facet values.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LocationType::Valley => "Valley",
            LocationType::Peak => "Peak",
            LocationType::Village => "Village",
            LocationType::ArchaeologicalSite => "Archaeological Site",
            LocationType::Lake => "Lake",
            LocationType::Pass => "Pass",
        }
    }

    /// Hex color used for this type's map marker.
    #[must_use]
    pub fn marker_color(self) -> &'static str {
        match self {
            LocationType::Valley => "#5c9e6f",
            LocationType::Peak => "#e74c3c",
            LocationType::Village => "#f39c12",
            LocationType::ArchaeologicalSite => "#3498db",
            LocationType::Lake => "#2980b9",
            LocationType::Pass => "#95a5a6",
        }
    }
}

impl std::fmt::Display for LocationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        LocationType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown location type '{trimmed}'"))
    }
}

/// A URL with an optional human-readable title.
///
/// Deserializes from either a bare string or a `{url, title}` map so that
/// fallback files can list plain photo paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LinkRepr")]
pub struct Link {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LinkRepr {
    Bare(String),
    Full { url: String, title: Option<String> },
}

impl From<LinkRepr> for Link {
    fn from(repr: LinkRepr) -> Self {
        match repr {
            LinkRepr::Bare(url) => Link { url, title: None },
            LinkRepr::Full { url, title } => Link { url, title },
        }
    }
}

impl From<&str> for Link {
    fn from(url: &str) -> Self {
        Link {
            url: url.to_owned(),
            title: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub location_type: LocationType,
    pub region: String,
    #[serde(default)]
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Meters above sea level. `None` when the source has no reading.
    #[serde(default)]
    pub elevation: Option<u32>,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub full_history: String,
    #[serde(default)]
    pub local_legends: String,
    #[serde(default)]
    pub geological_formation: String,
    #[serde(default)]
    pub research_history: String,
    #[serde(default)]
    pub historical_significance: Vec<String>,
    #[serde(default = "default_climate_zone")]
    pub climate_zone: String,
    #[serde(default)]
    pub flora_tags: Vec<String>,
    #[serde(default)]
    pub fauna_tags: Vec<String>,
    #[serde(default)]
    pub photo_urls: Vec<Link>,
    #[serde(default)]
    pub photo_geolocations: bool,
    #[serde(default)]
    pub video_urls: Vec<Link>,
    #[serde(default)]
    pub document_urls: Vec<Link>,
    #[serde(default)]
    pub news_article_urls: Vec<Link>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
    #[serde(default = "default_researcher_name")]
    pub researcher_name: String,
    #[serde(default)]
    pub research_notes: String,
}

pub(crate) fn default_climate_zone() -> String {
    "Alpine".to_string()
}

pub(crate) fn default_researcher_name() -> String {
    "Unknown".to_string()
}
