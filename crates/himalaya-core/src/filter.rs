//! Filter/search engine over an in-memory location collection.
//!
//! [`evaluate`] is a pure function: it never mutates the collection or the
//! [`FilterSpec`], keeps no state between calls, and preserves the input's
//! relative order. All active conditions are AND-combined; multi-value facets
//! (type, region, language, significance) accept a location when any of its
//! values is selected.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::location::Location;

/// Lower elevation bound meaning "no constraint".
pub const DEFAULT_MIN_ELEVATION: u32 = 0;
/// Upper elevation bound meaning "no constraint".
pub const DEFAULT_MAX_ELEVATION: u32 = 9_000;

/// Which text fields a free-text search looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    /// `name`, `shortDescription` and `region`.
    #[default]
    Basic,
    /// Basic fields plus the long-form history texts and every flora/fauna tag.
    Extended,
}

impl std::str::FromStr for SearchScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(SearchScope::Basic),
            "extended" => Ok(SearchScope::Extended),
            other => Err(format!("unknown search scope '{other}'")),
        }
    }
}

/// User-editable query state. Empty sets and default bounds mean "no
/// constraint" for that facet.
///
/// Facet sets use the singular names of the query surface on the wire
/// (`type`, `region`, `language`); the plural spellings are accepted on
/// input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    pub search: String,
    pub scope: SearchScope,
    #[serde(rename = "type")]
    pub types: BTreeSet<String>,
    #[serde(rename = "region", alias = "regions")]
    pub regions: BTreeSet<String>,
    #[serde(rename = "language", alias = "languages")]
    pub languages: BTreeSet<String>,
    pub significance: BTreeSet<String>,
    pub min_elevation: u32,
    pub max_elevation: u32,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            search: String::new(),
            scope: SearchScope::Basic,
            types: BTreeSet::new(),
            regions: BTreeSet::new(),
            languages: BTreeSet::new(),
            significance: BTreeSet::new(),
            min_elevation: DEFAULT_MIN_ELEVATION,
            max_elevation: DEFAULT_MAX_ELEVATION,
        }
    }
}

fn to_set<I, S>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}

impl FilterSpec {
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = to_set(types);
        self
    }

    #[must_use]
    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = to_set(regions);
        self
    }

    #[must_use]
    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = to_set(languages);
        self
    }

    #[must_use]
    pub fn with_significance<I, S>(mut self, significance: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.significance = to_set(significance);
        self
    }

    #[must_use]
    pub fn with_elevation(mut self, min: u32, max: u32) -> Self {
        self.min_elevation = min;
        self.max_elevation = max;
        self
    }

    /// The trimmed search text, or `None` when search is inactive.
    fn search_term(&self) -> Option<String> {
        let trimmed = self.search.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
    }

    /// Elevation filtering is active when either bound is tighter than the
    /// default range. Bounds looser than the defaults do not activate it.
    #[must_use]
    pub fn elevation_active(&self) -> bool {
        self.min_elevation > DEFAULT_MIN_ELEVATION || self.max_elevation < DEFAULT_MAX_ELEVATION
    }

    /// Number of active conditions, one per facet regardless of how many
    /// values are selected in it.
    #[must_use]
    pub fn active_filter_count(&self) -> usize {
        [
            self.search_term().is_some(),
            !self.types.is_empty(),
            !self.regions.is_empty(),
            !self.languages.is_empty(),
            !self.significance.is_empty(),
            self.elevation_active(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.active_filter_count() == 0
    }

    /// Returns `true` when `location` satisfies every active condition.
    #[must_use]
    pub fn matches(&self, location: &Location) -> bool {
        self.matches_with_term(location, self.search_term().as_deref())
    }

    fn matches_with_term(&self, location: &Location, term: Option<&str>) -> bool {
        if let Some(term) = term {
            if !matches_search(location, term, self.scope) {
                return false;
            }
        }

        if !self.types.is_empty() && !self.types.contains(location.location_type.as_str()) {
            return false;
        }

        if !self.regions.is_empty() && !self.regions.contains(&location.region) {
            return false;
        }

        if !self.languages.is_empty()
            && !location.languages.iter().any(|l| self.languages.contains(l))
        {
            return false;
        }

        if !self.significance.is_empty()
            && !location
                .historical_significance
                .iter()
                .any(|s| self.significance.contains(s))
        {
            return false;
        }

        self.elevation_matches(location.elevation)
    }

    fn elevation_matches(&self, elevation: Option<u32>) -> bool {
        if !self.elevation_active() {
            return true;
        }
        // An inverted range is a valid spec that selects nothing.
        if self.min_elevation > self.max_elevation {
            return false;
        }
        elevation.is_some_and(|e| (self.min_elevation..=self.max_elevation).contains(&e))
    }
}

/// `term` must already be lowercased.
fn matches_search(location: &Location, term: &str, scope: SearchScope) -> bool {
    let contains = |text: &str| text.to_lowercase().contains(term);

    if contains(&location.name)
        || contains(&location.short_description)
        || contains(&location.region)
    {
        return true;
    }

    match scope {
        SearchScope::Basic => false,
        SearchScope::Extended => {
            contains(&location.full_history)
                || contains(&location.local_legends)
                || contains(&location.geological_formation)
                || contains(&location.research_history)
                || location.flora_tags.iter().any(|t| contains(t))
                || location.fauna_tags.iter().any(|t| contains(t))
        }
    }
}

/// Returns the locations matching `spec`, in input order.
#[must_use]
pub fn evaluate(locations: &[Location], spec: &FilterSpec) -> Vec<Location> {
    let term = spec.search_term();
    let result: Vec<Location> = locations
        .iter()
        .filter(|loc| spec.matches_with_term(loc, term.as_deref()))
        .cloned()
        .collect();

    tracing::trace!(
        input = locations.len(),
        matched = result.len(),
        active_filters = spec.active_filter_count(),
        "evaluated filter spec"
    );
    result
}

/// Finds a location by its identifier.
#[must_use]
pub fn find_by_id<'a>(locations: &'a [Location], id: &str) -> Option<&'a Location> {
    locations.iter().find(|loc| loc.id == id)
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;
