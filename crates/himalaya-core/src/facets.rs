//! Facet values derived from whatever data is loaded, never from a fixed list.

use serde::Serialize;

use crate::location::Location;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetValue {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ElevationSpan {
    pub min: u32,
    pub max: u32,
}

/// Observed facet values with per-value location counts, in first-appearance
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub types: Vec<FacetValue>,
    pub regions: Vec<FacetValue>,
    pub languages: Vec<FacetValue>,
    pub significance: Vec<FacetValue>,
    pub elevation: Option<ElevationSpan>,
}

fn tally(values: &mut Vec<FacetValue>, value: &str) {
    match values.iter_mut().find(|v| v.value == value) {
        Some(existing) => existing.count += 1,
        None => values.push(FacetValue {
            value: value.to_owned(),
            count: 1,
        }),
    }
}

/// Tallies each tag once per location even if the source repeats it.
fn tally_tags(values: &mut Vec<FacetValue>, tags: &[String]) {
    for (idx, tag) in tags.iter().enumerate() {
        if !tags[..idx].contains(tag) {
            tally(values, tag);
        }
    }
}

#[must_use]
pub fn facets(locations: &[Location]) -> Facets {
    let mut out = Facets::default();

    for loc in locations {
        tally(&mut out.types, loc.location_type.as_str());
        tally(&mut out.regions, &loc.region);
        tally_tags(&mut out.languages, &loc.languages);
        tally_tags(&mut out.significance, &loc.historical_significance);

        if let Some(e) = loc.elevation {
            out.elevation = Some(match out.elevation {
                Some(span) => ElevationSpan {
                    min: span.min.min(e),
                    max: span.max.max(e),
                },
                None => ElevationSpan { min: e, max: e },
            });
        }
    }

    out
}
