use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use himalaya_core::{evaluate, facets, find_by_id, FacetValue, FilterSpec, Location};
use himalaya_store::{DataOrigin, LoadedLocations};

fn fmt_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn fmt_elevation(elevation: Option<u32>) -> String {
    elevation.map_or_else(|| "-".to_owned(), |m| format!("{m} m"))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_owned()
    }
}

/// List locations matching `spec`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub(crate) fn run_list(
    loaded: &LoadedLocations,
    spec: &FilterSpec,
    json: bool,
) -> anyhow::Result<()> {
    let matched = evaluate(&loaded.locations, spec);

    if json {
        println!("{}", serde_json::to_string_pretty(&matched)?);
        return Ok(());
    }

    if matched.is_empty() {
        println!(
            "no locations match {} active filter(s) across {} records",
            spec.active_filter_count(),
            loaded.locations.len()
        );
        return Ok(());
    }

    print!("{}", render_table(&matched));
    println!();
    println!(
        "{} of {} locations ({} source)",
        matched.len(),
        loaded.locations.len(),
        loaded.origin.label()
    );
    Ok(())
}

fn render_table(locations: &[Location]) -> String {
    let mut out = format!(
        "{:<6}{:<32}{:<22}{:<10}{:>10}\n",
        "ID", "NAME", "TYPE", "REGION", "ELEVATION"
    );
    for loc in locations {
        let _ = writeln!(
            out,
            "{:<6}{:<32}{:<22}{:<10}{:>10}",
            truncate(&loc.id, 5),
            truncate(&loc.name, 30),
            loc.location_type.as_str(),
            truncate(&loc.region, 9),
            fmt_elevation(loc.elevation)
        );
    }
    out
}

/// Show a single location in full.
///
/// # Errors
///
/// Returns an error if `id` is not in the collection.
pub(crate) fn run_show(loaded: &LoadedLocations, id: &str, json: bool) -> anyhow::Result<()> {
    let location = find_by_id(&loaded.locations, id)
        .ok_or_else(|| anyhow::anyhow!("location '{id}' not found; try `list` to see ids"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(location)?);
    } else {
        print!("{}", render_detail(location));
    }
    Ok(())
}

fn render_detail(loc: &Location) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", loc.name, loc.location_type);
    let _ = writeln!(
        out,
        "Region: {}{}",
        loc.region,
        if loc.country.is_empty() {
            String::new()
        } else {
            format!(", {}", loc.country)
        }
    );
    let _ = writeln!(out, "Coordinates: {:.4}, {:.4}", loc.latitude, loc.longitude);
    let _ = writeln!(out, "Elevation: {}", fmt_elevation(loc.elevation));
    let _ = writeln!(out, "Climate: {}", loc.climate_zone);
    if !loc.historical_significance.is_empty() {
        let _ = writeln!(out, "Significance: {}", loc.historical_significance.join(", "));
    }
    let _ = writeln!(out, "Languages: {}", loc.languages.join(", "));
    let _ = writeln!(
        out,
        "Researcher: {} (updated {})",
        loc.researcher_name,
        fmt_timestamp(loc.last_updated)
    );
    for (label, text) in [
        ("Summary", &loc.short_description),
        ("History", &loc.full_history),
        ("Local legends", &loc.local_legends),
        ("Geology", &loc.geological_formation),
        ("Research history", &loc.research_history),
        ("Notes", &loc.research_notes),
    ] {
        if !text.is_empty() {
            let _ = writeln!(out, "\n{label}:\n  {text}");
        }
    }
    for (label, tags) in [("Flora", &loc.flora_tags), ("Fauna", &loc.fauna_tags)] {
        if !tags.is_empty() {
            let _ = writeln!(out, "{label}: {}", tags.join(", "));
        }
    }
    let media = loc.photo_urls.len()
        + loc.video_urls.len()
        + loc.document_urls.len()
        + loc.news_article_urls.len();
    if media > 0 {
        let _ = writeln!(out, "Media: {media} linked item(s)");
    }
    out
}

/// Print facet values and counts.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub(crate) fn run_facets(loaded: &LoadedLocations, json: bool) -> anyhow::Result<()> {
    let f = facets(&loaded.locations);
    if json {
        println!("{}", serde_json::to_string_pretty(&f)?);
        return Ok(());
    }

    for (label, values) in [
        ("Types", &f.types),
        ("Regions", &f.regions),
        ("Languages", &f.languages),
        ("Significance", &f.significance),
    ] {
        println!("{label}: {}", render_facet_line(values));
    }
    match f.elevation {
        Some(span) => println!("Elevation: {}-{} m", span.min, span.max),
        None => println!("Elevation: no recorded values"),
    }
    Ok(())
}

fn render_facet_line(values: &[FacetValue]) -> String {
    if values.is_empty() {
        return "-".to_owned();
    }
    values
        .iter()
        .map(|v| format!("{} ({})", v.value, v.count))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn run_source(loaded: &LoadedLocations) {
    println!("{}", describe_source(loaded));
}

fn describe_source(loaded: &LoadedLocations) -> String {
    let origin = match &loaded.origin {
        DataOrigin::Airtable => "airtable".to_owned(),
        DataOrigin::Fallback(reason) => format!("fallback ({reason})"),
    };
    format!(
        "source: {origin}\nrecords: {}\nloaded: {}",
        loaded.locations.len(),
        fmt_timestamp(loaded.loaded_at)
    )
}
