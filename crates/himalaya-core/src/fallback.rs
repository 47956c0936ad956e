//! Built-in fallback collection and optional YAML override.
//!
//! The fallback replaces the remote collection wholesale whenever the remote
//! source is unconfigured or unavailable; it is never merged with partial
//! remote data.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::location::{Link, Location, LocationType};
use crate::ConfigError;

#[derive(Debug, Deserialize)]
pub struct FallbackFile {
    pub locations: Vec<Location>,
}

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn links(values: &[&str]) -> Vec<Link> {
    values.iter().copied().map(Link::from).collect()
}

/// The six surveyed sites shipped with the application.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn fallback_locations() -> Vec<Location> {
    vec![
        Location {
            id: "1".into(),
            name: "Sinja Valley".into(),
            location_type: LocationType::Valley,
            region: "Nepal".into(),
            country: "Nepal".into(),
            latitude: 28.8,
            longitude: 84.2,
            elevation: Some(2800),
            short_description: "The Sinja Valley is a high valley in the remote western Nepal, known for its unique archaeological sites and cultural heritage.".into(),
            full_history: "The valley has been inhabited for centuries and contains evidence of ancient settlements and trade routes. Archaeological surveys have revealed pottery dating back to the medieval period, suggesting continuous habitation. Local legends speak of ancient kingdoms and pilgrimage routes that connected the valley to major cultural centers.".into(),
            local_legends: "Local communities maintain oral traditions about the valley's founding and spiritual significance.".into(),
            geological_formation: "Formed by glacial activity during the Pleistocene epoch, displaying classic U-shaped glacial morphology.".into(),
            research_history: "The valley has been studied by researchers from Amherst College since 2015.".into(),
            historical_significance: tags(&["Cultural", "Archaeological", "Environmental"]),
            climate_zone: "Alpine".into(),
            flora_tags: tags(&["Alpine rhododendron", "High altitude grasses", "Juniper scrub", "Alpine sedges"]),
            fauna_tags: tags(&["Himalayan musk deer", "Lammergeier eagle", "Snow leopard", "Alpine pikas"]),
            photo_urls: links(&["/himalayan-valley-landscape.jpg", "/himalayan-cultural-site.jpg"]),
            photo_geolocations: true,
            languages: tags(&["English", "Nepali", "French"]),
            last_updated: date(2024, 12, 1),
            researcher_name: "Dr. Sarah Mitchell".into(),
            research_notes: "Ongoing environmental monitoring and cultural documentation.".into(),
            ..Location::default()
        },
        Location {
            id: "2".into(),
            name: "Mt. Everest".into(),
            location_type: LocationType::Peak,
            region: "Nepal".into(),
            country: "Nepal".into(),
            latitude: 27.9881,
            longitude: 86.925,
            elevation: Some(8848),
            short_description: "The highest mountain in the world, sacred to local Sherpa communities and a major focus of mountaineering research.".into(),
            full_history: "Mt. Everest has been revered for centuries by local communities as a sacred peak. Modern mountaineering began with early expeditions in the 20th century, culminating in the successful ascent by Edmund Hillary and Tenzing Norgay in 1953.".into(),
            local_legends: "Known as Sagarmatha in Nepali, meaning \"Forehead of the Sky\".".into(),
            geological_formation: "Formed by collision of the Indian and Eurasian tectonic plates, creating the highest peak in the world.".into(),
            research_history: "Extensive mountaineering and climate research has been conducted since the 1950s.".into(),
            historical_significance: tags(&["Cultural", "Environmental", "Geological"]),
            climate_zone: "High Alpine".into(),
            flora_tags: tags(&["Alpine tundra", "Sparse vegetation"]),
            fauna_tags: tags(&["Snow leopard", "Himalayan eagle", "Alpine fox"]),
            photo_urls: links(&["/mt-everest.jpg", "/everest-base-camp.jpg"]),
            photo_geolocations: true,
            languages: tags(&["English", "Nepali"]),
            last_updated: date(2024, 11, 15),
            researcher_name: "Dr. James Chen".into(),
            research_notes: "Monitoring glacial retreat and climate impacts on the mountain.".into(),
            ..Location::default()
        },
        Location {
            id: "3".into(),
            name: "Kathmandu Valley".into(),
            location_type: LocationType::Village,
            region: "Nepal".into(),
            country: "Nepal".into(),
            latitude: 27.7172,
            longitude: 85.324,
            elevation: Some(1400),
            short_description: "Nepal's capital city with rich cultural heritage, ancient temples, and vibrant traditions spanning centuries.".into(),
            full_history: "Kathmandu has been a major cultural and political center since ancient times. The city features numerous UNESCO World Heritage sites and has served as a hub for Himalayan trade routes.".into(),
            local_legends: "Legends speak of the valley's founding by the Gopal dynasty and its sacred significance.".into(),
            geological_formation: "Situated in a valley formed by ancient river systems.".into(),
            research_history: "Extensive anthropological and architectural studies of temples and urban culture.".into(),
            historical_significance: tags(&["Cultural", "Archaeological"]),
            climate_zone: "Temperate".into(),
            flora_tags: tags(&["Urban gardens", "Rhododendron forests nearby"]),
            fauna_tags: tags(&["Birds", "Small mammals"]),
            photo_urls: links(&["/kathmandu-temple.jpg", "/kathmandu-valley.jpg"]),
            photo_geolocations: true,
            languages: tags(&["English", "Nepali", "French"]),
            last_updated: date(2024, 11, 20),
            researcher_name: "Dr. Priya Sharma".into(),
            research_notes: "Documenting cultural preservation efforts and urban development impacts.".into(),
            ..Location::default()
        },
        Location {
            id: "4".into(),
            name: "Namche Bazaar".into(),
            location_type: LocationType::Village,
            region: "Nepal".into(),
            country: "Nepal".into(),
            latitude: 27.8089,
            longitude: 86.71,
            elevation: Some(3440),
            short_description: "Gateway to the Everest region, this Sherpa trading village is crucial for mountaineering expeditions and cultural tourism.".into(),
            full_history: "Originally a salt trading post, Namche Bazaar has evolved into the primary hub for Everest region tourism and mountaineering support.".into(),
            local_legends: "Sacred sites and Sherpa traditions related to mountain spirituality.".into(),
            geological_formation: "Nestled in a glacially carved valley.".into(),
            research_history: "Studies of Sherpa culture, mountaineering history, and tourism impacts.".into(),
            historical_significance: tags(&["Cultural", "Environmental"]),
            climate_zone: "Sub-Alpine".into(),
            flora_tags: tags(&["Rhododendron forest", "Alpine herbs"]),
            fauna_tags: tags(&["Musk deer", "Himalayan pheasant", "Snow leopard"]),
            photo_urls: links(&["/namche-bazaar.jpg", "/sherpa-village.jpg"]),
            photo_geolocations: true,
            languages: tags(&["English", "Nepali"]),
            last_updated: date(2024, 11, 18),
            researcher_name: "Dr. Michael Torres".into(),
            research_notes: "Researching cultural adaptation and tourism sustainability.".into(),
            ..Location::default()
        },
        Location {
            id: "5".into(),
            name: "Lhotse".into(),
            location_type: LocationType::Peak,
            region: "Nepal".into(),
            country: "Nepal".into(),
            latitude: 27.9617,
            longitude: 86.9331,
            elevation: Some(8516),
            short_description: "The fourth highest mountain in the world, known as the \"South Peak\" and integral to the Everest climbing route.".into(),
            full_history: "Part of the Everest massif, Lhotse has been studied extensively through mountaineering expeditions and geological surveys.".into(),
            local_legends: "Associated with Sherpa spiritual traditions.".into(),
            geological_formation: "Part of the Everest-Lhotse massif formed by tectonic collision.".into(),
            research_history: "Glaciological and mountaineering research.".into(),
            historical_significance: tags(&["Geological", "Environmental"]),
            climate_zone: "High Alpine".into(),
            flora_tags: tags(&["Alpine tundra"]),
            fauna_tags: tags(&["High altitude birds", "Snow leopard habitat"]),
            photo_urls: links(&["/lhotse-peak.jpg", "/everest-massif.jpg"]),
            photo_geolocations: true,
            languages: tags(&["English", "Nepali"]),
            last_updated: date(2024, 11, 12),
            researcher_name: "Dr. Anna Mueller".into(),
            research_notes: "Monitoring glacial changes and climate impacts.".into(),
            ..Location::default()
        },
        Location {
            id: "6".into(),
            name: "Panauti Archaeological Site".into(),
            location_type: LocationType::ArchaeologicalSite,
            region: "Nepal".into(),
            country: "Nepal".into(),
            latitude: 27.6089,
            longitude: 85.3031,
            elevation: Some(900),
            short_description: "Ancient archaeological site with significant historical artifacts and evidence of early settlements in the Kathmandu Valley.".into(),
            full_history: "Extensive excavations have revealed pottery, tools, and structures dating back several centuries, providing insights into valley settlement patterns.".into(),
            local_legends: "Local stories about ancient settlements and civilizations.".into(),
            geological_formation: "Situated in the fertile Kathmandu Valley.".into(),
            research_history: "Archaeological excavations and artifact analysis since the 1980s.".into(),
            historical_significance: tags(&["Archaeological", "Cultural"]),
            climate_zone: "Temperate".into(),
            flora_tags: tags(&["Valley vegetation", "Agricultural areas"]),
            fauna_tags: tags(&["Common valley species"]),
            photo_urls: links(&["/archaeological-site.jpg", "/ancient-pottery.jpg"]),
            photo_geolocations: true,
            languages: tags(&["English", "Nepali"]),
            last_updated: date(2024, 11, 10),
            researcher_name: "Dr. Rajesh Kumar".into(),
            research_notes: "Documenting artifacts and preservation efforts.".into(),
            ..Location::default()
        },
    ]
}

/// Load and validate a fallback collection from a YAML file.
///
/// The file has a single top-level `locations:` list whose entries use the
/// same camelCase keys as the JSON API.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_fallback_file(path: &Path) -> Result<Vec<Location>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FallbackFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: FallbackFile =
        serde_yaml::from_str(&content).map_err(ConfigError::FallbackFileParse)?;

    validate_locations(&file.locations)?;

    tracing::info!(
        path = %path.display(),
        count = file.locations.len(),
        "loaded fallback locations file"
    );
    Ok(file.locations)
}

/// Checks the invariants a fallback collection must hold.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] for an empty collection, a blank name
/// or id, a duplicate id, or coordinates outside the valid range.
pub fn validate_locations(locations: &[Location]) -> Result<(), ConfigError> {
    if locations.is_empty() {
        return Err(ConfigError::Validation(
            "fallback collection must contain at least one location".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();

    for loc in locations {
        if loc.id.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "location '{}' has an empty id",
                loc.name
            )));
        }

        if loc.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "location '{}' has an empty name",
                loc.id
            )));
        }

        if !seen_ids.insert(loc.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate location id: '{}'",
                loc.id
            )));
        }

        if !(-90.0..=90.0).contains(&loc.latitude) || !(-180.0..=180.0).contains(&loc.longitude) {
            return Err(ConfigError::Validation(format!(
                "location '{}' has out-of-range coordinates ({}, {})",
                loc.id, loc.latitude, loc.longitude
            )));
        }
    }

    Ok(())
}
