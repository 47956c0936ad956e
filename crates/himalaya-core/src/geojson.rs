//! GeoJSON feed for the map widget.
//!
//! Clustering and heatmap layers are built by the widget from this feed;
//! only the point features and the properties its popups read are produced
//! here.

use serde::Serialize;

use crate::location::Location;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub geometry: PointGeometry,
    pub properties: FeatureProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// `[longitude, latitude]`, per RFC 7946.
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureProperties {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: String,
    pub region: String,
    pub elevation: Option<u32>,
    pub marker_color: &'static str,
}

impl From<&Location> for Feature {
    fn from(loc: &Location) -> Self {
        Feature {
            kind: "Feature",
            geometry: PointGeometry {
                kind: "Point",
                coordinates: [loc.longitude, loc.latitude],
            },
            properties: FeatureProperties {
                id: loc.id.clone(),
                name: loc.name.clone(),
                location_type: loc.location_type.as_str().to_owned(),
                region: loc.region.clone(),
                elevation: loc.elevation,
                marker_color: loc.location_type.marker_color(),
            },
        }
    }
}

#[must_use]
pub fn to_feature_collection(locations: &[Location]) -> FeatureCollection {
    FeatureCollection {
        kind: "FeatureCollection",
        features: locations.iter().map(Feature::from).collect(),
    }
}
