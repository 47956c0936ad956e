use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use himalaya_core::{
    evaluate, find_by_id, to_feature_collection, FeatureCollection, FilterSpec, Location,
    SearchScope, DEFAULT_MAX_ELEVATION, DEFAULT_MIN_ELEVATION,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{require_loaded, ApiError, ApiResponse, AppState, ResponseMeta};

/// Query surface shared by `/locations` and `/map/features`.
///
/// Numeric fields arrive as raw strings so malformed values produce the
/// envelope-shaped 400 rather than axum's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub(super) struct LocationsQuery {
    pub search: Option<String>,
    pub scope: Option<String>,
    #[serde(rename = "type")]
    pub types: Option<String>,
    pub region: Option<String>,
    pub language: Option<String>,
    pub significance: Option<String>,
    pub min_elevation: Option<String>,
    pub max_elevation: Option<String>,
}

impl LocationsQuery {
    pub(super) fn into_filter_spec(self, request_id: &str) -> Result<FilterSpec, ApiError> {
        let bad = |message: String| ApiError::new(request_id, "bad_request", message);

        let scope = match self.scope.as_deref().map(str::trim) {
            None | Some("") => SearchScope::default(),
            Some(raw) => raw.parse::<SearchScope>().map_err(bad)?,
        };
        let min = parse_elevation("min_elevation", self.min_elevation.as_deref())
            .map_err(bad)?
            .unwrap_or(DEFAULT_MIN_ELEVATION);
        let max = parse_elevation("max_elevation", self.max_elevation.as_deref())
            .map_err(bad)?
            .unwrap_or(DEFAULT_MAX_ELEVATION);

        Ok(FilterSpec::default()
            .with_search(self.search.unwrap_or_default())
            .with_scope(scope)
            .with_types(split_list(self.types.as_deref()))
            .with_regions(split_list(self.region.as_deref()))
            .with_languages(split_list(self.language.as_deref()))
            .with_significance(split_list(self.significance.as_deref()))
            .with_elevation(min, max))
    }
}

/// Comma-separated multi-select values. Blank entries are dropped.
fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_elevation(name: &str, raw: Option<&str>) -> Result<Option<u32>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<u32>().map(Some).map_err(|_| {
            format!("{name} must be a non-negative whole number of meters, got '{value}'")
        }),
    }
}

#[derive(Debug, Serialize)]
pub(super) struct LocationList {
    pub locations: Vec<Location>,
    /// Size of the full collection before filtering.
    pub total: usize,
    pub active_filter_count: usize,
}

pub(super) async fn list_locations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<LocationsQuery>,
) -> Result<Json<ApiResponse<LocationList>>, ApiError> {
    let spec = query.into_filter_spec(&req_id.0)?;
    let loaded = require_loaded(&state, &req_id.0).await?;

    let locations = evaluate(&loaded.locations, &spec);
    tracing::debug!(
        matched = locations.len(),
        total = loaded.locations.len(),
        active_filters = spec.active_filter_count(),
        "evaluated location filter"
    );

    Ok(Json(ApiResponse {
        data: LocationList {
            locations,
            total: loaded.locations.len(),
            active_filter_count: spec.active_filter_count(),
        },
        meta: ResponseMeta::for_load(req_id.0, &loaded),
    }))
}

pub(super) async fn get_location(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Location>>, ApiError> {
    let loaded = require_loaded(&state, &req_id.0).await?;

    let Some(location) = find_by_id(&loaded.locations, &id).cloned() else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("location '{id}' not found"),
        ));
    };

    Ok(Json(ApiResponse {
        data: location,
        meta: ResponseMeta::for_load(req_id.0, &loaded),
    }))
}

pub(super) async fn list_map_features(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<LocationsQuery>,
) -> Result<Json<ApiResponse<FeatureCollection>>, ApiError> {
    let spec = query.into_filter_spec(&req_id.0)?;
    let loaded = require_loaded(&state, &req_id.0).await?;

    let subset = evaluate(&loaded.locations, &spec);

    Ok(Json(ApiResponse {
        data: to_feature_collection(&subset),
        meta: ResponseMeta::for_load(req_id.0, &loaded),
    }))
}
