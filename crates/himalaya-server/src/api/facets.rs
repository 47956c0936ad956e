use axum::{extract::State, Extension, Json};
use himalaya_core::{facets, Facets};

use crate::middleware::RequestId;

use super::{require_loaded, ApiError, ApiResponse, AppState, ResponseMeta};

/// Facet values and counts over the full collection, for building filter
/// controls. Independent of any active filter.
pub(super) async fn get_facets(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Facets>>, ApiError> {
    let loaded = require_loaded(&state, &req_id.0).await?;

    Ok(Json(ApiResponse {
        data: facets(&loaded.locations),
        meta: ResponseMeta::for_load(req_id.0, &loaded),
    }))
}
