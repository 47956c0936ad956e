mod facets;
mod locations;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use himalaya_store::{DataOrigin, LoadedLocations, LocationSession};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{enforce_rate_limit, request_id, RateLimitState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<LocationSession>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_source: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    data_source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location_count: Option<usize>,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
            data_source: None,
        }
    }

    /// Meta for a response computed from `loaded`.
    pub(super) fn for_load(request_id: String, loaded: &LoadedLocations) -> Self {
        Self {
            data_source: Some(loaded.origin.label()),
            ..Self::new(request_id)
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "loading" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// The committed collection, or a 503 `loading` error while the first load
/// is still in flight.
pub(super) async fn require_loaded(
    state: &AppState,
    request_id: &str,
) -> Result<Arc<LoadedLocations>, ApiError> {
    state.session.current().await.ok_or_else(|| {
        ApiError::new(
            request_id,
            "loading",
            "locations are still loading; retry shortly",
        )
    })
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
        .expose_headers([HeaderName::from_static("x-request-id")])
}

fn data_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/locations", get(locations::list_locations))
        .route("/api/v1/locations/{id}", get(locations::get_location))
        .route("/api/v1/map/features", get(locations::list_map_features))
        .route("/api/v1/facets", get(facets::get_facets))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(data_router(rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(CompressionLayer::new())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let Some(loaded) = state.session.current().await else {
        return Json(ApiResponse {
            data: HealthData {
                status: "loading",
                data_source: "pending",
                fallback_reason: None,
                location_count: None,
            },
            meta: ResponseMeta::new(req_id.0),
        });
    };

    let fallback_reason = match &loaded.origin {
        DataOrigin::Fallback(reason) => Some(reason.to_string()),
        DataOrigin::Airtable => None,
    };

    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            data_source: loaded.origin.label(),
            fallback_reason,
            location_count: Some(loaded.locations.len()),
        },
        meta: ResponseMeta::for_load(req_id.0, &loaded),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use himalaya_core::fallback_locations;
    use himalaya_store::FallbackReason;
    use tower::ServiceExt;

    async fn loaded_state() -> AppState {
        let session = Arc::new(LocationSession::new());
        let ticket = session.begin();
        session
            .commit(
                ticket,
                LoadedLocations {
                    locations: fallback_locations(),
                    origin: DataOrigin::Fallback(FallbackReason::Unconfigured),
                    loaded_at: Utc::now(),
                },
            )
            .await;
        AppState { session }
    }

    fn pending_state() -> AppState {
        AppState {
            session: Arc::new(LocationSession::new()),
        }
    }

    fn app(state: AppState) -> Router {
        build_app(state, RateLimitState::per_minute(1_000))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        (status, json)
    }

    fn names(json: &serde_json::Value) -> Vec<String> {
        json["data"]["locations"]
            .as_array()
            .expect("locations array")
            .iter()
            .map(|l| l["name"].as_str().expect("name").to_owned())
            .collect()
    }

    #[test]
    fn api_error_codes_map_to_statuses() {
        let cases = [
            ("not_found", StatusCode::NOT_FOUND),
            ("bad_request", StatusCode::BAD_REQUEST),
            ("loading", StatusCode::SERVICE_UNAVAILABLE),
            ("rate_limited", StatusCode::TOO_MANY_REQUESTS),
            ("anything_else", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, expected) in cases {
            let response = ApiError::new("req-1", code, "msg").into_response();
            assert_eq!(response.status(), expected, "code {code}");
        }
    }

    #[tokio::test]
    async fn health_reports_loading_before_first_commit() {
        let (status, json) = get_json(app(pending_state()), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "loading");
        assert_eq!(json["data"]["data_source"], "pending");
    }

    #[tokio::test]
    async fn health_reports_fallback_reason() {
        let (status, json) = get_json(app(loaded_state().await), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["data_source"], "fallback");
        assert_eq!(json["data"]["fallback_reason"], "unconfigured");
        assert_eq!(json["data"]["location_count"], 6);
    }

    #[tokio::test]
    async fn data_routes_return_503_while_loading() {
        for uri in [
            "/api/v1/locations",
            "/api/v1/locations/1",
            "/api/v1/facets",
            "/api/v1/map/features",
        ] {
            let (status, json) = get_json(app(pending_state()), uri).await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
            assert_eq!(json["error"]["code"], "loading");
        }
    }

    #[tokio::test]
    async fn list_without_filters_returns_everything_in_order() {
        let (status, json) = get_json(app(loaded_state().await), "/api/v1/locations").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["total"], 6);
        assert_eq!(json["data"]["active_filter_count"], 0);
        assert_eq!(json["meta"]["data_source"], "fallback");
        assert_eq!(
            names(&json),
            vec![
                "Sinja Valley",
                "Mt. Everest",
                "Kathmandu Valley",
                "Namche Bazaar",
                "Lhotse",
                "Panauti Archaeological Site"
            ]
        );
    }

    #[tokio::test]
    async fn list_applies_search_and_facets() {
        let (_, json) = get_json(app(loaded_state().await), "/api/v1/locations?search=sherpa").await;
        assert_eq!(names(&json), vec!["Mt. Everest", "Namche Bazaar"]);

        let (_, json) = get_json(
            app(loaded_state().await),
            "/api/v1/locations?region=Nepal&language=French",
        )
        .await;
        assert_eq!(names(&json), vec!["Sinja Valley", "Kathmandu Valley"]);
        assert_eq!(json["data"]["active_filter_count"], 2);
    }

    #[tokio::test]
    async fn list_accepts_comma_separated_types() {
        let (_, json) = get_json(
            app(loaded_state().await),
            "/api/v1/locations?type=Peak,%20Village",
        )
        .await;
        assert_eq!(
            names(&json),
            vec!["Mt. Everest", "Kathmandu Valley", "Namche Bazaar", "Lhotse"]
        );
    }

    #[tokio::test]
    async fn list_applies_elevation_range() {
        let (_, json) = get_json(
            app(loaded_state().await),
            "/api/v1/locations?min_elevation=3000&max_elevation=9000",
        )
        .await;
        assert_eq!(names(&json), vec!["Mt. Everest", "Namche Bazaar", "Lhotse"]);
    }

    #[tokio::test]
    async fn extended_scope_searches_tags() {
        let (_, basic) = get_json(
            app(loaded_state().await),
            "/api/v1/locations?search=snow%20leopard",
        )
        .await;
        let (_, extended) = get_json(
            app(loaded_state().await),
            "/api/v1/locations?search=snow%20leopard&scope=extended",
        )
        .await;
        assert!(names(&extended).len() > names(&basic).len());
    }

    #[tokio::test]
    async fn invalid_query_values_return_400() {
        for uri in [
            "/api/v1/locations?min_elevation=high",
            "/api/v1/locations?max_elevation=-5",
            "/api/v1/locations?scope=everything",
            "/api/v1/map/features?min_elevation=x",
        ] {
            let (status, json) = get_json(app(loaded_state().await), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(json["error"]["code"], "bad_request");
        }
    }

    #[tokio::test]
    async fn get_location_by_id() {
        let (status, json) = get_json(app(loaded_state().await), "/api/v1/locations/2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["name"], "Mt. Everest");
        assert_eq!(json["data"]["type"], "Peak");
        assert_eq!(json["data"]["elevation"], 8848);
    }

    #[tokio::test]
    async fn unknown_location_id_is_404() {
        let (status, json) = get_json(app(loaded_state().await), "/api/v1/locations/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn facets_cover_full_collection() {
        let (status, json) = get_json(app(loaded_state().await), "/api/v1/facets").await;
        assert_eq!(status, StatusCode::OK);
        let types = json["data"]["types"].as_array().expect("types");
        let peak = types
            .iter()
            .find(|t| t["value"] == "Peak")
            .expect("Peak facet");
        assert_eq!(peak["count"], 2);
        assert!(json["data"]["elevation"]["max"].as_u64().is_some());
    }

    #[tokio::test]
    async fn map_features_follow_filters() {
        let (status, json) = get_json(
            app(loaded_state().await),
            "/api/v1/map/features?type=Peak",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["type"], "FeatureCollection");
        let features = json["data"]["features"].as_array().expect("features");
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["properties"]["name"], "Mt. Everest");
    }

    #[tokio::test]
    async fn request_id_header_is_echoed() {
        let response = app(loaded_state().await)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header("x-request-id", "req-abc")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(
            response
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok()),
            Some("req-abc")
        );
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        assert_eq!(json["meta"]["request_id"], "req-abc");
    }

    #[tokio::test]
    async fn data_routes_are_rate_limited() {
        let app = build_app(loaded_state().await, RateLimitState::per_minute(1));
        let (first, _) = get_json(app.clone(), "/api/v1/facets").await;
        assert_eq!(first, StatusCode::OK);
        let (second, json) = get_json(app.clone(), "/api/v1/facets").await;
        assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["error"]["code"], "rate_limited");
        assert!(json["meta"]["request_id"].as_str().is_some_and(|id| !id.is_empty()));

        let (health, _) = get_json(app, "/api/v1/health").await;
        assert_eq!(health, StatusCode::OK);
    }
}
