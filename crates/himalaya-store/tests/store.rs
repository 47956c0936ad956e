//! Integration tests for `LocationStore` and `LocationSession` against a
//! wiremock Airtable.

use std::time::Duration;

use himalaya_core::{evaluate, fallback_locations, FilterSpec, LocationType};
use himalaya_store::{
    AirtableClient, DataOrigin, FallbackReason, LocationSession, LocationStore,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TABLE_PATH: &str = "/appTEST/Locations";

fn store_for(server: &MockServer, load_timeout: Duration) -> LocationStore {
    let client = AirtableClient::with_base_url(&server.uri(), "appTEST", "pat", "Locations", 5)
        .expect("client construction should not fail");
    LocationStore::new(Some(client), fallback_locations(), load_timeout)
}

async fn mount_records(server: &MockServer, records: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "records": records
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn live_records_are_normalized() {
    let server = MockServer::start().await;
    mount_records(
        &server,
        serde_json::json!([
            {
                "id": "recGokyo",
                "fields": {
                    "Location Name": "Gokyo Lakes",
                    "Location Type": "Lake",
                    "Region": "Khumbu",
                    "Latitude": 27.95,
                    "Longitude": 86.69,
                    "Altitude/Elevation": 4790,
                    "Language Tags": ["English", "Nepali"]
                }
            },
            {
                "id": "recMystery",
                "fields": { "Location Type": "Glacier" }
            }
        ]),
    )
    .await;

    let loaded = store_for(&server, Duration::from_secs(5)).load().await;

    assert_eq!(loaded.origin, DataOrigin::Airtable);
    assert!(!loaded.is_fallback());
    assert_eq!(loaded.locations.len(), 2);

    let gokyo = &loaded.locations[0];
    assert_eq!(gokyo.location_type, LocationType::Lake);
    assert_eq!(gokyo.elevation, Some(4790));
    assert_eq!(gokyo.region, "Khumbu");

    let mystery = &loaded.locations[1];
    assert_eq!(mystery.location_type, LocationType::Valley);
    assert_eq!(mystery.region, "Nepal");
    assert_eq!(mystery.languages, vec!["English"]);
}

#[tokio::test]
async fn duplicate_ids_keep_first_record() {
    let server = MockServer::start().await;
    mount_records(
        &server,
        serde_json::json!([
            { "id": "recA", "fields": { "Location Name": "First" } },
            { "id": "recA", "fields": { "Location Name": "Second" } },
            { "id": "recB", "fields": { "Location Name": "Other" } }
        ]),
    )
    .await;

    let loaded = store_for(&server, Duration::from_secs(5)).load().await;
    let names: Vec<&str> = loaded.locations.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["First", "Other"]);
}

#[tokio::test]
async fn empty_table_falls_back() {
    let server = MockServer::start().await;
    mount_records(&server, serde_json::json!([])).await;

    let loaded = store_for(&server, Duration::from_secs(5)).load().await;
    assert_eq!(loaded.origin, DataOrigin::Fallback(FallbackReason::Empty));
    assert_eq!(loaded.locations, fallback_locations());
}

#[tokio::test]
async fn server_error_falls_back_with_transport_reason() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let loaded = store_for(&server, Duration::from_secs(5)).load().await;
    assert!(matches!(
        loaded.origin,
        DataOrigin::Fallback(FallbackReason::Transport(_))
    ));
    assert_eq!(loaded.locations.len(), 6);
}

#[tokio::test]
async fn rejected_credentials_fall_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": { "type": "AUTHENTICATION_REQUIRED" }
        })))
        .mount(&server)
        .await;

    let loaded = store_for(&server, Duration::from_secs(5)).load().await;
    assert!(matches!(
        loaded.origin,
        DataOrigin::Fallback(FallbackReason::Transport(_))
    ));
    assert!(!loaded.locations.is_empty());
    assert_eq!(loaded.locations, fallback_locations());
}

#[tokio::test]
async fn unreachable_source_falls_back() {
    let client =
        AirtableClient::with_base_url("http://127.0.0.1:1/", "appTEST", "pat", "Locations", 2)
            .expect("client construction should not fail");
    let store = LocationStore::new(Some(client), fallback_locations(), Duration::from_secs(3));

    let loaded = store.load().await;
    assert!(loaded.is_fallback());
    assert!(matches!(
        loaded.origin,
        DataOrigin::Fallback(FallbackReason::Transport(_) | FallbackReason::Timeout)
    ));
    assert_eq!(loaded.locations.len(), 6);
}

#[tokio::test]
async fn slow_response_falls_back_with_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "records": [] }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let loaded = store_for(&server, Duration::from_millis(200)).load().await;
    assert_eq!(loaded.origin, DataOrigin::Fallback(FallbackReason::Timeout));
    assert_eq!(loaded.locations.len(), 6);
}

#[tokio::test]
async fn fallback_data_answers_filter_queries() {
    let store = LocationStore::new(None, fallback_locations(), Duration::from_secs(1));
    let loaded = store.load().await;
    assert_eq!(
        loaded.origin,
        DataOrigin::Fallback(FallbackReason::Unconfigured)
    );

    let peaks = evaluate(
        &loaded.locations,
        &FilterSpec::default().with_types(["Peak"]),
    );
    let names: Vec<&str> = peaks.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Mt. Everest", "Lhotse"]);
}

#[tokio::test]
async fn session_refresh_publishes_live_data() {
    let server = MockServer::start().await;
    mount_records(
        &server,
        serde_json::json!([{ "id": "recX", "fields": { "Location Name": "Tengboche" } }]),
    )
    .await;

    let store = store_for(&server, Duration::from_secs(5));
    let session = LocationSession::new();
    assert!(session.current().await.is_none());

    assert!(session.refresh(&store).await);
    let current = session.current().await.expect("committed");
    assert_eq!(current.origin, DataOrigin::Airtable);
    assert_eq!(current.locations[0].name, "Tengboche");
}
