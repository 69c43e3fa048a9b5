//! HTTP-level tests for the CleanRoute API, driven in-process

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use cleanroute::config::LookupConfig;
use cleanroute::{
    AppState, Coordinate, DirectionsProvider, InMemoryReadingStore, PollutionReading,
    ProviderError, Route, RouteEnricher, RoutePlanner, Site,
};

/// Straight east-west path with `points` coordinates
fn path(points: usize, latitude: f64) -> Vec<Coordinate> {
    (0..points)
        .map(|i| Coordinate::new(-1.62 + 0.004 * i as f64, latitude))
        .collect()
}

enum Behaviour {
    Route(usize),
    Reject(u16, &'static str),
    Stall,
}

struct FakeDirections(Behaviour);

#[async_trait]
impl DirectionsProvider for FakeDirections {
    async fn directions(
        &self,
        coordinates: &[Coordinate],
        _profile: &str,
    ) -> Result<Route, ProviderError> {
        match &self.0 {
            // Detours run one "row" north of the base route so they never
            // pass the base route's sensors
            Behaviour::Route(points) => {
                let latitude = if coordinates.len() == 2 { 54.97 } else { 54.99 };
                Ok(Route::from_path(path(*points, latitude)))
            }
            Behaviour::Reject(status, message) => Err(ProviderError::Api {
                status: *status,
                message: (*message).to_string(),
            }),
            Behaviour::Stall => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ProviderError::Network("stalled".to_string()))
            }
        }
    }
}

fn store() -> InMemoryReadingStore {
    let sites = vec![
        Site {
            system_code_number: "CM1".to_string(),
            latitude: 54.97,
            longitude: -1.62,
        },
        Site {
            system_code_number: "CM2".to_string(),
            latitude: 54.99,
            longitude: -1.62,
        },
    ];
    let timestamp = NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|date| date.and_hms_opt(9, 30, 0))
        .unwrap();

    let mut dirty = PollutionReading::empty("CM1", timestamp);
    dirty.no2 = Some(300.0);
    dirty.co = Some(0.4);
    dirty.noise = Some(62.0);
    let mut clean = PollutionReading::empty("CM2", timestamp);
    clean.no2 = Some(152.5);

    InMemoryReadingStore::new(sites, vec![dirty, clean])
}

fn app(behaviour: Behaviour) -> Router {
    app_with_timeout(behaviour, Duration::from_secs(30))
}

fn app_with_timeout(behaviour: Behaviour, request_timeout: Duration) -> Router {
    let store = Arc::new(store());
    let enricher = RouteEnricher::new(store.clone(), &LookupConfig::default());
    let planner = RoutePlanner::new(
        Arc::new(FakeDirections(behaviour)),
        enricher,
        Duration::from_secs(60),
    );
    cleanroute::web::app(AppState::new(store, planner), request_timeout)
}

fn route_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/routing/route")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn valid_body(pollutant: &str) -> String {
    json!({
        "start": [-1.62, 54.97],
        "end": [-1.58, 54.97],
        "mode": "foot-walking",
        "pollutant": pollutant,
    })
    .to_string()
}

#[tokio::test]
async fn test_route_picks_cleanest_candidate() {
    let (status, body) = send(app(Behaviour::Route(11)), route_request(&valid_body("aqi"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "FeatureCollection");

    let feature = &body["features"][0];
    let coordinates = feature["geometry"]["coordinates"].as_array().unwrap();
    assert_eq!(coordinates.len(), 11);
    // Detours run along 54.99 past the cleaner CM2 sensor
    assert_eq!(coordinates[0], json!([-1.62, 54.99]));

    let scores = feature["properties"]["pollution_scores"].as_array().unwrap();
    assert_eq!(scores.len(), 11);
    assert_eq!(scores[0], json!(5.0));
    assert!(scores[1..].iter().all(Value::is_null));
    assert_eq!(feature["properties"]["average_pollution_score"], json!(5.0));
}

#[tokio::test]
async fn test_route_with_unsupported_pollutant_has_null_average() {
    let (status, body) = send(app(Behaviour::Route(6)), route_request(&valid_body("pm25"))).await;

    assert_eq!(status, StatusCode::OK);
    let properties = &body["features"][0]["properties"];
    assert!(properties["average_pollution_score"].is_null());
    let scores = properties["pollution_scores"].as_array().unwrap();
    assert_eq!(scores.len(), 6);
    assert!(scores.iter().all(Value::is_null));
}

#[tokio::test]
async fn test_missing_field_is_bad_request() {
    let body = json!({
        "start": [-1.62, 54.97],
        "mode": "foot-walking",
        "pollutant": "aqi",
    })
    .to_string();

    let (status, body) = send(app(Behaviour::Route(6)), route_request(&body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing required input fields"}));
}

#[tokio::test]
async fn test_unparseable_body_is_bad_request() {
    let (status, body) = send(app(Behaviour::Route(6)), route_request("{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required input fields");
}

#[tokio::test]
async fn test_malformed_coordinate_is_bad_request() {
    let body = json!({
        "start": "somewhere",
        "end": [-1.58, 54.97],
        "mode": "foot-walking",
        "pollutant": "aqi",
    })
    .to_string();

    let (status, body) = send(app(Behaviour::Route(6)), route_request(&body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("start"));
}

#[tokio::test]
async fn test_provider_failure_is_bad_gateway() {
    let behaviour = Behaviour::Reject(403, "Access to this API has been disallowed");
    let (status, body) = send(app(behaviour), route_request(&valid_body("aqi"))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("ORS API error:"));
    assert!(message.contains("disallowed"));
}

#[tokio::test(start_paused = true)]
async fn test_request_timeout_has_json_error_body() {
    let app = app_with_timeout(Behaviour::Stall, Duration::from_secs(2));
    let (status, body) = send(app, route_request(&valid_body("aqi"))).await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body, json!({"error": "Request timed out"}));
}

#[tokio::test]
async fn test_short_base_route_is_bad_request() {
    let (status, body) = send(app(Behaviour::Route(2)), route_request(&valid_body("aqi"))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Base route too short to extract waypoints");
}

#[tokio::test]
async fn test_sites_feature_collection() {
    let (status, body) = send(app(Behaviour::Route(6)), get("/sites")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "FeatureCollection");
    let features = body["features"].as_array().unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[0]["geometry"]["type"], "Point");
    assert_eq!(features[0]["geometry"]["coordinates"], json!([-1.62, 54.97]));
    assert_eq!(features[0]["properties"]["systemCodeNumber"], "CM1");
}

#[tokio::test]
async fn test_latest_readings_shape() {
    let (status, body) = send(app(Behaviour::Route(6)), get("/heatmap/latest_readings")).await;

    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);

    let cm1 = rows
        .iter()
        .find(|row| row["systemCodeNumber"] == "CM1")
        .unwrap();
    assert_eq!(cm1["latitude"], json!(54.97));
    assert_eq!(cm1["longitude"], json!(-1.62));
    assert_eq!(cm1["readings"]["no2"], json!(300.0));
    assert_eq!(cm1["readings"]["co"], json!(0.4));
    assert_eq!(cm1["readings"]["noise"], json!(62.0));
    assert!(cm1["readings"]["no"].is_null());
    assert!(
        cm1["readings"]["lastUpdated"]
            .as_str()
            .unwrap()
            .starts_with("2024-03-01T09:30:00")
    );
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(app(Behaviour::Route(6)), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], cleanroute::VERSION);
}
