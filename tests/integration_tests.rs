//! Integration tests for the MapQuery HTTP API

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use mapquery::config::{MapQueryConfig, RoutingConfig, ServerConfig};
use mapquery::models::{GeocodeSource, RouteSource};
use mapquery::{
    AppState, Coordinates, DirectionsProvider, GeocodedLocation, GeocodingProvider, MapQueryError,
    Result, RouteResult, TextGenerator, TravelMode, web,
};

struct FakeGeocoder;

#[async_trait]
impl GeocodingProvider for FakeGeocoder {
    async fn forward(&self, query: &str) -> Result<Option<GeocodedLocation>> {
        if query.eq_ignore_ascii_case("Springfield") {
            return Ok(Some(GeocodedLocation {
                name: query.to_string(),
                coordinates: Coordinates::new(-89.65, 39.78),
                place_name: Some("Springfield, Illinois, United States".into()),
                source: GeocodeSource::Remote,
            }));
        }
        Ok(None)
    }
}

#[derive(Default)]
struct FakeDirections {
    calls: AtomicUsize,
}

#[async_trait]
impl DirectionsProvider for FakeDirections {
    async fn directions(
        &self,
        waypoints: &[Coordinates],
        _mode: TravelMode,
        _preferences: &[String],
    ) -> Result<Option<RouteResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(RouteResult {
            path: waypoints.iter().map(|c| c.to_lon_lat()).collect(),
            source: RouteSource::Directions,
            distance_km: 464.0,
            duration_seconds: Some(17_000.0),
        }))
    }
}

struct EchoGenerator;

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(&self, prompt: &str, json: bool) -> Result<String> {
        if json {
            return Err(MapQueryError::api("model offline"));
        }
        Ok(format!("echo: {prompt}"))
    }
}

fn app_with(generator: bool, token: Option<&str>) -> (Router, Arc<FakeDirections>) {
    let directions = Arc::new(FakeDirections::default());
    let state = AppState::new(
        Some(Arc::new(FakeGeocoder)),
        Some(directions.clone()),
        generator.then(|| Arc::new(EchoGenerator) as Arc<dyn TextGenerator>),
        &RoutingConfig::default(),
        token.map(str::to_string),
    );
    (web::app(state, &ServerConfig::default()), directions)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_upstreams() {
    let (app, _) = app_with(false, None);
    let (status, body) = send(app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["upstreams"]["geocoding"], true);
    assert_eq!(body["upstreams"]["llm"], false);
    assert!(body["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn test_token_endpoint() {
    let (app, _) = app_with(false, Some("pk.public"));
    let (status, body) = send(app, get("/api/token")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"], "pk.public");

    let (app, _) = app_with(false, None);
    let (status, body) = send(app, get("/api/token")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "unavailable");
}

#[tokio::test]
async fn test_token_endpoint_keeps_access_token_private() {
    let mut config = MapQueryConfig::default();
    config.mapbox.access_token = Some("sk.server-secret".to_string());
    let state = AppState::from_config(&config).unwrap();
    let app = web::app(state, &ServerConfig::default());

    let response = app.oneshot(get("/api/token")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(!String::from_utf8_lossy(&bytes).contains("sk.server-secret"));
}

#[tokio::test]
async fn test_geocode_endpoint() {
    let (app, _) = app_with(false, None);
    let (status, body) = send(app.clone(), get("/api/geocode?query=Springfield")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "remote");
    assert_eq!(body["coordinates"]["latitude"], 39.78);

    let (status, body) = send(app.clone(), get("/api/geocode?query=Qwxzzy")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, body) = send(app, get("/api/geocode")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn test_directions_endpoint() {
    let (app, directions) = app_with(false, None);
    let request = post_json(
        "/api/directions",
        json!({ "coordinates": [[2.3522, 48.8566], [4.8357, 45.7640]], "mode": "cycling" }),
    );
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "directions");
    assert_eq!(body["path"].as_array().unwrap().len(), 2);
    assert_eq!(directions.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_directions_long_leg_is_geodesic() {
    let (app, directions) = app_with(false, None);
    let request = post_json(
        "/api/directions",
        json!({ "coordinates": [[2.3522, 48.8566], [139.6503, 35.6762]] }),
    );
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "geodesic");
    assert_eq!(body["path"].as_array().unwrap().len(), 50);
    assert_eq!(directions.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_directions_validation() {
    let (app, _) = app_with(false, None);
    let (status, body) = send(
        app.clone(),
        post_json("/api/directions", json!({ "coordinates": [[2.0, 48.0]] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");

    let (status, _) = send(
        app.clone(),
        post_json(
            "/api/directions",
            json!({ "coordinates": [[2.0, 48.0], [3.0, 49.0]], "mode": "teleport" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(app, post_json("/api/directions", json!({ "waypoints": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn test_llm_endpoint() {
    let (app, _) = app_with(true, None);
    let (status, body) = send(app, post_json("/api/llm", json!({ "prompt": "hi" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "echo: hi");

    let (app, _) = app_with(false, None);
    let (status, _) = send(app, post_json("/api/llm", json!({ "prompt": "hi" }))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_extract_endpoint() {
    let (app, _) = app_with(false, None);
    let (status, body) = send(
        app.clone(),
        post_json(
            "/api/extract",
            json!({ "query": "Route from Paris to London tomorrow" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intentType"], "route");
    assert_eq!(body["visualizationType"], "route");
    assert_eq!(body["locations"][0]["name"], "Paris");
    assert_eq!(body["locations"][1]["timeContext"], "tomorrow");
    assert_eq!(body["suggestedSequence"], json!(["Paris", "London"]));

    let (status, body) = send(app, post_json("/api/extract", json!({ "query": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn test_extract_survives_model_failure() {
    let (app, _) = app_with(true, None);
    let (status, body) = send(
        app,
        post_json("/api/extract", json!({ "query": "Rome and Florence next week" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["intentType"], "locations");
    assert_eq!(body["locations"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_visualize_endpoint() {
    let (app, directions) = app_with(false, None);
    let (status, body) = send(
        app,
        post_json(
            "/api/visualize",
            json!({ "query": "Drive from Paris to Milan via Lyon" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["extraction"]["intentType"], "route");

    let commands = body["commands"].as_array().unwrap();
    assert_eq!(commands[0]["type"], "clearMarkers");
    let markers: Vec<&Value> = commands
        .iter()
        .filter(|c| c["type"] == "addMarker")
        .collect();
    assert_eq!(markers.len(), 3);
    assert_eq!(markers[0]["marker"]["label"], "Paris");
    assert_eq!(markers[0]["marker"]["role"], "origin");
    assert_eq!(markers[1]["marker"]["label"], "Lyon");
    assert_eq!(markers[2]["marker"]["role"], "destination");
    assert!(commands.iter().any(|c| c["type"] == "setRoute"));

    assert_eq!(body["summary"]["route"]["source"], "directions");
    assert_eq!(directions.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_api_route() {
    let (app, _) = app_with(false, None);
    let response = app.oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
