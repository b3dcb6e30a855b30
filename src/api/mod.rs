//! HTTP endpoints mounted under `/api`

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, warn};

use crate::config::{MapQueryConfig, RoutingConfig};
use crate::extractor::IntentExtractor;
use crate::geocoding::{Geocoder, GeocodingProvider};
use crate::llm::{GeminiClient, TextGenerator};
use crate::mapbox::MapboxClient;
use crate::models::{Coordinates, ExtractionResult, GeocodedLocation, RouteResult, TravelMode};
use crate::routing::{DirectionsProvider, RouteService};
use crate::visualization::{CommandRecorder, MapCommand, VisualizationApplier, VisualizationSummary};
use crate::{MapQueryError, Result};

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<IntentExtractor>,
    pub geocoder: Arc<Geocoder>,
    pub router: Arc<RouteService>,
    pub applier: Arc<VisualizationApplier>,
    pub generator: Option<Arc<dyn TextGenerator>>,
    /// Token handed to the browser map
    pub map_token: Option<String>,
}

impl AppState {
    pub fn new(
        geocoding: Option<Arc<dyn GeocodingProvider>>,
        directions: Option<Arc<dyn DirectionsProvider>>,
        generator: Option<Arc<dyn TextGenerator>>,
        routing: &RoutingConfig,
        map_token: Option<String>,
    ) -> Self {
        let geocoder = Arc::new(Geocoder::with_capacity(
            geocoding,
            routing.geocode_cache_capacity,
        ));
        let router = Arc::new(RouteService::new(directions, routing));
        Self {
            extractor: Arc::new(IntentExtractor::new(generator.clone())),
            applier: Arc::new(VisualizationApplier::new(geocoder.clone(), router.clone())),
            geocoder,
            router,
            generator,
            map_token,
        }
    }

    /// Wire up Mapbox and Gemini clients for whichever credentials are configured
    pub fn from_config(config: &MapQueryConfig) -> Result<Self> {
        let mapbox = if config.mapbox.access_token.is_some() {
            Some(Arc::new(MapboxClient::new(&config.mapbox)?))
        } else {
            warn!("No Mapbox access token configured, using built-in city table and geodesic routes");
            None
        };
        let generator: Option<Arc<dyn TextGenerator>> = if config.gemini.api_key.is_some() {
            Some(Arc::new(GeminiClient::new(&config.gemini)?))
        } else {
            warn!("No Gemini API key configured, extraction uses rules and string matching only");
            None
        };

        Ok(Self::new(
            mapbox.clone().map(|c| c as Arc<dyn GeocodingProvider>),
            mapbox.map(|c| c as Arc<dyn DirectionsProvider>),
            generator,
            &config.routing,
            config.mapbox.browser_token().map(str::to_string),
        ))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/token", get(token))
        .route("/geocode", get(geocode))
        .route("/directions", post(directions))
        .route("/llm", post(llm))
        .route("/extract", post(extract))
        .route("/visualize", post(visualize))
        .with_state(state)
}

impl IntoResponse for MapQueryError {
    fn into_response(self) -> Response {
        let status = match &self {
            MapQueryError::Validation { .. } => StatusCode::BAD_REQUEST,
            MapQueryError::NotFound { .. } => StatusCode::NOT_FOUND,
            MapQueryError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            MapQueryError::Api { .. } => StatusCode::BAD_GATEWAY,
            MapQueryError::Config { .. } | MapQueryError::Io { .. } | MapQueryError::General { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = json!({ "error": self.user_message(), "code": self.code() });
        (status, Json(body)).into_response()
    }
}

/// Unwrap a JSON body, turning rejections into validation errors
fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| MapQueryError::validation(rejection.body_text()))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "upstreams": {
            "geocoding": state.geocoder.has_remote(),
            "directions": state.router.has_remote(),
            "llm": state.generator.is_some(),
        }
    }))
}

#[derive(Serialize)]
struct TokenResponse {
    token: String,
}

async fn token(State(state): State<AppState>) -> Result<Json<TokenResponse>> {
    state
        .map_token
        .map(|token| Json(TokenResponse { token }))
        .ok_or_else(|| MapQueryError::unavailable("Mapbox token not configured"))
}

#[derive(Deserialize)]
struct GeocodeParams {
    query: Option<String>,
}

async fn geocode(
    State(state): State<AppState>,
    Query(params): Query<GeocodeParams>,
) -> Result<Json<GeocodedLocation>> {
    let query = params.query.unwrap_or_default();
    Ok(Json(state.geocoder.geocode(&query).await?))
}

#[derive(Deserialize)]
pub struct DirectionsRequest {
    /// `[lon, lat]` pairs in travel order
    pub coordinates: Vec<[f64; 2]>,
    pub mode: Option<String>,
    #[serde(default)]
    pub preferences: Vec<String>,
}

async fn directions(
    State(state): State<AppState>,
    payload: std::result::Result<Json<DirectionsRequest>, JsonRejection>,
) -> Result<Json<RouteResult>> {
    let request = body(payload)?;
    let mode = match request.mode.as_deref() {
        None => TravelMode::default(),
        Some(raw) => TravelMode::parse(raw)
            .ok_or_else(|| MapQueryError::validation(format!("Unknown travel mode '{raw}'")))?,
    };
    let waypoints: Vec<Coordinates> = request
        .coordinates
        .into_iter()
        .map(Coordinates::from_lon_lat)
        .collect();

    let route = state
        .router
        .route(&waypoints, mode, &request.preferences)
        .await?;
    Ok(Json(route))
}

#[derive(Deserialize)]
pub struct LlmRequest {
    pub prompt: String,
}

#[derive(Serialize)]
struct LlmResponse {
    text: String,
}

async fn llm(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LlmRequest>, JsonRejection>,
) -> Result<Json<LlmResponse>> {
    let request = body(payload)?;
    let generator = state
        .generator
        .as_ref()
        .ok_or_else(|| MapQueryError::unavailable("Gemini API key not configured"))?;
    let text = generator.generate(&request.prompt, false).await?;
    Ok(Json(LlmResponse { text }))
}

#[derive(Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

async fn extract(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<ExtractionResult>> {
    let request = body(payload)?;
    Ok(Json(state.extractor.extract(&request.query).await?))
}

#[derive(Serialize)]
pub struct VisualizeResponse {
    pub extraction: ExtractionResult,
    pub commands: Vec<MapCommand>,
    pub summary: VisualizationSummary,
}

async fn visualize(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<VisualizeResponse>> {
    let request = body(payload)?;
    let extraction = state.extractor.extract(&request.query).await?;
    let mut canvas = CommandRecorder::new();
    let summary = state.applier.apply(&extraction, &mut canvas).await;
    Ok(Json(VisualizeResponse {
        extraction,
        commands: canvas.into_commands(),
        summary,
    }))
}
