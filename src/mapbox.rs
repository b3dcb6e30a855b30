//! Mapbox Geocoding and Directions client
//!
//! Keeps the secret access token on the server; the browser only ever talks
//! to our own endpoints.

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::config::MapboxConfig;
use crate::geocoding::GeocodingProvider;
use crate::http_client::{build_client, redact_url};
use crate::models::{
    Coordinates, GeocodeSource, GeocodedLocation, RouteResult, RouteSource, TravelMode,
};
use crate::routing::DirectionsProvider;
use crate::{MapQueryError, Result};

/// Mapbox API client
pub struct MapboxClient {
    client: ClientWithMiddleware,
    access_token: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    features: Vec<GeocodingFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodingFeature {
    center: [f64; 2],
    place_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    code: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    geometry: LineGeometry,
    /// meters
    distance: f64,
    /// seconds
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct LineGeometry {
    coordinates: Vec<[f64; 2]>,
}

impl MapboxClient {
    /// Create a client; fails when no access token is configured
    pub fn new(config: &MapboxConfig) -> Result<Self> {
        let access_token = config
            .access_token
            .clone()
            .ok_or_else(|| MapQueryError::config("Mapbox access token not configured"))?;

        Ok(Self {
            client: build_client(config.timeout_seconds, config.max_retries)?,
            access_token,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn geocoding_url(&self, query: &str) -> String {
        format!(
            "{}/geocoding/v5/mapbox.places/{}.json?limit=1&access_token={}",
            self.base_url,
            urlencoding::encode(query),
            self.access_token
        )
    }

    fn directions_url(
        &self,
        waypoints: &[Coordinates],
        mode: TravelMode,
        preferences: &[String],
    ) -> String {
        let coordinates = waypoints
            .iter()
            .map(|c| format!("{:.6},{:.6}", c.longitude, c.latitude))
            .collect::<Vec<_>>()
            .join(";");

        let mut url = format!(
            "{}/directions/v5/mapbox/{}/{}?geometries=geojson&overview=full&access_token={}",
            self.base_url,
            mode.profile(),
            urlencoding::encode(&coordinates),
            self.access_token
        );

        let excludes = exclusions(mode, preferences);
        if !excludes.is_empty() {
            url.push_str("&exclude=");
            url.push_str(&excludes.join(","));
        }
        url
    }
}

/// Mapbox `exclude` values for the user's avoid-preferences
fn exclusions(mode: TravelMode, preferences: &[String]) -> Vec<&'static str> {
    // driving accepts toll/motorway/ferry, cycling only ferry, walking nothing
    preferences
        .iter()
        .filter_map(|p| match (p.as_str(), mode) {
            ("avoid_tolls", TravelMode::Driving) => Some("toll"),
            ("avoid_highways", TravelMode::Driving) => Some("motorway"),
            ("avoid_ferries", TravelMode::Driving | TravelMode::Cycling) => Some("ferry"),
            _ => None,
        })
        .collect()
}

#[async_trait]
impl GeocodingProvider for MapboxClient {
    #[instrument(skip(self))]
    async fn forward(&self, query: &str) -> Result<Option<GeocodedLocation>> {
        let url = self.geocoding_url(query);
        debug!("Mapbox geocoding request URL: {}", redact_url(&url));
        let start_time = Instant::now();

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(MapQueryError::api(format!(
                "Mapbox geocoding error {status}: {error_text}"
            )));
        }

        let body: GeocodingResponse = response
            .json()
            .await
            .map_err(|e| MapQueryError::api(format!("Failed to parse Mapbox geocoding response: {e}")))?;

        info!(
            "Mapbox geocoding returned {} feature(s) in {:.3}s",
            body.features.len(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(body.features.into_iter().next().map(|feature| GeocodedLocation {
            name: query.to_string(),
            coordinates: Coordinates::from_lon_lat(feature.center),
            place_name: feature.place_name,
            source: GeocodeSource::Remote,
        }))
    }
}

#[async_trait]
impl DirectionsProvider for MapboxClient {
    #[instrument(skip(self, waypoints), fields(waypoints = waypoints.len()))]
    async fn directions(
        &self,
        waypoints: &[Coordinates],
        mode: TravelMode,
        preferences: &[String],
    ) -> Result<Option<RouteResult>> {
        let url = self.directions_url(waypoints, mode, preferences);
        debug!("Mapbox directions request URL: {}", redact_url(&url));
        let start_time = Instant::now();

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        // Mapbox reports NoRoute/NoSegment as 4xx with a JSON body
        let body: DirectionsResponse = response
            .json()
            .await
            .map_err(|e| MapQueryError::api(format!("Failed to parse Mapbox directions response ({status}): {e}")))?;

        if body.code != "Ok" {
            return match body.code.as_str() {
                "NoRoute" | "NoSegment" => {
                    warn!("Mapbox found no route: {}", body.message.unwrap_or_default());
                    Ok(None)
                }
                code => Err(MapQueryError::api(format!(
                    "Mapbox directions error {code}: {}",
                    body.message.unwrap_or_default()
                ))),
            };
        }

        info!(
            "Mapbox directions returned {} route(s) in {:.3}s",
            body.routes.len(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(body.routes.into_iter().next().map(|route| RouteResult {
            path: route.geometry.coordinates,
            source: RouteSource::Directions,
            distance_km: route.distance / 1000.0,
            duration_seconds: Some(route.duration),
        }))
    }
}
