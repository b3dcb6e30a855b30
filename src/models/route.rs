//! Route model

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::Coordinates;

/// How a route path was produced
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RouteSource {
    /// Returned by the directions API
    Directions,
    /// Linearly interpolated fallback line
    Geodesic,
}

/// Ordered path between waypoints
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    /// `[lon, lat]` pairs in travel order
    pub path: Vec<[f64; 2]>,
    pub source: RouteSource,
    pub distance_km: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

impl RouteResult {
    /// Path as coordinates
    #[must_use]
    pub fn coordinates(&self) -> Vec<Coordinates> {
        self.path.iter().copied().map(Coordinates::from_lon_lat).collect()
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.source == RouteSource::Geodesic
    }

    /// GeoJSON `Feature` with a `LineString` geometry, ready for a map source
    #[must_use]
    pub fn to_geojson(&self) -> Value {
        json!({
            "type": "Feature",
            "properties": {
                "source": self.source,
                "distanceKm": self.distance_km,
                "durationSeconds": self.duration_seconds,
            },
            "geometry": {
                "type": "LineString",
                "coordinates": self.path,
            }
        })
    }
}
