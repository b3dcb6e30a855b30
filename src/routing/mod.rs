//! Routing module
//!
//! Asks a directions provider for a travel route and substitutes a geodesic
//! line when the provider fails, finds nothing, or the waypoints are too far
//! apart for a road route to make sense.

pub mod geodesic;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::config::RoutingConfig;
use crate::models::{Coordinates, RouteResult, TravelMode};
use crate::{MapQueryError, Result};

/// Mapbox Directions accepts at most this many coordinates per request
pub const MAX_WAYPOINTS: usize = 25;

/// Remote directions lookup
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    /// Route through `waypoints` in order; `None` when no route exists
    async fn directions(
        &self,
        waypoints: &[Coordinates],
        mode: TravelMode,
        preferences: &[String],
    ) -> Result<Option<RouteResult>>;
}

/// Route computation with geodesic fallback
pub struct RouteService {
    provider: Option<Arc<dyn DirectionsProvider>>,
    max_route_distance_km: f64,
    points_per_segment: usize,
}

impl RouteService {
    pub fn new(provider: Option<Arc<dyn DirectionsProvider>>, config: &RoutingConfig) -> Self {
        Self {
            provider,
            max_route_distance_km: config.max_route_distance_km,
            points_per_segment: config.geodesic_points_per_segment,
        }
    }

    /// Whether a remote provider is configured
    #[must_use]
    pub fn has_remote(&self) -> bool {
        self.provider.is_some()
    }

    /// Compute a route through `waypoints` in order
    #[instrument(skip(self, waypoints, preferences), fields(waypoints = waypoints.len()))]
    pub async fn route(
        &self,
        waypoints: &[Coordinates],
        mode: TravelMode,
        preferences: &[String],
    ) -> Result<RouteResult> {
        if waypoints.len() < 2 {
            return Err(MapQueryError::validation(
                "A route needs at least two waypoints",
            ));
        }
        if waypoints.len() > MAX_WAYPOINTS {
            return Err(MapQueryError::validation(format!(
                "A route can have at most {MAX_WAYPOINTS} waypoints, got {}",
                waypoints.len()
            )));
        }
        if let Some(bad) = waypoints.iter().find(|c| !c.is_valid()) {
            return Err(MapQueryError::validation(format!(
                "Waypoint out of range: {:?}",
                bad
            )));
        }

        if let Some(longest) = self.longest_leg_over_limit(waypoints) {
            info!(
                "Leg of {:.0} km exceeds {:.0} km limit, drawing geodesic line",
                longest, self.max_route_distance_km
            );
            return Ok(self.fallback(waypoints));
        }

        let Some(provider) = &self.provider else {
            info!("No directions provider configured, drawing geodesic line");
            return Ok(self.fallback(waypoints));
        };

        match provider.directions(waypoints, mode, preferences).await {
            Ok(Some(route)) if route.path.len() >= 2 => {
                info!(
                    "Directions route: {:.1} km, {} points",
                    route.distance_km,
                    route.path.len()
                );
                Ok(route)
            }
            Ok(_) => {
                warn!("Directions provider returned no usable route, drawing geodesic line");
                Ok(self.fallback(waypoints))
            }
            Err(e) => {
                warn!("Directions request failed: {}, drawing geodesic line", e);
                Ok(self.fallback(waypoints))
            }
        }
    }

    /// Geodesic line through `waypoints` using the configured density
    #[must_use]
    pub fn fallback(&self, waypoints: &[Coordinates]) -> RouteResult {
        geodesic::geodesic_route(waypoints, self.points_per_segment)
    }

    fn longest_leg_over_limit(&self, waypoints: &[Coordinates]) -> Option<f64> {
        waypoints
            .windows(2)
            .map(|pair| pair[0].distance_km(&pair[1]))
            .filter(|km| *km > self.max_route_distance_km)
            .reduce(f64::max)
    }
}
