//! Visualization module
//!
//! Applies an [`ExtractionResult`] to a [`MapCanvas`]: resolves the places,
//! draws numbered markers, and for route intents draws the route line.

pub mod canvas;

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

pub use canvas::{CommandRecorder, MapCanvas, MapCommand, Marker, MarkerRole};

use crate::geocoding::Geocoder;
use crate::models::{
    Bounds, Coordinates, ExtractionResult, GeocodeSource, GeocodedLocation, LocationMention,
    RouteResult,
};
use crate::routing::RouteService;

/// Zoom level used when a single place is shown
pub const SINGLE_PLACE_ZOOM: f64 = 10.0;
/// Pixel padding around fitted bounds
pub const FIT_PADDING: u32 = 60;

/// What was drawn, returned alongside the recorded commands
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationSummary {
    /// Resolved places in drawing order
    pub resolved: Vec<GeocodedLocation>,
    /// Names that could not be located
    pub unresolved: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteResult>,
    /// Final message shown on the map
    pub message: String,
}

pub struct VisualizationApplier {
    geocoder: Arc<Geocoder>,
    router: Arc<RouteService>,
}

impl VisualizationApplier {
    pub fn new(geocoder: Arc<Geocoder>, router: Arc<RouteService>) -> Self {
        Self { geocoder, router }
    }

    /// Draw `extraction` on `canvas`
    #[instrument(skip_all, fields(intent = ?extraction.intent_type, locations = extraction.locations.len()))]
    pub async fn apply<C: MapCanvas>(
        &self,
        extraction: &ExtractionResult,
        canvas: &mut C,
    ) -> VisualizationSummary {
        canvas.clear_markers();
        canvas.clear_route();

        if extraction.locations.is_empty() {
            canvas.show_message(&extraction.message);
            return VisualizationSummary {
                resolved: Vec::new(),
                unresolved: Vec::new(),
                route: None,
                message: extraction.message.clone(),
            };
        }

        let ordered: Vec<&LocationMention> = if extraction.is_route() {
            extraction.ordered_locations()
        } else {
            extraction.locations.iter().collect()
        };

        let (places, unresolved) = self.resolve(&ordered).await;

        if places.is_empty() {
            let message = format!("Could not locate: {}", unresolved.join(", "));
            info!("{}", message);
            canvas.show_message(&message);
            return VisualizationSummary {
                resolved: Vec::new(),
                unresolved,
                route: None,
                message,
            };
        }

        let points: Vec<Coordinates> = places.iter().map(|(_, hit)| hit.coordinates).collect();
        frame(canvas, &points);

        let is_route = extraction.is_route();
        for (index, (mention, hit)) in places.iter().enumerate() {
            canvas.add_marker(Marker {
                number: index + 1,
                label: mention.name.clone(),
                coordinates: hit.coordinates,
                role: MarkerRole::for_position(index, places.len(), is_route),
                time_context: mention.time_context.clone(),
                place_name: hit.place_name.clone(),
            });
        }

        let mut message = extraction.message.clone();
        let mut route = None;

        if is_route && points.len() >= 2 {
            match self
                .router
                .route(&points, extraction.travel_mode, &extraction.preferences)
                .await
            {
                Ok(result) => {
                    canvas.set_route(result.to_geojson());
                    frame(canvas, &result.coordinates());
                    if result.is_fallback() {
                        message.push_str(" (approximate straight-line route)");
                    }
                    route = Some(result);
                }
                Err(e) => {
                    warn!("Route could not be drawn: {}", e);
                    message = format!("Showing places only, the route could not be drawn: {e}");
                }
            }
        } else if is_route {
            message = format!(
                "Only {} could be located, showing it without a route",
                places[0].0.name
            );
        }

        if !unresolved.is_empty() {
            message.push_str(&format!(". Could not locate: {}", unresolved.join(", ")));
        }

        canvas.show_message(&message);
        info!(
            "Drew {} marker(s), route: {}",
            places.len(),
            route.is_some()
        );

        VisualizationSummary {
            resolved: places.into_iter().map(|(_, hit)| hit).collect(),
            unresolved,
            route,
            message,
        }
    }

    /// Resolve mentions in order; geocoding runs concurrently for those
    /// without coordinates
    async fn resolve<'a>(
        &self,
        ordered: &[&'a LocationMention],
    ) -> (Vec<(&'a LocationMention, GeocodedLocation)>, Vec<String>) {
        let pending: Vec<&str> = ordered
            .iter()
            .filter(|m| supplied_coordinates(m).is_none())
            .map(|m| m.name.as_str())
            .collect();
        let mut lookups = self.geocoder.geocode_all(&pending).await.into_iter();

        let mut places = Vec::with_capacity(ordered.len());
        let mut unresolved = Vec::new();
        for mention in ordered {
            let hit = match supplied_coordinates(mention) {
                Some(coordinates) => Some(GeocodedLocation {
                    name: mention.name.clone(),
                    coordinates,
                    place_name: None,
                    source: GeocodeSource::Provided,
                }),
                None => match lookups.next() {
                    Some(Ok(hit)) => Some(hit),
                    Some(Err(e)) => {
                        debug!("Skipping '{}': {}", mention.name, e);
                        None
                    }
                    None => None,
                },
            };
            match hit {
                Some(hit) => places.push((*mention, hit)),
                None => unresolved.push(mention.name.clone()),
            }
        }
        (places, unresolved)
    }
}

/// Coordinates given with a mention, if in range; otherwise the name is geocoded
fn supplied_coordinates(mention: &LocationMention) -> Option<Coordinates> {
    mention.coordinates.filter(Coordinates::is_valid)
}

/// Fly to a single point or fit the view around several
fn frame<C: MapCanvas>(canvas: &mut C, points: &[Coordinates]) {
    match points {
        [] => {}
        [only] => canvas.fly_to(*only, SINGLE_PLACE_ZOOM),
        _ => {
            if let Some(bounds) = Bounds::from_points(points) {
                canvas.fit_bounds(bounds, FIT_PADDING);
            }
        }
    }
}
