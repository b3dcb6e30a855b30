//! Map drawing surface and a recorder that turns draw calls into replayable commands

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Bounds, Coordinates};

/// What a marker stands for on the map
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MarkerRole {
    Origin,
    Waypoint,
    Destination,
    Place,
}

impl MarkerRole {
    /// Role of the marker at `index` among `count` markers
    #[must_use]
    pub fn for_position(index: usize, count: usize, is_route: bool) -> Self {
        if !is_route || count < 2 {
            MarkerRole::Place
        } else if index == 0 {
            MarkerRole::Origin
        } else if index + 1 == count {
            MarkerRole::Destination
        } else {
            MarkerRole::Waypoint
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    /// 1-based position in visiting order
    pub number: usize,
    pub label: String,
    pub coordinates: Coordinates,
    pub role: MarkerRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
}

/// One draw call, serialized for the browser to replay
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MapCommand {
    ClearMarkers,
    ClearRoute,
    AddMarker {
        marker: Marker,
    },
    SetRoute {
        geojson: Value,
    },
    FitBounds {
        bounds: Bounds,
        padding: u32,
    },
    FlyTo {
        center: Coordinates,
        zoom: f64,
    },
    ShowMessage {
        message: String,
    },
}

/// A map widget the applier can draw on
pub trait MapCanvas {
    fn clear_markers(&mut self);
    fn clear_route(&mut self);
    fn add_marker(&mut self, marker: Marker);
    /// Replace the route source with a GeoJSON feature
    fn set_route(&mut self, geojson: Value);
    fn fit_bounds(&mut self, bounds: Bounds, padding: u32);
    fn fly_to(&mut self, center: Coordinates, zoom: f64);
    fn show_message(&mut self, message: &str);
}

/// Canvas that records every call in order
#[derive(Debug, Default, Clone)]
pub struct CommandRecorder {
    commands: Vec<MapCommand>,
}

impl CommandRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn commands(&self) -> &[MapCommand] {
        &self.commands
    }

    #[must_use]
    pub fn into_commands(self) -> Vec<MapCommand> {
        self.commands
    }
}

impl MapCanvas for CommandRecorder {
    fn clear_markers(&mut self) {
        self.commands.push(MapCommand::ClearMarkers);
    }

    fn clear_route(&mut self) {
        self.commands.push(MapCommand::ClearRoute);
    }

    fn add_marker(&mut self, marker: Marker) {
        self.commands.push(MapCommand::AddMarker { marker });
    }

    fn set_route(&mut self, geojson: Value) {
        self.commands.push(MapCommand::SetRoute { geojson });
    }

    fn fit_bounds(&mut self, bounds: Bounds, padding: u32) {
        self.commands.push(MapCommand::FitBounds { bounds, padding });
    }

    fn fly_to(&mut self, center: Coordinates, zoom: f64) {
        self.commands.push(MapCommand::FlyTo { center, zoom });
    }

    fn show_message(&mut self, message: &str) {
        self.commands.push(MapCommand::ShowMessage {
            message: message.to_string(),
        });
    }
}
