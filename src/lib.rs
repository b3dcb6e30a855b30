//! `MapQuery` - natural-language map queries
//!
//! Turns free text such as "Route from Paris to London tomorrow" into
//! structured intents, resolves place names to coordinates, computes routes
//! (with a geodesic fallback) and emits map draw commands. A thin HTTP layer
//! proxies the Mapbox and Gemini APIs for a browser frontend.

pub mod api;
pub mod config;
pub mod error;
pub mod extractor;
pub mod geocoding;
pub mod http_client;
pub mod llm;
pub mod mapbox;
pub mod models;
pub mod routing;
pub mod telemetry;
pub mod visualization;
pub mod web;

// Re-export core types for public API
pub use api::AppState;
pub use config::MapQueryConfig;
pub use error::MapQueryError;
pub use extractor::IntentExtractor;
pub use geocoding::{Geocoder, GeocodingProvider};
pub use llm::{GeminiClient, TextGenerator};
pub use mapbox::MapboxClient;
pub use models::{
    Coordinates, ExtractionResult, GeocodedLocation, IntentType, RouteResult, TravelMode,
};
pub use routing::{DirectionsProvider, RouteService};
pub use visualization::{CommandRecorder, MapCanvas, MapCommand, VisualizationApplier};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, MapQueryError>;
