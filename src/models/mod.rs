//! Data models for the `MapQuery` service
//!
//! This module contains the core domain models organized by concern:
//! - Location: coordinates, bounds and geocoded places
//! - Extraction: the structured record produced from a free-text query
//! - Route: ordered paths produced by the router

pub mod extraction;
pub mod location;
pub mod route;

// Re-export all public types for convenient access
pub use extraction::{
    ExtractionResult, ExtractionSource, IntentType, LocationMention, TravelMode,
    VisualizationType,
};
pub use location::{Bounds, Coordinates, GeocodeSource, GeocodedLocation};
pub use route::{RouteResult, RouteSource};
