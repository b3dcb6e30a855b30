//! Configuration management for the `MapQuery` service
//!
//! Handles loading configuration from files and environment variables,
//! and provides validation for all configuration settings.

use crate::MapQueryError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `MapQuery` service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapQueryConfig {
    /// Mapbox Geocoding/Directions configuration
    pub mapbox: MapboxConfig,
    /// Gemini text model configuration
    pub gemini: GeminiConfig,
    /// Routing behaviour
    pub routing: RoutingConfig,
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Mapbox API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapboxConfig {
    /// Secret access token used for server-side calls
    pub access_token: Option<String>,
    /// Public token handed to the browser map; `access_token` is never exposed
    pub public_token: Option<String>,
    /// Base URL for the Mapbox API
    #[serde(default = "default_mapbox_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Gemini API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key; extraction falls back to string matching without it
    pub api_key: Option<String>,
    /// Model name, e.g. `gemini-1.5-flash`
    #[serde(default = "default_gemini_model")]
    pub model: String,
    /// Base URL for the Generative Language API
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_gemini_timeout")]
    pub timeout_seconds: u32,
    /// Sampling temperature
    #[serde(default = "default_gemini_temperature")]
    pub temperature: f32,
    /// Upper bound on generated tokens
    #[serde(default = "default_gemini_max_output_tokens")]
    pub max_output_tokens: u32,
}

/// Routing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Waypoint pairs farther apart than this skip the directions API
    #[serde(default = "default_max_route_distance")]
    pub max_route_distance_km: f64,
    /// Interpolated points per segment of a geodesic fallback line
    #[serde(default = "default_geodesic_points")]
    pub geodesic_points_per_segment: usize,
    /// Remote geocoding hits kept in memory, least recently used evicted first
    #[serde(default = "default_geocode_cache_capacity")]
    pub geocode_cache_capacity: usize,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Directory with the browser frontend, served as fallback
    pub static_dir: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
    #[serde(default = "default_body_limit")]
    pub body_limit_kb: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_mapbox_base_url() -> String {
    "https://api.mapbox.com".to_string()
}

fn default_upstream_timeout() -> u32 {
    10
}

fn default_max_retries() -> u32 {
    2
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_timeout() -> u32 {
    20
}

fn default_gemini_temperature() -> f32 {
    0.2
}

fn default_gemini_max_output_tokens() -> u32 {
    1024
}

fn default_max_route_distance() -> f64 {
    2000.0
}

fn default_geodesic_points() -> usize {
    50
}

fn default_geocode_cache_capacity() -> usize {
    1024
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    3000
}

fn default_request_timeout() -> u32 {
    30
}

fn default_body_limit() -> usize {
    64
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for MapboxConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            public_token: None,
            base_url: default_mapbox_base_url(),
            timeout_seconds: default_upstream_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
            timeout_seconds: default_gemini_timeout(),
            temperature: default_gemini_temperature(),
            max_output_tokens: default_gemini_max_output_tokens(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            max_route_distance_km: default_max_route_distance(),
            geodesic_points_per_segment: default_geodesic_points(),
            geocode_cache_capacity: default_geocode_cache_capacity(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            static_dir: None,
            request_timeout_seconds: default_request_timeout(),
            body_limit_kb: default_body_limit(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl MapboxConfig {
    /// Token the browser should use to render tiles
    #[must_use]
    pub fn browser_token(&self) -> Option<&str> {
        self.public_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}

impl MapQueryConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // MAPQUERY_MAPBOX__ACCESS_TOKEN, MAPQUERY_SERVER__PORT, ...
        builder = builder.add_source(
            Environment::with_prefix("MAPQUERY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: MapQueryConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mapquery").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.mapbox.base_url.is_empty() {
            self.mapbox.base_url = default_mapbox_base_url();
        }
        if self.mapbox.timeout_seconds == 0 {
            self.mapbox.timeout_seconds = default_upstream_timeout();
        }
        if self.gemini.model.is_empty() {
            self.gemini.model = default_gemini_model();
        }
        if self.gemini.base_url.is_empty() {
            self.gemini.base_url = default_gemini_base_url();
        }
        if self.gemini.timeout_seconds == 0 {
            self.gemini.timeout_seconds = default_gemini_timeout();
        }
        if self.routing.max_route_distance_km <= 0.0 {
            self.routing.max_route_distance_km = default_max_route_distance();
        }
        if self.routing.geodesic_points_per_segment == 0 {
            self.routing.geodesic_points_per_segment = default_geodesic_points();
        }
        if self.routing.geocode_cache_capacity == 0 {
            self.routing.geocode_cache_capacity = default_geocode_cache_capacity();
        }
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        // Blank secrets behave like missing ones
        for key in [
            &mut self.mapbox.access_token,
            &mut self.mapbox.public_token,
            &mut self.gemini.api_key,
        ] {
            if key.as_deref().is_some_and(|k| k.trim().is_empty()) {
                *key = None;
            }
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.mapbox.timeout_seconds > 120 || self.gemini.timeout_seconds > 120 {
            return Err(MapQueryError::config("Upstream timeout cannot exceed 120 seconds").into());
        }

        if self.mapbox.max_retries > 10 {
            return Err(MapQueryError::config("Mapbox max retries cannot exceed 10").into());
        }

        if !(0.0..=2.0).contains(&self.gemini.temperature) {
            return Err(
                MapQueryError::config("Gemini temperature must be between 0.0 and 2.0").into(),
            );
        }

        if self.routing.max_route_distance_km > 20_037.5 {
            return Err(MapQueryError::config(
                "Max route distance cannot exceed half the Earth's circumference (20037.5 km)",
            )
            .into());
        }

        if !(2..=1000).contains(&self.routing.geodesic_points_per_segment) {
            return Err(MapQueryError::config(
                "Geodesic points per segment must be between 2 and 1000",
            )
            .into());
        }

        if self.routing.geocode_cache_capacity > 1_000_000 {
            return Err(
                MapQueryError::config("Geocode cache capacity cannot exceed 1000000").into(),
            );
        }

        if self.server.port == 0 {
            return Err(MapQueryError::config("Server port cannot be 0").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(MapQueryError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(MapQueryError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (label, url) in [
            ("Mapbox", &self.mapbox.base_url),
            ("Gemini", &self.gemini.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(MapQueryError::config(format!(
                    "{label} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
