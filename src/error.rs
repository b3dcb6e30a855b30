//! Error types and handling for the `MapQuery` service

use thiserror::Error;

use crate::http_client::redact_url;

/// Main error type for the `MapQuery` service
#[derive(Error, Debug)]
pub enum MapQueryError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Upstream API communication errors (Mapbox, Gemini)
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// A place name could not be resolved
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// An upstream integration is not configured
    #[error("Unavailable: {message}")]
    Unavailable { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl MapQueryError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new unavailable error
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Stable machine-readable code, used in HTTP error bodies
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            MapQueryError::Config { .. } => "config",
            MapQueryError::Api { .. } => "upstream",
            MapQueryError::Validation { .. } => "validation",
            MapQueryError::NotFound { .. } => "not_found",
            MapQueryError::Unavailable { .. } => "unavailable",
            MapQueryError::Io { .. } => "io",
            MapQueryError::General { .. } => "internal",
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            MapQueryError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            MapQueryError::Api { .. } => {
                "Unable to reach the map or language service. Please try again later.".to_string()
            }
            MapQueryError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            MapQueryError::NotFound { message } => message.clone(),
            MapQueryError::Unavailable { message } => {
                format!("Service unavailable: {message}")
            }
            MapQueryError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            MapQueryError::General { message } => message.clone(),
        }
    }
}

// request URLs carry credentials, so they are stripped before the message is kept
impl From<reqwest_middleware::Error> for MapQueryError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(err) => err.into(),
            other => MapQueryError::api(redact_url(&format!("{other:#}"))),
        }
    }
}

impl From<reqwest::Error> for MapQueryError {
    fn from(err: reqwest::Error) -> Self {
        MapQueryError::api(err.without_url().to_string())
    }
}
