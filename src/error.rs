//! Error types and handling for the `CleanRoute` service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Failures talking to the external directions provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Transport-level failure (DNS, connect, TLS, middleware)
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered with a non-success status
    #[error("status {status}: {message}")]
    Api { status: u16, message: String },

    /// The provider answered 2xx but the body was not a usable route
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The call did not complete within the configured bound
    #[error("Request timed out after {0}s")]
    Timeout(u64),
}

/// Failures reading from the spatial reading store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Lookup timed out after {0}s")]
    Timeout(u64),

    #[error("Seed data error: {0}")]
    Seed(String),
}

/// Main error type for the `CleanRoute` service
#[derive(Error, Debug)]
pub enum CleanRouteError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Directions provider errors
    #[error("ORS API error: {source}")]
    Provider {
        #[from]
        source: ProviderError,
    },

    /// Input validation errors
    #[error("{message}")]
    Validation { message: String },

    /// Reading store errors
    #[error("Store error: {source}")]
    Store {
        #[from]
        source: StoreError,
    },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl CleanRouteError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// HTTP status this error surfaces as
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            CleanRouteError::Validation { .. } => StatusCode::BAD_REQUEST,
            CleanRouteError::Provider { .. } => StatusCode::BAD_GATEWAY,
            CleanRouteError::Config { .. }
            | CleanRouteError::Store { .. }
            | CleanRouteError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            CleanRouteError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            CleanRouteError::Provider { .. } | CleanRouteError::Validation { .. } => {
                self.to_string()
            }
            CleanRouteError::Store { .. } => {
                "Unable to read pollution data. Please try again later.".to_string()
            }
            CleanRouteError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl IntoResponse for CleanRouteError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
        (status, Json(json!({ "error": self.user_message() }))).into_response()
    }
}
