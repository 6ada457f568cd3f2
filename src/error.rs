//! Domain-specific error types for word-frequency

use axum::{
    extract::multipart::MultipartError,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main error type for the word-frequency service
#[derive(Error, Debug)]
pub enum WordFrequencyError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Payload too large: {message}")]
    PayloadTooLarge { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Cache unavailable: {message}")]
    CacheUnavailable { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl WordFrequencyError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        WordFrequencyError::InvalidInput {
            message: message.into(),
        }
    }

    /// HTTP status this error surfaces as
    pub fn status(&self) -> StatusCode {
        match self {
            WordFrequencyError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            WordFrequencyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for WordFrequencyError {
    fn from(err: anyhow::Error) -> Self {
        WordFrequencyError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for WordFrequencyError {
    fn from(err: serde_json::Error) -> Self {
        WordFrequencyError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for WordFrequencyError {
    fn from(err: std::io::Error) -> Self {
        WordFrequencyError::Storage {
            message: err.to_string(),
        }
    }
}

impl From<MultipartError> for WordFrequencyError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return WordFrequencyError::PayloadTooLarge {
                message: format!("Upload exceeds the size limit: {}", err.body_text()),
            };
        }
        WordFrequencyError::InvalidInput {
            message: format!("Malformed multipart body: {}", err.body_text()),
        }
    }
}

impl From<toml::de::Error> for WordFrequencyError {
    fn from(err: toml::de::Error) -> Self {
        WordFrequencyError::Config {
            message: err.to_string(),
        }
    }
}

/// Convert WordFrequencyError to an HTTP response
impl IntoResponse for WordFrequencyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            json!({"error": {"code": status.as_u16(), "message": self.to_string()}}).to_string(),
        )
            .into_response()
    }
}

/// Result type alias for word-frequency operations
pub type Result<T> = std::result::Result<T, WordFrequencyError>;
