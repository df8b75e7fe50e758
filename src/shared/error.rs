//! Application Error Types
//!
//! Centralized error handling for storage, cache and platform calls.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Platform error: {0}")]
    Rest(#[from] RestError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, 10001, msg.clone()),
            other => {
                tracing::error!("Internal error: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, 10000, "Internal server error".into())
            }
        };

        (status, Json(ErrorResponse { code, message })).into_response()
    }
}

/// Errors returned by the chat platform's REST API.
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// The target (message, channel, webhook) does not exist (HTTP 404).
    #[error("Unknown resource: {0}")]
    NotFound(String),

    /// The bot lacks access to the target (HTTP 403).
    #[error("Missing access: {0}")]
    Forbidden(String),

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Unexpected status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl RestError {
    /// Whether the error means the target is already gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RestError::NotFound(_))
    }

    /// Map a non-success HTTP status to the matching variant.
    pub fn from_status(code: u16, body: String, retry_after: Option<f64>) -> Self {
        match code {
            404 => RestError::NotFound(body),
            403 => RestError::Forbidden(body),
            429 => RestError::RateLimited {
                retry_after: Duration::from_secs_f64(retry_after.unwrap_or(1.0).max(0.0)),
            },
            _ => RestError::Status { code, body },
        }
    }
}
