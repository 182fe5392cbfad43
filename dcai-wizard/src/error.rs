//! Error types for dcai-wizard
//!
//! Every error renders as `{"error": "<message>"}` with the matching status
//! code, the normalized shape all proxy routes and wizard endpoints share.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::SessionError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g., gated navigation, stale update
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream backend failure; preserves the backend status code
    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// dcai-common error
    #[error("Common error: {0}")]
    Common(#[from] dcai_common::Error),

    /// Wizard session rule violation
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Upstream { status, message } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                message,
            ),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Io(ref err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Other(ref err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Common(ref err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Session(ref err) => (err.status_code(), err.to_string()),
        };

        let body = Json(json!({ "error": message }));

        (status, body).into_response()
    }
}

impl SessionError {
    /// HTTP status for the explicit-rejection navigation redesign:
    /// malformed requests are 400, rule conflicts are 409.
    pub fn status_code(&self) -> StatusCode {
        match self {
            SessionError::OutOfRange(_)
            | SessionError::InvalidIndex(_)
            | SessionError::UnknownColumn(_)
            | SessionError::DuplicateColumn(_) => StatusCode::BAD_REQUEST,
            SessionError::Gated { .. } | SessionError::Stale { .. } => StatusCode::CONFLICT,
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
