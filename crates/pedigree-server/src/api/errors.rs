//! Error handling for the Pedigree Server API
//!
//! Every failure is returned as
//! `{"error": .., "errorDetails": {"errorCode": .., "errorMessage": ..}}`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, error};

use crate::error::ServerError;

/// API Error type for returning standard error responses
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),
    /// Not found (404)
    NotFound(String),
    /// Wrapped server error
    ServerError(ServerError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ServerError> for ApiError {
    fn from(err: ServerError) -> Self {
        ApiError::ServerError(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::ServerError(err) => write!(f, "Server Error: {}", err),
        }
    }
}

impl std::fmt::Debug for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "BadRequest({})", msg),
            ApiError::NotFound(msg) => write!(f, "NotFound({})", msg),
            ApiError::ServerError(err) => write!(f, "ServerError({:?})", err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "ERR_BAD_REQUEST", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "ERR_NOT_FOUND", msg),
            ApiError::ServerError(err) => return api_error_response(&err),
        };

        error_body(status, error_code, &message)
    }
}

/// Convert a server error into the standard error response
pub fn api_error_response(err: &ServerError) -> Response {
    let (status, error_code) = match err {
        ServerError::NotFound { resource, .. } => (
            StatusCode::NOT_FOUND,
            format!("ERR_NOT_FOUND_{}", resource.to_uppercase()),
        ),
        ServerError::ValidationError(_) => {
            (StatusCode::BAD_REQUEST, "ERR_VALIDATION_ERROR".to_string())
        }
        ServerError::InvalidDocument(_) => {
            (StatusCode::BAD_REQUEST, "ERR_INVALID_DOCUMENT".to_string())
        }
        ServerError::NoPendingDeletion => {
            (StatusCode::CONFLICT, "ERR_NO_PENDING_DELETION".to_string())
        }
        ServerError::DeletionPending(_) => {
            (StatusCode::CONFLICT, "ERR_DELETION_PENDING".to_string())
        }
        ServerError::DeletionPromptOutdated(_) => (
            StatusCode::CONFLICT,
            "ERR_DELETION_PROMPT_OUTDATED".to_string(),
        ),
        ServerError::TooManySessions(_) => (
            StatusCode::TOO_MANY_REQUESTS,
            "ERR_TOO_MANY_SESSIONS".to_string(),
        ),
        ServerError::ConfigError(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "ERR_CONFIGURATION".to_string(),
        ),
        ServerError::InternalError(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "ERR_INTERNAL_SERVER_ERROR".to_string(),
        ),
    };

    if status.is_server_error() {
        error!(?err, "Request failed");
    } else {
        debug!(%err, "Request rejected");
    }

    error_body(status, &error_code, &err.to_string())
}

fn error_body(status: StatusCode, error_code: &str, message: &str) -> Response {
    let body = Json(json!({
        "error": message,
        "errorDetails": {
            "errorCode": error_code,
            "errorMessage": message,
        }
    }));

    (status, body).into_response()
}
