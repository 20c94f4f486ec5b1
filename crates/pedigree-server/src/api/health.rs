//! Health check endpoint

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::server::PedigreeServer;

/// Health check handler
pub async fn health_check(State(server): State<Arc<PedigreeServer>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "UP",
            "version": env!("CARGO_PKG_VERSION"),
            "sessions": server.session_count(),
            "maxSessions": server.config().max_sessions,
        })),
    )
}
