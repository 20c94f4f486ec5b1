//! API module for the Pedigree Server
//!
//! This module contains the HTTP API for editing pedigree charts.

use axum::{
    extract::{MatchedPath, Request},
    http::Uri,
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

use pedigree_monitoring::PedigreeMetrics;

use crate::server::PedigreeServer;

pub mod errors;
pub mod health;
pub mod sessions;

pub use errors::{api_error_response, ApiError};

/// Build the API router
pub fn build_router(server: Arc<PedigreeServer>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/v1/sessions", post(sessions::create_session))
        .route(
            "/v1/sessions/:session_id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route(
            "/v1/sessions/:session_id/ports/click",
            post(sessions::click_port),
        )
        .route("/v1/sessions/:session_id/links", post(sessions::create_link))
        .route(
            "/v1/sessions/:session_id/lineage/:edge_id/delete-request",
            post(sessions::request_deletion),
        )
        .route(
            "/v1/sessions/:session_id/deletion/confirm",
            post(sessions::confirm_deletion),
        )
        .route(
            "/v1/sessions/:session_id/deletion/cancel",
            post(sessions::cancel_deletion),
        )
        .route(
            "/v1/sessions/:session_id/selection",
            put(sessions::select_node).delete(sessions::clear_selection),
        )
        .route(
            "/v1/sessions/:session_id/selection/attributes",
            patch(sessions::edit_attribute).put(sessions::submit_attributes),
        )
        .route(
            "/v1/sessions/:session_id/document",
            get(sessions::export_document).put(sessions::import_document),
        )
        .fallback(not_found)
        .route_layer(middleware::from_fn(track_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(server)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

/// Count and time every routed request, labelled by route template
async fn track_requests(request: Request, next: Next) -> Response {
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());
    let method = request.method().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    PedigreeMetrics::record_http_request(
        &path,
        &method,
        response.status().as_u16(),
        start.elapsed().as_secs_f64() * 1000.0,
    );
    response
}
