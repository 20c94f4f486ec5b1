//! Session endpoints
//!
//! Port clicks, manual links, the two-step delete prompt, selection and
//! document export/import for one editing session.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use pedigree_core::{
    AttributeChange, CascadeOutcome, EdgeId, ExpansionOutcome, NodeId, PedigreeDocument,
    PersonAttributes, PortClick, PortGroup,
};

use super::errors::ApiError;
use crate::server::PedigreeServer;

/// One end of a manual link
#[derive(Debug, Deserialize)]
pub struct LinkEnd {
    pub node: NodeId,
    pub port: PortGroup,
}

/// Body of `POST /links`
#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    pub source: LinkEnd,
    pub target: LinkEnd,
}

/// Body of `PUT /selection`
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub node: NodeId,
}

type ApiResult = Result<Response, ApiError>;

fn ignored(reason: &str) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "status": "ignored", "reason": reason })),
    )
        .into_response()
}

/// Open a new session
pub async fn create_session(State(server): State<Arc<PedigreeServer>>) -> ApiResult {
    let summary = server.create_session()?;
    Ok((StatusCode::CREATED, Json(summary)).into_response())
}

/// Session counts
pub async fn get_session(
    State(server): State<Arc<PedigreeServer>>,
    Path(session_id): Path<String>,
) -> ApiResult {
    let summary = server.summary(&session_id)?;
    Ok(Json(summary).into_response())
}

/// Close a session
pub async fn delete_session(
    State(server): State<Arc<PedigreeServer>>,
    Path(session_id): Path<String>,
) -> ApiResult {
    server.remove_session(&session_id)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Port click; 201 with the new record, or 200 when nothing changed
pub async fn click_port(
    State(server): State<Arc<PedigreeServer>>,
    Path(session_id): Path<String>,
    payload: Result<Json<PortClick>, JsonRejection>,
) -> ApiResult {
    let Json(click) = payload?;
    let response = match server.click_port(&session_id, &click)? {
        ExpansionOutcome::Expanded { direction, record } => (
            StatusCode::CREATED,
            Json(json!({
                "status": "expanded",
                "direction": direction.as_str(),
                "record": record,
            })),
        )
            .into_response(),
        ExpansionOutcome::Ignored(reason) => (
            StatusCode::OK,
            Json(json!({
                "status": "ignored",
                "reason": reason.as_str(),
                "detail": reason.to_string(),
            })),
        )
            .into_response(),
    };
    Ok(response)
}

/// Manual link between two existing nodes
pub async fn create_link(
    State(server): State<Arc<PedigreeServer>>,
    Path(session_id): Path<String>,
    payload: Result<Json<LinkRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = payload?;
    let record = server.connect(
        &session_id,
        (&request.source.node, request.source.port),
        (&request.target.node, request.target.port),
    )?;
    Ok((StatusCode::CREATED, Json(json!({ "record": record }))).into_response())
}

/// Delete control on a primary edge; opens the confirmation prompt
pub async fn request_deletion(
    State(server): State<Arc<PedigreeServer>>,
    Path((session_id, edge_id)): Path<(String, String)>,
) -> ApiResult {
    let response = match server.request_deletion(&session_id, &EdgeId(edge_id))? {
        Some(prompt) => Json(json!({
            "status": "pending",
            "message": prompt.message(),
            "prompt": prompt,
        }))
        .into_response(),
        None => ignored("stale_target"),
    };
    Ok(response)
}

/// "Yes" on the open prompt
pub async fn confirm_deletion(
    State(server): State<Arc<PedigreeServer>>,
    Path(session_id): Path<String>,
) -> ApiResult {
    let response = match server.confirm_deletion(&session_id)? {
        CascadeOutcome::Deleted(report) => {
            Json(json!({ "status": "deleted", "report": report })).into_response()
        }
        CascadeOutcome::StaleTarget => ignored("stale_target"),
        CascadeOutcome::Declined => Json(json!({ "status": "declined" })).into_response(),
    };
    Ok(response)
}

/// "No" on the open prompt
pub async fn cancel_deletion(
    State(server): State<Arc<PedigreeServer>>,
    Path(session_id): Path<String>,
) -> ApiResult {
    server.cancel_deletion(&session_id)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Select a node; returns the editor bound to it
pub async fn select_node(
    State(server): State<Arc<PedigreeServer>>,
    Path(session_id): Path<String>,
    payload: Result<Json<SelectRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = payload?;
    let editor = server.select(&session_id, &request.node)?;
    Ok(Json(editor).into_response())
}

/// Blank-canvas click or explicit editor close
pub async fn clear_selection(
    State(server): State<Arc<PedigreeServer>>,
    Path(session_id): Path<String>,
) -> ApiResult {
    server.clear_selection(&session_id)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// One `{key, value}` change from the editor form
pub async fn edit_attribute(
    State(server): State<Arc<PedigreeServer>>,
    Path(session_id): Path<String>,
    payload: Result<Json<AttributeChange>, JsonRejection>,
) -> ApiResult {
    let Json(change) = payload?;
    let response = match server.edit_attribute(&session_id, change)? {
        Some(editor) => Json(editor).into_response(),
        None => ignored("nothing_selected"),
    };
    Ok(response)
}

/// Whole attribute bag from the editor form
pub async fn submit_attributes(
    State(server): State<Arc<PedigreeServer>>,
    Path(session_id): Path<String>,
    payload: Result<Json<PersonAttributes>, JsonRejection>,
) -> ApiResult {
    let Json(attributes) = payload?;
    let response = match server.submit_attributes(&session_id, attributes)? {
        Some(editor) => Json(editor).into_response(),
        None => ignored("nothing_selected"),
    };
    Ok(response)
}

/// Export the chart
pub async fn export_document(
    State(server): State<Arc<PedigreeServer>>,
    Path(session_id): Path<String>,
) -> ApiResult {
    let document = server.export_document(&session_id)?;
    Ok(Json(document).into_response())
}

/// Replace the chart; a rejected document changes nothing
pub async fn import_document(
    State(server): State<Arc<PedigreeServer>>,
    Path(session_id): Path<String>,
    payload: Result<Json<PedigreeDocument>, JsonRejection>,
) -> ApiResult {
    let Json(document) = payload?;
    let summary = server.import_document(&session_id, document)?;
    Ok(Json(summary).into_response())
}
