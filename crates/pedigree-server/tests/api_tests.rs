use axum::{
    body::{self, Body},
    http::{self, Request, StatusCode},
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use pedigree_server::{api::build_router, PedigreeServer, ServerConfig};

struct TestContext {
    server: Arc<PedigreeServer>,
}

impl TestContext {
    fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    fn with_config(config: ServerConfig) -> Self {
        Self {
            server: Arc::new(PedigreeServer::new(config)),
        }
    }

    // Helper to make HTTP requests against the router
    async fn request(
        &self,
        method: http::Method,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().uri(path).method(method);

        let body_data = match body {
            Some(value) => {
                req = req.header("Content-Type", "application/json");
                value.to_string()
            }
            None => String::new(),
        };

        let req = req.body(Body::from(body_data)).unwrap();
        let app = build_router(self.server.clone());
        let response = app.oneshot(req).await.unwrap();

        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Returns `(session_id, proband_id)`
    async fn open_session(&self) -> (String, String) {
        let (status, body) = self.request(http::Method::POST, "/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        (
            body["session_id"].as_str().unwrap().to_string(),
            body["proband_id"].as_str().unwrap().to_string(),
        )
    }

    /// Click a port and return the new record
    async fn expand(&self, session: &str, node: &str, port: &str) -> Value {
        let (status, body) = self
            .request(
                http::Method::POST,
                &format!("/v1/sessions/{}/ports/click", session),
                Some(json!({ "node": node, "port": port })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["record"].clone()
    }

    async fn summary(&self, session: &str) -> Value {
        let (status, body) = self
            .request(http::Method::GET, &format!("/v1/sessions/{}", session), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        body
    }
}

fn error_code(body: &Value) -> &str {
    body["errorDetails"]["errorCode"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn test_health_endpoint() {
    let ctx = TestContext::new();
    ctx.open_session().await;

    let (status, body) = ctx.request(http::Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "UP");
    assert_eq!(body["sessions"], 1);
    assert_eq!(body["maxSessions"], 64);
}

#[tokio::test]
async fn test_new_session_holds_only_the_proband() {
    let ctx = TestContext::new();
    let (session, proband) = ctx.open_session().await;

    let summary = ctx.summary(&session).await;
    assert_eq!(summary["node_count"], 1);
    assert_eq!(summary["edge_count"], 0);
    assert_eq!(summary["record_count"], 0);
    assert_eq!(summary["proband_id"], proband.as_str());

    let (_, document) = ctx
        .request(http::Method::GET, &format!("/v1/sessions/{}/document", session), None)
        .await;
    let node = &document["graph"]["nodes"][0];
    assert_eq!(node["attributes"]["proband"], true);
}

#[tokio::test]
async fn test_click_expands_and_records() {
    let ctx = TestContext::new();
    let (session, proband) = ctx.open_session().await;

    let (status, body) = ctx
        .request(
            http::Method::POST,
            &format!("/v1/sessions/{}/ports/click", session),
            Some(json!({ "node": proband, "port": "top" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "expanded");
    assert_eq!(body["direction"], "ancestors");
    assert_eq!(body["record"]["node_list"].as_array().unwrap().len(), 2);
    assert_eq!(body["record"]["edge_list"].as_array().unwrap().len(), 2);
    assert_eq!(body["record"]["parent_node_id"], proband.as_str());
    assert_eq!(body["record"]["id"], body["record"]["edge_list"][0]);

    let summary = ctx.summary(&session).await;
    assert_eq!(summary["node_count"], 3);
    assert_eq!(summary["record_count"], 1);
}

#[tokio::test]
async fn test_unknown_port_group_is_ignored() {
    let ctx = TestContext::new();
    let (session, proband) = ctx.open_session().await;

    let (status, body) = ctx
        .request(
            http::Method::POST,
            &format!("/v1/sessions/{}/ports/click", session),
            Some(json!({ "node": proband, "port": "diagonal" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ignored");
    assert_eq!(body["reason"], "unknown_port_group");
    assert_eq!(ctx.summary(&session).await["node_count"], 1);
}

#[tokio::test]
async fn test_delete_prompt_then_confirm_cascades() {
    let ctx = TestContext::new();
    let (session, proband) = ctx.open_session().await;

    let parents = ctx.expand(&session, &proband, "top").await;
    let father = parents["node_list"][0].as_str().unwrap().to_string();
    ctx.expand(&session, &father, "top").await;
    assert_eq!(ctx.summary(&session).await["node_count"], 5);

    let edge_id = parents["id"].as_str().unwrap();
    let (status, body) = ctx
        .request(
            http::Method::POST,
            &format!("/v1/sessions/{}/lineage/{}/delete-request", session, edge_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["message"], "Delete this link and its nodes?");
    assert_eq!(body["prompt"]["node_count"], 4);
    assert_eq!(body["prompt"]["record_count"], 2);

    // nothing is removed until the prompt is answered
    assert_eq!(ctx.summary(&session).await["node_count"], 5);

    let (status, body) = ctx
        .request(
            http::Method::POST,
            &format!("/v1/sessions/{}/deletion/confirm", session),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "deleted");
    assert_eq!(body["report"]["removed_records"].as_array().unwrap().len(), 2);
    assert_eq!(body["report"]["removed_nodes"].as_array().unwrap().len(), 4);

    let summary = ctx.summary(&session).await;
    assert_eq!(summary["node_count"], 1);
    assert_eq!(summary["edge_count"], 0);
    assert_eq!(summary["record_count"], 0);
}

#[tokio::test]
async fn test_cancel_keeps_everything() {
    let ctx = TestContext::new();
    let (session, proband) = ctx.open_session().await;
    let child = ctx.expand(&session, &proband, "bottom").await;
    let edge_id = child["id"].as_str().unwrap();

    ctx.request(
        http::Method::POST,
        &format!("/v1/sessions/{}/lineage/{}/delete-request", session, edge_id),
        None,
    )
    .await;
    let (status, _) = ctx
        .request(
            http::Method::POST,
            &format!("/v1/sessions/{}/deletion/cancel", session),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let summary = ctx.summary(&session).await;
    assert_eq!(summary["node_count"], 2);
    assert_eq!(summary["record_count"], 1);
    assert_eq!(summary["pending_deletion"], Value::Null);

    // the prompt is gone, so a late "yes" has nothing to confirm
    let (status, body) = ctx
        .request(
            http::Method::POST,
            &format!("/v1/sessions/{}/deletion/confirm", session),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "ERR_NO_PENDING_DELETION");
}

#[tokio::test]
async fn test_delete_request_on_stale_edge_is_ignored() {
    let ctx = TestContext::new();
    let (session, _) = ctx.open_session().await;

    let (status, body) = ctx
        .request(
            http::Method::POST,
            &format!("/v1/sessions/{}/lineage/no-such-edge/delete-request", session),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ignored");
    assert_eq!(body["reason"], "stale_target");
    assert_eq!(ctx.summary(&session).await["pending_deletion"], Value::Null);
}

#[tokio::test]
async fn test_selection_and_attribute_edits() {
    let ctx = TestContext::new();
    let (session, proband) = ctx.open_session().await;
    let child = ctx.expand(&session, &proband, "bottom").await;
    let child_id = child["node_list"][0].as_str().unwrap().to_string();

    let (status, first) = ctx
        .request(
            http::Method::PUT,
            &format!("/v1/sessions/{}/selection", session),
            Some(json!({ "node": proband })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, second) = ctx
        .request(
            http::Method::PUT,
            &format!("/v1/sessions/{}/selection", session),
            Some(json!({ "node": child_id })),
        )
        .await;
    assert_eq!(second["id"], first["id"]);
    assert_eq!(ctx.summary(&session).await["selected"], child_id.as_str());

    let (status, editor) = ctx
        .request(
            http::Method::PATCH,
            &format!("/v1/sessions/{}/selection/attributes", session),
            Some(json!({ "key": "name", "value": "Ann" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(editor["attributes"]["name"], "Ann");

    let (_, document) = ctx
        .request(http::Method::GET, &format!("/v1/sessions/{}/document", session), None)
        .await;
    let stored = document["graph"]["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|node| node["id"] == child_id.as_str())
        .unwrap();
    assert_eq!(stored["attributes"]["name"], "Ann");

    let (status, _) = ctx
        .request(
            http::Method::DELETE,
            &format!("/v1/sessions/{}/selection", session),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = ctx
        .request(
            http::Method::PATCH,
            &format!("/v1/sessions/{}/selection/attributes", session),
            Some(json!({ "key": "name", "value": "Bob" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reason"], "nothing_selected");
}

#[tokio::test]
async fn test_selecting_missing_node_is_not_found() {
    let ctx = TestContext::new();
    let (session, _) = ctx.open_session().await;

    let (status, body) = ctx
        .request(
            http::Method::PUT,
            &format!("/v1/sessions/{}/selection", session),
            Some(json!({ "node": "ghost" })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "ERR_NOT_FOUND_NODE");
}

#[tokio::test]
async fn test_manual_link_and_self_link() {
    let ctx = TestContext::new();
    let (session, proband) = ctx.open_session().await;
    let parents = ctx.expand(&session, &proband, "top").await;
    let father = parents["node_list"][0].as_str().unwrap().to_string();
    let mother = parents["node_list"][1].as_str().unwrap().to_string();

    let (status, body) = ctx
        .request(
            http::Method::POST,
            &format!("/v1/sessions/{}/links", session),
            Some(json!({
                "source": { "node": father, "port": "right" },
                "target": { "node": mother, "port": "left" },
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["record"]["node_list"], json!([]));
    assert_eq!(body["record"]["parent_node_id"], Value::Null);

    let (status, body) = ctx
        .request(
            http::Method::POST,
            &format!("/v1/sessions/{}/links", session),
            Some(json!({
                "source": { "node": father, "port": "right" },
                "target": { "node": father, "port": "left" },
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "ERR_VALIDATION_ERROR");
}

#[tokio::test]
async fn test_document_round_trip_restores_chart() {
    let ctx = TestContext::new();
    let (session, proband) = ctx.open_session().await;
    let child = ctx.expand(&session, &proband, "bottom").await;
    let child_id = child["node_list"][0].as_str().unwrap().to_string();
    ctx.expand(&session, &child_id, "right").await;

    let (_, document) = ctx
        .request(http::Method::GET, &format!("/v1/sessions/{}/document", session), None)
        .await;
    let before = ctx.summary(&session).await;

    let (other, _) = ctx.open_session().await;
    let (status, summary) = ctx
        .request(
            http::Method::PUT,
            &format!("/v1/sessions/{}/document", other),
            Some(document),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["node_count"], before["node_count"]);
    assert_eq!(summary["edge_count"], before["edge_count"]);
    assert_eq!(summary["record_count"], before["record_count"]);
    assert_eq!(summary["proband_id"], proband.as_str());

    // cascade still works on the imported ledger
    let edge_id = child["id"].as_str().unwrap();
    ctx.request(
        http::Method::POST,
        &format!("/v1/sessions/{}/lineage/{}/delete-request", other, edge_id),
        None,
    )
    .await;
    let (_, body) = ctx
        .request(
            http::Method::POST,
            &format!("/v1/sessions/{}/deletion/confirm", other),
            None,
        )
        .await;
    assert_eq!(body["status"], "deleted");
    assert_eq!(ctx.summary(&other).await["node_count"], 1);
}

#[tokio::test]
async fn test_invalid_document_leaves_session_untouched() {
    let ctx = TestContext::new();
    let (session, proband) = ctx.open_session().await;
    ctx.expand(&session, &proband, "top").await;
    let before = ctx.summary(&session).await;

    let (_, mut document) = ctx
        .request(http::Method::GET, &format!("/v1/sessions/{}/document", session), None)
        .await;
    document["lineage"].as_array_mut().unwrap().push(json!({
        "id": "ghost",
        "node_list": [],
        "edge_list": ["ghost"],
        "parent_node_id": null,
    }));

    let (status, body) = ctx
        .request(
            http::Method::PUT,
            &format!("/v1/sessions/{}/document", session),
            Some(document),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "ERR_INVALID_DOCUMENT");
    assert_eq!(ctx.summary(&session).await, before);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let ctx = TestContext::new();
    let (session, _) = ctx.open_session().await;

    let (status, body) = ctx
        .request(
            http::Method::POST,
            &format!("/v1/sessions/{}/ports/click", session),
            Some(json!({ "port": "top" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "ERR_BAD_REQUEST");
}

#[tokio::test]
async fn test_session_limit_and_unknown_session() {
    let ctx = TestContext::with_config(ServerConfig {
        max_sessions: 1,
        ..ServerConfig::default()
    });
    let (session, _) = ctx.open_session().await;

    let (status, body) = ctx.request(http::Method::POST, "/v1/sessions", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(error_code(&body), "ERR_TOO_MANY_SESSIONS");

    let (status, _) = ctx
        .request(http::Method::DELETE, &format!("/v1/sessions/{}", session), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = ctx
        .request(http::Method::GET, &format!("/v1/sessions/{}", session), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "ERR_NOT_FOUND_SESSION");

    ctx.open_session().await;
}

#[tokio::test]
async fn test_unknown_route() {
    let ctx = TestContext::new();
    let (status, body) = ctx.request(http::Method::GET, "/v2/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "ERR_NOT_FOUND");
}

#[tokio::test]
async fn test_open_prompt_blocks_edits_until_answered() {
    let ctx = TestContext::new();
    let (session, proband) = ctx.open_session().await;
    let parents = ctx.expand(&session, &proband, "top").await;
    let father = parents["node_list"][0].as_str().unwrap().to_string();
    let edge_id = parents["id"].as_str().unwrap();

    let (_, body) = ctx
        .request(
            http::Method::POST,
            &format!("/v1/sessions/{}/lineage/{}/delete-request", session, edge_id),
            None,
        )
        .await;
    assert_eq!(body["prompt"]["node_count"], 2);

    // growing the lineage under the prompt is refused
    let (status, body) = ctx
        .request(
            http::Method::POST,
            &format!("/v1/sessions/{}/ports/click", session),
            Some(json!({ "node": father, "port": "top" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "ERR_DELETION_PENDING");

    let (status, body) = ctx
        .request(
            http::Method::POST,
            &format!("/v1/sessions/{}/lineage/{}/delete-request", session, edge_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "ERR_DELETION_PENDING");

    let (status, body) = ctx
        .request(
            http::Method::PUT,
            &format!("/v1/sessions/{}/selection", session),
            Some(json!({ "node": father })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "ERR_DELETION_PENDING");
    assert_eq!(ctx.summary(&session).await["node_count"], 3);

    let (status, body) = ctx
        .request(
            http::Method::POST,
            &format!("/v1/sessions/{}/deletion/confirm", session),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["removed_nodes"].as_array().unwrap().len(), 2);
    assert_eq!(body["report"]["removed_records"].as_array().unwrap().len(), 1);

    let summary = ctx.summary(&session).await;
    assert_eq!(summary["node_count"], 1);
    assert_eq!(summary["pending_deletion"], Value::Null);

    // answered, so clicks work again
    ctx.expand(&session, &proband, "top").await;
}

#[tokio::test]
async fn test_submitted_bag_clears_gestation_of_living_person() {
    let ctx = TestContext::new();
    let (session, proband) = ctx.open_session().await;

    let (status, body) = ctx
        .request(
            http::Method::PUT,
            &format!("/v1/sessions/{}/selection/attributes", session),
            Some(json!({ "name": "Ann" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reason"], "nothing_selected");

    ctx.request(
        http::Method::PUT,
        &format!("/v1/sessions/{}/selection", session),
        Some(json!({ "node": proband })),
    )
    .await;

    let (status, editor) = ctx
        .request(
            http::Method::PUT,
            &format!("/v1/sessions/{}/selection/attributes", session),
            Some(json!({
                "name": "Ann",
                "individual_is": "Alive",
                "gestation_age": 20,
                "proband": true,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(editor["attributes"]["name"], "Ann");
    assert_eq!(editor["attributes"]["gestation_age"], "-");

    let (status, editor) = ctx
        .request(
            http::Method::PUT,
            &format!("/v1/sessions/{}/selection/attributes", session),
            Some(json!({
                "name": "Ann",
                "individual_is": "Unborn",
                "gestation_age": 20,
                "proband": true,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(editor["attributes"]["gestation_age"], "20");

    let (_, document) = ctx
        .request(http::Method::GET, &format!("/v1/sessions/{}/document", session), None)
        .await;
    assert_eq!(
        document["graph"]["nodes"][0]["attributes"]["gestation_age"],
        "20"
    );
}
