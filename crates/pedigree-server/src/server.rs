//! Pedigree Server
//!
//! Holds the open editing sessions and runs the HTTP listener.

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use uuid::Uuid;

use pedigree_core::{
    AttributeChange, CascadeOutcome, DeletionPrompt, EdgeId, EditorPanel, ExpansionOutcome,
    GraphSubstrate, LineageRecord, NodeId, PedigreeDocument, PedigreeSession, PersonAttributes,
    PortClick, PortGroup,
};
use pedigree_monitoring::{LogExt, PedigreeMetrics};

use crate::api;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// One editing session behind its own lock
pub type SharedSession = Arc<Mutex<PedigreeSession>>;

/// Counts describing a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub proband_id: Option<NodeId>,
    pub node_count: usize,
    pub edge_count: usize,
    pub record_count: usize,
    pub selected: Option<NodeId>,
    pub pending_deletion: Option<DeletionPrompt>,
}

/// Pedigree Server
pub struct PedigreeServer {
    config: ServerConfig,
    sessions: DashMap<String, SharedSession>,
    // Held across the limit check and the insert
    creation: Mutex<()>,
}

impl PedigreeServer {
    /// Create a new server with no sessions
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
            creation: Mutex::new(()),
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Number of open sessions
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Open a session with a fresh proband
    pub fn create_session(&self) -> ServerResult<SessionSummary> {
        let _creation = self.creation.lock();
        if self.sessions.len() >= self.config.max_sessions {
            warn!(max_sessions = self.config.max_sessions, "Session limit reached");
            return Err(ServerError::TooManySessions(self.config.max_sessions));
        }

        let session_id = Uuid::new_v4().to_string();
        let session = PedigreeSession::new(self.config.layout.clone());
        let summary = summarize(&session_id, &session);
        self.sessions
            .insert(session_id.clone(), Arc::new(Mutex::new(session)));

        info!(session_id = %session_id, "Created session");
        Ok(summary)
    }

    /// Close a session
    pub fn remove_session(&self, session_id: &str) -> ServerResult<()> {
        match self.sessions.remove(session_id) {
            Some(_) => {
                info!(session_id, "Removed session");
                Ok(())
            }
            None => Err(ServerError::session_not_found(session_id)),
        }
    }

    /// Look a session up
    pub fn session(&self, session_id: &str) -> ServerResult<SharedSession> {
        self.sessions
            .get(session_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ServerError::session_not_found(session_id))
    }

    /// Counts for one session
    pub fn summary(&self, session_id: &str) -> ServerResult<SessionSummary> {
        let handle = self.session(session_id)?;
        let session = handle.lock();
        Ok(summarize(session_id, &session))
    }

    /// Port click
    pub fn click_port(
        &self,
        session_id: &str,
        click: &PortClick,
    ) -> ServerResult<ExpansionOutcome> {
        let handle = self.session(session_id)?;
        let mut session = handle.lock();
        let outcome = session.click_port(click)?;
        match &outcome {
            ExpansionOutcome::Expanded { direction, .. } => {
                PedigreeMetrics::record_expansion(direction.as_str())
            }
            ExpansionOutcome::Ignored(reason) => {
                PedigreeMetrics::record_ignored_click(reason.as_str())
            }
        }
        drain_events(session_id, &mut session);
        Ok(outcome)
    }

    /// Manual link between two existing nodes
    pub fn connect(
        &self,
        session_id: &str,
        source: (&NodeId, PortGroup),
        target: (&NodeId, PortGroup),
    ) -> ServerResult<LineageRecord> {
        let handle = self.session(session_id)?;
        let mut session = handle.lock();
        let record = session.connect_manually(source, target)?;
        PedigreeMetrics::record_manual_link();
        drain_events(session_id, &mut session);
        Ok(record)
    }

    /// Open the delete prompt; `None` for a stale target
    pub fn request_deletion(
        &self,
        session_id: &str,
        edge_id: &EdgeId,
    ) -> ServerResult<Option<DeletionPrompt>> {
        let handle = self.session(session_id)?;
        let prompt = handle.lock().request_deletion(edge_id)?;
        if prompt.is_none() {
            PedigreeMetrics::record_stale_delete();
        }
        Ok(prompt)
    }

    /// Answer the open prompt with "yes"
    pub fn confirm_deletion(&self, session_id: &str) -> ServerResult<CascadeOutcome> {
        let handle = self.session(session_id)?;
        let mut session = handle.lock();
        let outcome = session.confirm_deletion()?;
        match &outcome {
            CascadeOutcome::Deleted(report) => PedigreeMetrics::record_cascade(
                report.removed_records.len(),
                report.removed_nodes.len(),
                report.removed_edges.len(),
            ),
            CascadeOutcome::StaleTarget => PedigreeMetrics::record_stale_delete(),
            CascadeOutcome::Declined => PedigreeMetrics::record_declined_deletion(),
        }
        drain_events(session_id, &mut session);
        Ok(outcome)
    }

    /// Answer the open prompt with "no"
    pub fn cancel_deletion(&self, session_id: &str) -> ServerResult<DeletionPrompt> {
        let handle = self.session(session_id)?;
        let prompt = handle.lock().cancel_deletion()?;
        PedigreeMetrics::record_declined_deletion();
        Ok(prompt)
    }

    /// Select a node and return the editor bound to it
    pub fn select(&self, session_id: &str, node: &NodeId) -> ServerResult<EditorPanel> {
        let handle = self.session(session_id)?;
        let mut session = handle.lock();
        let editor = session.select_node(node)?.clone();
        Ok(editor)
    }

    /// Blank-canvas click
    pub fn clear_selection(&self, session_id: &str) -> ServerResult<bool> {
        let handle = self.session(session_id)?;
        let cleared = handle.lock().clear_selection();
        Ok(cleared)
    }

    /// One editor field change; `None` while nothing is selected
    pub fn edit_attribute(
        &self,
        session_id: &str,
        change: AttributeChange,
    ) -> ServerResult<Option<EditorPanel>> {
        let handle = self.session(session_id)?;
        let mut session = handle.lock();
        let editor = session.edit_attribute(change)?.cloned();
        Ok(editor)
    }

    /// Whole attribute bag from the editor form; `None` while nothing is selected
    pub fn submit_attributes(
        &self,
        session_id: &str,
        attributes: PersonAttributes,
    ) -> ServerResult<Option<EditorPanel>> {
        let handle = self.session(session_id)?;
        let mut session = handle.lock();
        let editor = session.submit_attributes(attributes)?.cloned();
        Ok(editor)
    }

    /// Copy the chart out
    pub fn export_document(&self, session_id: &str) -> ServerResult<PedigreeDocument> {
        let handle = self.session(session_id)?;
        let document = handle.lock().export_document();
        Ok(document)
    }

    /// Replace the chart with a validated document
    pub fn import_document(
        &self,
        session_id: &str,
        document: PedigreeDocument,
    ) -> ServerResult<SessionSummary> {
        let handle = self.session(session_id)?;
        let mut session = handle.lock();
        let result = session.import_document(document);
        PedigreeMetrics::record_import(result.is_ok());
        result?;
        drain_events(session_id, &mut session);
        Ok(summarize(session_id, &session))
    }

    /// Run the server
    pub async fn run(self) -> ServerResult<()> {
        let addr = self.config.socket_addr()?;
        let server = Arc::new(self);
        let app = api::build_router(server);

        info!("Starting server on {}", addr);
        let listener = TcpListener::bind(addr)
            .await
            .log_err("Failed to bind listener")?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .log_err("Server terminated abnormally")
            .log_ok("Server stopped")?;
        Ok(())
    }
}

impl std::fmt::Debug for PedigreeServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PedigreeServer")
            .field("config", &self.config)
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

fn summarize(session_id: &str, session: &PedigreeSession) -> SessionSummary {
    SessionSummary {
        session_id: session_id.to_string(),
        proband_id: session.proband().cloned(),
        node_count: session.graph().node_count(),
        edge_count: session.graph().edge_count(),
        record_count: session.ledger().len(),
        selected: session.selection().selected().cloned(),
        pending_deletion: session.pending_deletion().cloned(),
    }
}

fn drain_events(session_id: &str, session: &mut PedigreeSession) {
    for event in session.take_events() {
        debug!(
            session_id,
            event_type = event.event_type(),
            timestamp = %event.timestamp(),
            "Domain event"
        );
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(?err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
