//! One editing session: graph, ledger, selection and the pending delete prompt.
//!
//! Every operation runs to completion before the next one starts. Hosts that
//! share a session between threads put it behind a single mutex.
//!
//! An open delete prompt blocks the session: until it is confirmed or
//! cancelled, every other mutating call fails with
//! [`PedigreeError::DeletionPending`].

use chrono::Utc;
use tracing::info;

use super::cascade::{CascadeDeleter, CascadeOutcome, DeletionConfirmer, DeletionPrompt};
use super::expansion::{ExpansionOutcome, GraphExpansionEngine, PortClick};
use super::layout::ExpansionLayout;
use super::selection::{EditorPanel, SelectionSyncController};
use crate::domain::document::{PedigreeDocument, DOCUMENT_VERSION};
use crate::domain::events::{
    DocumentImported, DomainEvent, LineageCascadeDeleted, LineageExpanded, ManualLinkCreated,
};
use crate::domain::graph::memory::InMemoryGraph;
use crate::domain::graph::{EdgeId, GraphSubstrate, NodeId, Position};
use crate::domain::lineage::{LineageLedger, LineageRecord};
use crate::domain::person::{AttributeChange, PersonAttributes};
use crate::domain::port::PortGroup;
use crate::PedigreeError;

/// Editing session aggregate
pub struct PedigreeSession<G: GraphSubstrate = InMemoryGraph> {
    graph: G,
    ledger: LineageLedger,
    engine: GraphExpansionEngine,
    selection: SelectionSyncController,
    pending_deletion: Option<DeletionPrompt>,
    proband: Option<NodeId>,
    events: Vec<Box<dyn DomainEvent>>,
}

impl PedigreeSession<InMemoryGraph> {
    /// New in-memory session holding only the proband at the canvas origin
    pub fn new(layout: ExpansionLayout) -> Self {
        Self::with_proband(InMemoryGraph::new(), layout, Position::default())
    }
}

impl<G: GraphSubstrate> PedigreeSession<G> {
    /// Session over an existing graph with an empty ledger
    pub fn with_graph(graph: G, layout: ExpansionLayout) -> Self {
        let selection = SelectionSyncController::new(layout.editor_offset);
        Self {
            graph,
            ledger: LineageLedger::new(),
            engine: GraphExpansionEngine::new(layout),
            selection,
            pending_deletion: None,
            proband: None,
            events: Vec::new(),
        }
    }

    /// Session whose graph starts with a proband node at `origin`
    pub fn with_proband(graph: G, layout: ExpansionLayout, origin: Position) -> Self {
        let mut session = Self::with_graph(graph, layout);
        let proband = session.engine.node_factory().create_with(
            &mut session.graph,
            origin,
            PersonAttributes::proband(),
        );
        session.proband = Some(proband);
        session
    }

    /// The chart
    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Live lineage records
    pub fn ledger(&self) -> &LineageLedger {
        &self.ledger
    }

    /// Selection and editor state
    pub fn selection(&self) -> &SelectionSyncController {
        &self.selection
    }

    /// Expansion geometry
    pub fn layout(&self) -> &ExpansionLayout {
        self.engine.layout()
    }

    /// The chart's base node, if it has one
    pub fn proband(&self) -> Option<&NodeId> {
        self.proband.as_ref()
    }

    /// Delete prompt awaiting an answer
    pub fn pending_deletion(&self) -> Option<&DeletionPrompt> {
        self.pending_deletion.as_ref()
    }

    fn ensure_no_pending_deletion(&self) -> Result<(), PedigreeError> {
        match &self.pending_deletion {
            Some(prompt) => Err(PedigreeError::DeletionPending(prompt.edge_id.to_string())),
            None => Ok(()),
        }
    }

    /// Handle a port click
    pub fn click_port(&mut self, click: &PortClick) -> Result<ExpansionOutcome, PedigreeError> {
        self.ensure_no_pending_deletion()?;
        let outcome = self
            .engine
            .expand(&mut self.graph, &mut self.ledger, click)?;
        if let ExpansionOutcome::Expanded { direction, record } = &outcome {
            self.events.push(Box::new(LineageExpanded {
                record_id: record.id.clone(),
                parent_node_id: click.node.clone(),
                direction: *direction,
                created_nodes: record.node_list.len(),
                timestamp: Utc::now(),
            }));
        }
        Ok(outcome)
    }

    /// Draw a deletable link between two existing nodes
    pub fn connect_manually(
        &mut self,
        source: (&NodeId, PortGroup),
        target: (&NodeId, PortGroup),
    ) -> Result<LineageRecord, PedigreeError> {
        self.ensure_no_pending_deletion()?;
        let record =
            self.engine
                .connect_manually(&mut self.graph, &mut self.ledger, source, target)?;
        self.events.push(Box::new(ManualLinkCreated {
            edge_id: record.id.clone(),
            source: source.0.clone(),
            target: target.0.clone(),
            timestamp: Utc::now(),
        }));
        Ok(record)
    }

    /// Open the delete prompt for a primary edge.
    ///
    /// Closes the editor first. Returns `Ok(None)`, changing nothing, for an
    /// edge that is not a live lineage record. A second request while a
    /// prompt is open is refused.
    pub fn request_deletion(
        &mut self,
        edge_id: &EdgeId,
    ) -> Result<Option<DeletionPrompt>, PedigreeError> {
        self.ensure_no_pending_deletion()?;
        let Some(prompt) = CascadeDeleter::prompt(&self.ledger, edge_id) else {
            return Ok(None);
        };
        self.selection.close();
        self.pending_deletion = Some(prompt.clone());
        Ok(Some(prompt))
    }

    /// Answer the open prompt with "yes".
    ///
    /// Deletes exactly the records the prompt listed, or nothing. The prompt
    /// is closed either way.
    pub fn confirm_deletion(&mut self) -> Result<CascadeOutcome, PedigreeError> {
        let prompt = self
            .pending_deletion
            .take()
            .ok_or(PedigreeError::NoPendingDeletion)?;
        let outcome =
            CascadeDeleter::execute_prompt(&mut self.graph, &mut self.ledger, &prompt)?;
        self.after_cascade(&prompt.edge_id, &outcome);
        Ok(outcome)
    }

    /// Answer the open prompt with "no"
    pub fn cancel_deletion(&mut self) -> Result<DeletionPrompt, PedigreeError> {
        let prompt = self
            .pending_deletion
            .take()
            .ok_or(PedigreeError::NoPendingDeletion)?;
        info!(edge_id = %prompt.edge_id, "Deletion declined");
        Ok(prompt)
    }

    /// Request, ask and answer in one step
    pub fn delete_with(
        &mut self,
        edge_id: &EdgeId,
        confirmer: &dyn DeletionConfirmer,
    ) -> Result<CascadeOutcome, PedigreeError> {
        let Some(prompt) = self.request_deletion(edge_id)? else {
            return Ok(CascadeOutcome::StaleTarget);
        };
        if confirmer.confirm(&prompt) {
            self.confirm_deletion()
        } else {
            self.cancel_deletion()?;
            Ok(CascadeOutcome::Declined)
        }
    }

    fn after_cascade(&mut self, edge_id: &EdgeId, outcome: &CascadeOutcome) {
        if let CascadeOutcome::Deleted(report) = outcome {
            self.selection.forget_removed(&report.removed_nodes);
            if let Some(proband) = &self.proband {
                if !self.graph.contains_node(proband) {
                    self.proband = None;
                }
            }
            self.events.push(Box::new(LineageCascadeDeleted {
                root_record_id: edge_id.clone(),
                removed_records: report.removed_records.clone(),
                removed_nodes: report.removed_nodes.len(),
                timestamp: Utc::now(),
            }));
        }
    }

    /// Select a node and bind the editor to it
    pub fn select_node(&mut self, node: &NodeId) -> Result<&EditorPanel, PedigreeError> {
        self.ensure_no_pending_deletion()?;
        self.selection.select(&self.graph, node)
    }

    /// Blank-canvas click
    pub fn clear_selection(&mut self) -> bool {
        self.selection.clear()
    }

    /// One `{key, value}` change from the editor
    pub fn edit_attribute(
        &mut self,
        change: AttributeChange,
    ) -> Result<Option<&EditorPanel>, PedigreeError> {
        self.ensure_no_pending_deletion()?;
        self.selection.apply_change(&mut self.graph, change)
    }

    /// Whole attribute bag from the editor
    pub fn submit_attributes(
        &mut self,
        attributes: PersonAttributes,
    ) -> Result<Option<&EditorPanel>, PedigreeError> {
        self.ensure_no_pending_deletion()?;
        self.selection.submit(&mut self.graph, attributes)
    }

    /// Copy the chart out as a document
    pub fn export_document(&self) -> PedigreeDocument {
        PedigreeDocument {
            version: DOCUMENT_VERSION,
            graph: self.graph.snapshot(),
            lineage: self.ledger.iter().cloned().collect(),
            proband: self.proband.clone(),
        }
    }

    /// Replace the whole chart with a document.
    ///
    /// The document is validated completely before anything is touched; a
    /// rejected document leaves the session as it was.
    pub fn import_document(&mut self, document: PedigreeDocument) -> Result<(), PedigreeError> {
        self.ensure_no_pending_deletion()?;
        let ledger = document.validated_ledger()?;
        let node_count = document.graph.nodes.len();
        let edge_count = document.graph.edges.len();

        self.graph.replace(document.graph);
        self.ledger = ledger;
        self.proband = document.proband;
        self.selection.clear();
        self.pending_deletion = None;

        info!(
            nodes = node_count,
            edges = edge_count,
            records = self.ledger.len(),
            "Imported pedigree document"
        );
        self.events.push(Box::new(DocumentImported {
            node_count,
            edge_count,
            record_count: self.ledger.len(),
            timestamp: Utc::now(),
        }));
        Ok(())
    }

    /// Parse and import a JSON document
    pub fn import_json(&mut self, text: &str) -> Result<(), PedigreeError> {
        let document = PedigreeDocument::from_json(text)?;
        self.import_document(document)
    }

    /// Drain the events recorded since the last call
    pub fn take_events(&mut self) -> Vec<Box<dyn DomainEvent>> {
        std::mem::take(&mut self.events)
    }
}
