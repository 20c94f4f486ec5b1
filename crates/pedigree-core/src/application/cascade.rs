//! Confirmed, recursive deletion of lineage records.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::graph::{EdgeId, GraphSubstrate, NodeId};
use crate::domain::lineage::LineageLedger;
use crate::PedigreeError;

/// Asks the user whether a cascade may proceed
pub trait DeletionConfirmer {
    /// Return `true` to proceed with the deletion
    fn confirm(&self, prompt: &DeletionPrompt) -> bool;
}

/// What a confirmed deletion would remove
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionPrompt {
    /// Primary edge whose delete control was used
    pub edge_id: EdgeId,
    /// Nodes owned by every record in the closure
    pub node_count: usize,
    /// Records in the closure, including the starting one
    pub record_count: usize,
    /// Ids of those records, starting record first
    pub records: Vec<EdgeId>,
}

impl DeletionPrompt {
    /// Question shown to the user
    pub fn message(&self) -> &'static str {
        if self.node_count > 0 {
            "Delete this link and its nodes?"
        } else {
            "Delete this link?"
        }
    }
}

/// What a cascade actually removed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    /// Records removed, starting record first
    pub removed_records: Vec<EdgeId>,
    /// Nodes removed, in record order
    pub removed_nodes: Vec<NodeId>,
    /// Edges explicitly removed from record edge lists
    pub removed_edges: Vec<EdgeId>,
    /// Ids listed in a record but already gone from the graph
    pub already_absent: usize,
    /// Manual links dropped because the substrate removed their edge with a node
    pub pruned_links: Vec<EdgeId>,
}

/// Result of a delete request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeOutcome {
    /// Records were removed
    Deleted(CascadeReport),
    /// The user declined; nothing changed
    Declined,
    /// The edge is not a live lineage record; nothing changed
    StaleTarget,
}

/// Removes a lineage record and every record descended from it
pub struct CascadeDeleter;

impl CascadeDeleter {
    /// Describe the deletion a delete control would trigger, or `None` for a stale target
    pub fn prompt(ledger: &LineageLedger, edge_id: &EdgeId) -> Option<DeletionPrompt> {
        let closure = ledger.closure(edge_id);
        if closure.is_empty() {
            return None;
        }
        let node_count = closure
            .iter()
            .filter_map(|id| ledger.get(id))
            .map(|record| record.node_list.len())
            .sum();
        Some(DeletionPrompt {
            edge_id: edge_id.clone(),
            node_count,
            record_count: closure.len(),
            records: closure,
        })
    }

    /// Ask the confirmer, then run the cascade only if it agrees
    pub fn delete<G: GraphSubstrate + ?Sized>(
        graph: &mut G,
        ledger: &mut LineageLedger,
        edge_id: &EdgeId,
        confirmer: &dyn DeletionConfirmer,
    ) -> CascadeOutcome {
        let Some(prompt) = Self::prompt(ledger, edge_id) else {
            warn!(edge_id = %edge_id, "Delete requested for unknown lineage record");
            return CascadeOutcome::StaleTarget;
        };
        if !confirmer.confirm(&prompt) {
            info!(edge_id = %edge_id, "Deletion declined");
            return CascadeOutcome::Declined;
        }
        Self::execute(graph, ledger, edge_id)
    }

    /// Run the cascade a prompt was confirmed for.
    ///
    /// Refuses with [`PedigreeError::DeletionPromptOutdated`], changing
    /// nothing, when the records under the edge are no longer the ones the
    /// prompt listed.
    pub fn execute_prompt<G: GraphSubstrate + ?Sized>(
        graph: &mut G,
        ledger: &mut LineageLedger,
        prompt: &DeletionPrompt,
    ) -> Result<CascadeOutcome, PedigreeError> {
        let mut current = ledger.closure(&prompt.edge_id);
        if current.is_empty() {
            warn!(edge_id = %prompt.edge_id, "Confirmed lineage record is gone");
            return Ok(CascadeOutcome::StaleTarget);
        }

        let mut shown = prompt.records.clone();
        current.sort();
        shown.sort();
        if current != shown {
            warn!(
                edge_id = %prompt.edge_id,
                shown = shown.len(),
                current = current.len(),
                "Lineage changed under an open delete prompt"
            );
            return Err(PedigreeError::DeletionPromptOutdated(
                prompt.edge_id.to_string(),
            ));
        }

        Ok(Self::execute(graph, ledger, &prompt.edge_id))
    }

    /// Run the cascade without asking.
    ///
    /// Within each record edges go before nodes. Ids already missing from the
    /// graph are counted and skipped.
    pub fn execute<G: GraphSubstrate + ?Sized>(
        graph: &mut G,
        ledger: &mut LineageLedger,
        edge_id: &EdgeId,
    ) -> CascadeOutcome {
        let closure = ledger.closure(edge_id);
        if closure.is_empty() {
            warn!(edge_id = %edge_id, "Delete requested for unknown lineage record");
            return CascadeOutcome::StaleTarget;
        }

        let mut report = CascadeReport::default();
        for id in &closure {
            let Some(record) = ledger.remove(id) else {
                continue;
            };

            for edge in &record.edge_list {
                if graph.remove_edge(edge) {
                    report.removed_edges.push(edge.clone());
                } else {
                    debug!(record_id = %record.id, edge_id = %edge, "Edge already absent");
                    report.already_absent += 1;
                }
            }
            for node in &record.node_list {
                if graph.remove_node(node) {
                    report.removed_nodes.push(node.clone());
                } else {
                    debug!(record_id = %record.id, node_id = %node, "Node already absent");
                    report.already_absent += 1;
                }
            }
            report.removed_records.push(record.id);
        }

        report.pruned_links = ledger.prune_detached(graph);

        if report.already_absent > 0 {
            warn!(
                edge_id = %edge_id,
                already_absent = report.already_absent,
                "Lineage ledger was out of sync with the graph"
            );
        }
        info!(
            edge_id = %edge_id,
            records = report.removed_records.len(),
            nodes = report.removed_nodes.len(),
            edges = report.removed_edges.len(),
            pruned_links = report.pruned_links.len(),
            "Cascade deletion complete"
        );

        CascadeOutcome::Deleted(report)
    }
}
