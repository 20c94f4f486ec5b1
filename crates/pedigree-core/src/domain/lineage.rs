//! Lineage ledger
//!
//! Every expansion leaves one [`LineageRecord`] behind: the nodes and edges it
//! created, keyed by the id of its primary (deletable) edge, plus the node that
//! was clicked to trigger it. Records only point upwards through
//! `parent_node_id`; the downward view needed for cascade deletion is rebuilt
//! on demand by [`LineageLedger::closure`].

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

use super::graph::{EdgeId, GraphSnapshot, GraphSubstrate, NodeId};
use crate::PedigreeError;

/// Bookkeeping for one expansion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageRecord {
    /// Primary edge id, also the ledger key
    pub id: EdgeId,

    /// Nodes created by the expansion
    pub node_list: Vec<NodeId>,

    /// Edges created by the expansion, primary first
    pub edge_list: Vec<EdgeId>,

    /// Node whose port click triggered the expansion; none for manual links
    #[serde(default)]
    pub parent_node_id: Option<NodeId>,
}

impl LineageRecord {
    /// Whether this record owns no nodes (a manual link)
    pub fn is_link_only(&self) -> bool {
        self.node_list.is_empty()
    }
}

/// Live lineage records in insertion order, indexed by primary edge id
#[derive(Debug, Default, Clone)]
pub struct LineageLedger {
    records: HashMap<EdgeId, LineageRecord>,
    order: Vec<EdgeId>,
}

impl LineageLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from records, rejecting duplicate ids
    pub fn from_records(
        records: impl IntoIterator<Item = LineageRecord>,
    ) -> Result<Self, PedigreeError> {
        let mut ledger = Self::new();
        for record in records {
            ledger.push(record)?;
        }
        Ok(ledger)
    }

    /// Append a record
    pub fn push(&mut self, record: LineageRecord) -> Result<(), PedigreeError> {
        if self.records.contains_key(&record.id) {
            return Err(PedigreeError::DuplicateLineageRecord(record.id.to_string()));
        }
        self.order.push(record.id.clone());
        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    /// Look up a record by primary edge id
    pub fn get(&self, id: &EdgeId) -> Option<&LineageRecord> {
        self.records.get(id)
    }

    /// Whether a record is live
    pub fn contains(&self, id: &EdgeId) -> bool {
        self.records.contains_key(id)
    }

    /// Remove a record
    pub fn remove(&mut self, id: &EdgeId) -> Option<LineageRecord> {
        let record = self.records.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(record)
    }

    /// Drop every record
    pub fn clear(&mut self) {
        self.records.clear();
        self.order.clear();
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the ledger is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &LineageRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// Records triggered from a given node
    pub fn triggered_by<'a>(
        &'a self,
        node: &'a NodeId,
    ) -> impl Iterator<Item = &'a LineageRecord> + 'a {
        self.iter()
            .filter(move |record| record.parent_node_id.as_ref() == Some(node))
    }

    /// Ids of the record and every record transitively descended from it.
    ///
    /// A record descends from another when its `parent_node_id` is one of the
    /// other's created nodes. The parent index is built once per call, so the
    /// walk is linear in the ledger size. Result is breadth-first with the
    /// starting record first; empty when `id` is not live.
    pub fn closure(&self, id: &EdgeId) -> Vec<EdgeId> {
        if !self.records.contains_key(id) {
            return Vec::new();
        }

        let mut by_parent: HashMap<&NodeId, Vec<&EdgeId>> = HashMap::new();
        for record in self.iter() {
            if let Some(parent) = &record.parent_node_id {
                by_parent.entry(parent).or_default().push(&record.id);
            }
        }

        let mut visited: HashSet<&EdgeId> = HashSet::new();
        let mut queue: VecDeque<&EdgeId> = VecDeque::new();
        let mut result = Vec::new();

        visited.insert(id);
        queue.push_back(id);

        while let Some(current) = queue.pop_front() {
            result.push(current.clone());
            let Some(record) = self.records.get(current) else {
                continue;
            };
            for node in &record.node_list {
                for child in by_parent.get(node).into_iter().flatten() {
                    if visited.insert(*child) {
                        queue.push_back(*child);
                    }
                }
            }
        }

        result
    }

    /// Remove link-only records whose primary edge is gone from the graph.
    ///
    /// Manual links disappear with the nodes they were attached to; this keeps
    /// the ledger from pointing at them afterwards.
    pub fn prune_detached<G: GraphSubstrate + ?Sized>(&mut self, graph: &G) -> Vec<EdgeId> {
        let detached: Vec<EdgeId> = self
            .iter()
            .filter(|record| record.is_link_only() && !graph.contains_edge(&record.id))
            .map(|record| record.id.clone())
            .collect();
        for id in &detached {
            self.remove(id);
        }
        detached
    }

    /// Check every live id exists in a graph snapshot
    pub fn validate_against(&self, snapshot: &GraphSnapshot) -> Result<(), PedigreeError> {
        let node_ids: HashSet<&NodeId> = snapshot.nodes.iter().map(|node| &node.id).collect();
        let edge_ids: HashSet<&EdgeId> = snapshot.edges.iter().map(|edge| &edge.id).collect();
        let mut owners: HashMap<&NodeId, &EdgeId> = HashMap::new();

        for record in self.iter() {
            if !edge_ids.contains(&record.id) {
                return Err(PedigreeError::InvalidDocument(format!(
                    "lineage record {} has no primary edge",
                    record.id
                )));
            }
            if let Some(edge) = record.edge_list.iter().find(|e| !edge_ids.contains(e)) {
                return Err(PedigreeError::InvalidDocument(format!(
                    "lineage record {} references missing edge {}",
                    record.id, edge
                )));
            }
            for node in &record.node_list {
                if !node_ids.contains(node) {
                    return Err(PedigreeError::InvalidDocument(format!(
                        "lineage record {} references missing node {}",
                        record.id, node
                    )));
                }
                if let Some(owner) = owners.insert(node, &record.id) {
                    return Err(PedigreeError::InvalidDocument(format!(
                        "node {} is claimed by lineage records {} and {}",
                        node, owner, record.id
                    )));
                }
            }
        }

        Ok(())
    }
}
