//! Graph substrate contract
//!
//! The engine never owns node or edge memory. It talks to whatever graph the
//! host application renders through [`GraphSubstrate`] and refers to cells by
//! id only. An in-memory substrate is provided for the server and for tests.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::person::PersonAttributes;
use super::port::PortGroup;
use crate::PedigreeError;

/// Value object: Node ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

/// Value object: Edge ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub String);

/// Value object: Port ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(pub String);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canvas coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Position {
    /// Create a position
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Position shifted by the given offsets
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Node size on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width in canvas units
    pub width: f64,
    /// Height in canvas units
    pub height: f64,
}

/// A connection point attached to a node.
///
/// `group` is kept as the raw name the substrate stores so that documents
/// produced elsewhere can carry groups the engine does not understand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Port id
    pub id: PortId,
    /// Raw port group name
    pub group: String,
}

/// A person on the chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonNode {
    /// Node id
    pub id: NodeId,
    /// Top-left corner
    pub position: Position,
    /// Node size
    pub size: Size,
    /// Person attributes
    pub attributes: PersonAttributes,
    /// Attached ports
    pub ports: Vec<Port>,
}

impl PersonNode {
    /// First port belonging to a group
    pub fn port(&self, group: PortGroup) -> Option<&Port> {
        self.ports.iter().find(|port| port.group == group.as_str())
    }
}

/// One end of an edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Node at this end
    pub node: NodeId,
    /// Port on that node, if any
    pub port: Option<PortId>,
}

impl Endpoint {
    /// Endpoint at a node port
    pub fn new(node: NodeId, port: Option<PortId>) -> Self {
        Self { node, port }
    }
}

/// Which delete control sits on an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    /// Control on a partner/sibling link
    PartnerLink,
    /// Control on a link down to a child, and on manual links
    ChildLink,
}

/// Deletable marker attached to a primary edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeleteLabel {
    /// Distance along the edge at which the control is drawn
    pub position: f64,
    /// Which control to draw
    pub kind: LabelKind,
}

/// Kind of relationship edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Visible relationship line
    #[default]
    Relationship,
    /// Invisible line that only keeps related nodes linked
    Trace,
}

/// Relationship between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    /// Edge id
    pub id: EdgeId,
    /// Start of the edge
    pub source: Endpoint,
    /// End of the edge
    pub target: Endpoint,
    /// Visible or trace
    #[serde(default)]
    pub kind: EdgeKind,
    /// Delete control, on primary edges only
    #[serde(default)]
    pub label: Option<DeleteLabel>,
}

impl RelationshipEdge {
    /// Whether either end sits on the given node
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source.node == node || &self.target.node == node
    }
}

/// Everything needed to add a node
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDraft {
    /// Top-left corner
    pub position: Position,
    /// Node size
    pub size: Size,
    /// Initial attributes
    pub attributes: PersonAttributes,
    /// Port group names to attach
    pub ports: Vec<String>,
}

/// Everything needed to add an edge
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeDraft {
    /// Start of the edge
    pub source: Endpoint,
    /// End of the edge
    pub target: Endpoint,
    /// Visible or trace
    pub kind: EdgeKind,
    /// Delete control, if any
    pub label: Option<DeleteLabel>,
}

/// Serializable copy of a whole graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GraphSnapshot {
    /// All nodes
    pub nodes: Vec<PersonNode>,
    /// All edges
    pub edges: Vec<RelationshipEdge>,
}

impl GraphSnapshot {
    /// Check ids are unique and every edge endpoint exists
    pub fn validate(&self) -> Result<(), PedigreeError> {
        let mut node_ids = std::collections::HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !node_ids.insert(&node.id) {
                return Err(PedigreeError::InvalidDocument(format!(
                    "duplicate node id {}",
                    node.id
                )));
            }
        }

        let mut edge_ids = std::collections::HashSet::with_capacity(self.edges.len());
        for edge in &self.edges {
            if !edge_ids.insert(&edge.id) {
                return Err(PedigreeError::InvalidDocument(format!(
                    "duplicate edge id {}",
                    edge.id
                )));
            }
            for end in [&edge.source, &edge.target] {
                if !node_ids.contains(&end.node) {
                    return Err(PedigreeError::InvalidDocument(format!(
                        "edge {} references missing node {}",
                        edge.id, end.node
                    )));
                }
            }
        }

        Ok(())
    }

    /// Whether a node id is present
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.iter().any(|node| &node.id == id)
    }

    /// Whether an edge id is present
    pub fn contains_edge(&self, id: &EdgeId) -> bool {
        self.edges.iter().any(|edge| &edge.id == id)
    }
}

/// The host graph the engine mutates.
///
/// Removing a node must also remove every edge still attached to it.
/// Removing an id that is already gone returns `false` and does nothing else.
pub trait GraphSubstrate: Send {
    /// Add a node and return the id the substrate assigned
    fn add_node(&mut self, draft: NodeDraft) -> NodeId;

    /// Add an edge and return the id the substrate assigned
    fn add_edge(&mut self, draft: EdgeDraft) -> EdgeId;

    /// Remove a node together with its attached edges
    fn remove_node(&mut self, id: &NodeId) -> bool;

    /// Remove an edge
    fn remove_edge(&mut self, id: &EdgeId) -> bool;

    /// Look up a node
    fn node(&self, id: &NodeId) -> Option<&PersonNode>;

    /// Look up an edge
    fn edge(&self, id: &EdgeId) -> Option<&RelationshipEdge>;

    /// Overwrite a node's attribute bag
    fn set_attributes(
        &mut self,
        id: &NodeId,
        attributes: PersonAttributes,
    ) -> Result<(), PedigreeError>;

    /// Number of nodes
    fn node_count(&self) -> usize;

    /// Number of edges
    fn edge_count(&self) -> usize;

    /// Copy the whole graph out
    fn snapshot(&self) -> GraphSnapshot;

    /// Replace the whole graph in one step
    fn replace(&mut self, snapshot: GraphSnapshot);

    /// Port of a node by group name
    fn port(&self, node: &NodeId, group: PortGroup) -> Option<PortId> {
        self.node(node)
            .and_then(|n| n.port(group))
            .map(|port| port.id.clone())
    }

    /// Whether a node exists
    fn contains_node(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Whether an edge exists
    fn contains_edge(&self, id: &EdgeId) -> bool {
        self.edge(id).is_some()
    }
}

/// In-memory substrate
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use tracing::debug;
    use uuid::Uuid;

    /// In-memory graph keeping insertion order for stable snapshots
    #[derive(Debug, Default, Clone)]
    pub struct InMemoryGraph {
        nodes: HashMap<NodeId, PersonNode>,
        node_order: Vec<NodeId>,
        edges: HashMap<EdgeId, RelationshipEdge>,
        edge_order: Vec<EdgeId>,
    }

    impl InMemoryGraph {
        /// Create an empty graph
        pub fn new() -> Self {
            Self::default()
        }

        /// Build a graph from a snapshot
        pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
            let mut graph = Self::new();
            graph.replace(snapshot);
            graph
        }

        /// Nodes in insertion order
        pub fn nodes(&self) -> impl Iterator<Item = &PersonNode> {
            self.node_order.iter().filter_map(|id| self.nodes.get(id))
        }

        /// Edges in insertion order
        pub fn edges(&self) -> impl Iterator<Item = &RelationshipEdge> {
            self.edge_order.iter().filter_map(|id| self.edges.get(id))
        }
    }

    impl GraphSubstrate for InMemoryGraph {
        fn add_node(&mut self, draft: NodeDraft) -> NodeId {
            let id = NodeId(Uuid::new_v4().to_string());
            let ports = draft
                .ports
                .into_iter()
                .map(|group| Port {
                    id: PortId(Uuid::new_v4().to_string()),
                    group,
                })
                .collect();

            let node = PersonNode {
                id: id.clone(),
                position: draft.position,
                size: draft.size,
                attributes: draft.attributes,
                ports,
            };
            self.nodes.insert(id.clone(), node);
            self.node_order.push(id.clone());
            id
        }

        fn add_edge(&mut self, draft: EdgeDraft) -> EdgeId {
            let id = EdgeId(Uuid::new_v4().to_string());
            let edge = RelationshipEdge {
                id: id.clone(),
                source: draft.source,
                target: draft.target,
                kind: draft.kind,
                label: draft.label,
            };
            self.edges.insert(id.clone(), edge);
            self.edge_order.push(id.clone());
            id
        }

        fn remove_node(&mut self, id: &NodeId) -> bool {
            if self.nodes.remove(id).is_none() {
                return false;
            }
            self.node_order.retain(|existing| existing != id);

            let attached: Vec<EdgeId> = self
                .edges
                .values()
                .filter(|edge| edge.touches(id))
                .map(|edge| edge.id.clone())
                .collect();
            for edge_id in &attached {
                self.remove_edge(edge_id);
            }
            debug!(node_id = %id, attached_edges = attached.len(), "Removed node");
            true
        }

        fn remove_edge(&mut self, id: &EdgeId) -> bool {
            if self.edges.remove(id).is_none() {
                return false;
            }
            self.edge_order.retain(|existing| existing != id);
            true
        }

        fn node(&self, id: &NodeId) -> Option<&PersonNode> {
            self.nodes.get(id)
        }

        fn edge(&self, id: &EdgeId) -> Option<&RelationshipEdge> {
            self.edges.get(id)
        }

        fn set_attributes(
            &mut self,
            id: &NodeId,
            attributes: PersonAttributes,
        ) -> Result<(), PedigreeError> {
            let node = self
                .nodes
                .get_mut(id)
                .ok_or_else(|| PedigreeError::NodeNotFound(id.to_string()))?;
            node.attributes = attributes;
            Ok(())
        }

        fn node_count(&self) -> usize {
            self.nodes.len()
        }

        fn edge_count(&self) -> usize {
            self.edges.len()
        }

        fn snapshot(&self) -> GraphSnapshot {
            GraphSnapshot {
                nodes: self.nodes().cloned().collect(),
                edges: self.edges().cloned().collect(),
            }
        }

        fn replace(&mut self, snapshot: GraphSnapshot) {
            self.nodes.clear();
            self.node_order.clear();
            self.edges.clear();
            self.edge_order.clear();

            for node in snapshot.nodes {
                self.node_order.push(node.id.clone());
                self.nodes.insert(node.id.clone(), node);
            }
            for edge in snapshot.edges {
                self.edge_order.push(edge.id.clone());
                self.edges.insert(edge.id.clone(), edge);
            }
        }
    }
}
