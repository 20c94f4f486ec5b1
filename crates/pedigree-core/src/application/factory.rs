//! Node and edge construction on top of the graph substrate.

use tracing::debug;

use crate::domain::graph::{
    DeleteLabel, EdgeDraft, EdgeId, EdgeKind, Endpoint, GraphSubstrate, NodeDraft, NodeId,
    Position, Size,
};
use crate::domain::person::{Gender, PersonAttributes};
use crate::domain::port::PortGroup;

/// Creates person nodes with default attributes and the four standard ports
#[derive(Debug, Clone)]
pub struct NodeFactory {
    size: Size,
}

impl NodeFactory {
    /// Create a factory producing nodes of the given size
    pub fn new(size: Size) -> Self {
        Self { size }
    }

    /// Add a node at `position` whose attributes are the defaults except for `gender`
    pub fn create<G: GraphSubstrate + ?Sized>(
        &self,
        graph: &mut G,
        position: Position,
        gender: Gender,
    ) -> NodeId {
        self.create_with(graph, position, PersonAttributes::with_gender(gender))
    }

    /// Add a node with an explicit attribute bag
    pub fn create_with<G: GraphSubstrate + ?Sized>(
        &self,
        graph: &mut G,
        position: Position,
        attributes: PersonAttributes,
    ) -> NodeId {
        let id = graph.add_node(NodeDraft {
            position,
            size: self.size,
            attributes,
            ports: PortGroup::ALL
                .iter()
                .map(|group| group.as_str().to_string())
                .collect(),
        });
        debug!(node_id = %id, x = position.x, y = position.y, "Created person node");
        id
    }
}

impl Default for NodeFactory {
    fn default() -> Self {
        Self::new(Size {
            width: 60.0,
            height: 60.0,
        })
    }
}

/// Creates relationship edges between node ports
pub struct EdgeFactory;

impl EdgeFactory {
    /// Endpoint at a node's port of the given group; portless when the node lacks one
    pub fn endpoint<G: GraphSubstrate + ?Sized>(
        graph: &G,
        node: &NodeId,
        group: PortGroup,
    ) -> Endpoint {
        Endpoint::new(node.clone(), graph.port(node, group))
    }

    /// Add a visible relationship edge, optionally carrying a delete control
    pub fn connect<G: GraphSubstrate + ?Sized>(
        graph: &mut G,
        source: Endpoint,
        target: Endpoint,
        label: Option<DeleteLabel>,
    ) -> EdgeId {
        Self::add(graph, source, target, EdgeKind::Relationship, label)
    }

    /// Add an invisible edge that only keeps two nodes linked; never deletable
    pub fn trace<G: GraphSubstrate + ?Sized>(
        graph: &mut G,
        source: Endpoint,
        target: Endpoint,
    ) -> EdgeId {
        Self::add(graph, source, target, EdgeKind::Trace, None)
    }

    fn add<G: GraphSubstrate + ?Sized>(
        graph: &mut G,
        source: Endpoint,
        target: Endpoint,
        kind: EdgeKind,
        label: Option<DeleteLabel>,
    ) -> EdgeId {
        let source_node = source.node.clone();
        let target_node = target.node.clone();
        let id = graph.add_edge(EdgeDraft {
            source,
            target,
            kind,
            label,
        });
        debug!(
            edge_id = %id,
            source = %source_node,
            target = %target_node,
            kind = ?kind,
            deletable = label.is_some(),
            "Created edge"
        );
        id
    }
}
