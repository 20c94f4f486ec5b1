use crate::domain::graph::{EdgeId, NodeId};
use crate::domain::port::Direction;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// Domain event trait for all events in the system
pub trait DomainEvent: Debug + Send + Sync {
    /// Returns the type of the event as a string
    fn event_type(&self) -> &'static str;

    /// Returns the timestamp when the event occurred
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Event: a port click produced a new lineage record
#[derive(Debug)]
pub struct LineageExpanded {
    /// Primary edge of the new record
    pub record_id: EdgeId,

    /// Node that was clicked
    pub parent_node_id: NodeId,

    /// What the click meant
    pub direction: Direction,

    /// Nodes created
    pub created_nodes: usize,

    /// The timestamp when the expansion happened
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for LineageExpanded {
    fn event_type(&self) -> &'static str {
        "lineage.expanded"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: a confirmed delete removed a record and its descendants
#[derive(Debug)]
pub struct LineageCascadeDeleted {
    /// Record whose delete control was used
    pub root_record_id: EdgeId,

    /// Every record removed, root first
    pub removed_records: Vec<EdgeId>,

    /// Nodes removed from the graph
    pub removed_nodes: usize,

    /// The timestamp when the deletion happened
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for LineageCascadeDeleted {
    fn event_type(&self) -> &'static str {
        "lineage.cascade_deleted"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: the user drew a link between two existing nodes
#[derive(Debug)]
pub struct ManualLinkCreated {
    /// The new edge, also its ledger key
    pub edge_id: EdgeId,

    /// Source node
    pub source: NodeId,

    /// Target node
    pub target: NodeId,

    /// The timestamp when the link was drawn
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for ManualLinkCreated {
    fn event_type(&self) -> &'static str {
        "lineage.manual_link_created"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: the whole chart was replaced from a document
#[derive(Debug)]
pub struct DocumentImported {
    /// Nodes in the imported graph
    pub node_count: usize,

    /// Edges in the imported graph
    pub edge_count: usize,

    /// Lineage records restored
    pub record_count: usize,

    /// The timestamp when the import completed
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for DocumentImported {
    fn event_type(&self) -> &'static str {
        "document.imported"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
