//! Click-to-expansion algorithm.
//!
//! One port click creates the nodes and edges for parents, a sibling with a
//! shared child, or a single child, and appends exactly one lineage record.
//! Trace edges are created alongside but are not listed in the record; the
//! substrate drops them together with their nodes.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use super::factory::{EdgeFactory, NodeFactory};
use super::layout::ExpansionLayout;
use crate::domain::graph::{
    DeleteLabel, EdgeId, Endpoint, GraphSubstrate, LabelKind, NodeId, PortId, Position,
};
use crate::domain::lineage::{LineageLedger, LineageRecord};
use crate::domain::person::{infer_sibling_gender, Gender};
use crate::domain::port::{Direction, PortGroup, PortSemantics};
use crate::PedigreeError;

/// A click on a node's connection point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortClick {
    /// The clicked node
    pub node: NodeId,
    /// Group name of the clicked port as reported by the substrate
    pub port: String,
}

impl PortClick {
    /// Click on one of the four standard ports
    pub fn new(node: NodeId, group: PortGroup) -> Self {
        Self {
            node,
            port: group.as_str().to_string(),
        }
    }
}

/// Values read from the clicked node before the graph is touched
#[derive(Debug, Clone, PartialEq)]
pub struct ClickSnapshot {
    /// Clicked node
    pub node: NodeId,
    /// Clicked port, if the click landed on one
    pub port: Option<PortId>,
    /// Gender of the clicked node
    pub gender: Gender,
    /// Position of the clicked node
    pub position: Position,
}

impl ClickSnapshot {
    fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.node.clone(), self.port.clone())
    }
}

/// Why a click produced no expansion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "value", rename_all = "snake_case")]
pub enum IgnoreReason {
    /// The port group is not one of top/right/bottom/left
    UnknownPortGroup(String),
    /// The clicked node is not in the graph
    UnknownNode(NodeId),
}

impl IgnoreReason {
    /// Short label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            IgnoreReason::UnknownPortGroup(_) => "unknown_port_group",
            IgnoreReason::UnknownNode(_) => "unknown_node",
        }
    }
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::UnknownPortGroup(group) => write!(f, "unknown port group '{}'", group),
            IgnoreReason::UnknownNode(node) => write!(f, "unknown node {}", node),
        }
    }
}

/// Result of a port click
#[derive(Debug, Clone, PartialEq)]
pub enum ExpansionOutcome {
    /// New nodes and edges were added and recorded
    Expanded {
        direction: Direction,
        record: LineageRecord,
    },
    /// Nothing changed
    Ignored(IgnoreReason),
}

impl ExpansionOutcome {
    /// The new record, if any
    pub fn record(&self) -> Option<&LineageRecord> {
        match self {
            ExpansionOutcome::Expanded { record, .. } => Some(record),
            ExpansionOutcome::Ignored(_) => None,
        }
    }
}

/// Ids produced by one branch of the algorithm
struct Created {
    nodes: Vec<NodeId>,
    primary: EdgeId,
    other: Option<EdgeId>,
}

/// Performs click-triggered expansions and manual links
#[derive(Debug, Clone)]
pub struct GraphExpansionEngine {
    layout: ExpansionLayout,
    nodes: NodeFactory,
}

impl GraphExpansionEngine {
    /// Create an engine with the given layout
    pub fn new(layout: ExpansionLayout) -> Self {
        let nodes = NodeFactory::new(layout.node_size());
        Self { layout, nodes }
    }

    /// Layout in use
    pub fn layout(&self) -> &ExpansionLayout {
        &self.layout
    }

    /// Node factory sized from the layout
    pub fn node_factory(&self) -> &NodeFactory {
        &self.nodes
    }

    /// Expand the graph from one port click and record the expansion.
    ///
    /// Unknown port groups and unknown nodes leave graph and ledger untouched.
    pub fn expand<G: GraphSubstrate + ?Sized>(
        &self,
        graph: &mut G,
        ledger: &mut LineageLedger,
        click: &PortClick,
    ) -> Result<ExpansionOutcome, PedigreeError> {
        let Some(group) = PortGroup::parse(&click.port) else {
            warn!(node_id = %click.node, port = %click.port, "Ignoring click on unknown port group");
            return Ok(ExpansionOutcome::Ignored(IgnoreReason::UnknownPortGroup(
                click.port.clone(),
            )));
        };
        let Some(node) = graph.node(&click.node) else {
            warn!(node_id = %click.node, "Ignoring click on unknown node");
            return Ok(ExpansionOutcome::Ignored(IgnoreReason::UnknownNode(
                click.node.clone(),
            )));
        };

        let snapshot = ClickSnapshot {
            node: node.id.clone(),
            port: node.port(group).map(|port| port.id.clone()),
            gender: node.attributes.gender,
            position: node.position,
        };
        let direction = PortSemantics::classify(group);

        let created = match direction {
            Direction::Ancestors => self.add_parents(graph, &snapshot),
            Direction::SiblingRight => self.add_sibling_right(graph, &snapshot),
            Direction::SiblingLeft => self.add_sibling_left(graph, &snapshot),
            Direction::Descendant => self.add_child(graph, &snapshot),
        };

        let mut edge_list = vec![created.primary.clone()];
        edge_list.extend(created.other);
        let record = LineageRecord {
            id: created.primary,
            node_list: created.nodes,
            edge_list,
            parent_node_id: Some(snapshot.node.clone()),
        };
        ledger.push(record.clone())?;

        info!(
            record_id = %record.id,
            parent_node_id = %snapshot.node,
            direction = direction.as_str(),
            nodes = record.node_list.len(),
            edges = record.edge_list.len(),
            "Expanded pedigree"
        );

        Ok(ExpansionOutcome::Expanded { direction, record })
    }

    /// Connect two existing nodes with a deletable link owning no nodes
    pub fn connect_manually<G: GraphSubstrate + ?Sized>(
        &self,
        graph: &mut G,
        ledger: &mut LineageLedger,
        source: (&NodeId, PortGroup),
        target: (&NodeId, PortGroup),
    ) -> Result<LineageRecord, PedigreeError> {
        let (source_node, source_group) = source;
        let (target_node, target_group) = target;

        if source_node == target_node {
            return Err(PedigreeError::SelfConnection(source_node.to_string()));
        }
        for node in [source_node, target_node] {
            if !graph.contains_node(node) {
                return Err(PedigreeError::NodeNotFound(node.to_string()));
            }
        }

        let from = EdgeFactory::endpoint(graph, source_node, source_group);
        let to = EdgeFactory::endpoint(graph, target_node, target_group);
        let label = DeleteLabel {
            position: self.layout.manual_label_position,
            kind: LabelKind::ChildLink,
        };
        let edge = EdgeFactory::connect(graph, from, to, Some(label));

        let record = LineageRecord {
            id: edge.clone(),
            node_list: Vec::new(),
            edge_list: vec![edge],
            parent_node_id: None,
        };
        ledger.push(record.clone())?;

        info!(
            edge_id = %record.id,
            source = %source_node,
            target = %target_node,
            "Created manual link"
        );
        Ok(record)
    }

    fn label(&self, kind: LabelKind) -> Option<DeleteLabel> {
        Some(DeleteLabel {
            position: self.layout.delete_label_position,
            kind,
        })
    }

    fn add_parents<G: GraphSubstrate + ?Sized>(
        &self,
        graph: &mut G,
        clicked: &ClickSnapshot,
    ) -> Created {
        let layout = &self.layout;
        let male = self.nodes.create(
            graph,
            clicked
                .position
                .offset(-layout.partner_offset, -layout.generation_gap),
            Gender::Male,
        );
        let female = self.nodes.create(
            graph,
            clicked
                .position
                .offset(layout.partner_offset, -layout.generation_gap),
            Gender::Female,
        );

        let male_right = EdgeFactory::endpoint(graph, &male, PortGroup::Right);
        let female_left = EdgeFactory::endpoint(graph, &female, PortGroup::Left);
        EdgeFactory::trace(graph, male_right.clone(), female_left.clone());
        let other = EdgeFactory::connect(graph, female_left, clicked.endpoint(), None);
        let primary = EdgeFactory::connect(
            graph,
            male_right,
            clicked.endpoint(),
            self.label(LabelKind::PartnerLink),
        );

        Created {
            nodes: vec![male, female],
            primary,
            other: Some(other),
        }
    }

    fn add_sibling_right<G: GraphSubstrate + ?Sized>(
        &self,
        graph: &mut G,
        clicked: &ClickSnapshot,
    ) -> Created {
        let layout = &self.layout;
        let sibling = self.nodes.create(
            graph,
            clicked.position.offset(layout.sibling_offset, 0.0),
            infer_sibling_gender(clicked.gender),
        );
        let child = self.nodes.create(
            graph,
            clicked
                .position
                .offset(layout.sibling_offset / 2.0, layout.generation_gap),
            Gender::Unknown,
        );

        let sibling_left = EdgeFactory::endpoint(graph, &sibling, PortGroup::Left);
        let child_top = EdgeFactory::endpoint(graph, &child, PortGroup::Top);
        EdgeFactory::trace(graph, clicked.endpoint(), sibling_left.clone());
        let other = EdgeFactory::connect(graph, sibling_left, child_top.clone(), None);
        let primary = EdgeFactory::connect(
            graph,
            clicked.endpoint(),
            child_top,
            self.label(LabelKind::PartnerLink),
        );

        Created {
            nodes: vec![sibling, child],
            primary,
            other: Some(other),
        }
    }

    // The deletable edge here runs from the sibling, not from the clicked node.
    fn add_sibling_left<G: GraphSubstrate + ?Sized>(
        &self,
        graph: &mut G,
        clicked: &ClickSnapshot,
    ) -> Created {
        let layout = &self.layout;
        let sibling = self.nodes.create(
            graph,
            clicked.position.offset(-layout.sibling_offset, 0.0),
            infer_sibling_gender(clicked.gender),
        );
        let child = self.nodes.create(
            graph,
            clicked
                .position
                .offset(-layout.sibling_offset / 2.0, layout.generation_gap),
            Gender::Unknown,
        );

        let sibling_right = EdgeFactory::endpoint(graph, &sibling, PortGroup::Right);
        let child_top = EdgeFactory::endpoint(graph, &child, PortGroup::Top);
        EdgeFactory::trace(graph, clicked.endpoint(), sibling_right.clone());
        let other = EdgeFactory::connect(graph, clicked.endpoint(), child_top.clone(), None);
        let primary = EdgeFactory::connect(
            graph,
            sibling_right,
            child_top,
            self.label(LabelKind::PartnerLink),
        );

        Created {
            nodes: vec![sibling, child],
            primary,
            other: Some(other),
        }
    }

    fn add_child<G: GraphSubstrate + ?Sized>(
        &self,
        graph: &mut G,
        clicked: &ClickSnapshot,
    ) -> Created {
        let child = self.nodes.create(
            graph,
            clicked.position.offset(0.0, self.layout.generation_gap),
            Gender::Unknown,
        );
        let child_top = EdgeFactory::endpoint(graph, &child, PortGroup::Top);
        let primary = EdgeFactory::connect(
            graph,
            clicked.endpoint(),
            child_top,
            self.label(LabelKind::ChildLink),
        );

        Created {
            nodes: vec![child],
            primary,
            other: None,
        }
    }
}

impl Default for GraphExpansionEngine {
    fn default() -> Self {
        Self::new(ExpansionLayout::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::memory::InMemoryGraph;
    use crate::domain::graph::EdgeKind;

    fn setup(gender: Gender) -> (InMemoryGraph, LineageLedger, GraphExpansionEngine, NodeId) {
        let mut graph = InMemoryGraph::new();
        let engine = GraphExpansionEngine::default();
        let root = engine
            .node_factory()
            .create(&mut graph, Position::new(500.0, 500.0), gender);
        (graph, LineageLedger::new(), engine, root)
    }

    fn position(graph: &InMemoryGraph, id: &NodeId) -> Position {
        graph.node(id).unwrap().position
    }

    #[test]
    fn test_ancestors_places_parents_above() {
        let (mut graph, mut ledger, engine, root) = setup(Gender::Unknown);
        let outcome = engine
            .expand(&mut graph, &mut ledger, &PortClick::new(root.clone(), PortGroup::Top))
            .unwrap();

        let record = outcome.record().unwrap().clone();
        let (male, female) = (&record.node_list[0], &record.node_list[1]);
        assert_eq!(position(&graph, male), Position::new(400.0, 350.0));
        assert_eq!(position(&graph, female), Position::new(600.0, 350.0));
        assert_eq!(graph.node(male).unwrap().attributes.gender, Gender::Male);
        assert_eq!(graph.node(female).unwrap().attributes.gender, Gender::Female);

        let primary = graph.edge(&record.id).unwrap();
        assert_eq!(&primary.source.node, male);
        assert_eq!(primary.target.node, root);
        assert_eq!(primary.label.unwrap().kind, LabelKind::PartnerLink);

        let other = graph.edge(&record.edge_list[1]).unwrap();
        assert_eq!(&other.source.node, female);
        assert!(other.label.is_none());

        // primary, other, and the couple's trace edge
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(
            graph.edges().filter(|e| e.kind == EdgeKind::Trace).count(),
            1
        );
    }

    #[test]
    fn test_sibling_right_primary_runs_from_clicked_node() {
        let (mut graph, mut ledger, engine, root) = setup(Gender::Male);
        let outcome = engine
            .expand(&mut graph, &mut ledger, &PortClick::new(root.clone(), PortGroup::Right))
            .unwrap();

        let record = outcome.record().unwrap();
        let (sibling, child) = (&record.node_list[0], &record.node_list[1]);
        assert_eq!(position(&graph, sibling), Position::new(700.0, 500.0));
        assert_eq!(position(&graph, child), Position::new(600.0, 650.0));
        assert_eq!(graph.node(sibling).unwrap().attributes.gender, Gender::Female);
        assert_eq!(graph.node(child).unwrap().attributes.gender, Gender::Unknown);

        let primary = graph.edge(&record.id).unwrap();
        assert_eq!(primary.source.node, root);
        assert_eq!(&primary.target.node, child);
    }

    #[test]
    fn test_sibling_left_primary_runs_from_sibling() {
        let (mut graph, mut ledger, engine, root) = setup(Gender::Female);
        let outcome = engine
            .expand(&mut graph, &mut ledger, &PortClick::new(root.clone(), PortGroup::Left))
            .unwrap();

        let record = outcome.record().unwrap();
        let (sibling, child) = (&record.node_list[0], &record.node_list[1]);
        assert_eq!(position(&graph, sibling), Position::new(300.0, 500.0));
        assert_eq!(position(&graph, child), Position::new(400.0, 650.0));
        assert_eq!(graph.node(sibling).unwrap().attributes.gender, Gender::Male);

        let primary = graph.edge(&record.id).unwrap();
        assert_eq!(&primary.source.node, sibling);
        assert_eq!(&primary.target.node, child);

        let other = graph.edge(&record.edge_list[1]).unwrap();
        assert_eq!(other.source.node, root);
    }

    #[test]
    fn test_descendant_uses_child_link_label() {
        let (mut graph, mut ledger, engine, root) = setup(Gender::Unknown);
        let outcome = engine
            .expand(&mut graph, &mut ledger, &PortClick::new(root.clone(), PortGroup::Bottom))
            .unwrap();

        let record = outcome.record().unwrap();
        assert_eq!(position(&graph, &record.node_list[0]), Position::new(500.0, 650.0));
        let primary = graph.edge(&record.id).unwrap();
        assert_eq!(primary.label.unwrap().kind, LabelKind::ChildLink);
        assert_eq!(primary.label.unwrap().position, 60.0);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_sibling_gender_read_before_mutation() {
        let (mut graph, mut ledger, engine, root) = setup(Gender::Male);
        let first = engine
            .expand(&mut graph, &mut ledger, &PortClick::new(root.clone(), PortGroup::Right))
            .unwrap();
        let sibling = first.record().unwrap().node_list[0].clone();

        let mut changed = graph.node(&root).unwrap().attributes.clone();
        changed.gender = Gender::Female;
        graph.set_attributes(&root, changed).unwrap();

        assert_eq!(graph.node(&sibling).unwrap().attributes.gender, Gender::Female);
    }

    #[test]
    fn test_unknown_node_is_ignored() {
        let (mut graph, mut ledger, engine, _) = setup(Gender::Unknown);
        let ghost = NodeId("ghost".to_string());
        let outcome = engine
            .expand(&mut graph, &mut ledger, &PortClick::new(ghost.clone(), PortGroup::Top))
            .unwrap();
        assert_eq!(outcome, ExpansionOutcome::Ignored(IgnoreReason::UnknownNode(ghost)));
        assert!(ledger.is_empty());
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_manual_link_rejects_self_connection() {
        let (mut graph, mut ledger, engine, root) = setup(Gender::Unknown);
        let result = engine.connect_manually(
            &mut graph,
            &mut ledger,
            (&root, PortGroup::Right),
            (&root, PortGroup::Left),
        );
        assert_eq!(result, Err(PedigreeError::SelfConnection(root.to_string())));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_manual_link_is_recorded_without_nodes() {
        let (mut graph, mut ledger, engine, root) = setup(Gender::Unknown);
        let other = engine
            .node_factory()
            .create(&mut graph, Position::new(800.0, 500.0), Gender::Female);

        let record = engine
            .connect_manually(
                &mut graph,
                &mut ledger,
                (&root, PortGroup::Right),
                (&other, PortGroup::Left),
            )
            .unwrap();

        assert!(record.is_link_only());
        assert_eq!(record.parent_node_id, None);
        assert_eq!(record.edge_list, vec![record.id.clone()]);
        let edge = graph.edge(&record.id).unwrap();
        assert_eq!(edge.label.unwrap().position, 40.0);
        assert_eq!(edge.label.unwrap().kind, LabelKind::ChildLink);
    }
}
