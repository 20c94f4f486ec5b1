//! Selection and the attribute editor panel.
//!
//! The editor is a UI-layer value bound to the selected node id. It never
//! lives in the graph, so nothing that walks graph nodes has to skip it.

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::graph::{GraphSubstrate, NodeId, Position};
use crate::domain::person::{AttributeChange, PersonAttributes};
use crate::PedigreeError;

/// The single attribute editor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorPanel {
    /// Stable while the editor stays open, even across re-selection
    pub id: String,
    /// Top-left corner of the panel
    pub position: Position,
    /// Copy of the selected node's attributes
    pub attributes: PersonAttributes,
}

/// Selection state; selected node and editor are set and cleared together
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SelectionState {
    /// Nothing selected, editor closed
    #[default]
    Idle,
    /// One node selected with its editor open
    Editing {
        /// Selected node
        selected: NodeId,
        /// Editor bound to the selected node
        editor: EditorPanel,
    },
}

/// Keeps one editor panel bound to at most one selected node
#[derive(Debug, Clone)]
pub struct SelectionSyncController {
    state: SelectionState,
    editor_offset: f64,
}

impl SelectionSyncController {
    /// Create an idle controller placing the editor `editor_offset` to the right of the node
    pub fn new(editor_offset: f64) -> Self {
        Self {
            state: SelectionState::Idle,
            editor_offset,
        }
    }

    /// Current state
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Selected node, if any
    pub fn selected(&self) -> Option<&NodeId> {
        match &self.state {
            SelectionState::Idle => None,
            SelectionState::Editing { selected, .. } => Some(selected),
        }
    }

    /// Open editor, if any
    pub fn editor(&self) -> Option<&EditorPanel> {
        match &self.state {
            SelectionState::Idle => None,
            SelectionState::Editing { editor, .. } => Some(editor),
        }
    }

    /// Whether a node is selected
    pub fn is_editing(&self) -> bool {
        matches!(self.state, SelectionState::Editing { .. })
    }

    /// Select a node, opening the editor or moving the open one onto it
    pub fn select<G: GraphSubstrate + ?Sized>(
        &mut self,
        graph: &G,
        node: &NodeId,
    ) -> Result<&EditorPanel, PedigreeError> {
        let person = graph
            .node(node)
            .ok_or_else(|| PedigreeError::NodeNotFound(node.to_string()))?;
        let position = person.position.offset(self.editor_offset, 0.0);
        let attributes = person.attributes.clone();

        match &mut self.state {
            SelectionState::Editing { selected, editor } => {
                debug!(editor_id = %editor.id, from = %selected, to = %node, "Rebinding editor");
                *selected = node.clone();
                editor.position = position;
                editor.attributes = attributes;
            }
            SelectionState::Idle => {
                let editor = EditorPanel {
                    id: Uuid::new_v4().to_string(),
                    position,
                    attributes,
                };
                info!(editor_id = %editor.id, node_id = %node, "Opened editor");
                self.state = SelectionState::Editing {
                    selected: node.clone(),
                    editor,
                };
            }
        }

        self.editor()
            .ok_or_else(|| PedigreeError::Other("editor missing after selection".to_string()))
    }

    /// Blank-canvas click; returns whether an editor was open
    pub fn clear(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            SelectionState::Idle => false,
            SelectionState::Editing { selected, editor } => {
                debug!(editor_id = %editor.id, node_id = %selected, "Selection cleared");
                true
            }
        }
    }

    /// Explicit close of the editor; same effect as [`clear`](Self::clear)
    pub fn close(&mut self) -> bool {
        self.clear()
    }

    /// Apply one editor field change to both the editor copy and the selected node.
    ///
    /// Returns `None` when nothing is selected.
    pub fn apply_change<G: GraphSubstrate + ?Sized>(
        &mut self,
        graph: &mut G,
        change: AttributeChange,
    ) -> Result<Option<&EditorPanel>, PedigreeError> {
        let SelectionState::Editing { editor, .. } = &self.state else {
            return Ok(None);
        };
        let mut updated = editor.attributes.clone();
        updated.apply(change);
        self.write_back(graph, updated)
    }

    /// Replace the whole attribute bag from the editor form.
    ///
    /// An Alive or Deceased status in the bag clears its gestation age.
    pub fn submit<G: GraphSubstrate + ?Sized>(
        &mut self,
        graph: &mut G,
        mut attributes: PersonAttributes,
    ) -> Result<Option<&EditorPanel>, PedigreeError> {
        attributes.normalize();
        self.write_back(graph, attributes)
    }

    /// Return to idle when the selected node is among `removed`
    pub fn forget_removed(&mut self, removed: &[NodeId]) -> bool {
        let hit = self
            .selected()
            .map_or(false, |selected| removed.contains(selected));
        hit && self.clear()
    }

    fn write_back<G: GraphSubstrate + ?Sized>(
        &mut self,
        graph: &mut G,
        attributes: PersonAttributes,
    ) -> Result<Option<&EditorPanel>, PedigreeError> {
        let SelectionState::Editing { selected, editor } = &mut self.state else {
            return Ok(None);
        };
        // graph first, so a failed write leaves both copies equal
        graph.set_attributes(selected, attributes.clone())?;
        editor.attributes = attributes;
        Ok(self.editor())
    }
}

impl Default for SelectionSyncController {
    fn default() -> Self {
        Self::new(80.0)
    }
}
