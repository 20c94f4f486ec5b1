use serde::{Deserialize, Serialize};

use crate::domain::graph::Size;
use crate::PedigreeError;

/// Distances used when placing the nodes of an expansion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionLayout {
    /// Vertical distance between generations
    pub generation_gap: f64,
    /// Horizontal distance from the clicked node to each new parent
    pub partner_offset: f64,
    /// Horizontal distance from the clicked node to a new sibling
    pub sibling_offset: f64,
    /// Width of a newly created node
    pub node_width: f64,
    /// Height of a newly created node
    pub node_height: f64,
    /// Where the delete control sits along an expansion's primary edge
    pub delete_label_position: f64,
    /// Where the delete control sits along a manual link
    pub manual_label_position: f64,
    /// Horizontal distance from the selected node to the editor panel
    pub editor_offset: f64,
}

impl Default for ExpansionLayout {
    fn default() -> Self {
        Self {
            generation_gap: 150.0,
            partner_offset: 100.0,
            sibling_offset: 200.0,
            node_width: 60.0,
            node_height: 60.0,
            delete_label_position: 60.0,
            manual_label_position: 40.0,
            editor_offset: 80.0,
        }
    }
}

impl ExpansionLayout {
    /// Size given to every created node
    pub fn node_size(&self) -> Size {
        Size {
            width: self.node_width,
            height: self.node_height,
        }
    }

    /// Reject non-positive or non-finite distances
    pub fn validate(&self) -> Result<(), PedigreeError> {
        let distances = [
            ("generation_gap", self.generation_gap),
            ("partner_offset", self.partner_offset),
            ("sibling_offset", self.sibling_offset),
            ("node_width", self.node_width),
            ("node_height", self.node_height),
            ("delete_label_position", self.delete_label_position),
            ("manual_label_position", self.manual_label_position),
            ("editor_offset", self.editor_offset),
        ];
        for (name, value) in distances {
            if !value.is_finite() || value <= 0.0 {
                return Err(PedigreeError::Other(format!(
                    "layout.{} must be a positive distance, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
