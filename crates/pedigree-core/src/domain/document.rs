//! Whole-chart document used for export and import.

use serde::{Deserialize, Serialize};

use super::graph::{GraphSnapshot, NodeId};
use super::lineage::{LineageLedger, LineageRecord};
use crate::PedigreeError;

/// Current document format version
pub const DOCUMENT_VERSION: u32 = 1;

/// Serialized chart: graph plus the lineage needed to keep cascade deletion working
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PedigreeDocument {
    /// Document format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Nodes and edges
    pub graph: GraphSnapshot,
    /// Expansion records in creation order
    #[serde(default)]
    pub lineage: Vec<LineageRecord>,
    /// Node marked as proband, if any
    #[serde(default)]
    pub proband: Option<NodeId>,
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

impl PedigreeDocument {
    /// Parse a document from JSON text
    pub fn from_json(text: &str) -> Result<Self, PedigreeError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Render the document as pretty JSON
    pub fn to_json_pretty(&self) -> Result<String, PedigreeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the document and build the ledger it describes
    pub fn validated_ledger(&self) -> Result<LineageLedger, PedigreeError> {
        if self.version > DOCUMENT_VERSION {
            return Err(PedigreeError::InvalidDocument(format!(
                "unsupported document version {}",
                self.version
            )));
        }
        self.graph.validate()?;

        if let Some(proband) = &self.proband {
            if !self.graph.contains_node(proband) {
                return Err(PedigreeError::InvalidDocument(format!(
                    "proband {} is not in the graph",
                    proband
                )));
            }
        }

        let ledger = LineageLedger::from_records(self.lineage.iter().cloned())
            .map_err(|e| PedigreeError::InvalidDocument(e.to_string()))?;
        ledger.validate_against(&self.graph)?;
        Ok(ledger)
    }
}
