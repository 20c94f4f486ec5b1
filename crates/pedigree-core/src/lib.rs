//!
//! Pedigree Core - graph expansion and lineage tracking for pedigree charts
//!
//! A port click on a person node adds parents, a sibling with a shared child,
//! or a child, and leaves a lineage record behind. Deleting an expansion's
//! primary edge removes that record and every record descended from the
//! nodes it created.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - people, ports, graph substrate, lineage
pub mod domain;

/// Application services - expansion, deletion, selection, sessions
pub mod application;

/// Error types
pub mod error;

pub use error::PedigreeError;

pub use domain::document::{PedigreeDocument, DOCUMENT_VERSION};
pub use domain::events::{
    DocumentImported, DomainEvent, LineageCascadeDeleted, LineageExpanded, ManualLinkCreated,
};
pub use domain::graph::memory::InMemoryGraph;
pub use domain::graph::{
    DeleteLabel, EdgeDraft, EdgeId, EdgeKind, Endpoint, GraphSnapshot, GraphSubstrate,
    LabelKind, NodeDraft, NodeId, PersonNode, Port, PortId, Position, RelationshipEdge, Size,
};
pub use domain::lineage::{LineageLedger, LineageRecord};
pub use domain::person::{
    infer_sibling_gender, AttributeChange, CarrierStatus, Gender, GestationAge, HeredityValue,
    IndividualStatus, PersonAttributes,
};
pub use domain::port::{Direction, PortGroup, PortSemantics};

pub use application::cascade::{
    CascadeDeleter, CascadeOutcome, CascadeReport, DeletionConfirmer, DeletionPrompt,
};
pub use application::expansion::{
    ClickSnapshot, ExpansionOutcome, GraphExpansionEngine, IgnoreReason, PortClick,
};
pub use application::factory::{EdgeFactory, NodeFactory};
pub use application::layout::ExpansionLayout;
pub use application::selection::{EditorPanel, SelectionState, SelectionSyncController};
pub use application::session::PedigreeSession;
