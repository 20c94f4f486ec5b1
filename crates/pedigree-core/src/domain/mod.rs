/// Person attributes and the editor's field changes
pub mod person;

/// Port groups and their genealogical meaning
pub mod port;

/// Graph substrate contract and the in-memory substrate
pub mod graph;

/// Lineage records and the ledger
pub mod lineage;

/// Domain events
pub mod events;

/// Export/import document
pub mod document;
