/// Layout distances for created nodes and labels
pub mod layout;

/// Node and edge factories
pub mod factory;

/// Click-to-expansion engine
pub mod expansion;

/// Cascade deletion
pub mod cascade;

/// Selection and editor synchronization
pub mod selection;

/// Editing session aggregate
pub mod session;
