//! Error types for the Pedigree Server
//!
//! This module contains the error types used throughout the server.

use pedigree_core::PedigreeError;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    /// Resource not found
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of resource (session or node)
        resource: &'static str,
        /// Id that was looked up
        id: String,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Imported document rejected
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Confirm or cancel without an open delete prompt
    #[error("No deletion is awaiting confirmation")]
    NoPendingDeletion,

    /// A delete prompt is open and blocks other edits
    #[error("Deletion of {0} is awaiting confirmation")]
    DeletionPending(String),

    /// The lineage under the prompted edge changed before confirmation
    #[error("Lineage under {0} changed since the delete prompt was shown")]
    DeletionPromptOutdated(String),

    /// Session limit reached
    #[error("Session limit of {0} reached")]
    TooManySessions(usize),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// Shorthand for a missing session
    pub fn session_not_found(id: &str) -> Self {
        ServerError::NotFound {
            resource: "session",
            id: id.to_string(),
        }
    }
}

// Implement conversions from other error types
impl From<PedigreeError> for ServerError {
    fn from(err: PedigreeError) -> Self {
        match err {
            PedigreeError::NodeNotFound(id) => ServerError::NotFound {
                resource: "node",
                id,
            },
            PedigreeError::SelfConnection(_) | PedigreeError::InvalidAttribute(_) => {
                ServerError::ValidationError(err.to_string())
            }
            PedigreeError::InvalidDocument(msg) => ServerError::InvalidDocument(msg),
            PedigreeError::SerializationError(msg) => {
                ServerError::ValidationError(format!("JSON error: {}", msg))
            }
            PedigreeError::NoPendingDeletion => ServerError::NoPendingDeletion,
            PedigreeError::DeletionPending(edge) => ServerError::DeletionPending(edge),
            PedigreeError::DeletionPromptOutdated(edge) => {
                ServerError::DeletionPromptOutdated(edge)
            }
            PedigreeError::DuplicateLineageRecord(_) | PedigreeError::Other(_) => {
                ServerError::InternalError(err.to_string())
            }
        }
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::ValidationError(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::InternalError(format!("IO error: {}", err))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::InternalError(format!("Error: {}", err))
    }
}

impl From<config::ConfigError> for ServerError {
    fn from(err: config::ConfigError) -> Self {
        ServerError::ConfigError(err.to_string())
    }
}
