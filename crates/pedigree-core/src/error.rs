use thiserror::Error;

/// Core error type for the pedigree engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PedigreeError {
    /// Person node not found
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// A lineage record with the same primary edge is already live
    #[error("Duplicate lineage record: {0}")]
    DuplicateLineageRecord(String),

    /// Attempt to link a node to itself
    #[error("Cannot connect node to itself: {0}")]
    SelfConnection(String),

    /// Imported document failed validation
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Attribute value outside its domain
    #[error("Invalid attribute value: {0}")]
    InvalidAttribute(String),

    /// Confirm or cancel issued without an open delete prompt
    #[error("No deletion is awaiting confirmation")]
    NoPendingDeletion,

    /// A delete prompt is open; only confirm or cancel are accepted
    #[error("Deletion of {0} is awaiting confirmation")]
    DeletionPending(String),

    /// The lineage below the prompted edge changed after the prompt was shown
    #[error("Lineage under {0} changed since the delete prompt was shown")]
    DeletionPromptOutdated(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for PedigreeError {
    fn from(err: serde_json::Error) -> Self {
        PedigreeError::SerializationError(err.to_string())
    }
}

impl From<String> for PedigreeError {
    fn from(err: String) -> Self {
        PedigreeError::Other(err)
    }
}

impl From<&str> for PedigreeError {
    fn from(err: &str) -> Self {
        PedigreeError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = vec![
            (PedigreeError::NodeNotFound("n1".to_string()), "Node not found: n1"),
            (
                PedigreeError::DeletionPending("e1".to_string()),
                "Deletion of e1 is awaiting confirmation",
            ),
            (
                PedigreeError::DuplicateLineageRecord("e2".to_string()),
                "Duplicate lineage record: e2",
            ),
            (
                PedigreeError::SelfConnection("n3".to_string()),
                "Cannot connect node to itself: n3",
            ),
            (PedigreeError::InvalidDocument("bad".to_string()), "Invalid document: bad"),
            (
                PedigreeError::InvalidAttribute("weeks".to_string()),
                "Invalid attribute value: weeks",
            ),
            (PedigreeError::NoPendingDeletion, "No deletion is awaiting confirmation"),
            (
                PedigreeError::SerializationError("eof".to_string()),
                "Serialization error: eof",
            ),
            (PedigreeError::Other("other_err".to_string()), "other_err"),
        ];

        for (error, expected_msg) in errors {
            assert_eq!(error.to_string(), expected_msg);
        }
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error: PedigreeError = json_error.into();

        match error {
            PedigreeError::SerializationError(msg) => {
                assert!(msg.contains("expected value"));
            }
            _ => panic!("Expected SerializationError variant"),
        }
    }

    #[test]
    fn test_from_str() {
        let error: PedigreeError = "test error message".into();
        assert_eq!(error, PedigreeError::Other("test error message".to_string()));
    }
}
