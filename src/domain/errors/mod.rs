// Domain errors - Error types for the domain layer

use std::fmt;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid arguments provided
    BadArgs(String),
    /// File not found
    FileNotFound(String),
    /// Invalid document or sample format
    InvalidFormat(String),
    /// A reference between document elements violates a structural invariant
    MalformedReference(String),
    /// An object's activity could not be resolved from the activity matrix
    UnresolvedActivity(String),
    /// An element with the same ID already exists
    IdCollision(String),
    /// No more IDs available for an element kind
    IdSpaceExhausted(String),
    /// An element slated for deletion is still referenced
    SharedElementConflict(String),
    /// Processing error
    ProcessingError(String),
}

impl DomainError {
    /// Whether the condition is absorbed into a keep/remove decision
    /// instead of aborting the document.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DomainError::UnresolvedActivity(_) | DomainError::SharedElementConflict(_)
        )
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::BadArgs(msg) => write!(f, "Bad arguments: {}", msg),
            DomainError::FileNotFound(msg) => write!(f, "File not found: {}", msg),
            DomainError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            DomainError::MalformedReference(msg) => write!(f, "Malformed reference: {}", msg),
            DomainError::UnresolvedActivity(msg) => write!(f, "Unresolved activity: {}", msg),
            DomainError::IdCollision(msg) => write!(f, "ID collision: {}", msg),
            DomainError::IdSpaceExhausted(msg) => write!(f, "ID space exhausted: {}", msg),
            DomainError::SharedElementConflict(msg) => {
                write!(f, "Shared element conflict: {}", msg)
            }
            DomainError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
