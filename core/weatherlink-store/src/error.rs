//! Error types for the node store.

use thiserror::Error;
use weatherlink_types::ValueType;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// No node at the given path.
    #[error("node not found: {0}")]
    NotFound(String),

    /// A node is already registered at the given path.
    #[error("node already exists: {0}")]
    AlreadyExists(String),

    /// The path belongs to a static node and cannot be published to.
    #[error("node is reserved: {0}")]
    Reserved(String),

    /// The node does not accept writes.
    #[error("node is not writable: {0}")]
    NotWritable(String),

    /// The value does not match the node's declared type.
    #[error("type mismatch at {path}: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: ValueType,
        actual: ValueType,
    },
}
