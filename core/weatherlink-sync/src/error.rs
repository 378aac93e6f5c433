//! Error types for the sync layer.

use thiserror::Error;
use weatherlink_types::PathError;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised while fetching the upstream document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The HTTP client could not be built.
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    /// The request could not be sent or the connection failed.
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The response body could not be read to completion.
    #[error("reading body from {url} failed: {message}")]
    Body { url: String, message: String },
}

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The fetch failed; nothing was published.
    #[error("fetch failed: {0}")]
    FetchFailed(#[from] TransportError),

    /// A node path could not be built.
    #[error("invalid node path: {0}")]
    Path(#[from] PathError),

    /// Invalid source configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}
