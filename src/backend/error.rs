//! Backend-specific error types.
//!
//! The cache never recovers from these: a failed introspection query is
//! propagated verbatim to the caller and is never cached, so the next call
//! retries against the backend.

use std::io;

use thiserror::Error;

/// Result type for backend introspection.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors a backend can report while answering introspection queries.
///
/// An unknown data source is deliberately *not* in this taxonomy: existence
/// queries answer it with `false` and primary-key lookups with `None`. A
/// backend only errors here when it genuinely cannot answer.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Could not reach the backend.
    #[error("connection to backend failed: {0}")]
    ConnectionFailed(String),

    /// The backend refused the introspection query.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The backend answered with metadata the port could not interpret.
    #[error("malformed metadata for {entity}: {reason}")]
    MalformedMetadata { entity: String, reason: String },

    /// The backend reported a driver-level error.
    #[error("backend error: {message} (code: {code})")]
    Remote { code: String, message: String },

    /// The introspection query timed out.
    #[error("introspection query timed out after {0} seconds")]
    Timeout(u64),

    /// I/O failure while talking to the backend.
    #[error("io error during introspection: {0}")]
    Io(#[from] io::Error),
}

impl BackendError {
    /// Create a remote error from a driver error code and message.
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Check if retrying the same query could plausibly succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_) | Self::Timeout(_))
    }
}
