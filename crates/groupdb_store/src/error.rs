//! Error types for table store operations.

use groupdb_codec::CodecError;
use groupdb_retry::{Interrupted, Retryable};
use thiserror::Error;

/// Result type for table store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during table store operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The column store could not be reached.
    #[error("column store unavailable: {0}")]
    Unavailable(String),

    /// The column store did not answer in time.
    #[error("column store timed out: {0}")]
    Timeout(String),

    /// The request is malformed and will never succeed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The client has been shut down.
    #[error("table store is closed")]
    Closed,

    /// A stored record could not be decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The call context was cancelled or its deadline passed.
    #[error("store call interrupted: {0}")]
    Interrupted(#[from] Interrupted),
}

impl StoreError {
    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

impl Retryable for StoreError {
    fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_connectivity_errors_are_retryable() {
        assert!(StoreError::unavailable("refused").is_retryable());
        assert!(StoreError::timeout("read").is_retryable());
        assert!(!StoreError::invalid_request("empty key").is_retryable());
        assert!(!StoreError::Closed.is_retryable());
        assert!(!StoreError::from(Interrupted::Cancelled).is_retryable());
        assert!(!StoreError::from(CodecError::InvalidUtf8).is_retryable());
    }

    #[test]
    fn display_includes_message() {
        let err = StoreError::unavailable("node 10.0.0.3 refused connection");
        assert_eq!(
            err.to_string(),
            "column store unavailable: node 10.0.0.3 refused connection"
        );
    }
}
