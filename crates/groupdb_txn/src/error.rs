//! Error types for coordinated writes.

use groupdb_codec::CodecError;
use groupdb_retry::{Interrupted, Retryable};
use groupdb_store::StoreError;
use thiserror::Error;

/// Result type for coordination operations.
pub type TxnResult<T> = Result<T, TxnError>;

/// Errors that can occur while coordinating a write.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TxnError {
    /// Another transaction holds the entity-group lock.
    #[error("entity group lock unavailable: {0}")]
    LockUnavailable(String),

    /// The coordination service could not be reached.
    #[error("coordination service unavailable: {0}")]
    CoordinationUnavailable(String),

    /// The write request is malformed.
    #[error("invalid write: {0}")]
    InvalidRequest(String),

    /// The table store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A row key could not be decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The call context was cancelled or its deadline passed.
    #[error("coordinated write interrupted: {0}")]
    Interrupted(#[from] Interrupted),
}

impl TxnError {
    /// Create a lock unavailable error.
    pub fn lock_unavailable(message: impl Into<String>) -> Self {
        Self::LockUnavailable(message.into())
    }

    /// Create a coordination unavailable error.
    pub fn coordination_unavailable(message: impl Into<String>) -> Self {
        Self::CoordinationUnavailable(message.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

impl Retryable for TxnError {
    fn is_retryable(&self) -> bool {
        match self {
            TxnError::LockUnavailable(_) | TxnError::CoordinationUnavailable(_) => true,
            TxnError::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_kinds_are_retryable() {
        assert!(TxnError::lock_unavailable("held").is_retryable());
        assert!(TxnError::coordination_unavailable("down").is_retryable());
        assert!(TxnError::from(StoreError::timeout("slow")).is_retryable());
        assert!(!TxnError::from(StoreError::Closed).is_retryable());
        assert!(!TxnError::invalid_request("no columns").is_retryable());
        assert!(!TxnError::from(Interrupted::DeadlineExceeded).is_retryable());
    }
}
