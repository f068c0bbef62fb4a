//! Error types for index scans.

use groupdb_codec::CodecError;
use groupdb_retry::Retryable;
use groupdb_store::StoreError;
use thiserror::Error;

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that can occur while building or advancing a range iterator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexError {
    /// The filter or cursor request is not valid for this iterator.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// There are no more entries in the range. This is the normal end of a
    /// scan.
    #[error("index range exhausted")]
    RangeExhausted,

    /// The table store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A key could not be encoded or a stored entry could not be decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl IndexError {
    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Returns true if this is the end-of-iteration signal.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, IndexError::RangeExhausted)
    }
}

impl Retryable for IndexError {
    fn is_retryable(&self) -> bool {
        match self {
            IndexError::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}
