//! Range iterator configuration.

use serde::{Deserialize, Serialize};

/// Default number of index rows fetched per store round trip.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Configuration for a [`crate::RangeIterator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Rows fetched per chunk. A short chunk marks the range exhausted.
    pub chunk_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl IndexConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chunk size. Zero is raised to one.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}
