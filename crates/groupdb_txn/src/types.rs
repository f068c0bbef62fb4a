//! Core types for coordinated writes.

use bytes::Bytes;
use groupdb_index::IndexRow;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-application transaction identifier.
///
/// Identifiers are allocated by the coordination service, increase
/// monotonically within one application, and scope exactly one lock
/// acquire/release cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Creates a new transaction ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// A write of one entity row plus its index rows.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityWrite {
    /// Target table.
    pub table: String,
    /// Entity row key (`app_id ⎵ namespace ⎵ path`).
    pub row_key: Vec<u8>,
    /// Columns to write.
    pub columns: Vec<String>,
    /// Values, parallel to `columns`.
    pub values: Vec<Bytes>,
    /// Index rows written under the same lock.
    pub index_rows: Vec<IndexRow>,
}

impl EntityWrite {
    /// Creates an empty write of `row_key` in `table`.
    pub fn new(table: impl Into<String>, row_key: impl Into<Vec<u8>>) -> Self {
        Self {
            table: table.into(),
            row_key: row_key.into(),
            columns: Vec::new(),
            values: Vec::new(),
            index_rows: Vec::new(),
        }
    }

    /// Adds a column value.
    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>, value: impl Into<Bytes>) -> Self {
        self.columns.push(column.into());
        self.values.push(value.into());
        self
    }

    /// Sets the index rows.
    #[must_use]
    pub fn with_index_rows(mut self, rows: Vec<IndexRow>) -> Self {
        self.index_rows = rows;
        self
    }
}

/// What a coordinated write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The entity (and its index rows) were written.
    Written,
    /// The row already held data, so nothing was written.
    Skipped,
    /// The entity (and its index rows) were deleted.
    Deleted,
}

/// Result of a coordinated write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReport {
    /// What happened.
    pub outcome: WriteOutcome,
    transaction_id: Option<TransactionId>,
}

impl WriteReport {
    pub(crate) fn new(outcome: WriteOutcome, transaction_id: Option<TransactionId>) -> Self {
        Self {
            outcome,
            transaction_id,
        }
    }

    /// Transaction the write ran under. `None` for non-transactional tables.
    pub fn transaction_id(&self) -> Option<TransactionId> {
        self.transaction_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_id_display() {
        assert_eq!(TransactionId::new(42).to_string(), "txn:42");
        assert!(TransactionId::new(1) < TransactionId::new(2));
    }

    #[test]
    fn entity_write_builder_keeps_columns_parallel() {
        let write = EntityWrite::new("users", b"app\0\0User\x02\x03x\x01".to_vec())
            .with_column("name", Bytes::from_static(b"ann"))
            .with_column("email", Bytes::from_static(b"a@x"));
        assert_eq!(write.columns, vec!["name", "email"]);
        assert_eq!(write.values.len(), 2);
        assert!(write.index_rows.is_empty());
    }
}
