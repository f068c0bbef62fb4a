//! The column-store call shape consumed by the table store.

use crate::error::StoreResult;
use async_trait::async_trait;
use bytes::Bytes;

/// One row returned by a scan: its key and the requested column values, in
/// request order. A `None` value means the row has no such column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRow {
    /// Row key.
    pub key: Vec<u8>,
    /// Column values in request order. Empty for keys-only results.
    pub values: Vec<Option<Bytes>>,
}

impl RangeRow {
    /// Creates a row.
    pub fn new(key: impl Into<Vec<u8>>, values: Vec<Option<Bytes>>) -> Self {
        Self {
            key: key.into(),
            values,
        }
    }

    /// Returns the value of the column at `index` in the request.
    pub fn value(&self, index: usize) -> Option<&Bytes> {
        self.values.get(index).and_then(Option::as_ref)
    }
}

/// A wide-column store: named tables of rows, each row a sparse map from
/// column name to bytes, rows ordered by key.
///
/// Column stores are **dumb**. They know nothing about schemas, entity paths
/// or index layouts; the table store owns all of that.
///
/// # Invariants
///
/// - `put` applies all of its cells to one row as a single batch
/// - `scan` bounds are inclusive on both ends and results are key-ordered
/// - reading a table that was never written behaves like reading an empty one
///
/// # Implementors
///
/// - [`super::InMemoryColumnStore`] - for tests and embedding
#[async_trait]
pub trait ColumnStore: Send + Sync {
    /// Checks that the store is reachable.
    async fn ping(&self) -> StoreResult<()>;

    /// Reads `columns` of one row. `None` means the row does not exist.
    async fn get(
        &self,
        table: &str,
        key: &[u8],
        columns: &[&str],
    ) -> StoreResult<Option<Vec<Option<Bytes>>>>;

    /// Writes `cells` to one row in one batch. Columns not named are left
    /// untouched.
    async fn put(&self, table: &str, key: &[u8], cells: Vec<(String, Bytes)>) -> StoreResult<()>;

    /// Deletes one row. Deleting a missing row succeeds.
    async fn delete(&self, table: &str, key: &[u8]) -> StoreResult<()>;

    /// Drops a whole table.
    async fn drop_table(&self, table: &str) -> StoreResult<()>;

    /// Returns up to `limit` rows with `start <= key <= end`, key-ordered.
    async fn scan(
        &self,
        table: &str,
        columns: &[&str],
        start: &[u8],
        end: &[u8],
        limit: usize,
    ) -> StoreResult<Vec<RangeRow>>;

    /// Returns every row of a table, key-ordered.
    async fn scan_table(&self, table: &str, columns: &[&str]) -> StoreResult<Vec<RangeRow>>;
}
