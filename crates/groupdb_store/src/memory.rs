//! In-memory column store.

use crate::column::{ColumnStore, RangeRow};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

type Row = HashMap<String, Bytes>;
type Table = BTreeMap<Vec<u8>, Row>;

/// A column store that keeps every table in a `BTreeMap` keyed by row key.
///
/// This store is suitable for:
/// - Unit and integration tests
/// - Embedding a throwaway store in a single process
///
/// # Example
///
/// ```rust
/// use bytes::Bytes;
/// use groupdb_store::{ColumnStore, InMemoryColumnStore};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let store = InMemoryColumnStore::new();
/// store
///     .put("users", b"alice", vec![("email".into(), Bytes::from_static(b"a@x"))])
///     .await
///     .unwrap();
/// let row = store.get("users", b"alice", &["email"]).await.unwrap();
/// assert_eq!(row, Some(vec![Some(Bytes::from_static(b"a@x"))]));
/// # });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryColumnStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl InMemoryColumnStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of rows in `table`.
    #[must_use]
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, BTreeMap::len)
    }

    /// Returns the names of all tables that hold at least one row.
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .read()
            .iter()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

fn project(key: &[u8], row: &Row, columns: &[&str]) -> RangeRow {
    RangeRow::new(
        key,
        columns.iter().map(|c| row.get(*c).cloned()).collect(),
    )
}

#[async_trait]
impl ColumnStore for InMemoryColumnStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn get(
        &self,
        table: &str,
        key: &[u8],
        columns: &[&str],
    ) -> StoreResult<Option<Vec<Option<Bytes>>>> {
        let tables = self.tables.read();
        Ok(tables
            .get(table)
            .and_then(|rows| rows.get(key))
            .map(|row| project(key, row, columns).values))
    }

    async fn put(&self, table: &str, key: &[u8], cells: Vec<(String, Bytes)>) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let row = tables
            .entry(table.to_string())
            .or_default()
            .entry(key.to_vec())
            .or_default();
        row.extend(cells);
        Ok(())
    }

    async fn delete(&self, table: &str, key: &[u8]) -> StoreResult<()> {
        if let Some(rows) = self.tables.write().get_mut(table) {
            rows.remove(key);
        }
        Ok(())
    }

    async fn drop_table(&self, table: &str) -> StoreResult<()> {
        self.tables.write().remove(table);
        Ok(())
    }

    async fn scan(
        &self,
        table: &str,
        columns: &[&str],
        start: &[u8],
        end: &[u8],
        limit: usize,
    ) -> StoreResult<Vec<RangeRow>> {
        if end < start {
            return Err(StoreError::invalid_request("scan end sorts before start"));
        }
        let tables = self.tables.read();
        let Some(rows) = tables.get(table) else {
            return Ok(Vec::new());
        };
        let bounds = (Bound::Included(start), Bound::Included(end));
        Ok(rows
            .range::<[u8], _>(bounds)
            .take(limit)
            .map(|(key, row)| project(key, row, columns))
            .collect())
    }

    async fn scan_table(&self, table: &str, columns: &[&str]) -> StoreResult<Vec<RangeRow>> {
        let tables = self.tables.read();
        Ok(tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .map(|(key, row)| project(key, row, columns))
                    .collect()
            })
            .unwrap_or_default())
    }
}
