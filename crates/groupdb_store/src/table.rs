//! The table store contract.

use crate::column::RangeRow;
use crate::error::StoreResult;
use async_trait::async_trait;
use bytes::Bytes;
use groupdb_retry::CallContext;

/// A key-range read against one table.
///
/// Bounds are inclusive unless flagged otherwise. `limit` is applied before
/// `offset`: at most `limit` rows are selected and the first `offset` of
/// them are then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQuery {
    /// Table to scan.
    pub table: String,
    /// Columns to project.
    pub columns: Vec<String>,
    /// First key of the range.
    pub start_key: Vec<u8>,
    /// Last key of the range.
    pub end_key: Vec<u8>,
    /// Maximum number of rows to select. `None` is unbounded.
    pub limit: Option<usize>,
    /// Number of selected rows to skip.
    pub offset: usize,
    /// Whether a row at `start_key` is included.
    pub start_inclusive: bool,
    /// Whether a row at `end_key` is included.
    pub end_inclusive: bool,
    /// Return keys only, with no column values.
    pub keys_only: bool,
}

impl RangeQuery {
    /// Creates an inclusive, unbounded query over `[start_key, end_key]`.
    pub fn new(
        table: impl Into<String>,
        start_key: impl Into<Vec<u8>>,
        end_key: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            start_key: start_key.into(),
            end_key: end_key.into(),
            limit: None,
            offset: 0,
            start_inclusive: true,
            end_inclusive: true,
            keys_only: false,
        }
    }

    /// Sets the projected columns.
    #[must_use]
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the row limit.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the offset.
    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Sets bound inclusivity.
    #[must_use]
    pub fn with_inclusive(mut self, start_inclusive: bool, end_inclusive: bool) -> Self {
        self.start_inclusive = start_inclusive;
        self.end_inclusive = end_inclusive;
        self
    }

    /// Requests keys without values.
    #[must_use]
    pub fn keys_only(mut self) -> Self {
        self.keys_only = true;
        self
    }
}

/// Entity and range operations over named tables.
///
/// Absent rows are `None`, never errors. Transient store failures are
/// retried inside the implementation and surface only once the retry budget
/// is spent.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Reads `columns` of one row, in request order.
    async fn get_entity(
        &self,
        ctx: &CallContext,
        table: &str,
        row_key: &[u8],
        columns: &[&str],
    ) -> StoreResult<Option<Vec<Option<Bytes>>>>;

    /// Writes `values` to `columns` of one row as a single batch.
    async fn put_entity(
        &self,
        ctx: &CallContext,
        table: &str,
        row_key: &[u8],
        columns: &[&str],
        values: Vec<Bytes>,
    ) -> StoreResult<()>;

    /// Reads every row of a (small) table.
    async fn get_table(
        &self,
        ctx: &CallContext,
        table: &str,
        columns: &[&str],
    ) -> StoreResult<Vec<RangeRow>>;

    /// Deletes one row.
    async fn delete_row(&self, ctx: &CallContext, table: &str, row_key: &[u8]) -> StoreResult<()>;

    /// Drops a table together with its schema record.
    async fn delete_table(&self, ctx: &CallContext, table: &str) -> StoreResult<()>;

    /// Runs a key-range query.
    async fn range_query(&self, ctx: &CallContext, query: &RangeQuery)
        -> StoreResult<Vec<RangeRow>>;

    /// Returns the recorded column list of a table.
    async fn get_schema(&self, ctx: &CallContext, table: &str) -> StoreResult<Option<Vec<String>>>;
}
