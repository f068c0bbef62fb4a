//! Table store backed by a [`ColumnStore`].

use crate::column::{ColumnStore, RangeRow};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::schema::{decode_schema, encode_schema, is_system_table, SCHEMA_COLUMN, SCHEMA_TABLE};
use crate::table::{RangeQuery, TableStore};
use async_trait::async_trait;
use bytes::Bytes;
use groupdb_retry::CallContext;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A [`TableStore`] over any [`ColumnStore`].
///
/// Every store call goes through the configured operation retry policy.
/// Schema records are cached after the first read; the cache is dropped
/// together with the table by [`TableStore::delete_table`].
pub struct ColumnTableStore<S: ColumnStore + ?Sized> {
    store: Arc<S>,
    config: StoreConfig,
    schemas: RwLock<HashMap<String, Vec<String>>>,
    closed: AtomicBool,
}

impl<S: ColumnStore + ?Sized> ColumnTableStore<S> {
    /// Wraps `store` without checking that it is reachable.
    pub fn new(store: Arc<S>, config: StoreConfig) -> Self {
        Self {
            store,
            config,
            schemas: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Wraps `store` once it answers a ping.
    ///
    /// # Errors
    ///
    /// Returns the last connectivity error once the connect retry budget is
    /// spent, or the interruption if `ctx` ends first.
    pub async fn connect(store: Arc<S>, config: StoreConfig, ctx: &CallContext) -> StoreResult<Self> {
        if let Err(error) = config
            .connect_retry
            .run_retryable(ctx, "connect", || store.ping())
            .await
        {
            warn!(error = %error, "column store unreachable");
            return Err(error);
        }
        info!("connected to column store");
        Ok(Self::new(store, config))
    }

    /// Closes the client. Every later call fails with [`StoreError::Closed`].
    pub fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("table store shut down");
        }
    }

    /// Returns true after [`Self::shutdown`].
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Returns the underlying column store.
    pub fn column_store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    async fn call<T, F, Fut>(&self, ctx: &CallContext, operation: &str, f: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = StoreResult<T>> + Send,
        T: Send,
    {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        self.config
            .operation_retry
            .run_retryable(ctx, operation, f)
            .await
    }

    async fn load_schema(&self, ctx: &CallContext, table: &str) -> StoreResult<Option<Vec<String>>> {
        let cached = self.schemas.read().get(table).cloned();
        if cached.is_some() {
            return Ok(cached);
        }
        let row = self
            .call(ctx, "get_schema", || {
                self.store
                    .get(SCHEMA_TABLE, table.as_bytes(), &[SCHEMA_COLUMN])
            })
            .await?;
        let Some(Some(encoded)) = row.and_then(|values| values.into_iter().next()) else {
            return Ok(None);
        };
        let columns = decode_schema(&encoded)?;
        self.schemas
            .write()
            .insert(table.to_string(), columns.clone());
        Ok(Some(columns))
    }

    /// Writes the schema record the first time `table` is written.
    async fn ensure_schema(&self, ctx: &CallContext, table: &str, columns: &[&str]) -> StoreResult<()> {
        if is_system_table(table) || self.load_schema(ctx, table).await?.is_some() {
            return Ok(());
        }
        let encoded = Bytes::from(encode_schema(columns));
        self.call(ctx, "put_schema", || {
            self.store.put(
                SCHEMA_TABLE,
                table.as_bytes(),
                vec![(SCHEMA_COLUMN.to_string(), encoded.clone())],
            )
        })
        .await?;
        debug!(table, columns = columns.len(), "recorded table schema");
        self.schemas.write().insert(
            table.to_string(),
            columns.iter().map(|c| (*c).to_string()).collect(),
        );
        Ok(())
    }
}

fn check_table(table: &str) -> StoreResult<()> {
    if table.is_empty() {
        return Err(StoreError::invalid_request("empty table name"));
    }
    Ok(())
}

fn check_row_key(row_key: &[u8]) -> StoreResult<()> {
    if row_key.is_empty() {
        return Err(StoreError::invalid_request("empty row key"));
    }
    Ok(())
}

#[async_trait]
impl<S: ColumnStore + ?Sized> TableStore for ColumnTableStore<S> {
    async fn get_entity(
        &self,
        ctx: &CallContext,
        table: &str,
        row_key: &[u8],
        columns: &[&str],
    ) -> StoreResult<Option<Vec<Option<Bytes>>>> {
        check_table(table)?;
        check_row_key(row_key)?;
        self.call(ctx, "get_entity", || self.store.get(table, row_key, columns))
            .await
    }

    async fn put_entity(
        &self,
        ctx: &CallContext,
        table: &str,
        row_key: &[u8],
        columns: &[&str],
        values: Vec<Bytes>,
    ) -> StoreResult<()> {
        check_table(table)?;
        check_row_key(row_key)?;
        if columns.is_empty() {
            return Err(StoreError::invalid_request("no columns to write"));
        }
        if columns.len() != values.len() {
            return Err(StoreError::invalid_request(format!(
                "{} columns but {} values",
                columns.len(),
                values.len()
            )));
        }

        self.ensure_schema(ctx, table, columns).await?;

        let cells: Vec<(String, Bytes)> = columns
            .iter()
            .map(|c| (*c).to_string())
            .zip(values)
            .collect();
        self.call(ctx, "put_entity", || {
            self.store.put(table, row_key, cells.clone())
        })
        .await
    }

    async fn get_table(
        &self,
        ctx: &CallContext,
        table: &str,
        columns: &[&str],
    ) -> StoreResult<Vec<RangeRow>> {
        check_table(table)?;
        self.call(ctx, "get_table", || self.store.scan_table(table, columns))
            .await
    }

    async fn delete_row(&self, ctx: &CallContext, table: &str, row_key: &[u8]) -> StoreResult<()> {
        check_table(table)?;
        check_row_key(row_key)?;
        self.call(ctx, "delete_row", || self.store.delete(table, row_key))
            .await
    }

    async fn delete_table(&self, ctx: &CallContext, table: &str) -> StoreResult<()> {
        check_table(table)?;
        self.call(ctx, "drop_table", || self.store.drop_table(table))
            .await?;
        self.call(ctx, "delete_schema", || {
            self.store.delete(SCHEMA_TABLE, table.as_bytes())
        })
        .await?;
        self.schemas.write().remove(table);
        info!(table, "dropped table");
        Ok(())
    }

    async fn range_query(&self, ctx: &CallContext, query: &RangeQuery) -> StoreResult<Vec<RangeRow>> {
        check_table(&query.table)?;
        if query.end_key < query.start_key {
            return Err(StoreError::invalid_request("range end sorts before start"));
        }

        let columns: Vec<&str> = if query.keys_only {
            Vec::new()
        } else {
            query.columns.iter().map(String::as_str).collect()
        };
        // The native scan is inclusive: fetch one spare row per excluded bound.
        let spare = usize::from(!query.start_inclusive) + usize::from(!query.end_inclusive);
        let fetch = query.limit.map_or(usize::MAX, |limit| limit.saturating_add(spare));

        let mut rows = self
            .call(ctx, "range_query", || {
                self.store.scan(
                    &query.table,
                    &columns,
                    &query.start_key,
                    &query.end_key,
                    fetch,
                )
            })
            .await?;
        let fetched = rows.len();

        if !query.start_inclusive && rows.first().is_some_and(|row| row.key == query.start_key) {
            rows.remove(0);
        }
        if !query.end_inclusive && rows.last().is_some_and(|row| row.key == query.end_key) {
            rows.pop();
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        let rows: Vec<RangeRow> = rows.into_iter().skip(query.offset).collect();

        debug!(
            table = %query.table,
            fetched,
            returned = rows.len(),
            "range query"
        );
        Ok(rows)
    }

    async fn get_schema(&self, ctx: &CallContext, table: &str) -> StoreResult<Option<Vec<String>>> {
        check_table(table)?;
        self.load_schema(ctx, table).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryColumnStore;
    use groupdb_retry::{Interrupted, RetryPolicy};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn b(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    fn store() -> ColumnTableStore<InMemoryColumnStore> {
        ColumnTableStore::new(Arc::new(InMemoryColumnStore::new()), StoreConfig::no_retry())
    }

    /// Refuses the first `failures` pings, then behaves like an empty store.
    #[derive(Default)]
    struct SlowStart {
        failures: usize,
        pings: AtomicUsize,
        inner: InMemoryColumnStore,
    }

    #[async_trait]
    impl ColumnStore for SlowStart {
        async fn ping(&self) -> StoreResult<()> {
            if self.pings.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(StoreError::unavailable("connection refused"));
            }
            Ok(())
        }
        async fn get(
            &self,
            table: &str,
            key: &[u8],
            columns: &[&str],
        ) -> StoreResult<Option<Vec<Option<Bytes>>>> {
            self.inner.get(table, key, columns).await
        }
        async fn put(&self, table: &str, key: &[u8], cells: Vec<(String, Bytes)>) -> StoreResult<()> {
            self.inner.put(table, key, cells).await
        }
        async fn delete(&self, table: &str, key: &[u8]) -> StoreResult<()> {
            self.inner.delete(table, key).await
        }
        async fn drop_table(&self, table: &str) -> StoreResult<()> {
            self.inner.drop_table(table).await
        }
        async fn scan(
            &self,
            table: &str,
            columns: &[&str],
            start: &[u8],
            end: &[u8],
            limit: usize,
        ) -> StoreResult<Vec<RangeRow>> {
            self.inner.scan(table, columns, start, end, limit).await
        }
        async fn scan_table(&self, table: &str, columns: &[&str]) -> StoreResult<Vec<RangeRow>> {
            self.inner.scan_table(table, columns).await
        }
    }

    #[tokio::test]
    async fn put_then_get_in_request_order() {
        let store = store();
        let ctx = CallContext::new();
        store
            .put_entity(&ctx, "users", b"u1", &["name", "email"], vec![b("ann"), b("a@x")])
            .await
            .unwrap();

        let row = store
            .get_entity(&ctx, "users", b"u1", &["email", "missing", "name"])
            .await
            .unwrap();
        assert_eq!(row, Some(vec![Some(b("a@x")), None, Some(b("ann"))]));
        assert_eq!(store.get_entity(&ctx, "users", b"u2", &["name"]).await.unwrap(), None);
    }

    #[tokio::test]
    async fn omitted_columns_are_untouched() {
        let store = store();
        let ctx = CallContext::new();
        store
            .put_entity(&ctx, "t", b"k", &["a", "b"], vec![b("1"), b("2")])
            .await
            .unwrap();
        store.put_entity(&ctx, "t", b"k", &["b"], vec![b("3")]).await.unwrap();
        let row = store.get_entity(&ctx, "t", b"k", &["a", "b"]).await.unwrap();
        assert_eq!(row, Some(vec![Some(b("1")), Some(b("3"))]));
    }

    #[tokio::test]
    async fn first_write_records_schema_once() {
        let store = store();
        let ctx = CallContext::new();
        store
            .put_entity(&ctx, "users", b"u1", &["name", "email"], vec![b("a"), b("b")])
            .await
            .unwrap();
        store
            .put_entity(&ctx, "users", b"u2", &["other"], vec![b("c")])
            .await
            .unwrap();

        assert_eq!(
            store.get_schema(&ctx, "users").await.unwrap(),
            Some(vec!["name".to_string(), "email".to_string()])
        );

        // A fresh client reads the stored record rather than its cache.
        let fresh = ColumnTableStore::new(Arc::clone(store.column_store()), StoreConfig::no_retry());
        assert_eq!(
            fresh.get_schema(&ctx, "users").await.unwrap(),
            Some(vec!["name".to_string(), "email".to_string()])
        );
        assert_eq!(fresh.get_schema(&ctx, "nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn system_tables_get_no_schema_record() {
        let store = store();
        let ctx = CallContext::new();
        store
            .put_entity(&ctx, crate::INDEX_TABLE, b"k", &["reference"], vec![b("r")])
            .await
            .unwrap();
        assert_eq!(store.column_store().row_count(SCHEMA_TABLE), 0);
    }

    #[tokio::test]
    async fn invalid_requests_fail_fast() {
        let store = store();
        let ctx = CallContext::new();
        let mismatch = store
            .put_entity(&ctx, "t", b"k", &["a", "b"], vec![b("1")])
            .await
            .unwrap_err();
        assert!(matches!(mismatch, StoreError::InvalidRequest(_)));
        assert!(matches!(
            store.get_entity(&ctx, "", b"k", &["a"]).await,
            Err(StoreError::InvalidRequest(_))
        ));
        assert!(matches!(
            store.get_entity(&ctx, "t", b"", &["a"]).await,
            Err(StoreError::InvalidRequest(_))
        ));
        let inverted = RangeQuery::new("t", b"z".to_vec(), b"a".to_vec());
        assert!(matches!(
            store.range_query(&ctx, &inverted).await,
            Err(StoreError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn delete_table_drops_rows_and_schema() {
        let store = store();
        let ctx = CallContext::new();
        store.put_entity(&ctx, "t", b"k", &["a"], vec![b("1")]).await.unwrap();
        store.delete_table(&ctx, "t").await.unwrap();

        assert_eq!(store.get_entity(&ctx, "t", b"k", &["a"]).await.unwrap(), None);
        assert_eq!(store.get_schema(&ctx, "t").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_row_removes_entity() {
        let store = store();
        let ctx = CallContext::new();
        store.put_entity(&ctx, "t", b"k", &["a"], vec![b("1")]).await.unwrap();
        store.delete_row(&ctx, "t", b"k").await.unwrap();
        assert_eq!(store.get_entity(&ctx, "t", b"k", &["a"]).await.unwrap(), None);
        assert!(store.get_table(&ctx, "t", &["a"]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn shutdown_closes_client() {
        let store = store();
        let ctx = CallContext::new();
        store.shutdown();
        assert!(store.is_closed());
        assert_eq!(
            store.get_entity(&ctx, "t", b"k", &["a"]).await,
            Err(StoreError::Closed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn connect_retries_until_ping_succeeds() {
        let inner = Arc::new(SlowStart {
            failures: 2,
            ..SlowStart::default()
        });
        let config = StoreConfig::no_retry().with_connect_retry(
            RetryPolicy::new(3).with_backoff_threshold(Duration::from_millis(10)),
        );
        let ctx = CallContext::new();
        let store = ColumnTableStore::connect(Arc::clone(&inner), config, &ctx)
            .await
            .unwrap();
        assert!(!store.is_closed());
        assert_eq!(inner.pings.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_gives_up_after_budget() {
        let inner = Arc::new(SlowStart {
            failures: usize::MAX,
            ..SlowStart::default()
        });
        let config = StoreConfig::no_retry().with_connect_retry(
            RetryPolicy::new(2).with_backoff_threshold(Duration::from_millis(10)),
        );
        let ctx = CallContext::new();
        let result = ColumnTableStore::connect(Arc::clone(&inner), config, &ctx).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(inner.pings.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cancelled_context_interrupts_calls() {
        let store = store();
        let ctx = CallContext::new();
        ctx.cancel();
        assert_eq!(
            store.get_entity(&ctx, "t", b"k", &["a"]).await,
            Err(StoreError::Interrupted(Interrupted::Cancelled))
        );
    }
}
