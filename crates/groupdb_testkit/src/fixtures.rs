//! Test fixtures for stores, coordinators and entity writes.

use bytes::Bytes;
use groupdb_codec::key::entity_row_key;
use groupdb_codec::{Path, Value};
use groupdb_index::{index_rows_for, IndexRow};
use groupdb_retry::{Backoff, CallContext, RetryPolicy};
use groupdb_store::{
    ColumnStore, ColumnTableStore, InMemoryColumnStore, StoreConfig, StoreResult, TableStore,
    INDEX_TABLE,
};
use groupdb_txn::{
    CoordinationService, CoordinatorConfig, EntityGroupCoordinator, EntityWrite,
    InMemoryCoordinationService, NON_TRANSACTIONAL_MARKER,
};
use std::sync::Arc;
use std::time::Duration;

/// Application id used by the fixtures.
pub const TEST_APP: &str = "test-app";

/// Namespace used by the fixtures.
pub const TEST_NAMESPACE: &str = "";

/// A table store over a fresh in-memory column store, without retries.
pub fn memory_table_store() -> Arc<ColumnTableStore<InMemoryColumnStore>> {
    table_store_over(Arc::new(InMemoryColumnStore::new()))
}

/// A table store over `store`, without retries.
pub fn table_store_over<S: ColumnStore + ?Sized>(store: Arc<S>) -> Arc<ColumnTableStore<S>> {
    Arc::new(ColumnTableStore::new(store, StoreConfig::no_retry()))
}

/// A retry policy that sleeps `step` between attempts, without jitter.
pub fn fixed_retry(step: Duration, max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries)
        .with_backoff(Backoff::Quadratic { unit: step })
        .with_backoff_threshold(step)
        .with_retrying_timeout(None)
        .with_jitter(false)
}

/// A coordinator configuration with millisecond retries.
pub fn fast_coordinator_config() -> CoordinatorConfig {
    let quick = fixed_retry(Duration::from_millis(1), 3);
    CoordinatorConfig::new()
        .with_txn_id_retry(quick.clone())
        .with_lock_retry(fixed_retry(Duration::from_millis(1), 5))
        .with_release_retry(quick.clone())
        .with_non_transactional_retry(quick)
}

/// Coordinator over `store` and `service` with [`fast_coordinator_config`].
pub fn coordinator_over<T, C>(store: Arc<T>, service: Arc<C>) -> EntityGroupCoordinator<T, C>
where
    T: TableStore + ?Sized,
    C: CoordinationService + ?Sized + 'static,
{
    EntityGroupCoordinator::new(store, service, fast_coordinator_config())
}

/// Coordinator over fresh in-memory backends.
pub fn memory_coordinator(
) -> EntityGroupCoordinator<ColumnTableStore<InMemoryColumnStore>, InMemoryCoordinationService> {
    coordinator_over(
        memory_table_store(),
        Arc::new(InMemoryCoordinationService::new()),
    )
}

/// The path of entity `kind`/`id` inside entity group `group`.
pub fn group_member(group: &str, kind: &str, id: u64) -> Path {
    Path::new().child("Group", group).child(kind, id)
}

/// Name of the pull-queue table for `tag`. Such tables bypass locking.
pub fn pull_queue_table(tag: &str) -> String {
    format!("pull_queue{NON_TRANSACTIONAL_MARKER}{tag}")
}

/// The row key of `path` under the fixture app and namespace.
///
/// # Panics
///
/// Panics if `path` is the root path.
pub fn row_key(path: &Path) -> Vec<u8> {
    entity_row_key(TEST_APP, TEST_NAMESPACE, path).expect("fixture path must not be root")
}

/// Index rows for `path` with one text property.
///
/// # Panics
///
/// Panics if `path` is the root path.
pub fn text_index_rows(path: &Path, property: &str, text: &str) -> Vec<IndexRow> {
    index_rows_for(TEST_APP, TEST_NAMESPACE, path, &[(property, Value::from(text))])
        .expect("fixture path must be indexable")
}

/// A write of one text column, indexed under the same name.
pub fn text_write(table: &str, path: &Path, column: &str, text: &str) -> EntityWrite {
    EntityWrite::new(table, row_key(path))
        .with_column(column, Bytes::copy_from_slice(text.as_bytes()))
        .with_index_rows(text_index_rows(path, column, text))
}

/// Writes index rows for `kind`/`name` entities, all with `property = value`.
pub async fn index_named<T: TableStore + ?Sized>(
    store: &T,
    kind: &str,
    names: &[&str],
    property: &str,
    value: &Value,
) -> StoreResult<Vec<Path>> {
    let ctx = CallContext::new();
    let mut paths = Vec::with_capacity(names.len());
    for name in names {
        let path = Path::new().child(kind, *name);
        let rows = index_rows_for(TEST_APP, TEST_NAMESPACE, &path, &[(property, value.clone())])
            .map_err(|e| groupdb_store::StoreError::invalid_request(e.to_string()))?;
        for row in rows {
            let (columns, values) = row.cells();
            store
                .put_entity(&ctx, INDEX_TABLE, &row.key, &columns, values)
                .await?;
        }
        paths.push(path);
    }
    Ok(paths)
}
