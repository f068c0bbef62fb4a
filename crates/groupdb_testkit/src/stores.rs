//! Column stores that record, delay or fail calls.
//!
//! Both wrap another [`ColumnStore`] and forward to it.

use async_trait::async_trait;
use bytes::Bytes;
use groupdb_store::{ColumnStore, RangeRow, StoreError, StoreResult};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One call seen by a [`RecordingColumnStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    /// Column store method name.
    pub method: &'static str,
    /// Table the call addressed.
    pub table: String,
    /// Row key for single-row calls, scan start for scans.
    pub key: Option<Vec<u8>>,
}

/// Records every call and suspends for `delay` before forwarding it.
///
/// The suspension is a tokio sleep, so concurrent callers interleave at
/// every store call. Under paused test time it costs nothing.
pub struct RecordingColumnStore<S: ColumnStore + ?Sized> {
    inner: Arc<S>,
    delay: Duration,
    calls: Mutex<Vec<StoreCall>>,
}

impl<S: ColumnStore + ?Sized> RecordingColumnStore<S> {
    /// Wraps `inner`, suspending each call for `delay`.
    pub fn new(inner: Arc<S>, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &Arc<S> {
        &self.inner
    }

    /// Returns a copy of the call log in call order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    /// Returns the logged calls of one method.
    pub fn calls_to(&self, method: &str) -> Vec<StoreCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.method == method)
            .cloned()
            .collect()
    }

    /// Clears the call log.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    async fn enter(&self, method: &'static str, table: &str, key: Option<&[u8]>) {
        self.calls.lock().push(StoreCall {
            method,
            table: table.to_string(),
            key: key.map(<[u8]>::to_vec),
        });
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl<S: ColumnStore + ?Sized> ColumnStore for RecordingColumnStore<S> {
    async fn ping(&self) -> StoreResult<()> {
        self.enter("ping", "", None).await;
        self.inner.ping().await
    }

    async fn get(
        &self,
        table: &str,
        key: &[u8],
        columns: &[&str],
    ) -> StoreResult<Option<Vec<Option<Bytes>>>> {
        self.enter("get", table, Some(key)).await;
        self.inner.get(table, key, columns).await
    }

    async fn put(&self, table: &str, key: &[u8], cells: Vec<(String, Bytes)>) -> StoreResult<()> {
        self.enter("put", table, Some(key)).await;
        self.inner.put(table, key, cells).await
    }

    async fn delete(&self, table: &str, key: &[u8]) -> StoreResult<()> {
        self.enter("delete", table, Some(key)).await;
        self.inner.delete(table, key).await
    }

    async fn drop_table(&self, table: &str) -> StoreResult<()> {
        self.enter("drop_table", table, None).await;
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
        self.enter("scan", table, Some(start)).await;
        self.inner.scan(table, columns, start, end, limit).await
    }

    async fn scan_table(&self, table: &str, columns: &[&str]) -> StoreResult<Vec<RangeRow>> {
        self.enter("scan_table", table, None).await;
        self.inner.scan_table(table, columns).await
    }
}

/// Fails the next N calls with [`StoreError::Unavailable`], then forwards.
pub struct FlakyColumnStore<S: ColumnStore + ?Sized> {
    inner: Arc<S>,
    failures_left: AtomicUsize,
    attempts: AtomicUsize,
}

impl<S: ColumnStore + ?Sized> FlakyColumnStore<S> {
    /// Wraps `inner`, failing the first `failures` calls.
    pub fn new(inner: Arc<S>, failures: usize) -> Self {
        Self {
            inner,
            failures_left: AtomicUsize::new(failures),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &Arc<S> {
        &self.inner
    }

    /// Fails the next `failures` calls, replacing any pending failures.
    pub fn fail_next(&self, failures: usize) {
        self.failures_left.store(failures, Ordering::SeqCst);
    }

    /// Number of calls made so far, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Number of injected failures still pending.
    pub fn failures_left(&self) -> usize {
        self.failures_left.load(Ordering::SeqCst)
    }

    fn enter(&self, method: &str) -> StoreResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::unavailable(format!("injected failure in {method}")));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: ColumnStore + ?Sized> ColumnStore for FlakyColumnStore<S> {
    async fn ping(&self) -> StoreResult<()> {
        self.enter("ping")?;
        self.inner.ping().await
    }

    async fn get(
        &self,
        table: &str,
        key: &[u8],
        columns: &[&str],
    ) -> StoreResult<Option<Vec<Option<Bytes>>>> {
        self.enter("get")?;
        self.inner.get(table, key, columns).await
    }

    async fn put(&self, table: &str, key: &[u8], cells: Vec<(String, Bytes)>) -> StoreResult<()> {
        self.enter("put")?;
        self.inner.put(table, key, cells).await
    }

    async fn delete(&self, table: &str, key: &[u8]) -> StoreResult<()> {
        self.enter("delete")?;
        self.inner.delete(table, key).await
    }

    async fn drop_table(&self, table: &str) -> StoreResult<()> {
        self.enter("drop_table")?;
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
        self.enter("scan")?;
        self.inner.scan(table, columns, start, end, limit).await
    }

    async fn scan_table(&self, table: &str, columns: &[&str]) -> StoreResult<Vec<RangeRow>> {
        self.enter("scan_table")?;
        self.inner.scan_table(table, columns).await
    }
}
