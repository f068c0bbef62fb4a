//! Coordinated entity writes.

use crate::config::CoordinatorConfig;
use crate::error::{TxnError, TxnResult};
use crate::guard::LockGuard;
use crate::service::CoordinationService;
use crate::types::{EntityWrite, TransactionId, WriteOutcome, WriteReport};
use groupdb_codec::key::{app_id_of, root_key_of};
use groupdb_retry::{CallContext, Retryable};
use groupdb_store::{TableStore, INDEX_TABLE};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs entity writes under entity-group locks.
///
/// A transactional write allocates a transaction id, takes the lock on the
/// entity group's root key, performs its reads and writes and releases the
/// lock on every exit path. Writes to tables that the [`crate::LockPolicy`]
/// exempts go straight to the table store.
///
/// Writes to different entity groups run in parallel; writes to the same
/// group are serialized by the coordination service alone.
pub struct EntityGroupCoordinator<T, C>
where
    T: TableStore + ?Sized,
    C: CoordinationService + ?Sized + 'static,
{
    store: Arc<T>,
    service: Arc<C>,
    config: CoordinatorConfig,
}

impl<T, C> EntityGroupCoordinator<T, C>
where
    T: TableStore + ?Sized,
    C: CoordinationService + ?Sized + 'static,
{
    /// Creates a new coordinator.
    pub fn new(store: Arc<T>, service: Arc<C>, config: CoordinatorConfig) -> Self {
        Self {
            store,
            service,
            config,
        }
    }

    /// Returns the table store.
    pub fn store(&self) -> &Arc<T> {
        &self.store
    }

    /// Returns the coordination service.
    pub fn service(&self) -> &Arc<C> {
        &self.service
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Writes an entity and its index rows.
    ///
    /// If the target row already holds a value for any of the requested
    /// columns, nothing is written and the outcome is
    /// [`WriteOutcome::Skipped`].
    ///
    /// # Errors
    ///
    /// Returns [`TxnError::LockUnavailable`] when the lock stays held past
    /// the lock retry budget, and store or coordination errors that outlived
    /// their retry policies. The lock is released before any error returns.
    pub async fn put_entity(&self, ctx: &CallContext, write: EntityWrite) -> TxnResult<WriteReport> {
        validate(&write)?;

        if !self.config.lock_policy.is_transactional(&write.table) {
            self.put_unlocked(ctx, &write).await?;
            return Ok(WriteReport::new(WriteOutcome::Written, None));
        }

        let root_key = root_key_of(&write.row_key)?;
        let app_id = app_id_of(&write.row_key)?;
        let write = &write;
        let (outcome, txn) = self
            .with_entity_group(ctx, app_id, &root_key, |txn| self.put_locked(ctx, write, txn))
            .await?;
        Ok(WriteReport::new(outcome, Some(txn)))
    }

    /// Deletes an entity row and the given index rows.
    pub async fn delete_entity(
        &self,
        ctx: &CallContext,
        table: &str,
        row_key: &[u8],
        index_keys: &[Vec<u8>],
    ) -> TxnResult<WriteReport> {
        if table.is_empty() || row_key.is_empty() {
            return Err(TxnError::invalid_request("table and row key are required"));
        }

        if !self.config.lock_policy.is_transactional(table) {
            self.config
                .non_transactional_retry
                .run(ctx, "delete_non_transactional", is_transient, || {
                    self.delete_rows(ctx, table, row_key, index_keys)
                })
                .await?;
            return Ok(WriteReport::new(WriteOutcome::Deleted, None));
        }

        let root_key = root_key_of(row_key)?;
        let app_id = app_id_of(row_key)?;
        let ((), txn) = self
            .with_entity_group(ctx, app_id, &root_key, |_| {
                self.delete_rows(ctx, table, row_key, index_keys)
            })
            .await?;
        Ok(WriteReport::new(WriteOutcome::Deleted, Some(txn)))
    }

    /// Runs `work` while holding the lock on `root_key`.
    ///
    /// The lock is released after `work` finishes, whether it succeeded or
    /// failed. If acquisition itself fails, a release is still sent in case
    /// the service granted the lock without reporting it. If the returned
    /// future is dropped, or `work` panics, the release is spawned on the
    /// runtime instead.
    pub async fn with_entity_group<F, Fut, R>(
        &self,
        ctx: &CallContext,
        app_id: &str,
        root_key: &[u8],
        work: F,
    ) -> TxnResult<(R, TransactionId)>
    where
        F: FnOnce(TransactionId) -> Fut,
        Fut: Future<Output = TxnResult<R>>,
    {
        let txn = self.allocate(ctx, app_id).await?;
        let mut guard = LockGuard::new(
            Arc::clone(&self.service),
            self.config.release_retry.clone(),
            app_id,
            root_key,
            txn,
        );

        if let Err(error) = self.acquire(ctx, app_id, root_key, txn).await {
            warn!(app_id, %txn, error = %error, "could not acquire entity group lock");
            self.release(app_id, root_key, txn).await;
            guard.disarm();
            return Err(error);
        }
        debug!(app_id, %txn, "entity group locked");

        let result = work(txn).await;

        self.release(app_id, root_key, txn).await;
        guard.disarm();

        result.map(|value| (value, txn))
    }

    async fn allocate(&self, ctx: &CallContext, app_id: &str) -> TxnResult<TransactionId> {
        self.config
            .txn_id_retry
            .run_retryable(ctx, "allocate_transaction_id", || {
                self.service.allocate_transaction_id(app_id)
            })
            .await
    }

    async fn acquire(
        &self,
        ctx: &CallContext,
        app_id: &str,
        root_key: &[u8],
        txn: TransactionId,
    ) -> TxnResult<()> {
        let service = &self.service;
        self.config
            .lock_retry
            .run_retryable(ctx, "acquire_lock", move || async move {
                if service.acquire_lock(app_id, root_key, txn).await? {
                    Ok(())
                } else {
                    Err(TxnError::lock_unavailable(format!("entity group held, {txn} waiting")))
                }
            })
            .await
    }

    /// Releases on a detached context: the request may already be cancelled.
    async fn release(&self, app_id: &str, root_key: &[u8], txn: TransactionId) {
        let detached = CallContext::new();
        let result = self
            .config
            .release_retry
            .run_retryable(&detached, "release_lock", || {
                self.service.release_lock(app_id, root_key, txn)
            })
            .await;
        match result {
            Ok(()) => debug!(app_id, %txn, "entity group unlocked"),
            Err(error) => warn!(app_id, %txn, error = %error, "failed to release entity group lock"),
        }
    }

    async fn put_locked(
        &self,
        ctx: &CallContext,
        write: &EntityWrite,
        txn: TransactionId,
    ) -> TxnResult<WriteOutcome> {
        let columns = column_refs(write);
        let existing = self
            .store
            .get_entity(ctx, &write.table, &write.row_key, &columns)
            .await?;
        if existing.is_some_and(|values| values.iter().any(Option::is_some)) {
            info!(table = %write.table, %txn, "entity already present, skipping write");
            return Ok(WriteOutcome::Skipped);
        }
        self.write_rows(ctx, write).await?;
        Ok(WriteOutcome::Written)
    }

    /// Nests outside the table store's own retries.
    async fn put_unlocked(&self, ctx: &CallContext, write: &EntityWrite) -> TxnResult<()> {
        self.config
            .non_transactional_retry
            .run(ctx, "put_non_transactional", is_transient, || {
                self.write_rows(ctx, write)
            })
            .await
    }

    async fn write_rows(&self, ctx: &CallContext, write: &EntityWrite) -> TxnResult<()> {
        let columns = column_refs(write);
        self.store
            .put_entity(ctx, &write.table, &write.row_key, &columns, write.values.clone())
            .await?;
        for row in &write.index_rows {
            let (columns, values) = row.cells();
            self.store
                .put_entity(ctx, INDEX_TABLE, &row.key, &columns, values)
                .await?;
        }
        Ok(())
    }

    async fn delete_rows(
        &self,
        ctx: &CallContext,
        table: &str,
        row_key: &[u8],
        index_keys: &[Vec<u8>],
    ) -> TxnResult<()> {
        self.store.delete_row(ctx, table, row_key).await?;
        for key in index_keys {
            self.store.delete_row(ctx, INDEX_TABLE, key).await?;
        }
        Ok(())
    }
}

fn is_transient(error: &TxnError) -> bool {
    matches!(error, TxnError::Store(e) if e.is_retryable())
}

fn column_refs(write: &EntityWrite) -> Vec<&str> {
    write.columns.iter().map(String::as_str).collect()
}

fn validate(write: &EntityWrite) -> TxnResult<()> {
    if write.table.is_empty() || write.row_key.is_empty() {
        return Err(TxnError::invalid_request("table and row key are required"));
    }
    if write.columns.is_empty() || write.columns.len() != write.values.len() {
        return Err(TxnError::invalid_request(format!(
            "{} columns but {} values",
            write.columns.len(),
            write.values.len()
        )));
    }
    Ok(())
}
