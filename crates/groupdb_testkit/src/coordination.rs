//! A coordination service that injects failures.

use async_trait::async_trait;
use groupdb_txn::{CoordinationService, TransactionId, TxnError, TxnResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Wraps a [`CoordinationService`] and fails selected calls with
/// [`TxnError::CoordinationUnavailable`].
///
/// Each operation has its own failure budget. With
/// [`FlakyCoordinationService::lose_acquire_replies`] set, acquisitions are
/// forwarded and granted but reported as failed, the way a lost reply looks
/// to the caller.
pub struct FlakyCoordinationService<C: CoordinationService + ?Sized> {
    inner: Arc<C>,
    allocate_failures: AtomicUsize,
    acquire_failures: AtomicUsize,
    release_failures: AtomicUsize,
    lose_acquire_replies: AtomicBool,
    acquire_calls: AtomicUsize,
    release_calls: AtomicUsize,
}

impl<C: CoordinationService + ?Sized> FlakyCoordinationService<C> {
    /// Wraps `inner` with no failures configured.
    pub fn new(inner: Arc<C>) -> Self {
        Self {
            inner,
            allocate_failures: AtomicUsize::new(0),
            acquire_failures: AtomicUsize::new(0),
            release_failures: AtomicUsize::new(0),
            lose_acquire_replies: AtomicBool::new(false),
            acquire_calls: AtomicUsize::new(0),
            release_calls: AtomicUsize::new(0),
        }
    }

    /// Returns the wrapped service.
    pub fn inner(&self) -> &Arc<C> {
        &self.inner
    }

    /// Fails the next `n` transaction id allocations.
    pub fn fail_allocations(&self, n: usize) {
        self.allocate_failures.store(n, Ordering::SeqCst);
    }

    /// Fails the next `n` lock acquisitions without forwarding them.
    pub fn fail_acquisitions(&self, n: usize) {
        self.acquire_failures.store(n, Ordering::SeqCst);
    }

    /// Fails the next `n` lock releases without forwarding them.
    pub fn fail_releases(&self, n: usize) {
        self.release_failures.store(n, Ordering::SeqCst);
    }

    /// Forwards acquisitions but reports every one of them as failed.
    pub fn lose_acquire_replies(&self, lose: bool) {
        self.lose_acquire_replies.store(lose, Ordering::SeqCst);
    }

    /// Number of acquire calls seen.
    pub fn acquire_calls(&self) -> usize {
        self.acquire_calls.load(Ordering::SeqCst)
    }

    /// Number of release calls seen.
    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }
}

fn take_failure(budget: &AtomicUsize, operation: &str) -> TxnResult<()> {
    if budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
        .is_ok()
    {
        return Err(TxnError::coordination_unavailable(format!(
            "injected failure in {operation}"
        )));
    }
    Ok(())
}

#[async_trait]
impl<C: CoordinationService + ?Sized> CoordinationService for FlakyCoordinationService<C> {
    async fn allocate_transaction_id(&self, app_id: &str) -> TxnResult<TransactionId> {
        take_failure(&self.allocate_failures, "allocate_transaction_id")?;
        self.inner.allocate_transaction_id(app_id).await
    }

    async fn acquire_lock(
        &self,
        app_id: &str,
        root_key: &[u8],
        txn: TransactionId,
    ) -> TxnResult<bool> {
        self.acquire_calls.fetch_add(1, Ordering::SeqCst);
        take_failure(&self.acquire_failures, "acquire_lock")?;
        let granted = self.inner.acquire_lock(app_id, root_key, txn).await?;
        if self.lose_acquire_replies.load(Ordering::SeqCst) {
            return Err(TxnError::coordination_unavailable("acquire reply lost"));
        }
        Ok(granted)
    }

    async fn release_lock(
        &self,
        app_id: &str,
        root_key: &[u8],
        txn: TransactionId,
    ) -> TxnResult<()> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        take_failure(&self.release_failures, "release_lock")?;
        self.inner.release_lock(app_id, root_key, txn).await
    }
}
