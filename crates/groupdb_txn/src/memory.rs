//! In-process coordination service.

use crate::error::{TxnError, TxnResult};
use crate::service::CoordinationService;
use crate::types::TransactionId;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, info};

const RELEASE_CHANNEL_CAPACITY: usize = 256;

/// Published every time a lock is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRelease {
    /// Application the lock belonged to.
    pub app_id: String,
    /// Root key of the released entity group.
    pub root_key: Vec<u8>,
    /// Transaction that held the lock.
    pub txn: TransactionId,
}

/// A [`CoordinationService`] kept entirely in memory.
///
/// Releases are published on a broadcast channel; watchers receive them by
/// subscribing rather than through callbacks into shared state.
#[derive(Debug)]
pub struct InMemoryCoordinationService {
    counters: Mutex<HashMap<String, u64>>,
    locks: Mutex<HashMap<(String, Vec<u8>), TransactionId>>,
    releases: broadcast::Sender<LockRelease>,
    closed: AtomicBool,
}

impl Default for InMemoryCoordinationService {
    fn default() -> Self {
        let (releases, _) = broadcast::channel(RELEASE_CHANNEL_CAPACITY);
        Self {
            counters: Mutex::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
            releases,
            closed: AtomicBool::new(false),
        }
    }
}

impl InMemoryCoordinationService {
    /// Creates a service with no locks and all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to lock releases.
    pub fn subscribe(&self) -> broadcast::Receiver<LockRelease> {
        self.releases.subscribe()
    }

    /// Returns the transaction holding the lock on `root_key`, if any.
    pub fn holder(&self, app_id: &str, root_key: &[u8]) -> Option<TransactionId> {
        self.locks
            .lock()
            .get(&(app_id.to_string(), root_key.to_vec()))
            .copied()
    }

    /// Number of locks currently held.
    pub fn held_locks(&self) -> usize {
        self.locks.lock().len()
    }

    /// Stops the service. Later calls fail with
    /// [`TxnError::CoordinationUnavailable`].
    pub fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("coordination service shut down");
        }
    }

    fn ensure_open(&self) -> TxnResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TxnError::coordination_unavailable("service is shut down"));
        }
        Ok(())
    }
}

#[async_trait]
impl CoordinationService for InMemoryCoordinationService {
    async fn allocate_transaction_id(&self, app_id: &str) -> TxnResult<TransactionId> {
        self.ensure_open()?;
        let mut counters = self.counters.lock();
        let counter = counters.entry(app_id.to_string()).or_insert(0);
        *counter += 1;
        Ok(TransactionId::new(*counter))
    }

    async fn acquire_lock(
        &self,
        app_id: &str,
        root_key: &[u8],
        txn: TransactionId,
    ) -> TxnResult<bool> {
        self.ensure_open()?;
        let mut locks = self.locks.lock();
        let holder = *locks
            .entry((app_id.to_string(), root_key.to_vec()))
            .or_insert(txn);
        Ok(holder == txn)
    }

    async fn release_lock(
        &self,
        app_id: &str,
        root_key: &[u8],
        txn: TransactionId,
    ) -> TxnResult<()> {
        self.ensure_open()?;
        let key = (app_id.to_string(), root_key.to_vec());
        let released = {
            let mut locks = self.locks.lock();
            match locks.get(&key) {
                Some(holder) if *holder == txn => locks.remove(&key).is_some(),
                _ => false,
            }
        };
        if released {
            debug!(app_id, %txn, "lock released");
            // No subscribers is not an error.
            let _ = self.releases.send(LockRelease {
                app_id: key.0,
                root_key: key.1,
                txn,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ids_increase_per_app() {
        let service = InMemoryCoordinationService::new();
        let a1 = service.allocate_transaction_id("a").await.unwrap();
        let a2 = service.allocate_transaction_id("a").await.unwrap();
        let b1 = service.allocate_transaction_id("b").await.unwrap();
        assert!(a2 > a1);
        assert_eq!(b1, TransactionId::new(1));
    }

    #[tokio::test]
    async fn lock_is_exclusive_and_reentrant() {
        let service = InMemoryCoordinationService::new();
        let t1 = TransactionId::new(1);
        let t2 = TransactionId::new(2);
        assert!(service.acquire_lock("a", b"root", t1).await.unwrap());
        assert!(service.acquire_lock("a", b"root", t1).await.unwrap());
        assert!(!service.acquire_lock("a", b"root", t2).await.unwrap());
        assert!(service.acquire_lock("a", b"other", t2).await.unwrap());
        assert!(service.acquire_lock("b", b"root", t2).await.unwrap());
        assert_eq!(service.holder("a", b"root"), Some(t1));
    }

    #[tokio::test]
    async fn release_by_non_owner_is_noop() {
        let service = InMemoryCoordinationService::new();
        let t1 = TransactionId::new(1);
        service.acquire_lock("a", b"root", t1).await.unwrap();
        service
            .release_lock("a", b"root", TransactionId::new(9))
            .await
            .unwrap();
        assert_eq!(service.holder("a", b"root"), Some(t1));
    }

    #[tokio::test]
    async fn releases_are_broadcast() {
        let service = InMemoryCoordinationService::new();
        let mut releases = service.subscribe();
        let t1 = TransactionId::new(1);
        service.acquire_lock("a", b"root", t1).await.unwrap();
        service.release_lock("a", b"root", t1).await.unwrap();

        let release = releases.recv().await.unwrap();
        assert_eq!(release.root_key, b"root".to_vec());
        assert_eq!(release.txn, t1);
        assert_eq!(service.held_locks(), 0);
    }

    #[tokio::test]
    async fn shutdown_makes_service_unavailable() {
        let service = InMemoryCoordinationService::new();
        service.shutdown();
        assert!(matches!(
            service.allocate_transaction_id("a").await,
            Err(TxnError::CoordinationUnavailable(_))
        ));
    }
}
