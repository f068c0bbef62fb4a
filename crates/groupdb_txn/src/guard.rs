//! Drop fallback for held entity-group locks.

use crate::service::CoordinationService;
use crate::types::TransactionId;
use groupdb_retry::{CallContext, RetryPolicy};
use std::sync::Arc;
use tracing::{debug, warn};

/// Owns an acquired lock until it is explicitly released.
///
/// If the guard is dropped while still armed (the work future was dropped
/// or panicked), the release is spawned onto the current tokio runtime and
/// retried under `policy` on a detached context.
pub(crate) struct LockGuard<C: CoordinationService + ?Sized + 'static> {
    service: Arc<C>,
    policy: RetryPolicy,
    app_id: String,
    root_key: Vec<u8>,
    txn: TransactionId,
    armed: bool,
}

impl<C: CoordinationService + ?Sized + 'static> LockGuard<C> {
    pub(crate) fn new(
        service: Arc<C>,
        policy: RetryPolicy,
        app_id: &str,
        root_key: &[u8],
        txn: TransactionId,
    ) -> Self {
        Self {
            service,
            policy,
            app_id: app_id.to_string(),
            root_key: root_key.to_vec(),
            txn,
            armed: true,
        }
    }

    /// Marks the lock as released by the caller.
    pub(crate) fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<C: CoordinationService + ?Sized + 'static> Drop for LockGuard<C> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let txn = self.txn;
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(%txn, "lock guard dropped outside a runtime; lock left to expire");
            return;
        };
        let service = Arc::clone(&self.service);
        let policy = self.policy.clone();
        let app_id = std::mem::take(&mut self.app_id);
        let root_key = std::mem::take(&mut self.root_key);
        debug!(%txn, "releasing lock from drop fallback");
        handle.spawn(async move {
            let detached = CallContext::new();
            let (service, app_id, root_key) = (&service, &app_id, &root_key);
            let result = policy
                .run_retryable(&detached, "release_lock", || {
                    service.release_lock(app_id, root_key, txn)
                })
                .await;
            if let Err(error) = result {
                warn!(%txn, error = %error, "drop fallback failed to release lock");
            }
        });
    }
}
