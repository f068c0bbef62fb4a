//! The coordination service contract.

use crate::error::TxnResult;
use crate::types::TransactionId;
use async_trait::async_trait;

/// An external coordination service that hands out transaction ids and
/// holds ephemeral entity-group locks.
///
/// # Invariants
///
/// - ids returned by `allocate_transaction_id` increase per application
/// - `acquire_lock` grants a lock to at most one transaction at a time
/// - `release_lock` by a transaction that does not hold the lock is a no-op
#[async_trait]
pub trait CoordinationService: Send + Sync {
    /// Allocates a fresh transaction id for `app_id`.
    async fn allocate_transaction_id(&self, app_id: &str) -> TxnResult<TransactionId>;

    /// Tries to take the lock on `root_key` for `txn`. Returns false if
    /// another transaction holds it.
    async fn acquire_lock(&self, app_id: &str, root_key: &[u8], txn: TransactionId)
        -> TxnResult<bool>;

    /// Releases the lock on `root_key` if `txn` holds it.
    async fn release_lock(&self, app_id: &str, root_key: &[u8], txn: TransactionId)
        -> TxnResult<()>;
}
