//! Coordinator configuration.

use crate::policy::LockPolicy;
use groupdb_retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for an [`crate::EntityGroupCoordinator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Retry policy for transaction id allocation.
    pub txn_id_retry: RetryPolicy,
    /// Retry policy for lock acquisition. A held lock is retried like a
    /// transient failure.
    pub lock_retry: RetryPolicy,
    /// Retry policy for lock release. Releases run on a detached context so
    /// that a cancelled request still gives its lock back.
    pub release_retry: RetryPolicy,
    /// Retry policy for writes to tables that bypass locking.
    ///
    /// This loop runs around whole table store calls, so it nests outside
    /// the store's own operation retry: a transient failure can be attempted
    /// `(non_transactional_retry.max_retries + 1) * (operation_retry.max_retries + 1)`
    /// times. Give one of the two a zero budget to keep a single layer.
    pub non_transactional_retry: RetryPolicy,
    /// Which tables bypass locking.
    pub lock_policy: LockPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            txn_id_retry: RetryPolicy::exponential(2.0, 0.1)
                .with_max_retries(5)
                .with_backoff_threshold(Duration::from_secs(2)),
            lock_retry: RetryPolicy::exponential(2.0, 0.05)
                .with_max_retries(10)
                .with_backoff_threshold(Duration::from_secs(1))
                .with_retrying_timeout(Some(Duration::from_secs(30))),
            release_retry: RetryPolicy::exponential(2.0, 0.1)
                .with_max_retries(5)
                .with_backoff_threshold(Duration::from_secs(2))
                .with_retrying_timeout(Some(Duration::from_secs(20))),
            non_transactional_retry: RetryPolicy::quadratic(Duration::from_millis(100), 5)
                .with_backoff_threshold(Duration::from_secs(2)),
            lock_policy: LockPolicy::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transaction id retry policy.
    #[must_use]
    pub fn with_txn_id_retry(mut self, policy: RetryPolicy) -> Self {
        self.txn_id_retry = policy;
        self
    }

    /// Sets the lock acquisition retry policy.
    #[must_use]
    pub fn with_lock_retry(mut self, policy: RetryPolicy) -> Self {
        self.lock_retry = policy;
        self
    }

    /// Sets the lock release retry policy.
    #[must_use]
    pub fn with_release_retry(mut self, policy: RetryPolicy) -> Self {
        self.release_retry = policy;
        self
    }

    /// Sets the retry policy for non-transactional writes.
    #[must_use]
    pub fn with_non_transactional_retry(mut self, policy: RetryPolicy) -> Self {
        self.non_transactional_retry = policy;
        self
    }

    /// Sets the lock policy.
    #[must_use]
    pub fn with_lock_policy(mut self, policy: LockPolicy) -> Self {
        self.lock_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_transactional_retry_is_quadratic() {
        let config = CoordinatorConfig::default();
        let first = config.non_transactional_retry.base_delay_for_attempt(1);
        let third = config.non_transactional_retry.base_delay_for_attempt(3);
        assert_eq!(first, Duration::from_millis(100));
        assert_eq!(third, Duration::from_millis(900));
    }

    #[test]
    fn config_roundtrips_through_json() {
        let config = CoordinatorConfig::new()
            .with_lock_policy(LockPolicy::new().with_bypass_table("stats"));
        let json = serde_json::to_string(&config).unwrap();
        let back: CoordinatorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
