//! Table store configuration.

use groupdb_retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`crate::ColumnTableStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Retry policy for the initial connectivity check.
    pub connect_retry: RetryPolicy,
    /// Retry policy for every individual store call.
    pub operation_retry: RetryPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            connect_retry: RetryPolicy::exponential(2.0, 0.5)
                .with_max_retries(5)
                .with_backoff_threshold(Duration::from_secs(10))
                .with_retrying_timeout(Some(Duration::from_secs(60))),
            operation_retry: RetryPolicy::exponential(2.0, 0.1)
                .with_max_retries(5)
                .with_backoff_threshold(Duration::from_secs(5))
                .with_retrying_timeout(Some(Duration::from_secs(30))),
        }
    }
}

impl StoreConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connect retry policy.
    #[must_use]
    pub fn with_connect_retry(mut self, policy: RetryPolicy) -> Self {
        self.connect_retry = policy;
        self
    }

    /// Sets the per-call retry policy.
    #[must_use]
    pub fn with_operation_retry(mut self, policy: RetryPolicy) -> Self {
        self.operation_retry = policy;
        self
    }

    /// A configuration that never retries. Useful in tests that count calls.
    pub fn no_retry() -> Self {
        Self {
            connect_retry: RetryPolicy::no_retry(),
            operation_retry: RetryPolicy::no_retry(),
        }
    }
}
