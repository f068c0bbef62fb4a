//! Backoff configuration.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lower bound of the jitter factor applied to every computed sleep.
pub const JITTER_LOW: f64 = 0.85;

/// Upper bound of the jitter factor applied to every computed sleep.
pub const JITTER_HIGH: f64 = 1.15;

/// How the sleep before retry `n` grows with `n`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Backoff {
    /// `multiplier * base^n` seconds.
    Exponential {
        /// Base of the exponent.
        base: f64,
        /// Scale factor, in seconds.
        multiplier: f64,
    },
    /// `unit * n^2`.
    Quadratic {
        /// Sleep for the first retry.
        unit: Duration,
    },
}

/// Configuration for retry behavior.
///
/// The sleep before retry `n` (1-based) is
/// `min(backoff_threshold, backoff(n))`, scaled by a jitter factor drawn
/// uniformly from [`JITTER_LOW`]..=[`JITTER_HIGH`] when `jitter` is set.
///
/// The retry loop stops and hands back the original error when the retry
/// predicate rejects it, when `max_retries` retries have been made, or when
/// `retrying_timeout` has elapsed since the first attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Growth of the sleep between attempts.
    pub backoff: Backoff,
    /// Cap on any single (pre-jitter) sleep.
    pub backoff_threshold: Duration,
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Wall-clock ceiling for the whole retry loop.
    pub retrying_timeout: Option<Duration>,
    /// Whether to scale sleeps by a random jitter factor.
    pub jitter: bool,
}

impl RetryPolicy {
    /// Creates a policy with the default exponential backoff and the given
    /// retry budget.
    pub fn new(max_retries: u32) -> Self {
        Self {
            backoff: Backoff::Exponential {
                base: 2.0,
                multiplier: 0.2,
            },
            backoff_threshold: Duration::from_secs(300),
            max_retries,
            retrying_timeout: Some(Duration::from_secs(60)),
            jitter: true,
        }
    }

    /// Creates an exponential policy: `multiplier * base^n` seconds.
    pub fn exponential(base: f64, multiplier: f64) -> Self {
        Self::new(10).with_backoff(Backoff::Exponential { base, multiplier })
    }

    /// Creates a quadratic policy: `unit * n^2`.
    pub fn quadratic(unit: Duration, max_retries: u32) -> Self {
        Self::new(max_retries).with_backoff(Backoff::Quadratic { unit })
    }

    /// Creates a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            backoff: Backoff::Quadratic {
                unit: Duration::ZERO,
            },
            backoff_threshold: Duration::ZERO,
            max_retries: 0,
            retrying_timeout: None,
            jitter: false,
        }
    }

    /// Sets the backoff curve.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets the cap on a single sleep.
    #[must_use]
    pub fn with_backoff_threshold(mut self, threshold: Duration) -> Self {
        self.backoff_threshold = threshold;
        self
    }

    /// Sets the retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the wall-clock ceiling of the retry loop.
    #[must_use]
    pub fn with_retrying_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.retrying_timeout = timeout;
        self
    }

    /// Enables or disables jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Sleep before retry `attempt` without jitter. Attempt 0 is the first
    /// call and never sleeps.
    pub fn base_delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let threshold = self.backoff_threshold.as_secs_f64();
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let raw = match self.backoff {
            Backoff::Exponential { base, multiplier } => multiplier * base.powi(exponent),
            Backoff::Quadratic { unit } => unit.as_secs_f64() * f64::from(attempt).powi(2),
        };

        // f64::min ignores NaN, so an overflowed product collapses to the cap.
        let secs = raw.min(threshold).max(0.0);
        Duration::try_from_secs_f64(secs).unwrap_or(self.backoff_threshold)
    }

    /// Sleep before retry `attempt`, with jitter when enabled.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay_for_attempt(attempt);
        if !self.jitter || delay.is_zero() {
            return delay;
        }
        let factor = rand::thread_rng().gen_range(JITTER_LOW..=JITTER_HIGH);
        delay.mul_f64(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(10)
    }
}
