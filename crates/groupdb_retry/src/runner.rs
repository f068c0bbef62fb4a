//! The async retry loop.

use crate::context::{CallContext, Interrupted};
use crate::policy::RetryPolicy;
use std::fmt;
use std::future::Future;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Errors that know whether retrying them can help.
///
/// This is the explicit allow-list of transient error kinds; everything the
/// implementor does not list is surfaced on the first failure.
pub trait Retryable {
    /// Returns true if the operation may succeed when attempted again.
    fn is_retryable(&self) -> bool;
}

impl RetryPolicy {
    /// Runs `f` until it succeeds or the policy gives up.
    ///
    /// The original error is returned when `should_retry` rejects it, when
    /// `max_retries` retries have been made, or when `retrying_timeout` has
    /// elapsed. Cancellation or deadline expiry of `ctx`, whether during the
    /// wrapped call or a backoff sleep, is returned as the converted
    /// [`Interrupted`].
    pub async fn run<T, E, F, Fut, P>(
        &self,
        ctx: &CallContext,
        operation: &str,
        should_retry: P,
        mut f: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: From<Interrupted> + fmt::Display,
    {
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            let error = match ctx.run(f()).await {
                Ok(Ok(value)) => {
                    if attempt > 0 {
                        debug!(operation, attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Ok(Err(error)) => error,
                Err(interrupted) => return Err(interrupted.into()),
            };

            if !should_retry(&error) {
                return Err(error);
            }

            if attempt >= self.max_retries {
                warn!(operation, attempts = attempt + 1, error = %error, "retry budget exhausted");
                return Err(error);
            }

            if let Some(timeout) = self.retrying_timeout {
                if started.elapsed() >= timeout {
                    warn!(
                        operation,
                        attempts = attempt + 1,
                        timeout_ms = duration_ms(timeout),
                        error = %error,
                        "retrying timeout elapsed"
                    );
                    return Err(error);
                }
            }

            attempt += 1;
            let delay = self.delay_for_attempt(attempt);
            warn!(
                operation,
                attempt,
                sleep_ms = duration_ms(delay),
                error = %error,
                "retrying after transient failure"
            );

            if let Err(interrupted) = ctx.sleep(delay).await {
                return Err(interrupted.into());
            }
        }
    }

    /// Runs `f`, retrying the errors that report themselves retryable.
    pub async fn run_retryable<T, E, F, Fut>(
        &self,
        ctx: &CallContext,
        operation: &str,
        f: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + From<Interrupted> + fmt::Display,
    {
        self.run(ctx, operation, |error: &E| error.is_retryable(), f)
            .await
    }
}

fn duration_ms(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{JITTER_HIGH, JITTER_LOW};
    use std::time::Duration;
    use thiserror::Error;

    #[derive(Debug, Error, PartialEq)]
    enum TestError {
        #[error("transient")]
        Transient,
        #[error("fatal")]
        Fatal,
        #[error("interrupted: {0}")]
        Interrupted(#[from] Interrupted),
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_target_sleeps_along_the_curve() {
        let policy = RetryPolicy::exponential(3.0, 0.1)
            .with_backoff_threshold(Duration::from_secs(2))
            .with_max_retries(4)
            .with_retrying_timeout(None);
        let ctx = CallContext::new();

        let mut calls = Vec::new();
        let result: Result<(), TestError> = policy
            .run(&ctx, "always_fails", |_| true, || {
                calls.push(Instant::now());
                async { Err(TestError::Transient) }
            })
            .await;

        assert_eq!(result, Err(TestError::Transient));
        assert_eq!(calls.len(), 5);

        let expected = [0.3, 0.9, 2.0, 2.0];
        for (pair, want) in calls.windows(2).zip(expected) {
            let slept = (pair[1] - pair[0]).as_secs_f64();
            assert!(
                slept >= want * JITTER_LOW - 1e-3 && slept <= want * JITTER_HIGH + 1e-3,
                "slept {slept}, expected about {want}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_error_is_not_retried() {
        let policy = RetryPolicy::new(5);
        let ctx = CallContext::new();
        let mut calls = 0;

        let result: Result<(), TestError> = policy
            .run_retryable(&ctx, "fatal", || {
                calls += 1;
                async { Err(TestError::Fatal) }
            })
            .await;

        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let policy = RetryPolicy::new(5).with_backoff_threshold(Duration::from_millis(100));
        let ctx = CallContext::new();
        let mut calls = 0;

        let result: Result<u32, TestError> = policy
            .run_retryable(&ctx, "flaky", || {
                calls += 1;
                let attempt = calls;
                async move {
                    if attempt < 3 {
                        Err(TestError::Transient)
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(3));
    }

    #[tokio::test(start_paused = true)]
    async fn retrying_timeout_stops_the_loop() {
        let policy = RetryPolicy::exponential(1.0, 1.0)
            .with_backoff_threshold(Duration::from_secs(1))
            .with_max_retries(100)
            .with_retrying_timeout(Some(Duration::from_secs(5)))
            .with_jitter(false);
        let ctx = CallContext::new();
        let mut calls = 0;

        let result: Result<(), TestError> = policy
            .run_retryable(&ctx, "slow", || {
                calls += 1;
                async { Err(TestError::Transient) }
            })
            .await;

        assert_eq!(result, Err(TestError::Transient));
        // One call per second of budget, plus the first.
        assert_eq!(calls, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_interrupts_backoff() {
        let policy = RetryPolicy::exponential(2.0, 10.0)
            .with_backoff_threshold(Duration::from_secs(60))
            .with_retrying_timeout(None);
        let ctx = CallContext::new().with_timeout(Duration::from_secs(1));

        let result: Result<(), TestError> = policy
            .run_retryable(&ctx, "stuck", || async { Err(TestError::Transient) })
            .await;

        assert_eq!(
            result,
            Err(TestError::Interrupted(Interrupted::DeadlineExceeded))
        );
    }

    #[tokio::test]
    async fn cancellation_abandons_the_wrapped_call() {
        let policy = RetryPolicy::new(3);
        let ctx = CallContext::new();
        let canceller = ctx.clone();

        let handle = tokio::spawn(async move {
            policy
                .run_retryable(&ctx, "hang", || async {
                    std::future::pending::<Result<(), TestError>>().await
                })
                .await
        });

        tokio::task::yield_now().await;
        canceller.cancel();
        let result = handle.await.unwrap();
        assert_eq!(result, Err(TestError::Interrupted(Interrupted::Cancelled)));
    }
}
