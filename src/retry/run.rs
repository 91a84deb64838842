//! Retry loop: run an async operation until success or the policy says stop.

use std::future::Future;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::policy::RetryPolicy;
use crate::error::AutomationError;

/// Generic attempt/classify/sleep loop parameterized by a [`RetryPolicy`].
///
/// One executor can be reused across operations; it holds no per-call state.
/// A cancellation token, when attached, aborts before an attempt and wakes
/// the loop mid-backoff.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            cancel: CancellationToken::new(),
        }
    }

    /// Executor whose waits can be interrupted through `cancel`.
    pub fn with_cancellation(policy: RetryPolicy, cancel: CancellationToken) -> Self {
        Self { policy, cancel }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds, fails non-retryably, or the
    /// attempt budget runs out. Exhaustion and non-retryable failures both
    /// return the last captured error verbatim so callers can inspect it.
    pub async fn execute<T, F, Fut>(
        &self,
        name: &str,
        mut operation: F,
    ) -> Result<T, AutomationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AutomationError>>,
    {
        let started = Instant::now();
        let mut attempt = 0u32;
        loop {
            if self.cancel.is_cancelled() {
                warn!(operation = name, attempt, "aborted before attempt");
                return Err(AutomationError::Aborted);
            }

            match operation().await {
                Ok(value) => {
                    debug!(
                        operation = name,
                        attempt,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "operation succeeded"
                    );
                    return Ok(value);
                }
                Err(error) => {
                    if !self.policy.should_retry(&error) {
                        warn!(
                            operation = name,
                            attempt,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            error = %error,
                            "failure is not retryable"
                        );
                        return Err(error);
                    }
                    if attempt >= self.policy.max_attempts {
                        warn!(
                            operation = name,
                            attempt,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            error = %error,
                            "retries exhausted"
                        );
                        return Err(error);
                    }

                    let delay = self.policy.delay_for_attempt(attempt);
                    debug!(
                        operation = name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "attempt failed; backing off"
                    );
                    tokio::select! {
                        _ = self.cancel.cancelled() => {
                            warn!(operation = name, attempt, "aborted during backoff");
                            return Err(AutomationError::Aborted);
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn counting_op(
        calls: &AtomicU32,
        failures: u32,
    ) -> impl FnMut() -> std::future::Ready<Result<u32, AutomationError>> + '_ {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if n < failures {
                Err(AutomationError::Timeout(Duration::from_secs(1)))
            } else {
                Ok(n)
            })
        }
    }

    #[tokio::test]
    async fn succeeds_first_try_without_waiting() {
        let calls = AtomicU32::new(0);
        let exec = RetryExecutor::new(RetryPolicy::fixed(3, Duration::from_secs(10)));
        let out = exec.execute("noop", counting_op(&calls, 0)).await.unwrap();
        assert_eq!(out, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invokes_k_plus_one_times_for_k_failures() {
        let calls = AtomicU32::new(0);
        let exec = RetryExecutor::new(RetryPolicy::fixed(3, Duration::from_millis(1)));
        let out = exec.execute("flaky", counting_op(&calls, 2)).await.unwrap();
        assert_eq!(out, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_rethrows_last_error_after_budget() {
        let calls = AtomicU32::new(0);
        let exec = RetryExecutor::new(RetryPolicy::fixed(3, Duration::from_millis(1)));
        let err = exec
            .execute("doomed", counting_op(&calls, u32::MAX))
            .await
            .unwrap_err();
        assert!(matches!(err, AutomationError::Timeout(_)));
        // max_attempts retries = max_attempts + 1 total tries.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn non_retryable_failure_stops_after_one_invocation() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::fixed(5, Duration::from_millis(1))
            .with_condition(|e| !matches!(e, AutomationError::Http { status: 404 }));
        let exec = RetryExecutor::new(policy);
        let err = exec
            .execute("not-found", || {
                calls.fetch_add(1, Ordering::SeqCst);
                std::future::ready(Err::<(), _>(AutomationError::Http { status: 404 }))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AutomationError::Http { status: 404 }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fixed_delay_accumulates_between_attempts() {
        let calls = AtomicU32::new(0);
        let exec = RetryExecutor::new(RetryPolicy::fixed(3, Duration::from_millis(100)));
        let started = Instant::now();
        let out = exec.execute("timed", counting_op(&calls, 2)).await.unwrap();
        assert_eq!(out, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Two backoff sleeps of 100ms each.
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn cancellation_interrupts_backoff() {
        let cancel = CancellationToken::new();
        let exec = RetryExecutor::with_cancellation(
            RetryPolicy::fixed(3, Duration::from_secs(60)),
            cancel.clone(),
        );
        let handle = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                cancel.cancel();
            }
        });
        let started = Instant::now();
        let err = exec
            .execute("cancelled", || {
                std::future::ready(Err::<(), _>(AutomationError::Timeout(
                    Duration::from_secs(1),
                )))
            })
            .await
            .unwrap_err();
        handle.await.unwrap();
        assert!(matches!(err, AutomationError::Aborted));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn already_cancelled_token_aborts_before_first_attempt() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = AtomicU32::new(0);
        let exec = RetryExecutor::with_cancellation(RetryPolicy::default(), cancel);
        let err = exec
            .execute("never-runs", counting_op(&calls, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AutomationError::Aborted));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
