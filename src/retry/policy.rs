//! Declarative retry policy: attempt budget, backoff shape, retryability.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::AutomationError;
use crate::retry::classify::{classify, RecoveryClass};

/// Predicate deciding whether an error is worth another attempt.
pub type RetryPredicate = Arc<dyn Fn(&AutomationError) -> bool + Send + Sync>;

/// Retry parameters shared (read-only) across concurrent operations.
///
/// `max_attempts` counts *retries*: the operation runs at most
/// `max_attempts + 1` times. When no predicate is set, every error is
/// considered retryable; the named presets restrict this to the error
/// classes that make sense for their domain.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_attempts: u32,
    /// Base delay between attempts (and the fixed delay when backoff is off).
    pub delay_between_attempts: Duration,
    /// Grow the delay exponentially instead of keeping it fixed.
    pub use_exponential_backoff: bool,
    /// Backoff multiplier, meaningful only with exponential backoff (> 1.0).
    pub backoff_multiplier: f64,
    /// Upper bound on any single inter-attempt delay.
    pub max_delay: Duration,
    retry_condition: Option<RetryPredicate>,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("delay_between_attempts", &self.delay_between_attempts)
            .field("use_exponential_backoff", &self.use_exponential_backoff)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("max_delay", &self.max_delay)
            .field("retry_condition", &self.retry_condition.is_some())
            .finish()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_between_attempts: Duration::from_millis(500),
            use_exponential_backoff: false,
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            retry_condition: None,
        }
    }
}

impl RetryPolicy {
    /// Fixed-delay policy.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay_between_attempts: delay,
            use_exponential_backoff: false,
            ..Self::default()
        }
    }

    /// Exponential-backoff policy with a cap.
    pub fn exponential(
        max_attempts: u32,
        base_delay: Duration,
        multiplier: f64,
        max_delay: Duration,
    ) -> Self {
        Self {
            max_attempts,
            delay_between_attempts: base_delay,
            use_exponential_backoff: true,
            backoff_multiplier: multiplier,
            max_delay,
            retry_condition: None,
        }
    }

    /// Attach a retryability predicate, replacing the default retry-all.
    pub fn with_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&AutomationError) -> bool + Send + Sync + 'static,
    {
        self.retry_condition = Some(Arc::new(condition));
        self
    }

    /// Preset for API call sites: exponential backoff, service-transient
    /// failures only.
    pub fn api() -> Self {
        Self::exponential(3, Duration::from_secs(1), 2.0, Duration::from_secs(30))
            .with_condition(|e| classify(e) == RecoveryClass::ServiceTransient)
    }

    /// Preset for UI call sites: short fixed delay, page-state and
    /// session-fatal failures.
    pub fn ui() -> Self {
        Self::fixed(2, Duration::from_millis(500)).with_condition(|e| {
            matches!(
                classify(e),
                RecoveryClass::PageState | RecoveryClass::SessionFatal
            )
        })
    }

    /// Preset for quick smoke runs: one retry, minimal waiting.
    pub fn fast() -> Self {
        Self::fixed(1, Duration::from_millis(100))
    }

    /// Preset for flaky environments: generous budget, slow exponential ramp.
    pub fn conservative() -> Self {
        Self::exponential(5, Duration::from_secs(2), 1.5, Duration::from_secs(60))
    }

    /// Whether the policy considers this error worth another attempt.
    pub fn should_retry(&self, error: &AutomationError) -> bool {
        match &self.retry_condition {
            Some(condition) => condition(error),
            None => true,
        }
    }

    /// Delay before retry number `attempt` (zero-based: the first retry uses
    /// the base delay). Computed in float seconds so an overflowing power
    /// saturates at the cap instead of panicking.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if !self.use_exponential_backoff {
            return self.delay_between_attempts;
        }
        let base = self.delay_between_attempts.as_secs_f64();
        let factor = self.backoff_multiplier.powi(attempt.min(i32::MAX as u32) as i32);
        let raw = base * factor;
        let capped = raw.min(self.max_delay.as_secs_f64());
        if capped.is_finite() && capped >= 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            self.max_delay
        }
    }
}
