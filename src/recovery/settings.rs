//! Recovery timing and attempt-budget settings, with explicit validation.

use std::time::Duration;

/// Per-subsystem recovery configuration.
///
/// Immutable in practice: build one (usually from a preset), validate it,
/// share it. All durations must be positive except `browser_restart_delay`,
/// which may be zero; the backoff multiplier must exceed 1.0.
#[derive(Debug, Clone)]
pub struct RecoverySettings {
    /// Timeout for the page reload itself.
    pub page_refresh_timeout: Duration,
    /// Timeout for the best-effort post-reload load wait.
    pub page_load_timeout: Duration,
    /// Pause between closing a dead session and opening a fresh one.
    pub browser_restart_delay: Duration,
    /// Base delay before re-sending a failed API call.
    pub api_retry_delay: Duration,
    /// Backoff multiplier for the API retry loop.
    pub api_backoff_multiplier: f64,
    /// Cap on any single API retry delay.
    pub max_api_retry_delay: Duration,
    /// Retry budget for the page-refresh tactic.
    pub max_page_refresh_attempts: u32,
    /// Retry budget for the browser-restart tactic.
    pub max_browser_restart_attempts: u32,
    /// Retry budget for the API-retry tactic.
    pub max_api_retry_attempts: u32,
    pub enable_page_refresh_recovery: bool,
    pub enable_browser_restart_recovery: bool,
    pub enable_api_retry_recovery: bool,
}

impl Default for RecoverySettings {
    fn default() -> Self {
        Self {
            page_refresh_timeout: Duration::from_secs(30),
            page_load_timeout: Duration::from_secs(10),
            browser_restart_delay: Duration::from_secs(2),
            api_retry_delay: Duration::from_secs(1),
            api_backoff_multiplier: 2.0,
            max_api_retry_delay: Duration::from_secs(30),
            max_page_refresh_attempts: 2,
            max_browser_restart_attempts: 1,
            max_api_retry_attempts: 3,
            enable_page_refresh_recovery: true,
            enable_browser_restart_recovery: true,
            enable_api_retry_recovery: true,
        }
    }
}

impl RecoverySettings {
    /// Preset for API-heavy suites: more API retries, UI tactics off.
    pub fn api() -> Self {
        Self {
            max_api_retry_attempts: 5,
            enable_page_refresh_recovery: false,
            enable_browser_restart_recovery: false,
            ..Self::default()
        }
    }

    /// Preset for UI-heavy suites: API tactic off, patient page waits.
    pub fn ui() -> Self {
        Self {
            page_refresh_timeout: Duration::from_secs(45),
            page_load_timeout: Duration::from_secs(20),
            max_page_refresh_attempts: 3,
            enable_api_retry_recovery: false,
            ..Self::default()
        }
    }

    /// Preset for quick smoke runs: tight timeouts, minimal budgets.
    pub fn fast() -> Self {
        Self {
            page_refresh_timeout: Duration::from_secs(10),
            page_load_timeout: Duration::from_secs(5),
            browser_restart_delay: Duration::ZERO,
            api_retry_delay: Duration::from_millis(250),
            max_page_refresh_attempts: 1,
            max_browser_restart_attempts: 1,
            max_api_retry_attempts: 1,
            ..Self::default()
        }
    }

    /// Preset for flaky environments: generous timeouts and budgets.
    pub fn conservative() -> Self {
        Self {
            page_refresh_timeout: Duration::from_secs(60),
            page_load_timeout: Duration::from_secs(30),
            browser_restart_delay: Duration::from_secs(5),
            api_retry_delay: Duration::from_secs(2),
            api_backoff_multiplier: 1.5,
            max_api_retry_delay: Duration::from_secs(60),
            max_page_refresh_attempts: 4,
            max_browser_restart_attempts: 2,
            max_api_retry_attempts: 5,
            ..Self::default()
        }
    }

    /// All validation failures, as human-readable messages. Empty when valid.
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.page_refresh_timeout.is_zero() {
            errors.push("page_refresh_timeout must be greater than zero".to_string());
        }
        if self.page_load_timeout.is_zero() {
            errors.push("page_load_timeout must be greater than zero".to_string());
        }
        if self.api_retry_delay.is_zero() {
            errors.push("api_retry_delay must be greater than zero".to_string());
        }
        if self.max_api_retry_delay.is_zero() {
            errors.push("max_api_retry_delay must be greater than zero".to_string());
        }
        if self.api_backoff_multiplier <= 1.0 || !self.api_backoff_multiplier.is_finite() {
            errors.push(format!(
                "api_backoff_multiplier must be greater than 1.0 (got {})",
                self.api_backoff_multiplier
            ));
        }
        if self.max_api_retry_delay < self.api_retry_delay {
            errors.push(
                "max_api_retry_delay must not be smaller than api_retry_delay".to_string(),
            );
        }
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        for (name, s) in [
            ("default", RecoverySettings::default()),
            ("api", RecoverySettings::api()),
            ("ui", RecoverySettings::ui()),
            ("fast", RecoverySettings::fast()),
            ("conservative", RecoverySettings::conservative()),
        ] {
            assert!(s.is_valid(), "{name} preset should validate: {:?}", s.validation_errors());
        }
    }

    #[test]
    fn zero_page_refresh_timeout_rejected_in_isolation() {
        let s = RecoverySettings {
            page_refresh_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(!s.is_valid());
        let errors = s.validation_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("page_refresh_timeout"));
    }

    #[test]
    fn multiplier_of_one_rejected_in_isolation() {
        let s = RecoverySettings {
            api_backoff_multiplier: 1.0,
            ..Default::default()
        };
        assert!(!s.is_valid());
        assert!(s
            .validation_errors()
            .iter()
            .any(|e| e.contains("api_backoff_multiplier")));
    }

    #[test]
    fn zero_api_retry_delay_rejected_in_isolation() {
        let s = RecoverySettings {
            api_retry_delay: Duration::ZERO,
            ..Default::default()
        };
        assert!(!s.is_valid());
        assert!(s
            .validation_errors()
            .iter()
            .any(|e| e.contains("api_retry_delay")));
    }

    #[test]
    fn zero_restart_delay_is_allowed() {
        let s = RecoverySettings {
            browser_restart_delay: Duration::ZERO,
            ..Default::default()
        };
        assert!(s.is_valid());
    }

    #[test]
    fn cap_below_base_delay_rejected() {
        let s = RecoverySettings {
            api_retry_delay: Duration::from_secs(10),
            max_api_retry_delay: Duration::from_secs(1),
            ..Default::default()
        };
        assert!(!s.is_valid());
    }
}
