//! Configuration loaded from `~/.config/backstop/config.toml`.
//!
//! The file is optional; harnesses can also build policies and settings in
//! code. A `profile` key selects a named preset, and the explicit `[retry]`
//! and `[recovery]` sections override it field-for-field where present.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::recovery::RecoverySettings;
use crate::retry::RetryPolicy;

/// Named preset selectable from config or the harness's environment switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Default,
    Api,
    Ui,
    Fast,
    Conservative,
}

impl Profile {
    pub fn retry_policy(self) -> RetryPolicy {
        match self {
            Profile::Default => RetryPolicy::default(),
            Profile::Api => RetryPolicy::api(),
            Profile::Ui => RetryPolicy::ui(),
            Profile::Fast => RetryPolicy::fast(),
            Profile::Conservative => RetryPolicy::conservative(),
        }
    }

    pub fn recovery_settings(self) -> RecoverySettings {
        match self {
            Profile::Default => RecoverySettings::default(),
            Profile::Api => RecoverySettings::api(),
            Profile::Ui => RecoverySettings::ui(),
            Profile::Fast => RecoverySettings::fast(),
            Profile::Conservative => RecoverySettings::conservative(),
        }
    }
}

/// Retry parameters (optional `[retry]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_attempts: u32,
    /// Base delay between attempts, in milliseconds.
    pub base_delay_ms: u64,
    /// Grow the delay exponentially instead of keeping it fixed.
    pub use_exponential_backoff: bool,
    /// Backoff multiplier (> 1.0), used with exponential backoff.
    pub backoff_multiplier: f64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            use_exponential_backoff: false,
            backoff_multiplier: 2.0,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryConfig {
    /// Build a policy from these values. The retry predicate is code, not
    /// config; attach one with [`RetryPolicy::with_condition`] afterwards.
    pub fn to_policy(&self) -> RetryPolicy {
        let base = Duration::from_millis(self.base_delay_ms);
        let mut policy = if self.use_exponential_backoff {
            RetryPolicy::exponential(
                self.max_attempts,
                base,
                self.backoff_multiplier,
                Duration::from_millis(self.max_delay_ms),
            )
        } else {
            RetryPolicy::fixed(self.max_attempts, base)
        };
        policy.backoff_multiplier = self.backoff_multiplier;
        policy.max_delay = Duration::from_millis(self.max_delay_ms);
        policy
    }
}

/// Recovery parameters (optional `[recovery]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    pub page_refresh_timeout_ms: u64,
    pub page_load_timeout_ms: u64,
    pub browser_restart_delay_ms: u64,
    pub api_retry_delay_ms: u64,
    pub api_backoff_multiplier: f64,
    pub max_api_retry_delay_ms: u64,
    pub max_page_refresh_attempts: u32,
    pub max_browser_restart_attempts: u32,
    pub max_api_retry_attempts: u32,
    pub enable_page_refresh_recovery: bool,
    pub enable_browser_restart_recovery: bool,
    pub enable_api_retry_recovery: bool,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self::from_settings(&RecoverySettings::default())
    }
}

impl RecoveryConfig {
    pub fn from_settings(s: &RecoverySettings) -> Self {
        Self {
            page_refresh_timeout_ms: s.page_refresh_timeout.as_millis() as u64,
            page_load_timeout_ms: s.page_load_timeout.as_millis() as u64,
            browser_restart_delay_ms: s.browser_restart_delay.as_millis() as u64,
            api_retry_delay_ms: s.api_retry_delay.as_millis() as u64,
            api_backoff_multiplier: s.api_backoff_multiplier,
            max_api_retry_delay_ms: s.max_api_retry_delay.as_millis() as u64,
            max_page_refresh_attempts: s.max_page_refresh_attempts,
            max_browser_restart_attempts: s.max_browser_restart_attempts,
            max_api_retry_attempts: s.max_api_retry_attempts,
            enable_page_refresh_recovery: s.enable_page_refresh_recovery,
            enable_browser_restart_recovery: s.enable_browser_restart_recovery,
            enable_api_retry_recovery: s.enable_api_retry_recovery,
        }
    }

    /// Settings built from these values. Validate before use:
    /// [`RecoverySettings::is_valid`].
    pub fn to_settings(&self) -> RecoverySettings {
        RecoverySettings {
            page_refresh_timeout: Duration::from_millis(self.page_refresh_timeout_ms),
            page_load_timeout: Duration::from_millis(self.page_load_timeout_ms),
            browser_restart_delay: Duration::from_millis(self.browser_restart_delay_ms),
            api_retry_delay: Duration::from_millis(self.api_retry_delay_ms),
            api_backoff_multiplier: self.api_backoff_multiplier,
            max_api_retry_delay: Duration::from_millis(self.max_api_retry_delay_ms),
            max_page_refresh_attempts: self.max_page_refresh_attempts,
            max_browser_restart_attempts: self.max_browser_restart_attempts,
            max_api_retry_attempts: self.max_api_retry_attempts,
            enable_page_refresh_recovery: self.enable_page_refresh_recovery,
            enable_browser_restart_recovery: self.enable_browser_restart_recovery,
            enable_api_retry_recovery: self.enable_api_retry_recovery,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackstopConfig {
    /// Base preset; explicit sections below override it.
    #[serde(default)]
    pub profile: Profile,
    /// Optional retry overrides; if missing, the profile's policy is used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Optional recovery overrides; if missing, the profile's settings are used.
    #[serde(default)]
    pub recovery: Option<RecoveryConfig>,
}

impl BackstopConfig {
    /// Effective retry policy after applying overrides.
    pub fn retry_policy(&self) -> RetryPolicy {
        match &self.retry {
            Some(r) => r.to_policy(),
            None => self.profile.retry_policy(),
        }
    }

    /// Effective recovery settings after applying overrides.
    pub fn recovery_settings(&self) -> RecoverySettings {
        match &self.recovery {
            Some(r) => r.to_settings(),
            None => self.profile.recovery_settings(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("backstop")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BackstopConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BackstopConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit path (no default-file creation).
pub fn load_from_path(path: &Path) -> Result<BackstopConfig> {
    let data = fs::read_to_string(path)?;
    let cfg: BackstopConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_default_profile() {
        let cfg = BackstopConfig::default();
        assert_eq!(cfg.profile, Profile::Default);
        assert!(cfg.retry.is_none());
        assert!(cfg.recovery.is_none());
        assert!(cfg.recovery_settings().is_valid());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = BackstopConfig {
            profile: Profile::Ui,
            retry: Some(RetryConfig::default()),
            recovery: Some(RecoveryConfig::default()),
        };
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: BackstopConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.profile, Profile::Ui);
        let retry = parsed.retry.unwrap();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.base_delay_ms, 500);
    }

    #[test]
    fn profile_parses_lowercase() {
        let cfg: BackstopConfig = toml::from_str("profile = \"conservative\"").unwrap();
        assert_eq!(cfg.profile, Profile::Conservative);
        assert_eq!(cfg.retry_policy().max_attempts, 5);
    }

    #[test]
    fn retry_section_overrides_profile() {
        let cfg: BackstopConfig = toml::from_str(
            "profile = \"fast\"\n\n\
             [retry]\n\
             max_attempts = 7\n\
             base_delay_ms = 50\n\
             use_exponential_backoff = true\n\
             backoff_multiplier = 3.0\n\
             max_delay_ms = 2000\n",
        )
        .unwrap();
        let policy = cfg.retry_policy();
        assert_eq!(policy.max_attempts, 7);
        assert_eq!(policy.delay_between_attempts, Duration::from_millis(50));
        assert!(policy.use_exponential_backoff);
        assert_eq!(policy.max_delay, Duration::from_millis(2000));
    }

    #[test]
    fn recovery_config_maps_onto_settings() {
        let settings = RecoverySettings::conservative();
        let mirrored = RecoveryConfig::from_settings(&settings).to_settings();
        assert_eq!(mirrored.page_refresh_timeout, settings.page_refresh_timeout);
        assert_eq!(mirrored.api_retry_delay, settings.api_retry_delay);
        assert_eq!(
            mirrored.max_api_retry_attempts,
            settings.max_api_retry_attempts
        );
        assert!(mirrored.is_valid());
    }

    #[test]
    fn load_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "profile = \"api\"\n").unwrap();
        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg.profile, Profile::Api);
        let settings = cfg.recovery_settings();
        assert!(!settings.enable_page_refresh_recovery);
    }
}
