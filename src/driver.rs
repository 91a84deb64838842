//! Collaborator contracts: what the recovery layer needs from a browser driver.
//!
//! The crate drives no browser itself; harnesses implement these traits over
//! their driver of choice and surface failures as [`AutomationError`] values
//! (via the normalization helpers in [`crate::error`]).

use std::time::Duration;

use async_trait::async_trait;

use crate::error::AutomationError;

/// Load condition to wait for after navigation or reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitUntil {
    /// The `load` event fired.
    #[default]
    Load,
    /// The `DOMContentLoaded` event fired.
    DomContentLoaded,
    /// No network connections for a quiet period.
    NetworkIdle,
}

/// Options for a page reload.
#[derive(Debug, Clone, Copy)]
pub struct ReloadOptions {
    pub timeout: Duration,
    pub wait_until: WaitUntil,
}

/// Settings used when creating a fresh page after a browser restart.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Default timeout applied by the driver to page operations.
    pub default_timeout: Duration,
    /// Viewport size, when the driver should override its default.
    pub viewport: Option<(u32, u32)>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            default_timeout: Duration::from_secs(30),
            viewport: None,
        }
    }
}

/// Handle to a live page.
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Reload the page, honoring the timeout and wait condition. A reload
    /// exceeding its timeout is a hard failure.
    async fn reload(&self, options: &ReloadOptions) -> Result<(), AutomationError>;

    /// Wait until the page reports loaded, up to `timeout`.
    async fn wait_for_load(&self, timeout: Duration) -> Result<(), AutomationError>;

    /// Whether the underlying handle has been closed.
    fn is_closed(&self) -> bool;

    /// Capture a screenshot (PNG bytes). Used by surrounding test
    /// infrastructure when recording failures; the recovery core never calls
    /// it.
    async fn screenshot(&self) -> Result<Vec<u8>, AutomationError>;
}

/// Factory/owner of browser sessions.
#[async_trait]
pub trait BrowserService: Send + Sync {
    type Page: PageHandle;

    /// Open a fresh page, starting a session first if needed.
    async fn create_page(&self, settings: &BrowserSettings)
        -> Result<Self::Page, AutomationError>;

    /// Tear down the session and release all its resources.
    async fn close(&self) -> Result<(), AutomationError>;
}
