//! Mutable context for one in-flight recovery call.

use crate::driver::{BrowserService, BrowserSettings, PageHandle};

/// Handles the comprehensive recovery path may need.
///
/// A context is exclusively owned by one in-flight call: the browser-restart
/// tactic replaces `page` in place, so callers must re-read it after any
/// recovery-aware call rather than caching the handle beforehand. Sharing
/// one context across parallel operations is not supported; build one per
/// call site.
pub struct RecoveryContext<B>
where
    B: BrowserService,
{
    /// Current page handle. Replaced by the browser-restart tactic.
    pub page: B::Page,
    /// Session owner used to tear down and recreate the page.
    pub browser: B,
    /// Settings applied when a restart creates the replacement page.
    pub settings: BrowserSettings,
}

impl<B> RecoveryContext<B>
where
    B: BrowserService,
{
    pub fn new(page: B::Page, browser: B, settings: BrowserSettings) -> Self {
        Self {
            page,
            browser,
            settings,
        }
    }

    /// Whether the current page handle is still usable.
    pub fn page_alive(&self) -> bool {
        !self.page.is_closed()
    }
}
