//! Fake page/browser collaborators for integration tests.
//!
//! Records every recovery-relevant call so tests can assert which tactic
//! ran; creates numbered pages so a browser restart is observable through
//! the replaced handle.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use backstop::driver::{BrowserService, BrowserSettings, PageHandle, ReloadOptions};
use backstop::error::AutomationError;

/// Shared call counters, inspectable after handles move into a context.
#[derive(Debug, Default)]
pub struct DriverStats {
    pub reloads: AtomicUsize,
    pub load_waits: AtomicUsize,
    pub session_closes: AtomicUsize,
    pub pages_created: AtomicUsize,
}

pub struct FakePage {
    pub id: usize,
    stats: Arc<DriverStats>,
    closed: AtomicBool,
    fail_next_reload: Mutex<Option<AutomationError>>,
}

impl FakePage {
    pub fn new(id: usize, stats: Arc<DriverStats>) -> Self {
        Self {
            id,
            stats,
            closed: AtomicBool::new(false),
            fail_next_reload: Mutex::new(None),
        }
    }

    /// Make the next reload fail with `error` (consumed on use).
    pub fn fail_next_reload(&self, error: AutomationError) {
        *self.fail_next_reload.lock().unwrap() = Some(error);
    }

    pub fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PageHandle for FakePage {
    async fn reload(&self, _options: &ReloadOptions) -> Result<(), AutomationError> {
        self.stats.reloads.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.fail_next_reload.lock().unwrap().take() {
            return Err(error);
        }
        Ok(())
    }

    async fn wait_for_load(&self, _timeout: Duration) -> Result<(), AutomationError> {
        self.stats.load_waits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn screenshot(&self) -> Result<Vec<u8>, AutomationError> {
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}

pub struct FakeBrowser {
    stats: Arc<DriverStats>,
    next_page_id: AtomicUsize,
}

impl FakeBrowser {
    /// Replacement pages are numbered from 1; tests give the initial page id 0.
    pub fn new(stats: Arc<DriverStats>) -> Self {
        Self {
            stats,
            next_page_id: AtomicUsize::new(1),
        }
    }
}

#[async_trait]
impl BrowserService for FakeBrowser {
    type Page = FakePage;

    async fn create_page(
        &self,
        _settings: &BrowserSettings,
    ) -> Result<FakePage, AutomationError> {
        self.stats.pages_created.fetch_add(1, Ordering::SeqCst);
        let id = self.next_page_id.fetch_add(1, Ordering::SeqCst);
        Ok(FakePage::new(id, Arc::clone(&self.stats)))
    }

    async fn close(&self) -> Result<(), AutomationError> {
        self.stats.session_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
