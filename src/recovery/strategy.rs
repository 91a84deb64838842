//! Recovery strategy: classify a failure, remediate, let the retry loop go again.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::context::RecoveryContext;
use super::settings::RecoverySettings;
use crate::driver::{BrowserService, PageHandle, ReloadOptions, WaitUntil};
use crate::error::AutomationError;
use crate::retry::{classify, RecoveryClass, RetryExecutor, RetryPolicy};

/// Delay between outer retry-loop attempts for the UI tactics. The API
/// tactic gets its backoff from the settings instead.
const RETRY_LOOP_DELAY: Duration = Duration::from_millis(250);

/// Which tactic applies to this error, honoring the feature toggles.
/// A disabled tactic makes its class fall through to "no recovery".
fn tactic_for(settings: &RecoverySettings, error: &AutomationError) -> Option<RecoveryClass> {
    match classify(error) {
        RecoveryClass::PageState if settings.enable_page_refresh_recovery => {
            Some(RecoveryClass::PageState)
        }
        RecoveryClass::SessionFatal if settings.enable_browser_restart_recovery => {
            Some(RecoveryClass::SessionFatal)
        }
        RecoveryClass::ServiceTransient if settings.enable_api_retry_recovery => {
            Some(RecoveryClass::ServiceTransient)
        }
        _ => None,
    }
}

fn ensure_name(name: &str) -> Result<(), AutomationError> {
    if name.trim().is_empty() {
        return Err(AutomationError::InvalidArgument(
            "operation name must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Orchestrates remediation ahead of retries.
///
/// Each entry point wraps the caller's operation so that a matching failure
/// triggers its tactic's remediation exactly once and then re-invokes the
/// operation directly; the wrapped closure is handed to [`RetryExecutor`]
/// for the outer loop, so remediation runs once per retry-loop attempt.
#[derive(Debug, Clone)]
pub struct RecoveryStrategy {
    settings: RecoverySettings,
    cancel: CancellationToken,
}

impl RecoveryStrategy {
    /// Build a strategy, rejecting invalid settings up front.
    pub fn new(settings: RecoverySettings) -> Result<Self, AutomationError> {
        Self::with_cancellation(settings, CancellationToken::new())
    }

    /// Like [`RecoveryStrategy::new`], with a token that interrupts backoff
    /// and restart waits.
    pub fn with_cancellation(
        settings: RecoverySettings,
        cancel: CancellationToken,
    ) -> Result<Self, AutomationError> {
        let errors = settings.validation_errors();
        if !errors.is_empty() {
            return Err(AutomationError::InvalidArgument(errors.join("; ")));
        }
        Ok(Self { settings, cancel })
    }

    pub fn settings(&self) -> &RecoverySettings {
        &self.settings
    }

    /// Run `operation`, reloading `page` whenever a page-state failure is
    /// caught, up to the configured page-refresh budget.
    pub async fn execute_with_page_refresh_recovery<T, P, F, Fut>(
        &self,
        page: &P,
        name: &str,
        operation: F,
    ) -> Result<T, AutomationError>
    where
        P: PageHandle,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AutomationError>>,
    {
        ensure_name(name)?;
        let executor =
            RetryExecutor::with_cancellation(self.page_refresh_policy(), self.cancel.clone());
        let op = Mutex::new(operation);
        let op = &op;
        executor
            .execute(name, move || async move {
                let mut guard = op.lock().await;
                let op = &mut *guard;
                match op().await {
                    Ok(value) => Ok(value),
                    Err(error)
                        if self.settings.enable_page_refresh_recovery
                            && classify(&error) == RecoveryClass::PageState =>
                    {
                        self.refresh_page(page).await?;
                        op().await
                    }
                    Err(error) => Err(error),
                }
            })
            .await
    }

    /// Run `operation`, recreating the browser session whenever a
    /// session-fatal failure is caught. Replaces `context.page` in place;
    /// callers must re-read it afterwards.
    pub async fn execute_with_browser_restart_recovery<T, B, F, Fut>(
        &self,
        context: &mut RecoveryContext<B>,
        name: &str,
        operation: F,
    ) -> Result<T, AutomationError>
    where
        B: BrowserService,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AutomationError>>,
    {
        ensure_name(name)?;
        let executor =
            RetryExecutor::with_cancellation(self.browser_restart_policy(), self.cancel.clone());
        let shared = Mutex::new((context, operation));
        let shared = &shared;
        executor
            .execute(name, move || async move {
                let mut guard = shared.lock().await;
                let (context, op) = &mut *guard;
                match op().await {
                    Ok(value) => Ok(value),
                    Err(error)
                        if self.settings.enable_browser_restart_recovery
                            && classify(&error) == RecoveryClass::SessionFatal =>
                    {
                        self.restart_browser(context).await?;
                        op().await
                    }
                    Err(error) => Err(error),
                }
            })
            .await
    }

    /// Run `operation`, waiting out transient service failures (5xx, 429,
    /// 408, transport, request timeout) before re-sending.
    pub async fn execute_with_api_retry_recovery<T, F, Fut>(
        &self,
        name: &str,
        operation: F,
    ) -> Result<T, AutomationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AutomationError>>,
    {
        ensure_name(name)?;
        let executor = RetryExecutor::with_cancellation(self.api_policy(), self.cancel.clone());
        let op = Mutex::new(operation);
        let op = &op;
        executor
            .execute(name, move || async move {
                let mut guard = op.lock().await;
                let op = &mut *guard;
                match op().await {
                    Ok(value) => Ok(value),
                    Err(error)
                        if self.settings.enable_api_retry_recovery
                            && classify(&error) == RecoveryClass::ServiceTransient =>
                    {
                        self.delay_api_retry(&error).await;
                        op().await
                    }
                    Err(error) => Err(error),
                }
            })
            .await
    }

    /// Run `operation` with all enabled tactics available: page-state
    /// failures reload, session-fatal failures restart, service-transient
    /// failures wait. Anything else is rethrown as-is.
    pub async fn execute_with_comprehensive_recovery<T, B, F, Fut>(
        &self,
        context: &mut RecoveryContext<B>,
        name: &str,
        operation: F,
    ) -> Result<T, AutomationError>
    where
        B: BrowserService,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AutomationError>>,
    {
        ensure_name(name)?;
        let executor =
            RetryExecutor::with_cancellation(self.comprehensive_policy(), self.cancel.clone());
        let shared = Mutex::new((context, operation));
        let shared = &shared;
        executor
            .execute(name, move || async move {
                let mut guard = shared.lock().await;
                let (context, op) = &mut *guard;
                match op().await {
                    Ok(value) => Ok(value),
                    Err(error) => match tactic_for(&self.settings, &error) {
                        Some(RecoveryClass::PageState) => {
                            self.refresh_page(&context.page).await?;
                            op().await
                        }
                        Some(RecoveryClass::SessionFatal) => {
                            self.restart_browser(context).await?;
                            op().await
                        }
                        Some(RecoveryClass::ServiceTransient) => {
                            self.delay_api_retry(&error).await;
                            op().await
                        }
                        _ => Err(error),
                    },
                }
            })
            .await
    }

    /// Reload the page and wait for it to settle. The reload itself failing
    /// is a hard failure (wrapped, so the next attempt classifies the
    /// cause); the load wait is best-effort.
    async fn refresh_page<P: PageHandle>(&self, page: &P) -> Result<(), AutomationError> {
        info!(
            timeout_ms = self.settings.page_refresh_timeout.as_millis() as u64,
            "refreshing page"
        );
        let options = ReloadOptions {
            timeout: self.settings.page_refresh_timeout,
            wait_until: WaitUntil::NetworkIdle,
        };
        page.reload(&options)
            .await
            .map_err(|e| AutomationError::recovery("page reload failed", e))?;
        if let Err(e) = page.wait_for_load(self.settings.page_load_timeout).await {
            warn!(error = %e, "post-refresh load wait failed; continuing");
        }
        Ok(())
    }

    /// Tear down the session, wait the restart delay, open a fresh page and
    /// substitute it into the context.
    async fn restart_browser<B: BrowserService>(
        &self,
        context: &mut RecoveryContext<B>,
    ) -> Result<(), AutomationError> {
        info!(
            delay_ms = self.settings.browser_restart_delay.as_millis() as u64,
            "restarting browser session"
        );
        context
            .browser
            .close()
            .await
            .map_err(|e| AutomationError::recovery("browser close failed", e))?;
        if !self.settings.browser_restart_delay.is_zero() {
            tokio::time::sleep(self.settings.browser_restart_delay).await;
        }
        let page = context
            .browser
            .create_page(&context.settings)
            .await
            .map_err(|e| AutomationError::recovery("page recreation failed", e))?;
        context.page = page;
        Ok(())
    }

    /// The API tactic's remediation is purely a delay.
    async fn delay_api_retry(&self, error: &AutomationError) {
        info!(
            delay_ms = self.settings.api_retry_delay.as_millis() as u64,
            error = %error,
            "waiting before API retry"
        );
        tokio::time::sleep(self.settings.api_retry_delay).await;
    }

    fn page_refresh_policy(&self) -> RetryPolicy {
        let enabled = self.settings.enable_page_refresh_recovery;
        RetryPolicy::fixed(self.settings.max_page_refresh_attempts, RETRY_LOOP_DELAY)
            .with_condition(move |e| enabled && classify(e) == RecoveryClass::PageState)
    }

    fn browser_restart_policy(&self) -> RetryPolicy {
        let enabled = self.settings.enable_browser_restart_recovery;
        RetryPolicy::fixed(self.settings.max_browser_restart_attempts, RETRY_LOOP_DELAY)
            .with_condition(move |e| enabled && classify(e) == RecoveryClass::SessionFatal)
    }

    fn api_policy(&self) -> RetryPolicy {
        let enabled = self.settings.enable_api_retry_recovery;
        RetryPolicy::exponential(
            self.settings.max_api_retry_attempts,
            self.settings.api_retry_delay,
            self.settings.api_backoff_multiplier,
            self.settings.max_api_retry_delay,
        )
        .with_condition(move |e| enabled && classify(e) == RecoveryClass::ServiceTransient)
    }

    fn comprehensive_policy(&self) -> RetryPolicy {
        let mut budget = 0u32;
        if self.settings.enable_page_refresh_recovery {
            budget = budget.max(self.settings.max_page_refresh_attempts);
        }
        if self.settings.enable_browser_restart_recovery {
            budget = budget.max(self.settings.max_browser_restart_attempts);
        }
        if self.settings.enable_api_retry_recovery {
            budget = budget.max(self.settings.max_api_retry_attempts);
        }
        let settings = self.settings.clone();
        RetryPolicy::fixed(budget, RETRY_LOOP_DELAY)
            .with_condition(move |e| tactic_for(&settings, e).is_some())
    }
}
