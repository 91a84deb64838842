//! Error taxonomy for automation failures.
//!
//! Raw driver and HTTP-client failures are normalized into this closed set
//! once, at the boundary (`from_driver_message`, `from_http_status`), so the
//! retry and recovery layers never inspect vendor error text themselves.

use std::time::Duration;

use thiserror::Error;

/// A normalized automation failure, as seen by the retry and recovery layers.
#[derive(Debug, Clone, Error)]
pub enum AutomationError {
    /// An element lookup failed (selector matched nothing).
    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },

    /// A wait for a selector ran out of time.
    #[error("timed out waiting for selector: {selector}")]
    SelectorWait { selector: String },

    /// The element was removed from the DOM (or became invisible) mid-interaction.
    #[error("element is detached or not visible")]
    ElementDetached,

    /// A generic driver operation timed out.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The page handle has been closed.
    #[error("page has been closed")]
    PageClosed,

    /// The browser itself has been closed.
    #[error("browser has been closed")]
    BrowserClosed,

    /// The browser context has been disposed.
    #[error("browser context has been disposed")]
    ContextClosed,

    /// A network/transport-level failure (connection reset, DNS, TLS, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The HTTP request timed out or was cancelled client-side.
    #[error("request timed out")]
    RequestTimeout,

    /// The server answered with a non-success HTTP status.
    #[error("HTTP {status}")]
    Http { status: u16 },

    /// A recovery action itself failed; carries the original cause so the
    /// next retry iteration can classify it.
    #[error("recovery action failed: {message}")]
    Recovery {
        message: String,
        #[source]
        source: Box<AutomationError>,
    },

    /// The surrounding call was cancelled via its cancellation token.
    #[error("operation aborted")]
    Aborted,

    /// A degenerate argument was rejected before any work began.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Anything the normalization layer could not place.
    #[error("{0}")]
    Other(String),
}

impl AutomationError {
    /// Wrap a remediation failure, keeping the cause for later classification.
    pub fn recovery(message: impl Into<String>, source: AutomationError) -> Self {
        AutomationError::Recovery {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Normalize raw driver error text into a taxonomy variant.
    ///
    /// This is the only place substring matching on vendor messages happens:
    /// an ordered pattern table evaluated top to bottom, session-fatal
    /// patterns first so "Page is closed" never reads as a page-state error.
    pub fn from_driver_message(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();

        if lower.contains("browser has been closed") || lower.contains("browser closed") {
            return AutomationError::BrowserClosed;
        }
        if lower.contains("context") && (lower.contains("disposed") || lower.contains("closed")) {
            return AutomationError::ContextClosed;
        }
        if lower.contains("page is closed")
            || lower.contains("page closed")
            || lower.contains("target closed")
        {
            return AutomationError::PageClosed;
        }
        if lower.contains("waiting for selector") {
            return AutomationError::SelectorWait {
                selector: extract_selector(message),
            };
        }
        if lower.contains("not attached") || lower.contains("detached") || lower.contains("not visible")
        {
            return AutomationError::ElementDetached;
        }
        if lower.contains("no element") || lower.contains("not found") {
            return AutomationError::ElementNotFound {
                selector: extract_selector(message),
            };
        }
        if lower.contains("timeout") || lower.contains("timed out") {
            return AutomationError::Timeout(Duration::ZERO);
        }
        AutomationError::Other(message.to_string())
    }

    /// Normalize an HTTP status code. 2xx is not an error and maps to `Other`.
    pub fn from_http_status(status: u16) -> Self {
        AutomationError::Http { status }
    }

    /// The underlying error, unwrapping recovery wrappers.
    pub fn root(&self) -> &AutomationError {
        match self {
            AutomationError::Recovery { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Pull a quoted selector out of a driver message, if one is present.
fn extract_selector(message: &str) -> String {
    message
        .split('"')
        .nth(1)
        .unwrap_or("<unknown>")
        .to_string()
}
