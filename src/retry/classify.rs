//! Classify automation errors into recovery tactics.

use crate::error::AutomationError;

/// Recovery tactic selected for a failure.
///
/// Errors that are worth retrying without any remediation are a policy
/// concern (`RetryPolicy`'s predicate), not a class of their own here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryClass {
    /// The page content is stale or a wait expired; a reload can help.
    PageState,
    /// The page/browser/context handle is no longer usable; the session
    /// must be recreated.
    SessionFatal,
    /// A transient service-side failure; waiting and re-sending can help.
    ServiceTransient,
    /// No recovery tactic applies; rethrow as-is.
    Unclassified,
}

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(status: u16) -> RecoveryClass {
    match status {
        408 | 429 => RecoveryClass::ServiceTransient,
        500..=599 => RecoveryClass::ServiceTransient,
        _ => RecoveryClass::Unclassified,
    }
}

/// Map a normalized error into its recovery class.
///
/// Recovery wrappers delegate to their cause so that a failed remediation
/// (e.g. a reload that found the page already closed) steers the next
/// attempt to the right tactic.
pub fn classify(error: &AutomationError) -> RecoveryClass {
    match error {
        AutomationError::ElementNotFound { .. }
        | AutomationError::SelectorWait { .. }
        | AutomationError::ElementDetached
        | AutomationError::Timeout(_) => RecoveryClass::PageState,

        AutomationError::PageClosed
        | AutomationError::BrowserClosed
        | AutomationError::ContextClosed => RecoveryClass::SessionFatal,

        AutomationError::Transport(_) | AutomationError::RequestTimeout => {
            RecoveryClass::ServiceTransient
        }
        AutomationError::Http { status } => classify_http_status(*status),

        AutomationError::Recovery { source, .. } => classify(source),

        AutomationError::Aborted
        | AutomationError::InvalidArgument(_)
        | AutomationError::Other(_) => RecoveryClass::Unclassified,
    }
}
