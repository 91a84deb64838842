//! Retry and backoff policy.
//!
//! This module encapsulates error classification (page-state, session-fatal,
//! service-transient), backoff decisions, and the generic retry loop so that
//! the higher-level recovery strategy and plain call sites share a
//! consistent policy.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_http_status, RecoveryClass};
pub use policy::{RetryPolicy, RetryPredicate};
pub use run::RetryExecutor;
