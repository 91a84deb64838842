//! backstop: retry, backoff and error-recovery orchestration for
//! browser-automation and API test harnesses.
//!
//! The crate drives no browser and speaks no protocol itself. Call sites
//! hand it an async operation plus a name; [`recovery::RecoveryStrategy`]
//! classifies failures, repairs what it can (page reload, session restart,
//! or a plain wait) and lets [`retry::RetryExecutor`] run the outer
//! attempt/backoff loop according to a [`retry::RetryPolicy`].

pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod recovery;
pub mod retry;

pub use driver::{BrowserService, BrowserSettings, PageHandle, ReloadOptions, WaitUntil};
pub use error::AutomationError;
pub use recovery::{RecoveryContext, RecoverySettings, RecoveryStrategy};
pub use retry::{RetryExecutor, RetryPolicy};
