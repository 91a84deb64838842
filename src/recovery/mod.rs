//! Error recovery: classify a failure, repair what it broke, retry.
//!
//! Built on top of [`crate::retry`]: each entry point wraps the caller's
//! operation with a remediation step (page reload, session restart, or a
//! plain delay) and hands the wrapped operation to the retry executor.

mod context;
mod settings;
mod strategy;

pub use context::RecoveryContext;
pub use settings::RecoverySettings;
pub use strategy::RecoveryStrategy;
