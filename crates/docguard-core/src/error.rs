//! Error types for docguard core.

use thiserror::Error;

/// Errors raised while constructing core values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("document identity must not be empty")]
    EmptyIdentity,

    #[error("enforcement rule selector must not be empty")]
    EmptySelector,

    #[error("idle timeout {timeout_secs}s must exceed warning window {window_secs}s")]
    TimeoutWithinWarningWindow { timeout_secs: u64, window_secs: u64 },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
