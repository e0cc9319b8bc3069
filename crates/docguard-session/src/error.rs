//! Error types for the session module.

use std::time::Duration;

use docguard_core::CoreError;
use thiserror::Error;

/// Errors that can occur when starting a session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Timeout and warning window are inconsistent.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Tick period must be non-zero.
    #[error("tick period must be non-zero, got {0:?}")]
    InvalidTick(Duration),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
