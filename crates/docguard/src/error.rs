//! Error types for the engine.
//!
//! Runtime failures never reach this type; they degrade to fail-closed
//! defaults inside the components. What remains are setup mistakes.

use docguard_dom::DomError;
use docguard_session::SessionError;
use thiserror::Error;

/// Errors that can occur when constructing or starting the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A rule could not be installed.
    #[error("rule error: {0}")]
    Rule(#[from] DomError),

    /// Session settings are inconsistent.
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
