//! Error types for authorization loading.
//!
//! These never leave the loader's public `load`: each one collapses into the
//! fail-closed record. They exist so the warning log says which step failed.

use thiserror::Error;

/// Errors that can occur while loading authorization.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Network-level failure.
    #[error("request to {path} failed: {message}")]
    Request { path: String, message: String },

    /// Non-success HTTP status.
    #[error("request to {path} returned status {status}")]
    Status { path: String, status: u16 },

    /// Request did not complete in time.
    #[error("request to {path} timed out")]
    Timeout { path: String },

    /// Payload was not the expected shape.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// Profile carried no usable email.
    #[error("profile has no email address")]
    MissingEmail,

    /// Document identity cannot be placed in a request path.
    #[error("document identity {0:?} is not path-safe")]
    UnsafeIdentity(String),

    /// No table row for the caller.
    #[error("no authorization row for {email}")]
    UserNotFound { email: String },

    /// Client construction failed.
    #[error("client error: {0}")]
    Client(String),
}

/// Result type for authorization loading.
pub type Result<T> = std::result::Result<T, AuthzError>;
