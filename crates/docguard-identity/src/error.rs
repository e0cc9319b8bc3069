//! Error types for the identity module.

use thiserror::Error;

/// Errors surfaced by an outbound channel.
///
/// Inspection never produces one of these: only the wrapped channel's own
/// delivery failures are propagated.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The channel is closed.
    #[error("channel closed")]
    Closed,

    /// Delivery failed in the host channel.
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
