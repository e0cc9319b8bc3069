//! Error types for the DOM module.

use thiserror::Error;

use crate::tree::NodeId;

/// Errors that can occur during DOM access.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
    /// Selector could not be parsed.
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// Node was removed by the host.
    #[error("node {0} is no longer in the tree")]
    NodeGone(NodeId),
}

/// Result type for DOM operations.
pub type Result<T> = std::result::Result<T, DomError>;
