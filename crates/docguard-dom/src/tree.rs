//! DomTree trait: the host's live document as the reconciler sees it.

use std::fmt;

use docguard_core::Presentation;
use tokio::sync::broadcast;

use crate::error::Result;

/// Handle to a host-owned node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One batch of child-list mutations anywhere under the body.
///
/// Presentation writes are attribute changes and are not reported, so the
/// reconciler never observes its own writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationBatch {
    /// Roots of inserted subtrees.
    pub added: Vec<NodeId>,
    /// Roots of removed subtrees.
    pub removed: Vec<NodeId>,
}

/// The host's document tree.
///
/// The engine owns none of the nodes. The only write it ever makes is
/// [`set_presentation`](DomTree::set_presentation).
pub trait DomTree: Send + Sync {
    /// All nodes matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Result<Vec<NodeId>>;

    /// Text content of `node`, if it is still attached.
    fn text_of(&self, node: NodeId) -> Option<String>;

    /// Closest inclusive ancestor of `node` matching `selector`.
    fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>>;

    /// Current presentation of `node`; `None` once detached.
    fn presentation(&self, node: NodeId) -> Option<Presentation>;

    /// Set the presentation attribute of `node`.
    fn set_presentation(&self, node: NodeId, presentation: Presentation) -> Result<()>;

    /// Subscribe to child-list mutation batches under the body.
    fn subscribe(&self) -> broadcast::Receiver<MutationBatch>;
}
