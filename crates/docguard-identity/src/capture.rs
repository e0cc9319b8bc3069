//! The sniffed document identity.
//!
//! Single writer (the sniffer), many readers (the resolver). Lives for the
//! page load; there is no reset.

use std::sync::{Arc, PoisonError, RwLock};

use docguard_core::DocumentIdentity;

/// Shared slot holding the most recently sniffed identity.
#[derive(Debug, Clone, Default)]
pub struct CapturedIdentity {
    inner: Arc<RwLock<Option<DocumentIdentity>>>,
}

impl CapturedIdentity {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent capture, if any.
    pub fn current(&self) -> Option<DocumentIdentity> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Record a capture. Last write wins.
    pub(crate) fn record(&self, id: DocumentIdentity) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(id);
    }

    /// Whether two handles refer to the same slot.
    pub fn same_slot(&self, other: &CapturedIdentity) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
