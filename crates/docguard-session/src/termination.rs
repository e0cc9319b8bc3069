//! The one termination action both expiry paths converge on.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::ports::Navigator;

/// Which path asked for termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The warning countdown reached zero.
    CountdownElapsed,
    /// The idle poll found the timeout exceeded.
    IdleTimeout,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TerminationReason::CountdownElapsed => "countdown_elapsed",
            TerminationReason::IdleTimeout => "idle_timeout",
        })
    }
}

/// Navigates to the logout path at most once. Clones share the latch.
#[derive(Clone)]
pub struct Termination {
    fired: Arc<AtomicBool>,
    navigator: Arc<dyn Navigator>,
    logout_path: Arc<str>,
}

impl Termination {
    pub fn new(navigator: Arc<dyn Navigator>, logout_path: impl Into<Arc<str>>) -> Self {
        Self {
            fired: Arc::new(AtomicBool::new(false)),
            navigator,
            logout_path: logout_path.into(),
        }
    }

    /// End the session. Returns `true` only for the call that navigated.
    pub fn terminate(&self, reason: TerminationReason) -> bool {
        if self
            .fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(%reason, "session already terminated");
            return false;
        }
        info!(%reason, path = %self.logout_path, "session expired, logging out");
        self.navigator.navigate(&self.logout_path);
        true
    }

    pub fn is_terminated(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Termination")
            .field("fired", &self.is_terminated())
            .field("logout_path", &self.logout_path)
            .finish()
    }
}
