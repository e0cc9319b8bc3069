//! Qualifying activity events.

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

/// Input events that count as user activity.
///
/// Passive events such as pointer movement, scrolling and wheel turns are
/// deliberately absent: unattended content that scrolls or refreshes must
/// not keep a session alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    PointerPress,
    KeyPress,
    TouchStart,
}

impl ActivityKind {
    /// Classify a host event name; `None` for events that do not qualify.
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "mousedown" | "pointerdown" => Some(ActivityKind::PointerPress),
            "keydown" | "keypress" => Some(ActivityKind::KeyPress),
            "touchstart" => Some(ActivityKind::TouchStart),
            _ => None,
        }
    }
}

/// Feeds activity into a running session. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ActivitySender {
    tx: mpsc::UnboundedSender<Instant>,
}

impl ActivitySender {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Instant>) -> Self {
        Self { tx }
    }

    /// Report a host input event by name.
    ///
    /// Returns whether it was delivered as activity. Non-qualifying events
    /// and events arriving after the session ended return `false`.
    pub fn notify(&self, event_name: &str) -> bool {
        match ActivityKind::from_event_name(event_name) {
            Some(kind) => self.record(kind),
            None => false,
        }
    }

    /// Report a qualifying activity now.
    pub fn record(&self, kind: ActivityKind) -> bool {
        let delivered = self.tx.send(Instant::now()).is_ok();
        debug!(?kind, delivered, "user activity");
        delivered
    }
}
