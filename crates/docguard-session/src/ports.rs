//! Host ports for the session: the overlay and status UI, and navigation.

use std::time::Duration;

/// Session UI owned by the host.
pub trait SessionUi: Send + Sync {
    /// Show or update the modal countdown overlay.
    fn show_countdown(&self, remaining: Duration);

    /// Hide the countdown overlay.
    fn hide_countdown(&self);

    /// Update the diagnostic "time remaining" display.
    fn render_status(&self, remaining: Duration);
}

/// Page navigation; the session's only side effect outside the page.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Render `remaining` as `m:ss`, rounding partial seconds up.
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub mod memory {
    //! Recording ports for tests.

    use std::sync::{Mutex, PoisonError};

    use super::*;

    /// One call made on a [`RecordingUi`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum UiEvent {
        ShowCountdown(Duration),
        HideCountdown,
        Status(Duration),
    }

    /// [`SessionUi`] that records every call.
    #[derive(Debug, Default)]
    pub struct RecordingUi {
        events: Mutex<Vec<UiEvent>>,
    }

    impl RecordingUi {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<UiEvent> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Whether the overlay is currently shown.
        pub fn overlay_visible(&self) -> bool {
            self.events()
                .iter()
                .rev()
                .find_map(|e| match e {
                    UiEvent::ShowCountdown(_) => Some(true),
                    UiEvent::HideCountdown => Some(false),
                    UiEvent::Status(_) => None,
                })
                .unwrap_or(false)
        }

        /// Remaining times shown on the overlay, in order.
        pub fn countdown_values(&self) -> Vec<Duration> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    UiEvent::ShowCountdown(d) => Some(d),
                    _ => None,
                })
                .collect()
        }

        pub fn status_renders(&self) -> usize {
            self.events()
                .iter()
                .filter(|e| matches!(e, UiEvent::Status(_)))
                .count()
        }

        fn push(&self, event: UiEvent) {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event);
        }
    }

    impl SessionUi for RecordingUi {
        fn show_countdown(&self, remaining: Duration) {
            self.push(UiEvent::ShowCountdown(remaining));
        }

        fn hide_countdown(&self) {
            self.push(UiEvent::HideCountdown);
        }

        fn render_status(&self, remaining: Duration) {
            self.push(UiEvent::Status(remaining));
        }
    }

    /// [`Navigator`] that records visited paths.
    #[derive(Debug, Default)]
    pub struct RecordingNavigator {
        visits: Mutex<Vec<String>>,
    }

    impl RecordingNavigator {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn visits(&self) -> Vec<String> {
            self.visits
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, path: &str) {
            self.visits
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(path.to_string());
        }
    }
}
