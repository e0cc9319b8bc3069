//! Session configuration.

use std::time::Duration;

use docguard_core::{CoreError, DEFAULT_WARNING_WINDOW, MIN_IDLE_TIMEOUT_MINUTES};

use crate::error::{Result, SessionError};

/// Configuration for the session runner.
///
/// The idle timeout itself is not here; it comes from the authorization
/// record loaded for the document.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Lead time before expiry during which the countdown is shown.
    pub warning_window: Duration,
    /// Poll period of the main loop and resolution of both timers.
    pub tick: Duration,
    /// Relative address navigated to on expiry.
    pub logout_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            warning_window: DEFAULT_WARNING_WINDOW,
            tick: Duration::from_secs(1),
            logout_path: "/logout".to_string(),
        }
    }
}

impl SessionConfig {
    /// Shortest idle timeout an authorization record can carry.
    pub const MIN_TIMEOUT: Duration = Duration::from_secs(MIN_IDLE_TIMEOUT_MINUTES as u64 * 60);

    /// Check that every valid record timeout can be run with this config.
    ///
    /// The warning window must be shorter than the minimum timeout, so a
    /// session can always be started once a record is loaded.
    pub fn validate(&self) -> Result<()> {
        if self.tick.is_zero() {
            return Err(SessionError::InvalidTick(self.tick));
        }
        if self.warning_window >= Self::MIN_TIMEOUT {
            return Err(CoreError::TimeoutWithinWarningWindow {
                timeout_secs: Self::MIN_TIMEOUT.as_secs(),
                window_secs: self.warning_window.as_secs(),
            }
            .into());
        }
        Ok(())
    }
}
