//! Idle session state machine.
//!
//! The machine is driven by elapsed time since the last qualifying activity,
//! recomputed on every poll. It stores a timestamp, never a chained deadline
//! timer, so a suspended tab that resumes late is judged by the wall clock.
//!
//! ```text
//!             elapsed >= timeout - window          elapsed >= timeout
//!   Active ------------------------------> Warning -----------------> Expired
//!     ^                                       |
//!     +---------------- activity -------------+
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};
use std::time::Duration;

use crate::error::{CoreError, Result};

/// Lead time before expiry during which the countdown is shown.
pub const DEFAULT_WARNING_WINDOW: Duration = Duration::from_secs(120);

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Active,
    Warning {
        /// Whole seconds left before expiry, rounded up.
        seconds_remaining: u64,
    },
    Expired,
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, SessionState::Warning { .. })
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, SessionState::Expired)
    }
}

/// Edge produced by a poll or an activity event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// No phase change.
    Unchanged,
    /// Active -> Warning.
    EnteredWarning,
    /// Warning -> Active, after activity.
    ReturnedToActive,
    /// Active or Warning -> Expired.
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Active,
    Warning,
    Expired,
}

/// The Active / Warning / Expired machine.
///
/// Generic over the instant type so the async driver can use a pausable
/// clock while unit tests use plain `std::time::Instant`.
#[derive(Debug, Clone)]
pub struct IdleSession<I> {
    timeout: Duration,
    warning_window: Duration,
    last_activity: I,
    phase: Phase,
}

impl<I> IdleSession<I>
where
    I: Copy + Ord + Add<Duration, Output = I> + Sub<I, Output = Duration>,
{
    /// Start a session in `Active` at `now`.
    ///
    /// The timeout must exceed the warning window.
    pub fn new(timeout: Duration, warning_window: Duration, now: I) -> Result<Self> {
        if timeout <= warning_window {
            return Err(CoreError::TimeoutWithinWarningWindow {
                timeout_secs: timeout.as_secs(),
                window_secs: warning_window.as_secs(),
            });
        }
        Ok(Self {
            timeout,
            warning_window,
            last_activity: now,
            phase: Phase::Active,
        })
    }

    /// The configured idle budget.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Timestamp of the last qualifying activity (or of start).
    pub fn last_activity(&self) -> I {
        self.last_activity
    }

    /// Instant at which the session expires absent further activity.
    pub fn deadline(&self) -> I {
        self.last_activity + self.timeout
    }

    /// Time elapsed since the last activity.
    pub fn elapsed(&self, now: I) -> Duration {
        if now > self.last_activity {
            now - self.last_activity
        } else {
            Duration::ZERO
        }
    }

    /// Time left before expiry.
    pub fn remaining(&self, now: I) -> Duration {
        self.timeout.saturating_sub(self.elapsed(now))
    }

    /// Observable state at `now`, without advancing the machine.
    pub fn state(&self, now: I) -> SessionState {
        match self.phase {
            Phase::Active => SessionState::Active,
            Phase::Expired => SessionState::Expired,
            Phase::Warning => SessionState::Warning {
                seconds_remaining: ceil_secs(self.remaining(now)),
            },
        }
    }

    /// Advance the machine to `now`.
    pub fn poll(&mut self, now: I) -> Transition {
        if self.phase == Phase::Expired {
            return Transition::Unchanged;
        }

        let elapsed = self.elapsed(now);
        if elapsed >= self.timeout {
            self.phase = Phase::Expired;
            return Transition::Expired;
        }

        if self.phase == Phase::Active && elapsed >= self.timeout - self.warning_window {
            self.phase = Phase::Warning;
            return Transition::EnteredWarning;
        }

        Transition::Unchanged
    }

    /// Record a qualifying activity event at `now`.
    ///
    /// Activity never revives an expired session: if the deadline already
    /// passed, the session expires instead.
    pub fn record_activity(&mut self, now: I) -> Transition {
        if self.poll(now) == Transition::Expired {
            return Transition::Expired;
        }
        if self.phase == Phase::Expired {
            return Transition::Unchanged;
        }

        self.last_activity = now;
        if self.phase == Phase::Warning {
            self.phase = Phase::Active;
            return Transition::ReturnedToActive;
        }
        Transition::Unchanged
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}
