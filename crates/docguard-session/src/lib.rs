//! # Docguard Session
//!
//! Drives the idle [`IdleSession`] machine against a real clock and turns
//! its transitions into UI and navigation effects.
//!
//! ## Overview
//!
//! - [`SessionRunner`] spawns the session: a main loop that polls the machine
//!   once per tick and on each qualifying activity event, plus an independent
//!   status display timer that never changes state.
//! - Entering the warning phase starts a cancellable countdown overlay.
//!   Activity during the warning cancels it and hides the overlay.
//! - Expiry navigates to the logout path through a [`Termination`] that fires
//!   at most once, whichever of the countdown or the idle poll gets there first.
//!
//! ## Usage
//!
//! ```ignore
//! use docguard_session::{SessionConfig, SessionRunner};
//!
//! let runner = SessionRunner::new(SessionConfig::default(), ui, navigator);
//! let handle = runner.spawn(record.idle_timeout())?;
//!
//! // From the host's input listeners:
//! handle.activity().notify("keydown");
//! ```
//!
//! [`IdleSession`]: docguard_core::IdleSession

pub mod activity;
pub mod config;
pub mod error;
pub mod ports;
pub mod runner;
pub mod termination;

pub use activity::{ActivityKind, ActivitySender};
pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use ports::{format_remaining, Navigator, SessionUi};
pub use runner::{SessionHandle, SessionRunner};
pub use termination::{Termination, TerminationReason};
