//! # Docguard Core
//!
//! Pure primitives for docguard: who is looking at which document, what they
//! may do there, and how long they may stay idle.
//!
//! This crate contains no I/O, no runtime, no networking. Every function is a
//! computation over values, and every clock reading is passed in by the caller.
//!
//! ## Key Types
//!
//! - [`DocumentIdentity`] - Opaque token naming the open document
//! - [`AuthorizationRecord`] - Per-user, per-document capabilities and idle budget
//! - [`EnforcementRule`] - Selector, required capability, and desired visibility
//! - [`IdleSession`] - The Active / Warning / Expired state machine
//!
//! ## Fail-closed
//!
//! [`AuthorizationRecord::fail_closed`] is the record produced whenever anything
//! about the caller is uncertain: every capability denied, default idle timeout.

pub mod authorization;
pub mod error;
pub mod rule;
pub mod session;
pub mod types;

pub use authorization::{
    validate_timeout_minutes, AuthorizationRecord, Capability, DisplayDensity, Theme,
    DEFAULT_IDLE_TIMEOUT_MINUTES, MIN_IDLE_TIMEOUT_MINUTES,
};
pub use error::{CoreError, Result};
pub use rule::{standard_rules, EnforcementRule, Presentation};
pub use session::{IdleSession, SessionState, Transition, DEFAULT_WARNING_WINDOW};
pub use types::DocumentIdentity;
