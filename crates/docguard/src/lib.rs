//! # Docguard
//!
//! Client-side authorization state and UI enforcement for a hosted
//! spreadsheet-like document application.
//!
//! ## Overview
//!
//! At page load the engine wraps the host's outbound channel to observe
//! which document is opened. At page-ready it:
//!
//! 1. Resolves the document identity within a fixed bound
//! 2. Loads the caller's [`AuthorizationRecord`], failing closed on any error
//! 3. Installs one reconciliation loop per [`EnforcementRule`]
//! 4. Starts the idle session with the record's timeout
//!
//! Every failure path ends in the most restrictive working state: guarded
//! UI hidden and the session timer running with the default timeout.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docguard::{Engine, EngineConfig, HostPorts};
//!
//! // Load time, before any traffic.
//! let engine = Engine::new(ports, EngineConfig::default())?;
//! let channel = engine.install_sniffer(host_channel);
//!
//! // Page ready.
//! let handle = engine.start().await?;
//! handle.activity().notify("keydown");
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `docguard::core` - Data model, rules and the idle state machine
//! - `docguard::identity` - Transport sniffer and identity resolver
//! - `docguard::authz` - Authorization loader and data API
//! - `docguard::dom` - DOM tree port and reconciler
//! - `docguard::session` - Idle session runner

pub mod engine;
pub mod error;

// Re-export component crates
pub use docguard_authz as authz;
pub use docguard_core as core;
pub use docguard_dom as dom;
pub use docguard_identity as identity;
pub use docguard_session as session;

// Re-export main types for convenience
pub use engine::{Engine, EngineConfig, EngineHandle, HostPorts};
pub use error::{EngineError, Result};

// Re-export commonly used types
pub use docguard_core::{
    standard_rules, AuthorizationRecord, Capability, DocumentIdentity, EnforcementRule,
    Presentation, SessionState,
};
