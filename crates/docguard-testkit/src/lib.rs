//! # Docguard Testkit
//!
//! Testing utilities for docguard.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a [`TestHost`] wiring every host port to an in-memory
//!   implementation, plus builders for profile and table payloads
//! - **Generators**: Proptest strategies for authorization tables and raw
//!   timeout cells
//!
//! ## Test Fixtures
//!
//! ```rust
//! use docguard_testkit::fixtures::{authorized_api, TableRow, TestHost, DOC_ID};
//!
//! let api = authorized_api(DOC_ID, "a@x.com", &[TableRow::granted("a@x.com", true, false, 10)]);
//! let host = TestHost::new(api).at_path(format!("/doc/{DOC_ID}"));
//! let ports = host.ports();
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use docguard_testkit::generators::timeout_cell;
//!
//! proptest! {
//!     #[test]
//!     fn timeout_never_below_minimum(cell in timeout_cell()) {
//!         // ...
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{init_tracing, GuardedUi, TableRow, TestHost};
