//! # Docguard Authz
//!
//! Loads the caller's [`AuthorizationRecord`] for one document.
//!
//! ## Overview
//!
//! The record is assembled from two reads against the host's data API:
//!
//! 1. the caller's profile (for the email address),
//! 2. the document's authorization table, in columnar layout.
//!
//! The row whose `Email` matches the profile case-insensitively supplies the
//! capabilities and idle budget. Every failure along the way, and a missing
//! row, produces [`AuthorizationRecord::fail_closed`]. Nothing here is ever
//! surfaced to the user as an error.
//!
//! ## Key Types
//!
//! - [`DataApi`] - The async trait over the host's HTTP data API
//! - [`HttpDataApi`] - reqwest implementation
//! - [`MemoryDataApi`] - In-memory routes for tests
//! - [`AuthorizationLoader`] - Profile + table join with fail-closed defaults
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use docguard_authz::{AuthorizationLoader, HttpDataApi, LoaderConfig};
//! use docguard_core::DocumentIdentity;
//!
//! async fn example() {
//!     let api = HttpDataApi::new("https://sheets.example.com").unwrap();
//!     let loader = AuthorizationLoader::new(Arc::new(api), LoaderConfig::default());
//!
//!     let doc = DocumentIdentity::new("4kQx2mR7pZ9wAb").unwrap();
//!     let record = loader.load(&doc).await;
//! }
//! ```
//!
//! [`AuthorizationRecord`]: docguard_core::AuthorizationRecord
//! [`AuthorizationRecord::fail_closed`]: docguard_core::AuthorizationRecord::fail_closed

pub mod api;
pub mod error;
pub mod http;
pub mod loader;
pub mod table;

pub use api::{memory::MemoryDataApi, DataApi};
pub use error::{AuthzError, Result};
pub use http::HttpDataApi;
pub use loader::{AuthorizationLoader, LoaderConfig, UserProfile};
pub use table::{columns, ColumnarTable};
