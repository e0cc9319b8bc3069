//! # Docguard Identity
//!
//! Finds out which remote document the current page has open.
//!
//! ## Overview
//!
//! Two pieces cooperate:
//!
//! - **Sniffer**: a pass-through wrapper around the host's outbound message
//!   channel. Every frame is still delivered; frames that are an `openDoc`
//!   call additionally record their first argument.
//! - **Resolver**: polls the host's exposed state, then the sniffed value,
//!   then the page path, and gives up after a fixed bound.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use docguard_identity::{IdentityResolver, ResolverConfig};
//! use docguard_identity::resolver::memory::{StaticHostState, StaticLocation};
//! use docguard_identity::transport::memory::RecordingOutbound;
//!
//! async fn example() {
//!     let resolver = IdentityResolver::new(
//!         ResolverConfig::default(),
//!         Arc::new(StaticHostState::empty()),
//!         Arc::new(StaticLocation::new("/o/docs/")),
//!     );
//!
//!     // At load time, before any traffic.
//!     let channel = resolver.install_sniffer(Arc::new(RecordingOutbound::new()));
//!
//!     // At page-ready.
//!     let doc = resolver.resolve().await;
//! }
//! ```

pub mod capture;
pub mod error;
pub mod resolver;
pub mod transport;

pub use capture::CapturedIdentity;
pub use error::{Result, TransportError};
pub use resolver::{
    document_id_from_path, HostState, IdentityResolver, IdentitySource, PageLocation,
    ResolverConfig,
};
pub use transport::{install_sniffer, Outbound, RpcCall, SniffingOutbound, OPEN_DOC_METHOD};
