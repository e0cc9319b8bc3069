//! # Docguard DOM
//!
//! Keeps host-owned DOM regions shown or hidden according to the caller's
//! capabilities, while the host keeps re-rendering them.
//!
//! ## Overview
//!
//! The host's tree is reached through the [`DomTree`] trait. Its
//! [`subscribe`](DomTree::subscribe) method is a stream of mutation batches.
//! For each [`EnforcementRule`], the [`Reconciler`] runs one pass on
//! installation and one pass per batch thereafter. A pass only writes the
//! presentation attribute, and only when it differs from the desired value.
//!
//! ## Key Properties
//!
//! - **Idempotent**: a pass over an already-correct tree writes nothing
//! - **Monotonic under re-render**: a recreated node is corrected on the next batch
//! - **Commutative**: rules govern disjoint selectors and run independently
//! - **Quiet on miss**: a selector that matches nothing is a no-op
//!
//! [`EnforcementRule`]: docguard_core::EnforcementRule

pub mod error;
pub mod memory;
pub mod reconciler;
pub mod selector;
pub mod tree;

pub use error::{DomError, Result};
pub use memory::{MemoryDom, NodeSpec};
pub use reconciler::{fixed_record, EnforcementHandle, PassReport, Reconciler, RecordFeed};
pub use selector::Selector;
pub use tree::{DomTree, MutationBatch, NodeId};
