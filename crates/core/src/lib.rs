//! # vitrine-core
//!
//! Table-of-contents engine for digitized objects.
//!
//! This crate turns flat index documents into a navigable TOC:
//! - **label**: display labels from templates or field fallbacks
//! - **fetch**: record classification and index queries (groups, anchors, volumes)
//! - **populate**: recursive tree population over real and loose children
//! - **toc**: the TOC container with tree building and expand/collapse state
//!
//! ## Design Principle
//!
//! No I/O happens here directly. The index, configuration, access control,
//! URL building and translation are reached through the traits in
//! `vitrine-traits`, bundled into a [`TocContext`].

// Re-export foundation crates
pub use vitrine_traits as traits;
pub use vitrine_types as types;

pub mod context;
pub mod error;
pub mod fetch;
pub mod label;
pub mod populate;
pub mod toc;

pub use context::TocContext;
pub use error::TocError;
pub use fetch::{RecordFetcher, TocData};
pub use label::LabelComposer;
pub use populate::TreePopulator;
pub use toc::{Toc, TocGroups};

/// Upper bound on hierarchy depth walked by the populator and the ancestor walk.
pub const MAX_TREE_DEPTH: usize = 64;
