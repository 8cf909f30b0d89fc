//! Error types for TOC generation and manipulation.

use thiserror::Error;
use vitrine_traits::{AccessError, IndexError};

#[derive(Error, Debug)]
pub enum TocError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Index query failed: {0}")]
    Index(#[from] IndexError),
    #[error("Access check failed: {0}")]
    Access(#[from] AccessError),
    #[error("No entry {index} in group '{group}'")]
    EntryNotFound { group: String, index: usize },
    #[error("Unknown TOC group: '{0}'")]
    UnknownGroup(String),
    #[error("Record hierarchy deeper than {0} levels; check the configured ancestor fields for cycles")]
    DepthLimitExceeded(usize),
}
