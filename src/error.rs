use thiserror::Error;
use vitrine_core::TocError;
use vitrine_traits::IndexError;

/// Errors surfaced by the TOC service and the command line tool.
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("TOC generation failed: {0}")]
    Toc(#[from] TocError),

    #[error("Index lookup failed: {0}")]
    Index(#[from] IndexError),

    #[error("No record with PI '{0}'")]
    RecordNotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration is invalid: {0}")]
    Config(String),
}
