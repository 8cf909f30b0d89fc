//! # vitrine
//!
//! Table-of-contents engine for digitized objects.
//!
//! The facade over the workspace crates: it re-exports the commonly used types
//! and adds [`TocServiceBuilder`], which wires the index, configuration,
//! access control, URL building and translation into a [`TocService`].
//!
//! ```no_run
//! use vitrine::{Pi, TocServiceBuilder, DEFAULT_GROUP};
//!
//! # fn main() -> Result<(), vitrine::ViewerError> {
//! let service = TocServiceBuilder::new()
//!     .with_config_file("toc.json")?
//!     .build();
//! let toc = service.generate_toc_for_pi(&Pi::new("PPN123"), false, None, 1)?;
//! for entry in toc.visible_entries(DEFAULT_GROUP)? {
//!     println!("{}{}", "  ".repeat(entry.level as usize), entry.label.default_value());
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod service;

// Re-export workspace crates
pub use vitrine_core as engine;
pub use vitrine_traits as traits;
pub use vitrine_types as types;

pub use error::ViewerError;
pub use service::{TocService, TocServiceBuilder};

pub use vitrine_core::{
    LabelComposer, RecordFetcher, Toc, TocContext, TocData, TocError, TocGroups, TreePopulator,
};
pub use vitrine_traits::{
    AccessChecker, AllowAll, InMemoryAccessChecker, InMemoryIndex, IndexError, IndexSearcher,
    MessageCatalog, PatternUrlBuilder, Privilege, StaticTocConfiguration, TocConfiguration,
    Translator, UrlBuilder,
};
pub use vitrine_types::{DEFAULT_GROUP, Iddoc, IndexRecord, LogId, MultiLanguageValue, Pi, TocEntry};
