pub mod entry;
pub mod fields;
pub mod ids;
pub mod label;
pub mod record;

pub use entry::{EntryKey, TocEntry};
pub use ids::{Iddoc, LogId, Pi};
pub use label::MultiLanguageValue;
pub use record::IndexRecord;

/// Name of the group every TOC starts with.
pub const DEFAULT_GROUP: &str = "_DEFAULT";
