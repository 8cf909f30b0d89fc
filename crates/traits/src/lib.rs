pub mod access;
pub mod config;
pub mod index;
pub mod translate;
pub mod url;

pub use access::{
    AccessChecker, AccessError, AllowAll, InMemoryAccessChecker, PermissionMap, Privilege,
};
pub use config::{LabelParam, LabelParamKind, LabelTemplate, StaticTocConfiguration, TocConfiguration};
pub use index::{
    Clause, InMemoryIndex, IndexError, IndexSearcher, Query, SearchHits, SearchRequest, SortField,
};
pub use translate::{MessageCatalog, Translator};
pub use url::{PageType, PatternUrlBuilder, UrlBuilder};
