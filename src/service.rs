use crate::error::ViewerError;
use log::{debug, info};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use vitrine_core::{Toc, TocContext};
use vitrine_traits::{
    AccessChecker, AllowAll, Clause, InMemoryIndex, IndexSearcher, MessageCatalog,
    PatternUrlBuilder, Query, StaticTocConfiguration, TocConfiguration, Translator, UrlBuilder,
};
use vitrine_types::fields::{DOCTYPE, DOCTYPE_GROUP, ISANCHOR, ISWORK, PI};
use vitrine_types::{IndexRecord, Pi};

/// A builder for creating a `TocService`.
///
/// Every collaborator has an in-memory default: an empty index, the default
/// configuration, no access restrictions, root-relative URLs and no
/// translations.
#[derive(Default)]
pub struct TocServiceBuilder {
    index: Option<Arc<dyn IndexSearcher>>,
    config: Option<Arc<dyn TocConfiguration>>,
    access: Option<Arc<dyn AccessChecker>>,
    urls: Option<Arc<dyn UrlBuilder>>,
    translator: Option<Arc<dyn Translator>>,
}

impl TocServiceBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_index(mut self, index: Arc<dyn IndexSearcher>) -> Self {
        self.index = Some(index);
        self
    }

    /// Uses an in-memory index holding `records`.
    pub fn with_records(self, records: Vec<IndexRecord>) -> Self {
        self.with_index(Arc::new(InMemoryIndex::from_records(records)))
    }

    /// Loads index records from a JSON file containing an array of documents.
    pub fn with_records_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ViewerError> {
        let records: Vec<IndexRecord> = serde_json::from_str(&read(path.as_ref(), "records")?)?;
        info!("Loaded {} index records from {}", records.len(), path.as_ref().display());
        Ok(self.with_records(records))
    }

    pub fn with_config(mut self, config: Arc<dyn TocConfiguration>) -> Self {
        self.config = Some(config);
        self
    }

    /// Loads a `StaticTocConfiguration` from a JSON file.
    pub fn with_config_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ViewerError> {
        let path = path.as_ref();
        let config = StaticTocConfiguration::from_json(&read(path, "configuration")?)
            .map_err(|e| ViewerError::Config(format!("'{}': {}", path.display(), e)))?;
        Ok(self.with_config(Arc::new(config)))
    }

    pub fn with_access(mut self, access: Arc<dyn AccessChecker>) -> Self {
        self.access = Some(access);
        self
    }

    pub fn with_urls(mut self, urls: Arc<dyn UrlBuilder>) -> Self {
        self.urls = Some(urls);
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Consumes the builder and creates the `TocService`.
    pub fn build(self) -> TocService {
        let ctx = TocContext::new(
            self.index.unwrap_or_else(|| Arc::new(InMemoryIndex::new())),
            self.config
                .unwrap_or_else(|| Arc::new(StaticTocConfiguration::default())),
            self.access.unwrap_or_else(|| Arc::new(AllowAll)),
            self.urls.unwrap_or_else(|| Arc::new(PatternUrlBuilder::default())),
            self.translator.unwrap_or_else(|| Arc::new(MessageCatalog::new())),
        );
        debug!("TOC service ready with index '{}'", ctx.index.name());
        TocService { ctx }
    }
}

fn read(path: &Path, what: &str) -> Result<String, ViewerError> {
    fs::read_to_string(path).map_err(|e| {
        ViewerError::Io(io::Error::new(
            e.kind(),
            format!("Failed to read {} from '{}': {}", what, path.display(), e),
        ))
    })
}

/// Generates TOCs against one set of collaborators.
#[derive(Debug, Clone)]
pub struct TocService {
    ctx: TocContext,
}

impl TocService {
    pub fn context(&self) -> &TocContext {
        &self.ctx
    }

    /// The top-level record (work, anchor or group) carrying `pi`.
    pub fn find_record(&self, pi: &Pi) -> Result<Option<IndexRecord>, ViewerError> {
        let query = Query::new().field_eq(PI, pi.as_str()).and(Clause::AnyOf(vec![
            Clause::equals(ISWORK, "true"),
            Clause::equals(ISANCHOR, "true"),
            Clause::equals(DOCTYPE, DOCTYPE_GROUP),
        ]));
        Ok(self.ctx.index.find_one(&query, &[])?)
    }

    /// Builds a fresh TOC for `root`; the tree is built on first access.
    pub fn generate_toc(
        &self,
        root: &IndexRecord,
        add_all_siblings: bool,
        mime_type: Option<&str>,
        page: usize,
    ) -> Result<Toc, ViewerError> {
        let toc = Toc::new(Arc::clone(&self.ctx.config));
        toc.generate(&self.ctx, root, add_all_siblings, mime_type, page)?;
        Ok(toc)
    }

    /// Like [`generate_toc`](Self::generate_toc), looking the record up by PI first.
    pub fn generate_toc_for_pi(
        &self,
        pi: &Pi,
        add_all_siblings: bool,
        mime_type: Option<&str>,
        page: usize,
    ) -> Result<Toc, ViewerError> {
        let root = self
            .find_record(pi)?
            .ok_or_else(|| ViewerError::RecordNotFound(pi.to_string()))?;
        self.generate_toc(&root, add_all_siblings, mime_type, page)
    }
}
