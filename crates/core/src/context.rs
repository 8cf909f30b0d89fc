use std::sync::Arc;
use vitrine_traits::{AccessChecker, IndexSearcher, TocConfiguration, Translator, UrlBuilder};

/// The collaborators a TOC is built against, shared by all components.
#[derive(Debug, Clone)]
pub struct TocContext {
    pub index: Arc<dyn IndexSearcher>,
    pub config: Arc<dyn TocConfiguration>,
    pub access: Arc<dyn AccessChecker>,
    pub urls: Arc<dyn UrlBuilder>,
    pub translator: Arc<dyn Translator>,
}

impl TocContext {
    pub fn new(
        index: Arc<dyn IndexSearcher>,
        config: Arc<dyn TocConfiguration>,
        access: Arc<dyn AccessChecker>,
        urls: Arc<dyn UrlBuilder>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            index,
            config,
            access,
            urls,
            translator,
        }
    }
}
