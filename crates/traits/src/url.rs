//! UrlBuilder trait for turning TOC entries into navigable links.

use std::fmt;
use std::fmt::Debug;
use vitrine_types::fields::THUMBNAIL;
use vitrine_types::{IndexRecord, LogId, Pi};

/// The viewer page an entry links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageType {
    /// Image view of a page.
    ViewObject,
    /// Table of contents (anchors and groups).
    ViewToc,
    /// Bibliographic metadata (records without images).
    ViewMetadata,
}

impl PageType {
    /// Anchors and groups link to their TOC, records with images to the
    /// image view, everything else to the metadata view.
    pub fn determine(anchor_or_group: bool, has_images: bool) -> Self {
        if anchor_or_group {
            PageType::ViewToc
        } else if has_images {
            PageType::ViewObject
        } else {
            PageType::ViewMetadata
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            PageType::ViewObject => "object",
            PageType::ViewToc => "toc",
            PageType::ViewMetadata => "metadata",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

pub trait UrlBuilder: Send + Sync + Debug {
    fn build_url(&self, pi: &Pi, page_no: Option<i64>, logid: Option<&LogId>, page_type: PageType) -> String;

    /// Thumbnail for a record, `None` when the record has no representative image.
    fn thumbnail_url(&self, record: &IndexRecord) -> Option<String>;
}

/// Builds `{base}/{view}/{pi}/{page}/{logid}/` links and IIIF-style thumbnail URLs.
#[derive(Debug, Clone)]
pub struct PatternUrlBuilder {
    base: String,
    thumbnail_width: u32,
    thumbnail_height: u32,
}

impl PatternUrlBuilder {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            thumbnail_width: 100,
            thumbnail_height: 120,
        }
    }

    pub fn with_thumbnail_size(mut self, width: u32, height: u32) -> Self {
        self.thumbnail_width = width;
        self.thumbnail_height = height;
        self
    }
}

impl Default for PatternUrlBuilder {
    fn default() -> Self {
        Self::new("")
    }
}

impl UrlBuilder for PatternUrlBuilder {
    fn build_url(&self, pi: &Pi, page_no: Option<i64>, logid: Option<&LogId>, page_type: PageType) -> String {
        let mut url = format!("{}/{}/{}/{}/", self.base, page_type, pi, page_no.unwrap_or(1));
        if let Some(logid) = logid {
            url.push_str(logid.as_str());
            url.push('/');
        }
        url
    }

    fn thumbnail_url(&self, record: &IndexRecord) -> Option<String> {
        let file = record.str_value(THUMBNAIL)?;
        let pi = record.pi_topstruct()?;
        Some(format!(
            "{}/api/v1/records/{}/files/images/{}/full/!{},{}/0/default.jpg",
            self.base, pi, file, self.thumbnail_width, self.thumbnail_height
        ))
    }
}
