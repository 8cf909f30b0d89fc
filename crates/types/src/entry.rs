use crate::ids::{Iddoc, LogId, Pi};
use crate::label::MultiLanguageValue;
use indexmap::IndexMap;
use serde::Serialize;
use std::hash::{Hash, Hasher};

/// Identity of a TOC entry: logical section, page and owning record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryKey {
    pub logid: Option<LogId>,
    pub page_no: Option<i64>,
    pub pi: Pi,
}

/// An entry in the table of contents.
///
/// The core fields are set once while the entry is constructed. The view-state
/// fields (`id`, `parent_id`, `visible`, `expanded`, `has_child`) belong to the
/// container holding the entry and are only changed by its tree operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TocEntry {
    pub label: MultiLanguageValue,
    pub page_no: Option<i64>,
    pub page_no_label: Option<String>,
    pub iddoc: Iddoc,
    pub logid: Option<LogId>,
    /// Nesting level, 0 for roots.
    pub level: u32,
    /// PI of the record this entry belongs to.
    pub pi: Pi,
    pub thumbnail_url: Option<String>,
    pub url: String,
    pub record_mime_type: Option<String>,
    pub docstruct: Option<String>,
    pub footer_id: Option<String>,
    pub anchor_or_group: bool,
    pub access_permission_pdf: bool,
    pub has_images: bool,
    /// Extra display fields (docstruct type, running number, title).
    pub metadata: IndexMap<String, String>,

    pub id: usize,
    pub parent_id: Option<usize>,
    pub visible: bool,
    pub expanded: bool,
    pub has_child: bool,
}

impl TocEntry {
    pub fn new(label: MultiLanguageValue, iddoc: Iddoc, pi: Pi, level: u32) -> Self {
        Self {
            label,
            page_no: None,
            page_no_label: None,
            iddoc,
            logid: None,
            level,
            pi,
            thumbnail_url: None,
            url: String::new(),
            record_mime_type: None,
            docstruct: None,
            footer_id: None,
            anchor_or_group: false,
            access_permission_pdf: false,
            has_images: false,
            metadata: IndexMap::new(),
            id: 0,
            parent_id: None,
            visible: true,
            expanded: false,
            has_child: false,
        }
    }

    pub fn with_page(mut self, page_no: Option<i64>, page_no_label: Option<String>) -> Self {
        self.page_no = page_no;
        self.page_no_label = page_no_label;
        self
    }

    pub fn with_logid(mut self, logid: Option<LogId>) -> Self {
        self.logid = logid;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_thumbnail_url(mut self, url: Option<String>) -> Self {
        self.thumbnail_url = url;
        self
    }

    pub fn with_mime_type(mut self, mime_type: Option<String>) -> Self {
        self.record_mime_type = mime_type;
        self
    }

    pub fn with_docstruct(mut self, docstruct: Option<String>) -> Self {
        self.docstruct = docstruct;
        self
    }

    pub fn with_footer_id(mut self, footer_id: Option<String>) -> Self {
        self.footer_id = footer_id;
        self
    }

    pub fn with_anchor_or_group(mut self, anchor_or_group: bool) -> Self {
        self.anchor_or_group = anchor_or_group;
        self
    }

    pub fn with_pdf_permission(mut self, allowed: bool) -> Self {
        self.access_permission_pdf = allowed;
        self
    }

    pub fn with_images(mut self, has_images: bool) -> Self {
        self.has_images = has_images;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn key(&self) -> EntryKey {
        EntryKey {
            logid: self.logid.clone(),
            page_no: self.page_no,
            pi: self.pi.clone(),
        }
    }

    /// Label in the given language, falling back to the default label.
    pub fn label_for(&self, lang: &str) -> &str {
        self.label.get(lang)
    }
}

impl PartialEq for TocEntry {
    fn eq(&self, other: &Self) -> bool {
        self.logid == other.logid && self.page_no == other.page_no && self.pi == other.pi
    }
}

impl Eq for TocEntry {}

impl Hash for TocEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.logid.hash(state);
        self.page_no.hash(state);
        self.pi.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn entry(logid: &str, page: i64, pi: &str, label: &str) -> TocEntry {
        TocEntry::new(label.into(), Iddoc::new("1"), Pi::new(pi), 0)
            .with_logid(Some(LogId::new(logid)))
            .with_page(Some(page), None)
    }

    #[test]
    fn test_equality_ignores_label_and_level() {
        let a = entry("LOG_1", 3, "PPN1", "a");
        let mut b = entry("LOG_1", 3, "PPN1", "b");
        b.level = 4;
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_inequality_on_page_or_pi() {
        let a = entry("LOG_1", 3, "PPN1", "a");
        assert_ne!(a, entry("LOG_1", 4, "PPN1", "a"));
        assert_ne!(a, entry("LOG_1", 3, "PPN2", "a"));
        assert_ne!(a, entry("LOG_2", 3, "PPN1", "a"));
    }

    #[test]
    fn test_hash_set_dedup() {
        let mut set = HashSet::new();
        assert!(set.insert(entry("LOG_1", 1, "PPN1", "a").key()));
        assert!(!set.insert(entry("LOG_1", 1, "PPN1", "other").key()));
    }

    #[test]
    fn test_new_entry_view_state_defaults() {
        let e = entry("LOG_1", 1, "PPN1", "a");
        assert!(e.visible);
        assert!(!e.expanded);
        assert!(!e.has_child);
        assert_eq!(e.parent_id, None);
    }
}
