//! Recursive TOC population for standalone records and volumes.
//!
//! Two kinds of children are followed:
//! - **real** children live inside the same record (`PI_TOPSTRUCT` matches)
//!   and point at their parent through `IDDOC_PARENT`;
//! - **loose** children are separate records linked through an ancestor
//!   identifier field (`PI_PARENT` or a configured one).
//!
//! Entries are emitted in depth-first pre-order, so the level sequence of the
//! target list encodes the tree.

use crate::MAX_TREE_DEPTH;
use crate::context::TocContext;
use crate::error::TocError;
use crate::label::LabelComposer;
use log::{debug, trace, warn};
use std::collections::{HashMap, HashSet};
use vitrine_traits::{Clause, PageType, PermissionMap, Privilege, Query, SearchRequest, SortField};
use vitrine_types::fields::{
    CURRENTNO, CURRENTNOSORT, DOCSTRCT, DOCTYPE, DOCTYPE_DOCSTRCT, FILENAME_HTML, IDDOC,
    IDDOC_PARENT, ISANCHOR, ISWORK, MD_TITLE, MIMETYPE, NUMPAGES, PI, PI_TOPSTRUCT, THUMBNAIL,
    THUMBPAGENO, THUMBPAGENOLABEL,
};
use vitrine_types::{EntryKey, Iddoc, IndexRecord, MultiLanguageValue, TocEntry};

/// Builds a TOC entry from an index record.
///
/// Returns `None` for records without `IDDOC` or PI; those cannot be linked.
pub(crate) fn entry_from_record(
    ctx: &TocContext,
    record: &IndexRecord,
    label: MultiLanguageValue,
    level: u32,
    pdf_allowed: bool,
    mime_type: Option<&str>,
) -> Option<TocEntry> {
    let (Some(iddoc), Some(pi)) = (record.iddoc(), record.pi_topstruct()) else {
        warn!("Skipping index document without IDDOC or PI: {:?}", record);
        return None;
    };
    let anchor_or_group = record.is_anchor() || record.is_group();
    let has_images =
        record.contains(THUMBNAIL) || record.i64_value(NUMPAGES).is_some_and(|n| n > 0);
    let page_no = record.i64_value(THUMBPAGENO);
    let logid = record.logid();
    let url = ctx.urls.build_url(
        &pi,
        page_no,
        logid.as_ref(),
        PageType::determine(anchor_or_group, has_images),
    );

    let mut entry = TocEntry::new(label, iddoc, pi, level)
        .with_page(page_no, record.str_value(THUMBPAGENOLABEL))
        .with_logid(logid)
        .with_url(url)
        .with_thumbnail_url(ctx.urls.thumbnail_url(record))
        .with_mime_type(record.str_value(MIMETYPE).or_else(|| mime_type.map(str::to_string)))
        .with_docstruct(record.docstruct())
        .with_footer_id(record.str_value(FILENAME_HTML))
        .with_anchor_or_group(anchor_or_group)
        .with_pdf_permission(pdf_allowed)
        .with_images(has_images);

    for field in [DOCSTRCT, CURRENTNO, MD_TITLE] {
        if let Some(value) = record.str_value(field) {
            entry = entry.with_metadata(field, value);
        }
    }
    Some(entry)
}

/// Populates a flat, level-annotated TOC list for one ancestor field.
///
/// One populator is used per ancestor-field candidate. The entry dedup set and
/// the set of visited records live as long as the populator.
pub struct TreePopulator<'a> {
    ctx: &'a TocContext,
    ancestor_field: &'a str,
    requested: &'a Iddoc,
    fields: &'a [String],
    mime_type: Option<&'a str>,
    seen: HashSet<EntryKey>,
    visited: HashSet<Iddoc>,
}

impl<'a> TreePopulator<'a> {
    /// `requested` is the record the TOC was asked for; only its real children are expanded.
    pub fn new(
        ctx: &'a TocContext,
        ancestor_field: &'a str,
        requested: &'a Iddoc,
        fields: &'a [String],
        mime_type: Option<&'a str>,
    ) -> Self {
        Self {
            ctx,
            ancestor_field,
            requested,
            fields,
            mime_type,
            seen: HashSet::new(),
            visited: HashSet::new(),
        }
    }

    /// Appends `current` and its descendants to `target`.
    ///
    /// Loose children are only followed when `add_all_siblings` is set or they lie
    /// on `main_chain_ids`, the path from the requested record up to the top.
    pub fn populate(
        &mut self,
        target: &mut Vec<TocEntry>,
        main_chain_ids: &HashSet<Iddoc>,
        current: &IndexRecord,
        level: u32,
        include_children: bool,
        add_all_siblings: bool,
    ) -> Result<(), TocError> {
        self.seen.extend(target.iter().map(TocEntry::key));
        self.populate_record(target, main_chain_ids, current, level, include_children, add_all_siblings, 0)
    }

    #[allow(clippy::too_many_arguments)]
    fn populate_record(
        &mut self,
        target: &mut Vec<TocEntry>,
        main_chain_ids: &HashSet<Iddoc>,
        current: &IndexRecord,
        level: u32,
        include_children: bool,
        add_all_siblings: bool,
        depth: usize,
    ) -> Result<(), TocError> {
        if depth > MAX_TREE_DEPTH {
            return Err(TocError::DepthLimitExceeded(MAX_TREE_DEPTH));
        }
        let (Some(iddoc), Some(pi)) = (current.iddoc(), current.pi_topstruct()) else {
            warn!("Cannot populate TOC from a document without IDDOC or PI");
            return Ok(());
        };
        if !self.visited.insert(iddoc.clone()) {
            debug!("Record {} already populated, ancestor links form a cycle", iddoc);
            return Ok(());
        }

        let permissions = self.ctx.access.check_all_permissions(&pi, Privilege::DownloadPdf)?;
        let children = if include_children {
            self.real_children(&pi, &iddoc)?
        } else {
            HashMap::new()
        };
        trace!(
            "Populating {} at level {} ({} parents with real children)",
            iddoc,
            level,
            children.len()
        );
        self.add_recursively(target, &children, current, level, &permissions, 0)?;

        for child in self.loose_children(current, &iddoc, &pi)? {
            let Some(child_iddoc) = child.iddoc() else {
                continue;
            };
            if add_all_siblings || main_chain_ids.contains(&child_iddoc) {
                let include = &child_iddoc == self.requested;
                self.populate_record(
                    target,
                    main_chain_ids,
                    &child,
                    level + 1,
                    include,
                    add_all_siblings,
                    depth + 1,
                )?;
            } else {
                trace!("Pruning loose child {} outside the main chain", child_iddoc);
            }
        }
        Ok(())
    }

    /// Emits `record` and, depth-first, its real children. Entries already in
    /// the list are skipped together with their subtree.
    fn add_recursively(
        &mut self,
        target: &mut Vec<TocEntry>,
        children: &HashMap<Iddoc, Vec<IndexRecord>>,
        record: &IndexRecord,
        level: u32,
        permissions: &PermissionMap,
        depth: usize,
    ) -> Result<(), TocError> {
        if depth > MAX_TREE_DEPTH {
            return Err(TocError::DepthLimitExceeded(MAX_TREE_DEPTH));
        }
        let label = LabelComposer::from_context(self.ctx).compose(record);
        let pdf_allowed = permissions.is_granted(record.logid().as_ref());
        let Some(entry) = entry_from_record(self.ctx, record, label, level, pdf_allowed, self.mime_type)
        else {
            return Ok(());
        };
        if !self.seen.insert(entry.key()) {
            trace!("Skipping duplicate TOC entry {:?}", entry.key());
            return Ok(());
        }
        let iddoc = entry.iddoc.clone();
        target.push(entry);

        if let Some(kids) = children.get(&iddoc) {
            for child in kids {
                self.add_recursively(target, children, child, level + 1, permissions, depth + 1)?;
            }
        }
        Ok(())
    }

    /// All structure elements of the record, grouped by their parent's IDDOC.
    fn real_children(
        &self,
        pi: &vitrine_types::Pi,
        iddoc: &Iddoc,
    ) -> Result<HashMap<Iddoc, Vec<IndexRecord>>, TocError> {
        let query = Query::new()
            .field_eq(PI_TOPSTRUCT, pi.as_str())
            .field_eq(DOCTYPE, DOCTYPE_DOCSTRCT)
            .field_ne(IDDOC, iddoc.as_str());
        let request = SearchRequest::new(query)
            .with_sort(vec![SortField::asc(THUMBPAGENO), SortField::asc(IDDOC)])
            .with_fields(self.fields.to_vec());
        let hits = self.ctx.index.find_many(&request)?;

        let mut map: HashMap<Iddoc, Vec<IndexRecord>> = HashMap::new();
        for doc in hits.records {
            let (Some(own), Some(parent)) = (doc.iddoc(), doc.str_value(IDDOC_PARENT)) else {
                continue;
            };
            let parent = Iddoc::from(parent);
            if parent == own {
                warn!("Structure element {} names itself as parent", own);
                continue;
            }
            map.entry(parent).or_default().push(doc);
        }
        debug!("Found {} structure elements below {}", map.values().map(Vec::len).sum::<usize>(), pi);
        Ok(map)
    }

    /// Top-level records linking to `record` through the ancestor field.
    fn loose_children(
        &self,
        record: &IndexRecord,
        iddoc: &Iddoc,
        pi: &vitrine_types::Pi,
    ) -> Result<Vec<IndexRecord>, TocError> {
        let link = if links_by_iddoc(self.ancestor_field) {
            iddoc.to_string()
        } else {
            match record.str_value(PI) {
                Some(own_pi) => own_pi,
                None => pi.to_string(),
            }
        };
        let query = Query::new()
            .field_eq(self.ancestor_field, link)
            .and(Clause::AnyOf(vec![
                Clause::equals(ISWORK, "true"),
                Clause::equals(ISANCHOR, "true"),
            ]))
            .field_ne(IDDOC, iddoc.as_str());
        let request = SearchRequest::new(query)
            .with_sort(vec![SortField::asc(CURRENTNOSORT)])
            .with_fields(self.fields.to_vec());
        Ok(self.ctx.index.find_many(&request)?.records)
    }
}

/// Ancestor fields holding an `IDDOC` link by internal id, all others by PI.
pub(crate) fn links_by_iddoc(field: &str) -> bool {
    field.contains(IDDOC)
}
