//! Record classification and the index queries behind a TOC.
//!
//! A requested record is one of three kinds, checked in this order:
//! 1. a **group** (`DOCTYPE:GROUP`), listing its member records;
//! 2. an **anchor** (`ISANCHOR:true`), listing a page of its volumes, optionally
//!    split into named groups;
//! 3. anything else, whose full tree is populated from the top-most ancestor.

use crate::MAX_TREE_DEPTH;
use crate::context::TocContext;
use crate::error::TocError;
use crate::label::LabelComposer;
use crate::populate::{TreePopulator, entry_from_record, links_by_iddoc};
use crate::toc::TocGroups;
use itertools::Itertools;
use log::{debug, trace, warn};
use std::collections::HashSet;
use vitrine_traits::{Privilege, Query, SearchRequest, SortField};
use vitrine_types::fields::{
    GROUPTYPE, IDDOC, IDDOC_PARENT, ISWORK, PI, PI_PARENT, PREFIX_GROUPID, PREFIX_GROUPORDER,
    REQUIRED_FIELDS,
};
use vitrine_types::{DEFAULT_GROUP, Iddoc, IndexRecord, TocEntry};

/// Volume limit for anchors when pagination is disabled.
pub const UNBOUNDED_VOLUME_LIMIT: usize = 10_000;

/// The fetched TOC: named groups of flat, level-annotated entries.
#[derive(Debug, Clone)]
pub struct TocData {
    pub groups: TocGroups,
    /// Number of entries for pagination (total volumes for anchors).
    pub total_size: usize,
}

impl TocData {
    /// Only the default group, empty.
    pub fn empty() -> Self {
        let mut groups = TocGroups::new();
        groups.insert(DEFAULT_GROUP.to_string(), Vec::new());
        Self {
            groups,
            total_size: 0,
        }
    }

    fn single(entries: Vec<TocEntry>, total_size: usize) -> Self {
        let mut data = Self::empty();
        data.groups.insert(DEFAULT_GROUP.to_string(), entries);
        data.total_size = total_size;
        data
    }
}

pub struct RecordFetcher<'a> {
    ctx: &'a TocContext,
}

impl<'a> RecordFetcher<'a> {
    pub fn new(ctx: &'a TocContext) -> Self {
        Self { ctx }
    }

    /// Fetches the TOC entries for `root`.
    ///
    /// `current_page` (1-based) and `items_per_page` only affect anchors;
    /// `items_per_page <= 0` lists every volume.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `root` has no `IDDOC` or `current_page` is 0.
    /// Index and access failures are propagated.
    pub fn fetch(
        &self,
        root: &IndexRecord,
        add_all_siblings: bool,
        mime_type: Option<&str>,
        current_page: usize,
        items_per_page: i64,
    ) -> Result<TocData, TocError> {
        let Some(iddoc) = root.iddoc() else {
            return Err(TocError::InvalidArgument("root record has no IDDOC".to_string()));
        };
        if current_page < 1 {
            return Err(TocError::InvalidArgument(format!(
                "page must be 1 or greater, got {}",
                current_page
            )));
        }

        let fields = self.field_list(root.docstruct().as_deref().unwrap_or_default());
        let query = Query::new().field_eq(IDDOC, iddoc.as_str());
        let Some(record) = self.ctx.index.find_one(&query, &fields)? else {
            debug!("No index document for IDDOC {}, TOC stays empty", iddoc);
            return Ok(TocData::empty());
        };

        if record.is_group() {
            debug!("Building group TOC for {}", iddoc);
            self.fetch_group(&record, &fields, mime_type)
        } else if record.is_anchor() {
            debug!("Building anchor TOC for {} (page {})", iddoc, current_page);
            self.fetch_anchor(&record, &fields, mime_type, current_page, items_per_page)
        } else {
            debug!("Building volume TOC for {}", iddoc);
            self.fetch_volume_tree(&record, &iddoc, &fields, add_all_siblings, mime_type)
        }
    }

    /// Fields requested from the index for every document of the TOC.
    fn field_list(&self, docstruct: &str) -> Vec<String> {
        let config = self.ctx.config.as_ref();
        REQUIRED_FIELDS
            .iter()
            .map(|f| f.to_string())
            .chain(config.ancestor_identifier_fields())
            .chain(LabelComposer::from_context(self.ctx).required_fields())
            .chain(config.volume_grouping_field(docstruct))
            .chain(config.volume_sort_fields(docstruct).into_iter().map(|s| s.field))
            .unique()
            .collect()
    }

    fn fetch_group(
        &self,
        record: &IndexRecord,
        fields: &[String],
        mime_type: Option<&str>,
    ) -> Result<TocData, TocError> {
        let composer = LabelComposer::from_context(self.ctx);
        let mut entries = Vec::new();
        let Some(pi) = record.pi() else {
            warn!("Group record without PI: {:?}", record.iddoc());
            return Ok(TocData::empty());
        };

        let pdf = self.ctx.access.check_permission(&pi, None, Privilege::DownloadPdf)?;
        let label = composer.compose_group_label(record);
        entries.extend(entry_from_record(self.ctx, record, label, 0, pdf, mime_type));

        match record.str_value(GROUPTYPE) {
            Some(group_type) => {
                let query = Query::new().field_eq(format!("{}{}", PREFIX_GROUPID, group_type), pi.as_str());
                let request = SearchRequest::new(query)
                    .with_sort(vec![SortField::asc(format!("{}{}", PREFIX_GROUPORDER, group_type))])
                    .with_fields(fields.to_vec());
                let members = self.ctx.index.find_many(&request)?;
                debug!("Group {} has {} members", pi, members.total);

                for member in &members.records {
                    let Some(member_pi) = member.pi() else {
                        warn!("Skipping group member without PI: {:?}", member.iddoc());
                        continue;
                    };
                    let pdf = self
                        .ctx
                        .access
                        .check_permission(&member_pi, None, Privilege::DownloadPdf)?;
                    let label = composer.compose(member);
                    entries.extend(entry_from_record(self.ctx, member, label, 1, pdf, mime_type));
                }
            }
            None => warn!("Group {} has no {}, listing no members", pi, GROUPTYPE),
        }

        let total = entries.len();
        Ok(TocData::single(entries, total))
    }

    fn fetch_anchor(
        &self,
        record: &IndexRecord,
        fields: &[String],
        mime_type: Option<&str>,
        current_page: usize,
        items_per_page: i64,
    ) -> Result<TocData, TocError> {
        let config = self.ctx.config.as_ref();
        let composer = LabelComposer::from_context(self.ctx);
        let (Some(iddoc), Some(pi)) = (record.iddoc(), record.pi()) else {
            warn!("Anchor record without IDDOC or PI");
            return Ok(TocData::empty());
        };
        let docstruct = record.docstruct().unwrap_or_default();

        let mut data = TocData::empty();
        let pdf = self.ctx.access.check_permission(&pi, None, Privilege::DownloadPdf)?;
        if let Some(entry) = entry_from_record(self.ctx, record, composer.compose(record), 0, pdf, mime_type)
        {
            data.groups.entry(DEFAULT_GROUP.to_string()).or_default().push(entry);
        }

        let (offset, limit) = match usize::try_from(items_per_page) {
            Ok(ipp) if ipp > 0 => {
                let offset = (current_page - 1).checked_mul(ipp).ok_or_else(|| {
                    TocError::InvalidArgument(format!(
                        "page {} with {} volumes per page is out of range",
                        current_page, ipp
                    ))
                })?;
                (offset, ipp)
            }
            _ => (0, UNBOUNDED_VOLUME_LIMIT),
        };
        let query = Query::new()
            .field_eq(IDDOC_PARENT, iddoc.as_str())
            .field_eq(ISWORK, "true");
        let request = SearchRequest::new(query)
            .with_page(offset, limit)
            .with_sort(config.volume_sort_fields(&docstruct))
            .with_fields(fields.to_vec());
        let volumes = self.ctx.index.find_many(&request)?;
        debug!(
            "Anchor {} has {} volumes, showing {} from offset {}",
            pi,
            volumes.total,
            volumes.records.len(),
            offset
        );

        let grouping_field = config.volume_grouping_field(&docstruct);
        for volume in &volumes.records {
            let Some(volume_pi) = volume.pi() else {
                warn!("Skipping volume without PI: {:?}", volume.iddoc());
                continue;
            };
            if !self.ctx.access.check_permission(&volume_pi, None, Privilege::List)? {
                trace!("Volume {} not listable, skipped", volume_pi);
                continue;
            }
            let pdf = self
                .ctx
                .access
                .check_permission(&volume_pi, None, Privilege::DownloadPdf)?;
            let Some(entry) = entry_from_record(self.ctx, volume, composer.compose(volume), 1, pdf, mime_type)
            else {
                continue;
            };
            let group = grouping_field
                .as_deref()
                .and_then(|field| volume.str_value(field))
                .unwrap_or_else(|| DEFAULT_GROUP.to_string());
            data.groups.entry(group).or_default().push(entry);
        }

        data.total_size = volumes.total;
        Ok(data)
    }

    fn fetch_volume_tree(
        &self,
        record: &IndexRecord,
        requested: &Iddoc,
        fields: &[String],
        add_all_siblings: bool,
        mime_type: Option<&str>,
    ) -> Result<TocData, TocError> {
        let mut candidates = self.ctx.config.ancestor_identifier_fields();
        if !candidates.iter().any(|f| f == PI_PARENT) {
            candidates.push(PI_PARENT.to_string());
        }

        let mut best: Vec<TocEntry> = Vec::new();
        for field in &candidates {
            let (top, main_chain) = self.ancestor_chain(record, field, fields)?;
            let include_children = top.iddoc().as_ref() == Some(requested);
            let mut tree = Vec::new();
            TreePopulator::new(self.ctx, field, requested, fields, mime_type).populate(
                &mut tree,
                &main_chain,
                &top,
                0,
                include_children,
                add_all_siblings,
            )?;
            debug!("Ancestor field {} yields {} entries", field, tree.len());
            if tree.len() > best.len() {
                best = tree;
            }
        }

        let total = best.len();
        Ok(TocData::single(best, total))
    }

    /// Walks up `field` links from `record`, returning the top-most ancestor
    /// and the IDDOCs of every record on the way (including both ends).
    fn ancestor_chain(
        &self,
        record: &IndexRecord,
        field: &str,
        fields: &[String],
    ) -> Result<(IndexRecord, HashSet<Iddoc>), TocError> {
        let mut chain: HashSet<Iddoc> = record.iddoc().into_iter().collect();
        let mut current = record.clone();
        let lookup_field = if links_by_iddoc(field) { IDDOC } else { PI };

        while let Some(link) = current.str_value(field) {
            if chain.len() > MAX_TREE_DEPTH {
                return Err(TocError::DepthLimitExceeded(MAX_TREE_DEPTH));
            }
            let query = Query::new().field_eq(lookup_field, link.as_str());
            let Some(parent) = self.ctx.index.find_one(&query, fields)? else {
                trace!("Ancestor {}:{} not in index, chain ends", lookup_field, link);
                break;
            };
            let Some(parent_iddoc) = parent.iddoc() else {
                break;
            };
            if !chain.insert(parent_iddoc.clone()) {
                warn!("Ancestor cycle via {} at {}, stopping", field, parent_iddoc);
                break;
            }
            current = parent;
        }
        Ok((current, chain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vitrine_traits::{
        AccessChecker, AllowAll, InMemoryAccessChecker, InMemoryIndex, MessageCatalog,
        PatternUrlBuilder, StaticTocConfiguration,
    };

    fn context(
        records: Vec<IndexRecord>,
        config: StaticTocConfiguration,
        access: Arc<dyn AccessChecker>,
    ) -> TocContext {
        let _ = env_logger::builder().is_test(true).try_init();
        TocContext::new(
            Arc::new(InMemoryIndex::from_records(records)),
            Arc::new(config),
            access,
            Arc::new(PatternUrlBuilder::default()),
            Arc::new(MessageCatalog::new()),
        )
    }

    fn anchor() -> IndexRecord {
        IndexRecord::new()
            .with("IDDOC", 100)
            .with("PI", "ANCHOR")
            .with("ISANCHOR", true)
            .with("DOCSTRCT", "periodical")
            .with("LABEL", "Periodical")
    }

    fn volume(iddoc: i64, pi: &str, no: i64) -> IndexRecord {
        IndexRecord::new()
            .with("IDDOC", iddoc)
            .with("IDDOC_PARENT", "100")
            .with("PI", pi)
            .with("PI_TOPSTRUCT", pi)
            .with("PI_PARENT", "ANCHOR")
            .with("ISWORK", true)
            .with("DOCTYPE", "DOCSTRCT")
            .with("DOCSTRCT", "volume")
            .with("LOGID", "LOG_0000")
            .with("CURRENTNOSORT", no)
            .with("LABEL", format!("Volume {}", no))
    }

    fn labels(entries: &[TocEntry]) -> Vec<String> {
        entries.iter().map(|e| e.label.default_value().to_string()).collect()
    }

    #[test]
    fn test_argument_errors() {
        let ctx = context(vec![], StaticTocConfiguration::default(), Arc::new(AllowAll));
        let fetcher = RecordFetcher::new(&ctx);
        let no_iddoc = IndexRecord::new().with("PI", "PPN1");
        assert!(matches!(
            fetcher.fetch(&no_iddoc, false, None, 1, 0),
            Err(TocError::InvalidArgument(_))
        ));
        assert!(matches!(
            fetcher.fetch(&anchor(), false, None, 0, 0),
            Err(TocError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_missing_document_gives_empty_toc() {
        let ctx = context(vec![], StaticTocConfiguration::default(), Arc::new(AllowAll));
        let data = RecordFetcher::new(&ctx).fetch(&anchor(), false, None, 1, 0).unwrap();
        assert_eq!(data.total_size, 0);
        assert_eq!(data.groups.len(), 1);
        assert!(data.groups[DEFAULT_GROUP].is_empty());
    }

    #[test]
    fn test_anchor_volume_grouping() {
        let config = StaticTocConfiguration {
            volume_grouping_fields: [("periodical".to_string(), "MD_SERIES".to_string())].into(),
            ..Default::default()
        };
        let records = vec![
            anchor(),
            volume(101, "V1", 1).with("MD_SERIES", "A"),
            volume(102, "V2", 2),
            volume(103, "V3", 3).with("MD_SERIES", "A"),
        ];
        let ctx = context(records, config, Arc::new(AllowAll));
        let data = RecordFetcher::new(&ctx).fetch(&anchor(), false, None, 1, 0).unwrap();

        let names: Vec<_> = data.groups.keys().cloned().collect();
        assert_eq!(names, vec![DEFAULT_GROUP, "A"]);
        assert_eq!(labels(&data.groups[DEFAULT_GROUP]), vec!["Periodical", "Volume 2"]);
        assert_eq!(labels(&data.groups["A"]), vec!["Volume 1", "Volume 3"]);
        assert_eq!(data.groups[DEFAULT_GROUP][0].level, 0);
        assert!(data.groups["A"].iter().all(|e| e.level == 1));
        assert_eq!(data.total_size, 3);
    }

    #[test]
    fn test_anchor_pagination_and_list_permission() {
        let access = InMemoryAccessChecker::new();
        access.deny_record("V4", Privilege::List);
        let mut records = vec![anchor()];
        records.extend((1..=6).map(|n| volume(100 + n, &format!("V{}", n), n)));
        let ctx = context(records, StaticTocConfiguration::default(), Arc::new(access));
        let fetcher = RecordFetcher::new(&ctx);

        let page2 = fetcher.fetch(&anchor(), false, None, 2, 2).unwrap();
        assert_eq!(labels(&page2.groups[DEFAULT_GROUP]), vec!["Periodical", "Volume 3"]);
        assert_eq!(page2.total_size, 6);

        let all = fetcher.fetch(&anchor(), false, None, 1, 0).unwrap();
        assert_eq!(all.groups[DEFAULT_GROUP].len(), 6);
    }

    #[test]
    fn test_anchor_page_offset_overflow_is_rejected() {
        let records = vec![anchor(), volume(101, "V1", 1)];
        let ctx = context(records, StaticTocConfiguration::default(), Arc::new(AllowAll));
        let fetcher = RecordFetcher::new(&ctx);
        assert!(matches!(
            fetcher.fetch(&anchor(), false, None, usize::MAX, 2),
            Err(TocError::InvalidArgument(_))
        ));
        let unbounded = fetcher.fetch(&anchor(), false, None, usize::MAX, 0).unwrap();
        assert_eq!(unbounded.total_size, 1);
    }

    #[test]
    fn test_group_toc() {
        let group = IndexRecord::new()
            .with("IDDOC", 500)
            .with("PI", "SERIES1")
            .with("DOCTYPE", "GROUP")
            .with("GROUPTYPE", "SERIES")
            .with("MD_SHELFMARK", "Cod. 1");
        let member = |iddoc: i64, pi: &str, order: i64| {
            IndexRecord::new()
                .with("IDDOC", iddoc)
                .with("PI", pi)
                .with("ISWORK", true)
                .with("GROUPID_SERIES", "SERIES1")
                .with("GROUPORDER_SERIES", order)
                .with("LABEL", pi)
        };
        let access = InMemoryAccessChecker::new();
        access.deny_record("M2", Privilege::DownloadPdf);
        let ctx = context(
            vec![
                group.clone(),
                member(501, "M2", 2).with("THUMBNAIL", "1.jpg"),
                member(502, "M1", 1),
            ],
            StaticTocConfiguration::default(),
            Arc::new(access),
        );
        let data = RecordFetcher::new(&ctx).fetch(&group, false, None, 1, 0).unwrap();
        let entries = &data.groups[DEFAULT_GROUP];

        assert_eq!(labels(entries), vec!["Cod. 1", "M1", "M2"]);
        assert!(entries[0].anchor_or_group);
        assert_eq!(entries[1].level, 1);
        assert!(entries[1].thumbnail_url.is_none());
        assert!(entries[2].thumbnail_url.is_some());
        assert!(entries[1].access_permission_pdf);
        assert!(!entries[2].access_permission_pdf);
        assert_eq!(data.total_size, 3);
    }

    #[test]
    fn test_volume_tree_picks_largest_candidate() {
        // Only the requested volume links to SERIES, both volumes link to ANCHOR.
        let config = StaticTocConfiguration {
            ancestor_identifier_fields: vec!["MD_ANCESTOR".to_string()],
            ..Default::default()
        };
        let series = IndexRecord::new()
            .with("IDDOC", 1)
            .with("PI", "SERIES")
            .with("ISANCHOR", true)
            .with("LABEL", "Series");
        let requested = volume(2, "VOL", 1)
            .with("MD_ANCESTOR", "SERIES")
            .with("PI_PARENT", "ANCHOR");
        let sibling = volume(3, "SIB", 2);
        let section = IndexRecord::new()
            .with("IDDOC", 4)
            .with("IDDOC_PARENT", "2")
            .with("PI_TOPSTRUCT", "VOL")
            .with("DOCTYPE", "DOCSTRCT")
            .with("LOGID", "LOG_1")
            .with("THUMBPAGENO", 5)
            .with("LABEL", "Chapter");
        let ctx = context(
            vec![anchor(), series, requested.clone(), sibling, section],
            config,
            Arc::new(AllowAll),
        );

        let data = RecordFetcher::new(&ctx).fetch(&requested, true, None, 1, 0).unwrap();
        assert_eq!(labels(&data.groups[DEFAULT_GROUP]), vec!["Periodical", "Volume 1", "Chapter", "Volume 2"]);
        assert_eq!(data.total_size, 4);
    }

    #[test]
    fn test_ancestor_chain_stops_on_cycle() {
        let a = volume(1, "A", 1).with("MD_ANCESTOR", "B");
        let b = volume(2, "B", 2).with("MD_ANCESTOR", "A");
        let ctx = context(vec![a.clone(), b], StaticTocConfiguration::default(), Arc::new(AllowAll));
        let (top, chain) = RecordFetcher::new(&ctx).ancestor_chain(&a, "MD_ANCESTOR", &[]).unwrap();
        assert_eq!(top.pi().map(|p| p.to_string()).as_deref(), Some("B"));
        assert_eq!(chain.len(), 2);
    }
}
