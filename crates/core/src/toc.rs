//! The TOC container: named groups of entries plus their view state.
//!
//! Entries are stored flat in depth-first pre-order; the tree is implied by the
//! level sequence. Building the tree assigns ids, parents, `has_child` and the
//! initial visibility. Afterwards entries are expanded or collapsed one
//! subtree at a time, either directly or through the pending request/apply
//! cycle a UI round-trip needs.
//!
//! All state sits behind one mutex, so a `Toc` can be shared between threads.
//! Readers get cloned snapshots.

use crate::MAX_TREE_DEPTH;
use crate::context::TocContext;
use crate::error::TocError;
use crate::fetch::RecordFetcher;
use indexmap::IndexMap;
use log::{debug, trace};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use vitrine_traits::TocConfiguration;
use vitrine_types::{DEFAULT_GROUP, IndexRecord, MultiLanguageValue, Pi, TocEntry};

/// Group name to entries, default group first.
pub type TocGroups = IndexMap<String, Vec<TocEntry>>;

#[derive(Debug)]
struct TocState {
    groups: TocGroups,
    built: bool,
    total_size: usize,
    current_page: usize,
    max_depth: u32,
    pending_expand: Option<usize>,
    pending_collapse: Option<usize>,
    active: Option<usize>,
}

impl TocState {
    fn new() -> Self {
        let mut groups = TocGroups::new();
        groups.insert(DEFAULT_GROUP.to_string(), Vec::new());
        Self {
            groups,
            built: false,
            total_size: 0,
            current_page: 1,
            max_depth: 0,
            pending_expand: None,
            pending_collapse: None,
            active: None,
        }
    }

    fn default_group_mut(&mut self) -> &mut Vec<TocEntry> {
        self.groups.entry(DEFAULT_GROUP.to_string()).or_default()
    }

    fn build(&mut self, config: &dyn TocConfiguration) {
        if self.built {
            return;
        }
        let visible_level = config.toc_visible_level();
        let mut max_depth = 0;
        for entries in self.groups.values_mut() {
            max_depth = max_depth.max(build_group(entries, visible_level));
        }
        collapse_for_length(
            self.default_group_mut(),
            config.collapse_length_threshold(),
            config.lowest_level_to_collapse_for_length(),
        );
        self.max_depth = max_depth;
        self.built = true;
        debug!(
            "Built TOC tree: {} groups, max depth {}",
            self.groups.len(),
            max_depth
        );
    }

    /// Expands or collapses entry `id` of the default group and makes it active.
    fn toggle(&mut self, id: usize, expand: bool) -> Result<TocEntry, TocError> {
        let entries = self.default_group_mut();
        if id >= entries.len() {
            return Err(TocError::EntryNotFound {
                group: DEFAULT_GROUP.to_string(),
                index: id,
            });
        }
        if expand {
            expand_subtree(entries, id, 0);
        } else {
            collapse_subtree(entries, id);
        }
        entries[id].expanded = expand;
        let entry = entries[id].clone();
        self.active = Some(id);
        Ok(entry)
    }
}

/// A table of contents shared by the views rendering it.
#[derive(Debug)]
pub struct Toc {
    config: Arc<dyn TocConfiguration>,
    state: Mutex<TocState>,
}

impl Toc {
    pub fn new(config: Arc<dyn TocConfiguration>) -> Self {
        Self {
            config,
            state: Mutex::new(TocState::new()),
        }
    }

    /// Creates a container holding `groups`, unbuilt.
    pub fn with_groups(config: Arc<dyn TocConfiguration>, groups: TocGroups, total_size: usize) -> Self {
        let toc = Self::new(config);
        toc.replace_groups(groups, total_size);
        toc
    }

    // Every mutation leaves the entries structurally valid, so a poisoned
    // lock still guards usable state.
    fn lock(&self) -> MutexGuard<'_, TocState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetches the TOC of `root` and replaces the content of this container.
    ///
    /// The lock is held for the whole fetch, so concurrent `generate` calls
    /// run one after the other. The tree is left unbuilt.
    pub fn generate(
        &self,
        ctx: &TocContext,
        root: &IndexRecord,
        add_all_siblings: bool,
        mime_type: Option<&str>,
        current_page: usize,
    ) -> Result<(), TocError> {
        let mut state = self.lock();
        let data = RecordFetcher::new(ctx).fetch(
            root,
            add_all_siblings,
            mime_type,
            current_page,
            self.config.toc_volumes_per_page(),
        )?;
        debug!(
            "Generated TOC with {} groups, total size {}",
            data.groups.len(),
            data.total_size
        );
        *state = TocState::new();
        state.current_page = current_page;
        state.total_size = data.total_size;
        for (name, entries) in data.groups {
            state.groups.insert(name, entries);
        }
        Ok(())
    }

    /// Replaces the content with `groups`, keeping the current page.
    pub fn replace_groups(&self, groups: TocGroups, total_size: usize) {
        let mut state = self.lock();
        let current_page = state.current_page;
        *state = TocState::new();
        state.current_page = current_page;
        state.total_size = total_size;
        for (name, entries) in groups {
            state.groups.insert(name, entries);
        }
    }

    /// Builds the tree if it is not built yet.
    pub fn build_tree(&self) {
        self.lock().build(self.config.as_ref());
    }

    pub fn is_tree_built(&self) -> bool {
        self.lock().built
    }

    /// Entries of `group` with their view state, building the tree first.
    pub fn tree_view(&self, group: &str) -> Result<Vec<TocEntry>, TocError> {
        let mut state = self.lock();
        state.build(self.config.as_ref());
        state
            .groups
            .get(group)
            .cloned()
            .ok_or_else(|| TocError::UnknownGroup(group.to_string()))
    }

    /// The visible entries of `group`, in order.
    pub fn visible_entries(&self, group: &str) -> Result<Vec<TocEntry>, TocError> {
        Ok(self
            .tree_view(group)?
            .into_iter()
            .filter(|e| e.visible)
            .collect())
    }

    /// All groups as they are, without building the tree.
    pub fn flat_view(&self) -> TocGroups {
        self.lock().groups.clone()
    }

    pub fn group_names(&self) -> Vec<String> {
        self.lock().groups.keys().cloned().collect()
    }

    /// Deepest level in any group, building the tree first.
    pub fn max_depth(&self) -> u32 {
        let mut state = self.lock();
        state.build(self.config.as_ref());
        state.max_depth
    }

    /// Number of entries in the default group.
    pub fn len(&self) -> usize {
        self.lock().groups.get(DEFAULT_GROUP).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queues expanding entry `id` of the default group.
    pub fn request_expand(&self, id: usize) {
        trace!("Expand requested for entry {}", id);
        self.lock().pending_expand = Some(id);
    }

    /// Queues collapsing entry `id` of the default group.
    pub fn request_collapse(&self, id: usize) {
        trace!("Collapse requested for entry {}", id);
        self.lock().pending_collapse = Some(id);
    }

    /// Applies the queued action, expand before collapse, and returns the
    /// entry it acted on. `Ok(None)` when nothing is queued.
    ///
    /// A queued collapse stays queued while an expand is applied.
    pub fn apply_pending_action(&self) -> Result<Option<TocEntry>, TocError> {
        let mut state = self.lock();
        state.build(self.config.as_ref());

        let (id, expand) = match (state.pending_expand, state.pending_collapse) {
            (Some(id), _) => (id, true),
            (None, Some(id)) => (id, false),
            (None, None) => return Ok(None),
        };
        if expand {
            state.pending_expand = None;
        } else {
            state.pending_collapse = None;
        }

        let entry = state.toggle(id, expand)?;
        debug!("{} entry {}", if expand { "Expanded" } else { "Collapsed" }, id);
        Ok(Some(entry))
    }

    /// Expands entry `id` of the default group right away.
    pub fn expand_subtree(&self, id: usize) -> Result<TocEntry, TocError> {
        self.toggle(id, true)
    }

    /// Collapses entry `id` of the default group right away.
    pub fn collapse_subtree(&self, id: usize) -> Result<TocEntry, TocError> {
        self.toggle(id, false)
    }

    fn toggle(&self, id: usize, expand: bool) -> Result<TocEntry, TocError> {
        let mut state = self.lock();
        state.build(self.config.as_ref());
        state.toggle(id, expand)
    }

    /// Shows every entry of the default group and expands every parent.
    pub fn expand_all(&self) {
        let mut state = self.lock();
        state.build(self.config.as_ref());
        for entry in state.default_group_mut() {
            entry.visible = true;
            if entry.has_child {
                entry.expanded = true;
            }
        }
    }

    /// Leaves only the roots of the default group visible, all collapsed.
    pub fn collapse_all(&self) {
        let mut state = self.lock();
        state.build(self.config.as_ref());
        for entry in state.default_group_mut() {
            if entry.level == 0 {
                entry.expanded = false;
            } else {
                entry.visible = false;
            }
        }
    }

    /// The entry acted on by the last expand or collapse.
    pub fn active_entry(&self) -> Option<TocEntry> {
        let state = self.lock();
        let id = state.active?;
        state.groups.get(DEFAULT_GROUP)?.get(id).cloned()
    }

    pub fn total_toc_size(&self) -> usize {
        self.lock().total_size
    }

    pub fn current_page(&self) -> usize {
        self.lock().current_page
    }

    pub fn set_current_page(&self, page: usize) -> Result<(), TocError> {
        if page < 1 {
            return Err(TocError::InvalidArgument(format!(
                "page must be 1 or greater, got {}",
                page
            )));
        }
        self.lock().current_page = page;
        Ok(())
    }

    /// Number of pages of `toc_volumes_per_page` volumes, at least 1.
    pub fn num_pages(&self) -> usize {
        page_count(self.total_toc_size(), self.config.toc_volumes_per_page())
    }

    /// Label of the first entry belonging to `pi`, in any group.
    pub fn label_for_pi(&self, pi: &Pi) -> Option<MultiLanguageValue> {
        let state = self.lock();
        state
            .groups
            .values()
            .flatten()
            .find(|e| &e.pi == pi)
            .map(|e| e.label.clone())
    }
}

fn page_count(total: usize, items_per_page: i64) -> usize {
    match usize::try_from(items_per_page) {
        Ok(ipp) if ipp > 0 => total.div_ceil(ipp).max(1),
        _ => 1,
    }
}

/// Single forward pass assigning ids, parents, `has_child`, `expanded` and
/// the initial visibility. Returns the deepest level seen.
fn build_group(entries: &mut [TocEntry], visible_level: u32) -> u32 {
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.id = i;
        entry.parent_id = None;
        entry.visible = true;
        entry.expanded = false;
        entry.has_child = false;
    }

    let mut max_depth = 0;
    for i in 0..entries.len() {
        let level = entries[i].level;
        max_depth = max_depth.max(level);
        if i == 0 || level <= entries[i - 1].level {
            continue;
        }

        // First child of entry i - 1.
        let parent = i - 1;
        entries[parent].has_child = true;
        if level > visible_level {
            entries[i].visible = false;
            entries[parent].expanded = false;
        } else {
            entries[parent].expanded = true;
        }
        entries[i].parent_id = Some(parent);

        for next in entries.iter_mut().skip(i + 1) {
            if next.level < level {
                break;
            }
            if next.level == level {
                next.parent_id = Some(parent);
            }
            if next.level > visible_level {
                next.visible = false;
            }
        }
    }
    max_depth
}

/// Hides runs of more than `threshold` siblings behind their collapsed parent.
///
/// Only levels at or below `lowest_level` are considered; the run counted at
/// an entry covers the entry and its following siblings. 0 disables.
fn collapse_for_length(entries: &mut [TocEntry], threshold: usize, lowest_level: u32) {
    if threshold == 0 {
        return;
    }
    let mut hide_level: Option<u32> = None;
    for i in 0..entries.len() {
        let level = entries[i].level;
        if level < lowest_level {
            hide_level = None;
            continue;
        }
        match hide_level {
            Some(hide) if level >= hide => {
                entries[i].visible = false;
                entries[i].expanded = false;
                continue;
            }
            Some(_) => {
                hide_level = None;
                continue;
            }
            None => {}
        }
        if i == 0 {
            continue;
        }
        let run = entries[i..]
            .iter()
            .take_while(|e| e.level >= level)
            .filter(|e| e.level == level)
            .count();
        if run > threshold {
            trace!("Collapsing {} siblings below entry {}", run, i - 1);
            entries[i - 1].expanded = false;
            entries[i].visible = false;
            entries[i].expanded = false;
            hide_level = Some(level);
        }
    }
}

/// Shows the direct children of `parent`, descending into children that were
/// expanded before.
fn expand_subtree(entries: &mut [TocEntry], parent: usize, depth: usize) {
    if depth > MAX_TREE_DEPTH {
        return;
    }
    let parent_level = entries[parent].level;
    let mut i = parent + 1;
    while i < entries.len() && entries[i].level > parent_level {
        if entries[i].level == parent_level + 1 {
            entries[i].visible = true;
            if entries[i].has_child && entries[i].expanded {
                expand_subtree(entries, i, depth + 1);
            }
        }
        i += 1;
    }
}

/// Hides every descendant of `parent`.
fn collapse_subtree(entries: &mut [TocEntry], parent: usize) {
    let parent_level = entries[parent].level;
    for entry in entries[parent + 1..].iter_mut() {
        if entry.level <= parent_level {
            break;
        }
        entry.visible = false;
    }
}
