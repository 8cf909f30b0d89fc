//! Read-only configuration consumed by the TOC engine.

use crate::index::SortField;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use vitrine_types::fields::{CURRENTNOSORT, LABEL};

/// Key used for per-docstruct settings that apply when no specific entry exists.
pub const DEFAULT_DOCSTRUCT: &str = "_DEFAULT";

/// How a label template parameter obtains its value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LabelParamKind {
    /// The plain field value.
    #[default]
    Field,
    /// The field plus its `_LANG_XX` variants.
    MultiLanguageField,
    /// The plain field value, run through the translator for every language.
    TranslatedField,
}

/// One `{key}` placeholder of a label template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelParam {
    pub key: String,
    pub prefix: String,
    pub suffix: String,
    #[serde(rename = "type")]
    pub kind: LabelParamKind,
}

impl LabelParam {
    pub fn new(key: impl Into<String>, kind: LabelParamKind) -> Self {
        Self {
            key: key.into(),
            kind,
            ..Default::default()
        }
    }

    pub fn with_affixes(mut self, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self.suffix = suffix.into();
        self
    }

    pub fn placeholder(&self) -> String {
        format!("{{{}}}", self.key)
    }
}

/// A label pattern with `{FIELD}` placeholders and the parameters that fill them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelTemplate {
    pub master_value: String,
    pub params: Vec<LabelParam>,
}

impl LabelTemplate {
    /// Master pattern, `{LABEL}` when none is configured.
    pub fn master_value(&self) -> String {
        if self.master_value.trim().is_empty() {
            format!("{{{}}}", LABEL)
        } else {
            self.master_value.clone()
        }
    }
}

/// Read-only accessors for everything the TOC engine is configurable by.
pub trait TocConfiguration: Send + Sync + Debug {
    /// Volumes per page when listing an anchor; `<= 0` means unpaginated.
    fn toc_volumes_per_page(&self) -> i64;

    /// Deepest level that is visible right after the tree is built.
    fn toc_visible_level(&self) -> u32;

    /// Sibling runs longer than this are collapsed behind their parent; 0 disables.
    fn collapse_length_threshold(&self) -> usize;

    /// Shallowest level eligible for length-based collapsing.
    fn lowest_level_to_collapse_for_length(&self) -> u32;

    /// Extra fields linking a record to its ancestor (besides `PI_PARENT`).
    fn ancestor_identifier_fields(&self) -> Vec<String>;

    fn toc_label_template(&self, docstruct: &str) -> Option<LabelTemplate>;

    /// Every field referenced by any configured label template.
    fn label_template_fields(&self) -> Vec<String> {
        Vec::new()
    }

    fn volume_sort_fields(&self, docstruct: &str) -> Vec<SortField>;

    fn volume_grouping_field(&self, docstruct: &str) -> Option<String>;

    /// Prefix fallback labels with the translated docstruct type.
    fn add_docstruct_type_to_label(&self) -> bool;
}

/// A configuration held entirely in memory, typically deserialized from JSON.
///
/// Per-docstruct maps fall back to the `_DEFAULT` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaticTocConfiguration {
    pub volumes_per_page: i64,
    pub visible_level: u32,
    pub collapse_length_threshold: usize,
    pub lowest_level_to_collapse_for_length: u32,
    pub ancestor_identifier_fields: Vec<String>,
    pub label_templates: HashMap<String, LabelTemplate>,
    pub volume_sort_fields: HashMap<String, Vec<SortField>>,
    pub volume_grouping_fields: HashMap<String, String>,
    pub add_docstruct_type_to_label: bool,
}

impl Default for StaticTocConfiguration {
    fn default() -> Self {
        Self {
            volumes_per_page: 0,
            visible_level: 2,
            collapse_length_threshold: 0,
            lowest_level_to_collapse_for_length: 1,
            ancestor_identifier_fields: Vec::new(),
            label_templates: HashMap::new(),
            volume_sort_fields: HashMap::new(),
            volume_grouping_fields: HashMap::new(),
            add_docstruct_type_to_label: false,
        }
    }
}

impl StaticTocConfiguration {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn lookup<'a, T>(map: &'a HashMap<String, T>, docstruct: &str) -> Option<&'a T> {
        map.get(docstruct).or_else(|| map.get(DEFAULT_DOCSTRUCT))
    }
}

impl TocConfiguration for StaticTocConfiguration {
    fn toc_volumes_per_page(&self) -> i64 {
        self.volumes_per_page
    }

    fn toc_visible_level(&self) -> u32 {
        self.visible_level
    }

    fn collapse_length_threshold(&self) -> usize {
        self.collapse_length_threshold
    }

    fn lowest_level_to_collapse_for_length(&self) -> u32 {
        self.lowest_level_to_collapse_for_length
    }

    fn ancestor_identifier_fields(&self) -> Vec<String> {
        self.ancestor_identifier_fields.clone()
    }

    fn toc_label_template(&self, docstruct: &str) -> Option<LabelTemplate> {
        Self::lookup(&self.label_templates, docstruct).cloned()
    }

    fn label_template_fields(&self) -> Vec<String> {
        self.label_templates
            .values()
            .flat_map(|t| t.params.iter().map(|p| p.key.clone()))
            .unique()
            .collect()
    }

    fn volume_sort_fields(&self, docstruct: &str) -> Vec<SortField> {
        Self::lookup(&self.volume_sort_fields, docstruct)
            .filter(|fields| !fields.is_empty())
            .cloned()
            .unwrap_or_else(|| vec![SortField::asc(CURRENTNOSORT)])
    }

    fn volume_grouping_field(&self, docstruct: &str) -> Option<String> {
        Self::lookup(&self.volume_grouping_fields, docstruct)
            .filter(|f| !f.trim().is_empty())
            .cloned()
    }

    fn add_docstruct_type_to_label(&self) -> bool {
        self.add_docstruct_type_to_label
    }
}
