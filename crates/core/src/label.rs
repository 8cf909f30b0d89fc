//! Display labels for TOC entries.
//!
//! A label comes either from a per-docstruct template (a pattern with
//! `{FIELD}` placeholders) or from the `LABEL` -> `MD_TITLE` -> docstruct
//! fallback chain. Every label is produced for the language-agnostic default
//! and for each language the translator knows.

use crate::context::TocContext;
use vitrine_traits::{LabelParam, LabelParamKind, LabelTemplate, TocConfiguration, Translator};
use vitrine_types::fields::{LABEL, MD_SHELFMARK, MD_TITLE};
use vitrine_types::{IndexRecord, MultiLanguageValue};

/// Builds labels from index records. Pure: the output depends only on the
/// record, the configuration and the translator.
#[derive(Debug, Clone, Copy)]
pub struct LabelComposer<'a> {
    config: &'a dyn TocConfiguration,
    translator: &'a dyn Translator,
}

impl<'a> LabelComposer<'a> {
    pub fn new(config: &'a dyn TocConfiguration, translator: &'a dyn Translator) -> Self {
        Self { config, translator }
    }

    pub fn from_context(ctx: &'a TocContext) -> Self {
        Self::new(ctx.config.as_ref(), ctx.translator.as_ref())
    }

    /// Label for a structure element or volume.
    pub fn compose(&self, record: &IndexRecord) -> MultiLanguageValue {
        let docstruct = record.docstruct().unwrap_or_default();
        match self.config.toc_label_template(&docstruct) {
            Some(template) => self.compose_from_template(record, &template, &docstruct),
            None => self.compose_from_fields(record, &docstruct),
        }
    }

    /// Label for a group record: `LABEL`, then shelfmark, then PI.
    pub fn compose_group_label(&self, record: &IndexRecord) -> MultiLanguageValue {
        let label = record.multi_language_value(LABEL);
        if !label.is_empty() {
            return label;
        }
        let shelfmark = record.multi_language_value(MD_SHELFMARK);
        if !shelfmark.is_empty() {
            return shelfmark;
        }
        MultiLanguageValue::new(record.pi().map(|pi| pi.to_string()).unwrap_or_default())
    }

    /// Fields the configured templates read, so queries can request them.
    pub fn required_fields(&self) -> Vec<String> {
        self.config.label_template_fields()
    }

    fn compose_from_template(
        &self,
        record: &IndexRecord,
        template: &LabelTemplate,
        docstruct: &str,
    ) -> MultiLanguageValue {
        let languages = self.translator.languages();
        let mut label = MultiLanguageValue::new(template.master_value());
        label.ensure_languages(languages.iter().map(String::as_str));

        for param in &template.params {
            let mut value = self.resolve_param(record, param);
            if value.is_empty() && param.key == LABEL {
                value = record.multi_language_value(MD_TITLE);
                if value.is_empty() {
                    value = self.translated(docstruct);
                }
            }
            if !value.is_empty() {
                value.ensure_languages(languages.iter().map(String::as_str));
                if !param.prefix.is_empty() {
                    value.add_prefix(&self.translated(&param.prefix));
                }
                if !param.suffix.is_empty() {
                    value.add_suffix(&self.translated(&param.suffix));
                }
            }
            label.replace_placeholder(&param.placeholder(), &value);
        }

        label.map_values(|_, text| strip_placeholders(text));
        label
    }

    fn compose_from_fields(&self, record: &IndexRecord, docstruct: &str) -> MultiLanguageValue {
        let mut label = record.multi_language_value(LABEL);
        if label.is_empty() {
            label = record.multi_language_value(MD_TITLE);
        }
        if label.is_empty() {
            return self.translated(docstruct);
        }

        if self.config.add_docstruct_type_to_label() && !docstruct.is_empty() {
            let mut prefix = self.translated(docstruct);
            prefix.map_values(|_, v| format!("{}: ", v));
            label.ensure_languages(self.translator.languages().iter().map(String::as_str));
            label.add_prefix(&prefix);
        }
        label
    }

    fn resolve_param(&self, record: &IndexRecord, param: &LabelParam) -> MultiLanguageValue {
        match param.kind {
            LabelParamKind::Field => {
                MultiLanguageValue::new(record.str_value(&param.key).unwrap_or_default())
            }
            LabelParamKind::MultiLanguageField => record.multi_language_value(&param.key),
            LabelParamKind::TranslatedField => match record.str_value(&param.key) {
                Some(raw) => self.translated(&raw),
                None => MultiLanguageValue::default(),
            },
        }
    }

    /// `key` with a translated variant for every known language.
    fn translated(&self, key: &str) -> MultiLanguageValue {
        let mut value = MultiLanguageValue::new(key);
        if key.is_empty() {
            return value;
        }
        for lang in self.translator.languages() {
            let text = self.translator.translate(key, &lang);
            value.set_value(lang, text);
        }
        value
    }
}

/// Drops `{KEY}` placeholders no param resolved.
fn strip_placeholders(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('{') {
        let tail = &rest[start + 1..];
        match tail.find(['{', '}']) {
            Some(end) if tail[end..].starts_with('}') => {
                out.push_str(&rest[..start]);
                rest = &tail[end + 1..];
            }
            _ => {
                out.push_str(&rest[..=start]);
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}
