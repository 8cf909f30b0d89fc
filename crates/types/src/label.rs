use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A display value with optional per-language variants.
///
/// `get` falls back to the language-agnostic default when no variant exists
/// for the requested language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiLanguageValue {
    #[serde(default)]
    default: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    values: BTreeMap<String, String>,
}

impl MultiLanguageValue {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            values: BTreeMap::new(),
        }
    }

    /// Adds or replaces the variant for `lang`.
    pub fn with_value(mut self, lang: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_value(lang, value);
        self
    }

    pub fn set_value(&mut self, lang: impl Into<String>, value: impl Into<String>) {
        self.values.insert(lang.into().to_lowercase(), value.into());
    }

    pub fn set_default(&mut self, value: impl Into<String>) {
        self.default = value.into();
    }

    pub fn default_value(&self) -> &str {
        &self.default
    }

    pub fn get(&self, lang: &str) -> &str {
        self.values
            .get(&lang.to_lowercase())
            .map(String::as_str)
            .unwrap_or(&self.default)
    }

    /// Languages with an explicit variant.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// True when the default and every variant are blank.
    pub fn is_empty(&self) -> bool {
        self.default.trim().is_empty() && self.values.values().all(|v| v.trim().is_empty())
    }

    /// Applies `f` to the default and to every variant.
    pub fn map_values(&mut self, mut f: impl FnMut(Option<&str>, &str) -> String) {
        self.default = f(None, &self.default);
        for (lang, value) in self.values.iter_mut() {
            let next = f(Some(lang.as_str()), value.as_str());
            *value = next;
        }
    }

    /// Makes sure a variant exists for each of `langs`, seeded from the default.
    pub fn ensure_languages<'a>(&mut self, langs: impl IntoIterator<Item = &'a str>) {
        for lang in langs {
            let key = lang.to_lowercase();
            if !self.values.contains_key(&key) {
                self.values.insert(key, self.default.clone());
            }
        }
    }

    /// Replaces `placeholder` in every variant with the matching variant of `value`.
    pub fn replace_placeholder(&mut self, placeholder: &str, value: &MultiLanguageValue) {
        let langs: Vec<String> = value.values.keys().cloned().collect();
        self.ensure_languages(langs.iter().map(String::as_str));
        self.map_values(|lang, current| match lang {
            Some(lang) => current.replace(placeholder, value.get(lang)),
            None => current.replace(placeholder, value.default_value()),
        });
    }

    /// Prefixes each non-empty variant with the matching variant of `prefix`.
    pub fn add_prefix(&mut self, prefix: &MultiLanguageValue) {
        self.map_values(|lang, current| {
            if current.is_empty() {
                return String::new();
            }
            let p = lang.map_or(prefix.default_value(), |l| prefix.get(l));
            format!("{}{}", p, current)
        });
    }

    /// Appends the matching variant of `suffix` to each non-empty variant.
    pub fn add_suffix(&mut self, suffix: &MultiLanguageValue) {
        self.map_values(|lang, current| {
            if current.is_empty() {
                return String::new();
            }
            let s = lang.map_or(suffix.default_value(), |l| suffix.get(l));
            format!("{}{}", current, s)
        });
    }
}

impl From<&str> for MultiLanguageValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MultiLanguageValue {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_falls_back_to_default() {
        let value = MultiLanguageValue::new("Chapter").with_value("de", "Kapitel");
        assert_eq!(value.get("de"), "Kapitel");
        assert_eq!(value.get("DE"), "Kapitel");
        assert_eq!(value.get("fr"), "Chapter");
    }

    #[test]
    fn test_replace_placeholder_per_language() {
        let mut label = MultiLanguageValue::new("{MD_TITLE} ({CURRENTNO})").with_value("de", "{MD_TITLE} ({CURRENTNO})");
        let title = MultiLanguageValue::new("Title").with_value("de", "Titel");
        label.replace_placeholder("{MD_TITLE}", &title);
        label.replace_placeholder("{CURRENTNO}", &MultiLanguageValue::new("3"));

        assert_eq!(label.default_value(), "Title (3)");
        assert_eq!(label.get("de"), "Titel (3)");
    }

    #[test]
    fn test_prefix_skips_empty_values() {
        let mut value = MultiLanguageValue::new("").with_value("en", "x");
        value.add_prefix(&MultiLanguageValue::new("Vol. "));
        assert_eq!(value.default_value(), "");
        assert_eq!(value.get("en"), "Vol. x");
    }

    #[test]
    fn test_is_empty() {
        assert!(MultiLanguageValue::new("  ").is_empty());
        assert!(!MultiLanguageValue::new("").with_value("en", "a").is_empty());
    }
}
