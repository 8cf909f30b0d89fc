//! Message translation used for docstruct names and label affixes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;

pub trait Translator: Send + Sync + Debug {
    /// Translation of `key` into `lang`. Unknown keys translate to themselves.
    fn translate(&self, key: &str, lang: &str) -> String;

    /// Languages labels are produced for, besides the language-agnostic default.
    fn languages(&self) -> Vec<String>;
}

/// An in-memory message catalog: language -> key -> text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageCatalog {
    messages: BTreeMap<String, HashMap<String, String>>,
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(
        mut self,
        lang: impl Into<String>,
        key: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.add(lang, key, text);
        self
    }

    pub fn add(&mut self, lang: impl Into<String>, key: impl Into<String>, text: impl Into<String>) {
        self.messages
            .entry(lang.into().to_lowercase())
            .or_default()
            .insert(key.into(), text.into());
    }

    /// Registers a language without messages.
    pub fn with_language(mut self, lang: impl Into<String>) -> Self {
        self.messages.entry(lang.into().to_lowercase()).or_default();
        self
    }
}

impl Translator for MessageCatalog {
    fn translate(&self, key: &str, lang: &str) -> String {
        self.messages
            .get(&lang.to_lowercase())
            .and_then(|m| m.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    fn languages(&self) -> Vec<String> {
        self.messages.keys().cloned().collect()
    }
}
