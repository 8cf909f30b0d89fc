//! Flat documents as returned by the search index.

use crate::fields::{self, LANG_INFIX};
use crate::ids::{Iddoc, LogId, Pi};
use crate::label::MultiLanguageValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One index document: field name to JSON value.
///
/// Multi-valued fields are stored as arrays; accessors that return a single
/// value use the first element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexRecord {
    fields: BTreeMap<String, Value>,
}

impl IndexRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter, mostly useful in tests and fixtures.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Keeps only the fields accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.fields.retain(|k, _| keep(k));
    }

    /// All values of `field` rendered as strings, blanks dropped.
    pub fn str_values(&self, field: &str) -> Vec<String> {
        match self.fields.get(field) {
            Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
            Some(other) => scalar_to_string(other).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// First non-blank value of `field`.
    pub fn str_value(&self, field: &str) -> Option<String> {
        self.str_values(field).into_iter().next()
    }

    pub fn i64_value(&self, field: &str) -> Option<i64> {
        self.str_value(field).and_then(|s| s.trim().parse().ok())
    }

    /// Accepts JSON booleans as well as the strings `"true"`/`"false"`.
    pub fn bool_value(&self, field: &str) -> bool {
        match self.fields.get(field) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Array(items)) => matches!(items.first(), Some(Value::Bool(true))),
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// The plain value of `field` as default plus every `<field>_LANG_XX` variant.
    pub fn multi_language_value(&self, field: &str) -> MultiLanguageValue {
        let mut value = MultiLanguageValue::new(self.str_value(field).unwrap_or_default());
        let prefix = format!("{}{}", field, LANG_INFIX);
        for (name, _) in self.fields.range(prefix.clone()..) {
            let Some(lang) = name.strip_prefix(&prefix) else {
                break;
            };
            if let Some(v) = self.str_value(name) {
                if value.default_value().is_empty() {
                    value.set_default(v.clone());
                }
                value.set_value(lang, v);
            }
        }
        value
    }

    pub fn iddoc(&self) -> Option<Iddoc> {
        self.str_value(fields::IDDOC).map(Iddoc::from)
    }

    pub fn pi(&self) -> Option<Pi> {
        self.str_value(fields::PI).map(Pi::from)
    }

    /// PI of the record this document belongs to; top-level documents carry their own PI.
    pub fn pi_topstruct(&self) -> Option<Pi> {
        self.str_value(fields::PI_TOPSTRUCT)
            .or_else(|| self.str_value(fields::PI))
            .map(Pi::from)
    }

    pub fn logid(&self) -> Option<LogId> {
        self.str_value(fields::LOGID).map(LogId::from)
    }

    pub fn docstruct(&self) -> Option<String> {
        self.str_value(fields::DOCSTRCT)
    }

    pub fn is_anchor(&self) -> bool {
        self.bool_value(fields::ISANCHOR)
    }

    pub fn is_work(&self) -> bool {
        self.bool_value(fields::ISWORK)
    }

    pub fn is_group(&self) -> bool {
        self.str_value(fields::DOCTYPE).as_deref() == Some(fields::DOCTYPE_GROUP)
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if s.trim().is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_and_array_access() {
        let record = IndexRecord::new()
            .with("PI", "PPN1")
            .with("THUMBPAGENO", 7)
            .with("MD_AUTHOR", json!(["A", "", "B"]));

        assert_eq!(record.str_value("PI").as_deref(), Some("PPN1"));
        assert_eq!(record.i64_value("THUMBPAGENO"), Some(7));
        assert_eq!(record.str_values("MD_AUTHOR"), vec!["A", "B"]);
        assert_eq!(record.str_value("MISSING"), None);
    }

    #[test]
    fn test_bool_value_variants() {
        let record = IndexRecord::new()
            .with("ISANCHOR", true)
            .with("ISWORK", "true")
            .with("OTHER", json!([true]));
        assert!(record.is_anchor());
        assert!(record.is_work());
        assert!(record.bool_value("OTHER"));
        assert!(!record.bool_value("MISSING"));
    }

    #[test]
    fn test_multi_language_value() {
        let record = IndexRecord::new()
            .with("LABEL", "Band 1")
            .with("LABEL_LANG_EN", "Volume 1")
            .with("LABEL_LANG_DE", "Band 1")
            .with("LABELX", "ignored");

        let value = record.multi_language_value("LABEL");
        assert_eq!(value.default_value(), "Band 1");
        assert_eq!(value.get("en"), "Volume 1");
        assert_eq!(value.get("de"), "Band 1");
        assert_eq!(value.languages().count(), 2);
    }

    #[test]
    fn test_multi_language_value_without_default() {
        let record = IndexRecord::new().with("MD_TITLE_LANG_EN", "Title");
        let value = record.multi_language_value("MD_TITLE");
        assert_eq!(value.default_value(), "Title");
    }

    #[test]
    fn test_pi_topstruct_falls_back_to_pi() {
        let record = IndexRecord::new().with("PI", "PPN1");
        assert_eq!(record.pi_topstruct(), Some(Pi::new("PPN1")));
    }

    #[test]
    fn test_deserialize_transparent() {
        let record: IndexRecord =
            serde_json::from_value(json!({"IDDOC": 12, "DOCTYPE": "GROUP"})).unwrap();
        assert_eq!(record.iddoc(), Some(Iddoc::new("12")));
        assert!(record.is_group());
    }
}
