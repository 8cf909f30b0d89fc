//! IndexSearcher trait for abstracting the document index.
//!
//! The TOC engine only ever asks two things of the index: "give me the one
//! document matching this query" and "give me a sorted, paginated page of
//! documents matching this query". Queries are a conjunction of field clauses
//! so they can be evaluated in memory or rendered to a Solr query string.

use itertools::Itertools;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::RwLock;
use thiserror::Error;
use vitrine_types::IndexRecord;
use vitrine_types::fields::LANG_INFIX;

/// Error type for index operations.
#[derive(Error, Debug, Clone)]
pub enum IndexError {
    #[error("Index unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid query '{query}': {message}")]
    InvalidQuery { query: String, message: String },

    #[error("Index backend error: {0}")]
    Backend(String),
}

/// A single condition on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// Any value of `field` equals `value`.
    Equals { field: String, value: String },
    /// No value of `field` equals `value`.
    NotEquals { field: String, value: String },
    /// At least one of the nested clauses holds.
    AnyOf(Vec<Clause>),
}

impl Clause {
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Clause::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn not_equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Clause::NotEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, record: &IndexRecord) -> bool {
        match self {
            Clause::Equals { field, value } => record.str_values(field).iter().any(|v| v == value),
            Clause::NotEquals { field, value } => {
                !record.str_values(field).iter().any(|v| v == value)
            }
            Clause::AnyOf(clauses) => clauses.iter().any(|c| c.matches(record)),
        }
    }

    fn to_query_string(&self) -> String {
        match self {
            Clause::Equals { field, value } => format!("{}:\"{}\"", field, escape(value)),
            Clause::NotEquals { field, value } => format!("-{}:\"{}\"", field, escape(value)),
            Clause::AnyOf(clauses) => {
                format!("({})", clauses.iter().map(Clause::to_query_string).join(" OR "))
            }
        }
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// A conjunction of clauses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    clauses: Vec<Clause>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn field_eq(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.and(Clause::equals(field, value))
    }

    pub fn field_ne(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.and(Clause::not_equals(field, value))
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn matches(&self, record: &IndexRecord) -> bool {
        self.clauses.iter().all(|c| c.matches(record))
    }

    /// Renders the query in Solr syntax, e.g. `PI_TOPSTRUCT:"PPN1" AND -IDDOC:"2"`.
    pub fn to_query_string(&self) -> String {
        if self.clauses.is_empty() {
            return "*:*".to_string();
        }
        self.clauses.iter().map(Clause::to_query_string).join(" AND ")
    }
}

/// Sort order on one field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SortField {
    pub field: String,
    #[serde(default)]
    pub descending: bool,
}

impl SortField {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// A paginated, sorted search.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: Query,
    pub offset: usize,
    pub limit: usize,
    pub sort: Vec<SortField>,
    /// Fields to return; empty means all fields.
    pub fields: Vec<String>,
}

impl SearchRequest {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            offset: 0,
            limit: usize::MAX,
            sort: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn with_page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    pub fn with_sort(mut self, sort: Vec<SortField>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }
}

/// One page of hits plus the total hit count ignoring pagination.
#[derive(Debug, Clone, Default)]
pub struct SearchHits {
    pub records: Vec<IndexRecord>,
    pub total: usize,
}

/// A trait for querying the document index.
///
/// # Implementations
///
/// - `InMemoryIndex`: evaluates queries over a pre-populated record list
pub trait IndexSearcher: Send + Sync + Debug {
    /// Returns the first document matching `query`, restricted to `fields`
    /// (all fields when empty).
    fn find_one(&self, query: &Query, fields: &[String]) -> Result<Option<IndexRecord>, IndexError> {
        let request = SearchRequest::new(query.clone())
            .with_page(0, 1)
            .with_fields(fields.to_vec());
        Ok(self.find_many(&request)?.records.into_iter().next())
    }

    fn find_many(&self, request: &SearchRequest) -> Result<SearchHits, IndexError>;

    /// Returns a human-readable name for this searcher (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// An in-memory index.
///
/// Records must be added before use. Sorting compares values numerically when
/// both sides parse as integers; documents missing the sort field sort last.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    records: RwLock<Vec<IndexRecord>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<IndexRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Add a document to the index.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Unavailable` if the internal lock is poisoned.
    pub fn add(&self, record: IndexRecord) -> Result<(), IndexError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| IndexError::Unavailable("index lock poisoned".to_string()))?;
        records.push(record);
        Ok(())
    }

    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Returns `true` if the lock is poisoned (safe default).
    pub fn is_empty(&self) -> bool {
        self.records.read().map(|r| r.is_empty()).unwrap_or(true)
    }
}

fn compare_by(a: &IndexRecord, b: &IndexRecord, sort: &[SortField]) -> Ordering {
    for key in sort {
        let ordering = match (a.str_value(&key.field), b.str_value(&key.field)) {
            (None, None) => Ordering::Equal,
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ordering = match (x.parse::<i64>(), y.parse::<i64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    _ => x.cmp(&y),
                };
                if key.descending { ordering.reverse() } else { ordering }
            }
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn project(mut record: IndexRecord, fields: &HashSet<&str>) -> IndexRecord {
    if fields.is_empty() {
        return record;
    }
    record.retain(|name| {
        fields.contains(name)
            || name
                .split_once(LANG_INFIX)
                .is_some_and(|(base, _)| fields.contains(base))
    });
    record
}

impl IndexSearcher for InMemoryIndex {
    fn find_many(&self, request: &SearchRequest) -> Result<SearchHits, IndexError> {
        let records = self
            .records
            .read()
            .map_err(|_| IndexError::Unavailable("index lock poisoned".to_string()))?;

        let mut hits: Vec<&IndexRecord> = records.iter().filter(|r| request.query.matches(r)).collect();
        hits.sort_by(|a, b| compare_by(a, b, &request.sort));
        let total = hits.len();

        let fields: HashSet<&str> = request.fields.iter().map(String::as_str).collect();
        let records = hits
            .into_iter()
            .skip(request.offset)
            .take(request.limit)
            .map(|r| project(r.clone(), &fields))
            .collect();

        log::trace!(
            "[{}] {} -> {} hits",
            self.name(),
            request.query.to_query_string(),
            total
        );
        Ok(SearchHits { records, total })
    }

    fn name(&self) -> &'static str {
        "InMemoryIndex"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn volume(iddoc: i64, no: i64, group: Option<&str>) -> IndexRecord {
        let mut r = IndexRecord::new()
            .with("IDDOC", iddoc)
            .with("IDDOC_PARENT", "1")
            .with("ISWORK", true)
            .with("CURRENTNOSORT", no)
            .with("LABEL", format!("Volume {}", no))
            .with("LABEL_LANG_EN", format!("Volume {}", no));
        if let Some(g) = group {
            r.set("MD_SERIES", g);
        }
        r
    }

    fn index() -> InMemoryIndex {
        InMemoryIndex::from_records(vec![
            volume(12, 10, None),
            volume(10, 2, Some("A")),
            volume(11, 1, Some("A")),
            IndexRecord::new().with("IDDOC", 1).with("ISANCHOR", true),
        ])
    }

    #[test]
    fn test_query_string_rendering() {
        let query = Query::new()
            .field_eq("PI_TOPSTRUCT", "PPN\"1")
            .field_ne("IDDOC", "2")
            .and(Clause::AnyOf(vec![
                Clause::equals("ISWORK", "true"),
                Clause::equals("ISANCHOR", "true"),
            ]));
        assert_eq!(
            query.to_query_string(),
            r#"PI_TOPSTRUCT:"PPN\"1" AND -IDDOC:"2" AND (ISWORK:"true" OR ISANCHOR:"true")"#
        );
        assert_eq!(Query::new().to_query_string(), "*:*");
    }

    #[test]
    fn test_find_many_sorts_numerically() {
        let idx = index();
        let request = SearchRequest::new(Query::new().field_eq("IDDOC_PARENT", "1"))
            .with_sort(vec![SortField::asc("CURRENTNOSORT")]);
        let hits = idx.find_many(&request).unwrap();
        let numbers: Vec<_> = hits.records.iter().filter_map(|r| r.i64_value("CURRENTNOSORT")).collect();
        assert_eq!(numbers, vec![1, 2, 10]);
        assert_eq!(hits.total, 3);
    }

    #[test]
    fn test_find_many_paginates_but_reports_total() {
        let idx = index();
        let request = SearchRequest::new(Query::new().field_eq("ISWORK", "true"))
            .with_sort(vec![SortField::desc("CURRENTNOSORT")])
            .with_page(1, 1);
        let hits = idx.find_many(&request).unwrap();
        assert_eq!(hits.total, 3);
        assert_eq!(hits.records.len(), 1);
        assert_eq!(hits.records[0].i64_value("CURRENTNOSORT"), Some(2));
    }

    #[test]
    fn test_projection_keeps_language_variants() {
        let idx = index();
        let record = idx
            .find_one(&Query::new().field_eq("IDDOC", "12"), &["LABEL".to_string()])
            .unwrap()
            .unwrap();
        assert!(record.contains("LABEL"));
        assert!(record.contains("LABEL_LANG_EN"));
        assert!(!record.contains("CURRENTNOSORT"));
    }

    #[test]
    fn test_find_one_none() {
        let idx = index();
        let result = idx.find_one(&Query::new().field_eq("IDDOC", "999"), &[]).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_missing_sort_values_last() {
        let idx = InMemoryIndex::new();
        idx.add(IndexRecord::new().with("IDDOC", 1)).unwrap();
        idx.add(IndexRecord::new().with("IDDOC", 2).with("ORDER", json!(5))).unwrap();
        let hits = idx
            .find_many(&SearchRequest::new(Query::new()).with_sort(vec![SortField::asc("ORDER")]))
            .unwrap();
        assert_eq!(hits.records[0].str_value("IDDOC").as_deref(), Some("2"));
        assert_eq!(idx.len(), 2);
    }

    #[test]
    fn test_index_error_display() {
        let err = IndexError::InvalidQuery {
            query: "PI:".to_string(),
            message: "missing value".to_string(),
        };
        assert!(err.to_string().contains("PI:"));
        assert!(err.to_string().contains("missing value"));
    }
}
