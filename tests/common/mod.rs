pub mod fixtures;

use std::sync::Arc;
use vitrine::{
    IndexRecord, StaticTocConfiguration, TocEntry, TocService, TocServiceBuilder,
};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A service over an in-memory index of `records`
pub fn service(records: Vec<IndexRecord>, config: StaticTocConfiguration) -> TocService {
    TocServiceBuilder::new()
        .with_records(records)
        .with_config(Arc::new(config))
        .build()
}

/// Default labels of `entries`, in order
pub fn labels(entries: &[TocEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| e.label.default_value().to_string())
        .collect()
}

pub fn levels(entries: &[TocEntry]) -> Vec<u32> {
    entries.iter().map(|e| e.level).collect()
}
