//! TOC generation and tree building benchmarks
//!
//! Measures, for records with a growing number of structure elements:
//! - full generation (index queries, labels, URLs) plus tree building
//! - tree building alone, including the length-based collapse pass
//!
//! Run benchmarks: `cargo bench --bench toc_build`

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;
use vitrine::{
    DEFAULT_GROUP, IndexRecord, Pi, StaticTocConfiguration, Toc, TocGroups, TocServiceBuilder,
};

/// One work with `chapters` chapters of four sections each
fn generate_records(chapters: i64) -> Vec<IndexRecord> {
    let mut records = vec![json!({
        "IDDOC": 1,
        "PI": "PPN_BENCH",
        "PI_TOPSTRUCT": "PPN_BENCH",
        "ISWORK": true,
        "DOCTYPE": "DOCSTRCT",
        "LOGID": "LOG_0000",
        "LABEL": "Benchmark"
    })];
    let mut iddoc = 2;
    for c in 0..chapters {
        let chapter = iddoc;
        records.push(json!({
            "IDDOC": chapter,
            "IDDOC_PARENT": "1",
            "PI_TOPSTRUCT": "PPN_BENCH",
            "DOCTYPE": "DOCSTRCT",
            "LOGID": format!("LOG_{}", chapter),
            "THUMBPAGENO": c * 10 + 1,
            "LABEL": format!("Chapter {}", c)
        }));
        iddoc += 1;
        for s in 0..4 {
            records.push(json!({
                "IDDOC": iddoc,
                "IDDOC_PARENT": chapter.to_string(),
                "PI_TOPSTRUCT": "PPN_BENCH",
                "DOCTYPE": "DOCSTRCT",
                "LOGID": format!("LOG_{}", iddoc),
                "THUMBPAGENO": c * 10 + s + 2,
                "LABEL": format!("Section {}.{}", c, s)
            }));
            iddoc += 1;
        }
    }
    records
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect()
}

fn collapsing_config() -> StaticTocConfiguration {
    StaticTocConfiguration {
        collapse_length_threshold: 50,
        ..Default::default()
    }
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    for chapters in [10, 100, 500] {
        let service = TocServiceBuilder::new()
            .with_records(generate_records(chapters))
            .with_config(Arc::new(collapsing_config()))
            .build();
        let pi = Pi::new("PPN_BENCH");
        group.throughput(Throughput::Elements((chapters * 5 + 1) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(chapters), &chapters, |b, _| {
            b.iter(|| {
                let toc = service
                    .generate_toc_for_pi(&pi, false, None, 1)
                    .expect("generation failed");
                black_box(toc.max_depth())
            })
        });
    }
    group.finish();
}

fn bench_build_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_tree");
    for chapters in [100, 1000, 5000] {
        let service = TocServiceBuilder::new()
            .with_records(generate_records(chapters))
            .build();
        let flat = service
            .generate_toc_for_pi(&Pi::new("PPN_BENCH"), false, None, 1)
            .expect("generation failed")
            .flat_view();
        let config = Arc::new(collapsing_config());
        group.throughput(Throughput::Elements((chapters * 5 + 1) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(chapters), &flat, |b, flat: &TocGroups| {
            b.iter(|| {
                let toc = Toc::with_groups(config.clone(), flat.clone(), 0);
                toc.build_tree();
                black_box(toc.visible_entries(DEFAULT_GROUP).map(|v| v.len()))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_generate, bench_build_tree);
criterion_main!(benches);
