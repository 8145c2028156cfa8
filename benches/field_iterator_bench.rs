use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};

use doclink::{AnalyzerResolver, FieldIterator, IndexWriter, LinkConfig, LinkMeta, PrimaryKey};

fn make_document(id: u64, width: usize) -> Value {
    let items: Vec<Value> = (0..width)
        .map(|i| {
            json!({
                "id": id * 1000 + i as u64,
                "name": format!("item {}", i),
                "tags": ["a", "b", "c"],
                "active": i % 2 == 0
            })
        })
        .collect();
    json!({
        "title": format!("document {}", id),
        "nested": { "depth": { "value": id } },
        "items": items,
        "missing": null
    })
}

fn tracked_config(resolver: &AnalyzerResolver) -> LinkConfig {
    LinkConfig::new(
        LinkMeta::new()
            .with_include_all_fields(true)
            .with_track_list_positions(true),
        resolver,
    )
}

fn bench_flatten(c: &mut Criterion) {
    let resolver = AnalyzerResolver::default();
    let config = tracked_config(&resolver);
    let widths = [1usize, 10, 100];

    let mut group = c.benchmark_group("flatten_document");
    for &width in &widths {
        let doc = make_document(1, width);
        group.bench_with_input(BenchmarkId::from_parameter(width), &doc, |b, doc| {
            let mut it = FieldIterator::new();
            b.iter(|| {
                it.reset(doc, &config);
                let mut tokens = 0usize;
                while it.valid() {
                    if let Some(field) = it.field_mut() {
                        while field.next_token().is_some() {
                            tokens += 1;
                        }
                    }
                    it.advance();
                }
                black_box(tokens);
            });
        });
    }
    group.finish();
}

fn bench_replace_and_commit(c: &mut Criterion) {
    let resolver = AnalyzerResolver::default();
    let config = tracked_config(&resolver);
    let counts = [100u64, 1_000];

    let mut group = c.benchmark_group("replace_and_commit");
    group.sample_size(10);
    for &count in &counts {
        let docs: Vec<Value> = (0..count).map(|id| make_document(id, 4)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &docs, |b, docs| {
            let writer = IndexWriter::default();
            b.iter(|| {
                let mut ctx = writer.documents();
                for (id, doc) in docs.iter().enumerate() {
                    ctx.replace_document(PrimaryKey(id as u64), doc, &config);
                }
                black_box(writer.commit().unwrap());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_flatten, bench_replace_and_commit);
criterion_main!(benches);
