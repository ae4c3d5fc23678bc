use criterion::{criterion_group, criterion_main, Criterion};
use jani_reports::models::{PollutionType, Report, ReportId, TagSelection};
use jani_reports::services::MapView;
use jani_reports::storage::MemoryBlobStore;
use std::hint::black_box;

/// Reports scattered over the subcontinent with a mix of tags.
fn synthetic_reports(count: usize) -> Vec<Report> {
    (0..count)
        .map(|i| {
            let tags: TagSelection = PollutionType::ALL
                .into_iter()
                .enumerate()
                .filter(|(bit, _)| i & (1 << bit) != 0)
                .map(|(_, tag)| tag)
                .collect();
            Report {
                id: ReportId::Int(i as i64 + 1),
                latitude: 8.0 + (i % 270) as f64 * 0.1,
                longitude: 68.0 + (i % 290) as f64 * 0.1,
                description: (i % 3 != 0).then(|| format!("Report number {}", i)),
                image_key: format!("{}_{:016x}.jpg", 1_700_000_000_000u64 + i as u64, i),
                tags,
                created_at: None,
            }
        })
        .collect()
}

fn benchmark_map_view(c: &mut Criterion) {
    let blobs = MemoryBlobStore::new("https://abc.supabase.co", "jani-images");
    let small = synthetic_reports(100);
    let large = synthetic_reports(10_000);

    let mut group = c.benchmark_group("map_view");

    group.bench_function("build_100_reports", |b| {
        b.iter(|| MapView::build(black_box(&small), &blobs, false))
    });

    group.bench_function("build_10000_reports", |b| {
        b.iter(|| MapView::build(black_box(&large), &blobs, false))
    });

    let view = MapView::build(&large, &blobs, false);
    group.bench_function("geojson_10000_reports", |b| {
        b.iter(|| black_box(&view).to_feature_collection())
    });

    group.finish();
}

criterion_group!(benches, benchmark_map_view);
criterion_main!(benches);
