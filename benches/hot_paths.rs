//! Benchmarks for the per-frame and per-cycle paths.
//!
//! Run with: cargo bench --bench hot_paths

use aqi_dash::client::parse_records;
use aqi_dash::map::{CircleMarker, MapView, MarkerPolicy};
use aqi_dash::record::PollutionRecord;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const CATEGORIES: [&str; 6] = [
    "Good",
    "Moderate",
    "Unhealthy (Sensitive)",
    "Unhealthy",
    "Very Unhealthy",
    "Hazardous",
];

/// Backend payload with `n` stations spread across the globe
fn payload(n: usize) -> String {
    let rows: Vec<String> = (0..n)
        .map(|i| {
            let lat = (i as f64 * 7.3) % 140.0 - 70.0;
            let lon = (i as f64 * 13.7) % 360.0 - 180.0;
            format!(
                r#"{{"id":{i},"location":"Station {i}","latitude":{lat},"longitude":{lon},"aqi":{aqi},"category":"{cat}","pm25":12.5,"pm10":30,"no2":18.2,"co":450,"o3":61,"so2":4.1,"timestamp":"2024-05-01T12:00:00Z"}}"#,
                aqi = (i * 37) % 400,
                cat = CATEGORIES[i % CATEGORIES.len()],
            )
        })
        .collect();
    format!("[{}]", rows.join(","))
}

fn records(n: usize) -> Vec<PollutionRecord> {
    let mut bytes = payload(n).into_bytes();
    parse_records(&mut bytes).unwrap_or_default()
}

fn bench_parse_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_records");
    for n in [10, 500] {
        let body = payload(n).into_bytes();
        group.bench_function(format!("{n}_records"), |b| {
            b.iter(|| {
                let mut bytes = body.clone();
                black_box(parse_records(black_box(&mut bytes)))
            });
        });
    }
    group.finish();
}

fn bench_map_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_render");

    let mut view = MapView::initialize(None, MarkerPolicy::Replace);
    view.resize(160, 48);
    let markers: Vec<CircleMarker> = records(200).iter().map(CircleMarker::for_record).collect();

    group.bench_function("world_basemap_only", |b| {
        b.iter(|| black_box(view.renderer().render(160, 48, view.viewport(), &[], None)));
    });

    group.bench_function("world_200_markers", |b| {
        b.iter(|| {
            black_box(view.renderer().render(160, 48, view.viewport(), &markers, Some(0)))
        });
    });

    view.set_view(48.8, 2.3, MapView::FOCUS_LEVEL);
    group.bench_function("focused_200_markers", |b| {
        b.iter(|| {
            black_box(view.renderer().render(160, 48, view.viewport(), &markers, None))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_parse_records, bench_map_render);
criterion_main!(benches);
