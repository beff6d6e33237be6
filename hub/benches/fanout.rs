//! Performance benchmarks for event fan-out

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quakewatch_hub::{EventKind, ListenerRegistry, RealtimeEvent};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

fn quake_event() -> RealtimeEvent {
    RealtimeEvent::EarthquakeUpdate(json!({
        "id": "eq-42",
        "title": "MARMARA DENIZI",
        "magnitude": 4.5,
        "depth": 7.0,
        "coordinates": [28.18, 40.86]
    }))
}

fn bench_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");

    for listeners in [1usize, 10, 100] {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(AtomicU64::new(0));
        for _ in 0..listeners {
            let hits = hits.clone();
            registry.on(EventKind::EarthquakeUpdate, move |_| {
                hits.fetch_add(1, Ordering::Relaxed);
            });
        }
        let event = quake_event();

        group.bench_with_input(
            BenchmarkId::new("earthquake_update", listeners),
            &listeners,
            |b, _| b.iter(|| registry.emit(black_box(&event))),
        );
    }

    group.finish();
}

fn bench_subscribe(c: &mut Criterion) {
    c.bench_function("on_off", |b| {
        let registry = ListenerRegistry::new();
        b.iter(|| {
            let handler = registry.on(EventKind::PredictionResult, |_| {});
            registry.off(black_box(EventKind::PredictionResult), &handler)
        })
    });
}

criterion_group!(benches, bench_emit, bench_subscribe);
criterion_main!(benches);
