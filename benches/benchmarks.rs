use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};
use std::hint::black_box;

use tether::{Entity, Hub, ListenerOptions, ObservableValue, Projection, Record, SetOptions, Store};

fn counter() -> Store<i64> {
    Store::new(Record::new().with("count", 0).with("step", 1))
}

fn observable_write_benchmark(c: &mut Criterion) {
    let value = ObservableValue::new("count", 0i64);

    c.bench_function("observable_write", |b| {
        let mut i = 0;
        b.iter(|| {
            value.notify(black_box(i), SetOptions::new());
            i += 1;
        });
    });
}

fn store_read_benchmark(c: &mut Criterion) {
    let store = counter();

    c.bench_function("store_read", |b| {
        b.iter(|| {
            black_box(store.get(black_box("step")).unwrap());
        });
    });
}

fn store_write_benchmark(c: &mut Criterion) {
    let store = counter();

    c.bench_function("store_write", |b| {
        let mut i = 0;
        b.iter(|| {
            store.set("count", black_box(i)).unwrap();
            i += 1;
        });
    });
}

fn store_subscribe_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_subscribe");

    for listener_count in [1, 10, 100].iter() {
        let store = counter();

        for _ in 0..*listener_count {
            store
                .add_listener("count", |_, _, _| {}, ListenerOptions::new())
                .unwrap();
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(listener_count),
            listener_count,
            |b, _| {
                let mut i = 0;
                b.iter(|| {
                    store.set("count", black_box(i)).unwrap();
                    i += 1;
                });
            },
        );
    }
    group.finish();
}

fn hub_propagation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("hub_propagation");

    for store_count in [2, 16, 128].iter() {
        let hub = Hub::new();
        let entity = Entity::new(Record::new().with("count", 0).with("step", 1));
        let stores: Vec<_> = (0..*store_count).map(|_| counter()).collect();
        for store in &stores {
            hub.bind(store, &entity);
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(store_count),
            store_count,
            |b, _| {
                let mut i = 0;
                b.iter(|| {
                    stores[0].set("count", black_box(i)).unwrap();
                    i += 1;
                });
            },
        );
    }
    group.finish();
}

fn projection_build_benchmark(c: &mut Criterion) {
    let source: Value = json!({
        "text": "hello",
        "meta": { "image": { "quality": { "low": { "h": 200 }, "high": { "h": 1600 } } } }
    });

    c.bench_function("projection_build", |b| {
        b.iter(|| {
            Store::from_projections(
                black_box(&source),
                [
                    Projection::parse("lowH", "meta.image.quality.low.h"),
                    Projection::parse("highH", "meta.image.quality.high.h"),
                    Projection::field("text"),
                ],
            )
            .unwrap()
        });
    });
}

criterion_group!(
    benches,
    observable_write_benchmark,
    store_read_benchmark,
    store_write_benchmark,
    store_subscribe_benchmark,
    hub_propagation_benchmark,
    projection_build_benchmark,
);
criterion_main!(benches);
