//! Benchmarks for result collection reads and the notification pump.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use vista_core::schema::TableBuilder;
use vista_core::{DataType, Value};
use vista_results::{
    AggregateFunction, ChangeListener, HostRuntime, ListenerError, NativeRuntime, Results,
};
use vista_storage::{DescriptorSet, SortDescriptor, Store};

struct Sink;

impl ChangeListener for Sink {
    fn on_change(&self, changes_empty: bool) -> Result<(), ListenerError> {
        black_box(changes_empty);
        Ok(())
    }
}

fn populated_store(count: i64) -> Arc<Store> {
    let store = Store::new();
    store
        .create_table(
            TableBuilder::new("trades")
                .unwrap()
                .add_column("price", DataType::Float64)
                .unwrap()
                .add_column("qty", DataType::Int64)
                .unwrap()
                .build()
                .unwrap(),
        )
        .unwrap();
    store.begin_write().unwrap();
    for i in 0..count {
        store
            .insert(
                "trades",
                vec![Value::Float64(((i * 31) % 997) as f64), Value::Int64(i % 100)],
            )
            .unwrap();
    }
    store.commit_write().unwrap();
    store
}

fn sorted_results(store: &Arc<Store>) -> Results {
    Results::new(
        store.clone(),
        store.query("trades").unwrap(),
        DescriptorSet::new().with_sort(SortDescriptor::ascending(0)),
    )
    .unwrap()
}

/// Benchmark: live reads re-evaluate, snapshot reads do not
fn read_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("results_read");

    for total_rows in [1000i64, 10000].iter() {
        let store = populated_store(*total_rows);
        let live = sorted_results(&store);
        let mut frozen = sorted_results(&store);
        frozen.enable_snapshot().unwrap();

        group.bench_with_input(BenchmarkId::new("live_size", total_rows), &live, |b, r| {
            b.iter(|| black_box(r.size().unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("snapshot_size", total_rows), &frozen, |b, r| {
            b.iter(|| black_box(r.size().unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("snapshot_sum", total_rows), &frozen, |b, r| {
            b.iter(|| black_box(r.aggregate(1, AggregateFunction::Sum).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark: one pump pass after a single-row update with N listeners
fn pump_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("results_pump");
    let runtime: Arc<dyn HostRuntime> = Arc::new(NativeRuntime::new());
    let listener: Arc<dyn ChangeListener> = Arc::new(Sink);

    for listeners in [1usize, 10, 50].iter() {
        let store = populated_store(1000);
        let mut collections: Vec<Results> = (0..*listeners).map(|_| sorted_results(&store)).collect();
        for results in &mut collections {
            results.start_listening(&runtime, &listener).unwrap();
        }
        store.advance_to_latest().unwrap();

        let mut qty = 0i64;
        group.bench_with_input(BenchmarkId::new("update", listeners), listeners, |b, _| {
            b.iter(|| {
                qty += 1;
                store.begin_write().unwrap();
                store.set_value("trades", 1, 1, Value::Int64(qty)).unwrap();
                store.commit_write().unwrap();
                black_box(store.advance_to_latest().unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, read_benchmark, pump_benchmark);

criterion_main!(benches);
