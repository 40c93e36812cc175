//! Benchmarks for query evaluation and change set computation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use vista_core::schema::TableBuilder;
use vista_core::{DataType, Value};
use vista_storage::{ChangeSet, DescriptorSet, Predicate, SortDescriptor, Store};

fn populated_store(count: i64) -> Arc<Store> {
    let store = Store::new();
    store
        .create_table(
            TableBuilder::new("quotes")
                .unwrap()
                .add_column("price", DataType::Float64)
                .unwrap()
                .add_column("sector", DataType::String)
                .unwrap()
                .build()
                .unwrap(),
        )
        .unwrap();

    let sectors = ["Tech", "Finance", "Health", "Energy", "Consumer"];
    store.begin_write().unwrap();
    for i in 0..count {
        store
            .insert(
                "quotes",
                vec![
                    Value::Float64(100.0 + ((i * 7919) % 1000) as f64 * 0.1),
                    Value::from(sectors[(i as usize) % sectors.len()]),
                ],
            )
            .unwrap();
    }
    store.commit_write().unwrap();
    store
}

/// Benchmark: filtered evaluation with and without a sort
fn evaluate_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_evaluate");

    for total_rows in [1000i64, 10000, 50000].iter() {
        let store = populated_store(*total_rows);
        let query = store
            .query("quotes")
            .unwrap()
            .filter(Predicate::Gt(0, Value::Float64(120.0)))
            .unwrap();
        let sorted = DescriptorSet::new().with_sort(SortDescriptor::descending(0));

        group.bench_with_input(BenchmarkId::new("unsorted", total_rows), &query, |b, query| {
            b.iter(|| black_box(store.evaluate(query, &DescriptorSet::new()).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("sorted", total_rows), &query, |b, query| {
            b.iter(|| black_box(store.evaluate(query, &sorted).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark: change set between two results with deletions and moves
fn change_set_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("change_set_compute");

    for total_rows in [1000u64, 10000, 100000].iter() {
        let old: Vec<(u64, u64)> = (1..=*total_rows).map(|id| (id, 1)).collect();
        let new: Vec<(u64, u64)> = old
            .iter()
            .filter(|(id, _)| id % 10 != 0)
            .map(|(id, v)| if id % 7 == 0 { (*id, v + 1) } else { (*id, *v) })
            .rev()
            .collect();

        group.bench_with_input(BenchmarkId::new("reversed", total_rows), &new, |b, new| {
            b.iter(|| black_box(ChangeSet::compute(&old, new)))
        });
        group.bench_with_input(BenchmarkId::new("identical", total_rows), &old, |b, same| {
            b.iter(|| black_box(ChangeSet::compute(&old, same)))
        });
    }

    group.finish();
}

criterion_group!(benches, evaluate_benchmark, change_set_benchmark);

criterion_main!(benches);
