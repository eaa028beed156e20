//! Binding Performance Benchmarks
//!
//! Measures the cost of the binding lifecycle against the in-memory store.
//!
//! ## Benchmark Structure
//! 1. Bind and dispose a static reference
//! 2. Resubscribe after a reference change (one flush per change)
//! 3. Fan-out of one write to many bound queries
//!
//! ## Running Benchmarks
//! ```bash
//! cargo bench --bench binding_bench
//!
//! # Specific benchmark
//! cargo bench --bench binding_bench -- write_fanout/64
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use reactive_firestore::firestore::{CollectionReference, MemoryStore};
use reactive_firestore::reactive::{Scheduler, Signal};
use reactive_firestore::{Binder, BoundData};
use serde_json::json;

fn seeded_store(documents: usize) -> (MemoryStore, CollectionReference) {
    let store = MemoryStore::new();
    let users = CollectionReference::new("users").expect("valid collection path");
    let mut batch = store.batch();
    for i in 0..documents {
        let reference = users.doc(format!("user{i}")).expect("valid document id");
        batch = batch
            .set(&reference, json!({"rank": i, "active": i % 2 == 0}))
            .expect("object data");
    }
    batch.commit().expect("batch commit");
    (store, users)
}

fn bench_bind(c: &mut Criterion) {
    let mut group = c.benchmark_group("bind_dispose");
    for documents in [1, 16, 256] {
        let (store, users) = seeded_store(documents);
        let binder = Binder::new(store, Scheduler::new());
        group.throughput(Throughput::Elements(documents as u64));
        group.bench_with_input(BenchmarkId::from_parameter(documents), &users, |b, users| {
            b.iter(|| {
                let binding = binder
                    .bind(users.clone(), BoundData::Empty)
                    .expect("bind succeeds");
                black_box(binding.get());
            });
        });
    }
    group.finish();
}

fn bench_resubscribe(c: &mut Criterion) {
    let (store, users) = seeded_store(64);
    let scheduler = Scheduler::new();
    let binder = Binder::new(store, scheduler.clone());
    let active = users.query().where_equal_to("active", json!(true));
    let inactive = users.query().where_equal_to("active", json!(false));
    let reference = Signal::new(active.clone());
    let binding = binder.bind(reference.clone(), BoundData::Empty).expect("bind succeeds");

    let mut flip = false;
    c.bench_function("resubscribe", |b| {
        b.iter(|| {
            flip = !flip;
            reference.set(if flip { inactive.clone() } else { active.clone() });
            scheduler.flush().expect("flush succeeds");
            black_box(binding.with(|data| data.as_collection().map(<[_]>::len)));
        });
    });
}

fn bench_write_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_fanout");
    for bindings in [1, 8, 64] {
        let (store, users) = seeded_store(16);
        let binder = Binder::new(store.clone(), Scheduler::new());
        let held: Vec<_> = (0..bindings)
            .map(|_| binder.bind(users.clone(), BoundData::Empty).expect("bind succeeds"))
            .collect();
        let target = users.doc("user0").expect("valid document id");

        group.throughput(Throughput::Elements(bindings as u64));
        group.bench_with_input(BenchmarkId::from_parameter(bindings), &target, |b, target| {
            let mut rank = 0u64;
            b.iter(|| {
                rank += 1;
                store.set(target, json!({"rank": rank})).expect("write succeeds");
            });
        });
        drop(held);
    }
    group.finish();
}

criterion_group!(benches, bench_bind, bench_resubscribe, bench_write_fanout);
criterion_main!(benches);
