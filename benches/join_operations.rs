//! Record join benchmarks
//! Index construction plus each cardinality contract over synthetic workloads

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use record_join::workload::{held_key, incoming_key, Workload};
use record_join::{Index, JoinConfig, JoinKey, Key, Record, RecordJoiner, SetKey};

const HELD: usize = 10_000;
const INCOMING: usize = 40_000;

fn joiner(held: Vec<Record>, config: JoinConfig) -> RecordJoiner<i64, Key<i64>> {
    let index: Index<i64> = held_key().index(held).unwrap();
    RecordJoiner::with_config(index, incoming_key(), config).unwrap()
}

fn benchmark_index_build(c: &mut Criterion) {
    let workload = Workload::parents_and_children(HELD, INCOMING, 1);

    c.bench_function("index_build_40k", |b| {
        b.iter(|| {
            let index = incoming_key().index(black_box(workload.incoming.clone())).unwrap();
            black_box(index);
        })
    });
}

fn benchmark_many_to_one(c: &mut Criterion) {
    let workload = Workload::parents_and_children(HELD, INCOMING, 2);
    let joiner = joiner(workload.held, JoinConfig::default());

    c.bench_function("many_to_one_40k", |b| {
        b.iter(|| black_box(joiner.many_to_one(black_box(&workload.incoming)).unwrap()))
    });
    c.bench_function("strict_many_to_one_40k", |b| {
        b.iter(|| black_box(joiner.strict_many_to_one(black_box(&workload.incoming)).unwrap()))
    });
}

fn benchmark_one_to_many(c: &mut Criterion) {
    let workload = Workload::parents_and_children(HELD, INCOMING, 3);
    let joiner = joiner(workload.held, JoinConfig::default());
    let children: SetKey<Record> = SetKey::new("children");

    c.bench_function("one_to_many_10k_x4", |b| {
        b.iter(|| {
            black_box(
                joiner
                    .one_to_many(black_box(&workload.incoming), &children)
                    .unwrap(),
            )
        })
    });
}

fn benchmark_strict_one_to_one(c: &mut Criterion) {
    let workload = Workload::one_to_one(HELD, 4);
    let joiner = joiner(workload.held, JoinConfig::default());

    c.bench_function("strict_one_to_one_10k", |b| {
        b.iter(|| black_box(joiner.strict_one_to_one(black_box(&workload.incoming)).unwrap()))
    });
}

fn benchmark_parallel_merge(c: &mut Criterion) {
    let workload = Workload::parents_and_children(HELD, INCOMING, 5);
    let mut group = c.benchmark_group("many_to_one_merge");

    // usize::MAX keeps every join on the calling thread
    for (label, threshold) in [("sequential", usize::MAX), ("parallel", 0)] {
        let joiner = joiner(
            workload.held.clone(),
            JoinConfig::default().with_parallel_threshold(threshold),
        );
        group.bench_with_input(
            BenchmarkId::from_parameter(label),
            &workload.incoming,
            |b, incoming| b.iter(|| black_box(joiner.many_to_one(black_box(incoming)).unwrap())),
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_index_build,
    benchmark_many_to_one,
    benchmark_one_to_many,
    benchmark_strict_one_to_one,
    benchmark_parallel_merge
);
criterion_main!(benches);
