mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use proc_graph::prelude::*;

const CHAIN_LENGTHS: [usize; 4] = [4, 16, 64, 256];

fn queue_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("execution/queue_build");

    for &len in &CHAIN_LENGTHS {
        let graph = common::chain_graph(len).expect("builds");
        group.throughput(common::elements_throughput(graph.node_count()));

        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| {
                let queue = graph.execution_queue().expect("schedules");
                black_box(queue.max_depth());
            });
        });
    }

    group.finish();
}

fn pass_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("execution/pass");

    for &len in &CHAIN_LENGTHS {
        let template = common::chain_graph(len).expect("builds");
        group.throughput(common::elements_throughput(template.node_count()));
        let mut runner = GraphRunner::new(RunConfig::new().with_seed(0xC0FFEE));

        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter_batched(
                || common::chain_graph(len).expect("builds"),
                |mut graph| {
                    let result = runner.run(&mut graph).expect("runs");
                    black_box(result.visits);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn repeated_pass_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("execution/repeated_pass");
    let mut graph = common::chain_graph(16).expect("builds");
    let mut runner = GraphRunner::default();

    group.bench_function("chain_16", |b| {
        b.iter(|| {
            let result = runner.run(&mut graph).expect("runs");
            black_box(result.objects_discarded);
        });
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = queue_benches, pass_benches, repeated_pass_benches
}
criterion_main!(benches);
