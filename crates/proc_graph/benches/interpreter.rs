mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use proc_graph::prelude::*;
use proc_graph::script::parse;

const FIB_ARGS: [u32; 4] = [5, 10, 15, 20];

fn fib_source(n: u32) -> String {
    format!(
        "function fib(n) {{ if (n < 2) {{ return n; }} return fib(n - 1) + fib(n - 2); }} fib({n});"
    )
}

const ARITHMETIC: &str = r#"
var acc = 0.0;
var i = 0;
while (i < 100) {
    acc = acc + sqrt(i * 1.5) - min(i, 50) / 3.0;
    i = i + 1;
}
acc;
"#;

fn parse_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpreter/parse");
    group.throughput(common::elements_throughput(ARITHMETIC.len()));
    group.bench_function("arithmetic_loop", |b| {
        b.iter(|| {
            let program = parse(black_box(ARITHMETIC)).expect("parses");
            black_box(program.statements().len());
        });
    });
    group.finish();
}

fn evaluate_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpreter/fib");

    for &n in &FIB_ARGS {
        let program = parse(&fib_source(n)).expect("parses");
        let mut interpreter = Interpreter::new();

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                interpreter.interpret(&program).expect("runs");
                black_box(interpreter.last_evaluated_expression().cloned());
            });
        });
    }

    group.finish();
}

fn expression_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpreter/expression");
    let expression = Expression::parse("max(width * 2.0, height) + offset.z").expect("parses");
    let mut interpreter = Interpreter::new();
    let bindings = [
        ("width", Value::Float(1.5)),
        ("height", Value::Float(4.0)),
        ("offset", Value::Vector3(glam::Vec3::new(0.0, 0.0, 1.0))),
    ];

    group.bench_function("bound_variables", |b| {
        b.iter(|| {
            let value = expression
                .evaluate(&mut interpreter, bindings.iter().cloned())
                .expect("evaluates");
            black_box(value);
        });
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = parse_benches, evaluate_benches, expression_benches
}
criterion_main!(benches);
