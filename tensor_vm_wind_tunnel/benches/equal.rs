// Copyright 2026 the Tensor VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use tensor_ir::nodes::{Call, Function, IntImm, Op, Tuple, Var};
use tensor_ir::{ObjectRef, ReducerRegistry, Value, first_structural_mismatch, structural_equal};
use tensor_vm::dtype::DataType;

fn deep_chain(depth: u32, seed: ObjectRef) -> ObjectRef {
    let mut expr = seed;
    for _ in 0..depth {
        expr = Call::new(Op::new("relu"), vec![expr]);
    }
    expr
}

fn wide_function(width: u32) -> Value {
    let dtype = DataType::int(32, 1);
    let x = Var::new("x", dtype);
    let fields = (0..width)
        .map(|i| Call::new(Op::new("add"), vec![x.clone(), IntImm::new(dtype, i64::from(i))]))
        .collect();
    Function::new(vec![x], Tuple::new(fields)).into()
}

fn bench_deep_graphs(c: &mut Criterion) {
    let mut group = c.benchmark_group("structural_equal_deep");
    for &depth in &[100_u32, 1000, 10_000] {
        let reg = ReducerRegistry::with_builtin_nodes();
        let dtype = DataType::int(32, 1);
        let lhs: Value = deep_chain(depth, IntImm::new(dtype, 0)).into();
        let rhs: Value = deep_chain(depth, IntImm::new(dtype, 0)).into();
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| black_box(structural_equal(&reg, &lhs, &rhs, false)));
        });
    }
    group.finish();
}

fn bench_wide_graphs(c: &mut Criterion) {
    let mut group = c.benchmark_group("structural_equal_wide");
    for &width in &[100_u32, 1000] {
        let reg = ReducerRegistry::with_builtin_nodes();
        let lhs = wide_function(width);
        let rhs = wide_function(width);
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| black_box(structural_equal(&reg, &lhs, &rhs, false)));
        });
    }
    group.finish();
}

fn bench_traced_mismatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("first_structural_mismatch");
    for &width in &[100_u32, 1000] {
        let reg = ReducerRegistry::with_builtin_nodes();
        let lhs = wide_function(width);
        let rhs = wide_function(width - 1);
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| black_box(first_structural_mismatch(&reg, &lhs, &rhs, false)));
        });
    }
    group.finish();
}

fn bench_equal(c: &mut Criterion) {
    bench_deep_graphs(c);
    bench_wide_graphs(c);
    bench_traced_mismatch(c);
}

criterion_group!(benches, bench_equal);
criterion_main!(benches);
