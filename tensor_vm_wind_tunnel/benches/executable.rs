// Copyright 2026 the Tensor VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use tensor_vm::constant::Constant;
use tensor_vm::executable::{Executable, FuncInfo, FuncKind};
use tensor_vm::instruction::{Arg, Instruction};

fn build_call_chain(calls: u32) -> Executable {
    let mut exec = Executable::new();
    exec.constants.push(Constant::Int(7));
    exec.declare_function(FuncInfo {
        kind: FuncKind::PackedFunc,
        name: "ext".into(),
        start_instr: 0,
        end_instr: 0,
        num_args: 2,
        register_file_size: 0,
        param_names: vec![],
    });
    exec.declare_function(FuncInfo {
        kind: FuncKind::VmFunc,
        name: "main".into(),
        start_instr: 0,
        end_instr: i64::from(calls) + 1,
        num_args: 1,
        register_file_size: i64::from(calls) + 2,
        param_names: vec!["x".into()],
    });
    for i in 0..calls {
        exec.push_instruction(&Instruction::Call {
            dst: i64::from(i) + 1,
            func_idx: 0,
            args: vec![Arg::register(i64::from(i)), Arg::const_idx(0)],
        });
    }
    exec.push_instruction(&Instruction::Ret {
        result: i64::from(calls),
    });
    exec
}

fn bench_save_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("save_load_roundtrip");
    for &calls in &[10_u32, 100, 1000] {
        let exec = build_call_chain(calls);
        group.bench_with_input(BenchmarkId::from_parameter(calls), &exec, |b, exec| {
            b.iter(|| {
                let bytes = exec.save_to_bytes();
                let back = Executable::load_from_bytes(&bytes).unwrap();
                black_box(back);
            });
        });
    }
    group.finish();
}

fn bench_disassembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("disassembly");
    for &calls in &[10_u32, 100, 1000] {
        let exec = build_call_chain(calls);
        group.bench_with_input(BenchmarkId::from_parameter(calls), &exec, |b, exec| {
            b.iter(|| {
                let text = exec.as_text().unwrap();
                let py = exec.as_python().unwrap();
                black_box((text, py));
            });
        });
    }
    group.finish();
}

fn bench_executable(c: &mut Criterion) {
    bench_save_load(c);
    bench_disassembly(c);
}

criterion_group!(benches, bench_executable);
criterion_main!(benches);
