//! # Gate Benchmarks
//!
//! Measures gate application across register widths and the cost of
//! partitioned shot sampling.
//!
//! Run: `cargo bench --bench gate_benchmarks` (add `--features parallel` for rayon)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use statevector_engine::prelude::*;

/// Benchmark single gates on registers of increasing width
fn bench_gate_application(c: &mut Criterion) {
    let mut group = c.benchmark_group("gate_application");

    for width in [6usize, 10, 14] {
        let gates = [
            ("hadamard", GateDescriptor::new(Opcode::H, vec![width - 1], vec![], vec![])),
            (
                "controlled_u3",
                GateDescriptor::new(Opcode::CU3, vec![1], vec![width - 1], vec![0.7, 0.2, -0.4]),
            ),
            ("toffoli", GateDescriptor::new(Opcode::CCX, vec![0], vec![1, width - 1], vec![])),
            ("swap", GateDescriptor::new(Opcode::SWAP, vec![0, width - 1], vec![], vec![])),
        ];

        for (name, gate) in gates {
            let mut state = QuantumStateVector::zero_state(width);
            group.bench_with_input(BenchmarkId::new(name, width), &gate, |b, gate| {
                b.iter(|| apply_gate_with_threshold(black_box(&mut state), gate, 12))
            });
        }
    }

    group.finish();
}

/// Benchmark sampling a uniform register with varying partition counts
fn bench_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampling");

    let width = 8;
    let mut builder = CircuitBuilder::new(width, width);
    for qubit in 0..width {
        builder.hadamard(qubit).unwrap();
    }
    for qubit in 0..width {
        builder.measure(qubit, qubit).unwrap();
    }
    let circuit = builder.finalize();
    let state = CircuitExecutor::new().run_exact(&circuit).unwrap();
    let register = circuit.classical_register_map();

    for partitions in [1usize, 4, 16] {
        group.bench_with_input(
            BenchmarkId::new("shots_10000", partitions),
            &partitions,
            |b, &partitions| {
                b.iter(|| sample_partitioned(&state, &register, 10_000, 7, partitions, true))
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_gate_application, bench_sampling);
criterion_main!(benches);
