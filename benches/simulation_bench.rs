//! Performance benchmarks for circuit construction and simulation.
//!
//! Run with: `cargo bench`
//! Or for specific bench: `cargo bench --bench simulation_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use kairo::flatten::without_compound_modules;
use kairo::integrity::check_connections;
use kairo::library::{mux4, ripple_adder};
use kairo::{create_simulator, Approach, Circuit, InputVector, SimOptions};

const WIDTHS: [usize; 3] = [8, 16, 32];

// ============================================================================
// Construction
// ============================================================================

fn bench_instantiate(c: &mut Criterion) {
    let mut group = c.benchmark_group("instantiate");

    for width in WIDTHS {
        let adder = ripple_adder(width).unwrap();
        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::new("ripple_adder", width), &adder, |b, adder| {
            b.iter(|| black_box(Circuit::with_top(adder).unwrap()));
        });
    }

    group.finish();
}

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");

    for width in WIDTHS {
        let circuit = Circuit::with_top(&ripple_adder(width).unwrap()).unwrap();
        group.bench_with_input(BenchmarkId::new("ripple_adder", width), &circuit, |b, circuit| {
            b.iter(|| black_box(without_compound_modules(circuit).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("integrity", width), &circuit, |b, circuit| {
            b.iter(|| check_connections(black_box(circuit)).unwrap());
        });
    }

    group.finish();
}

// ============================================================================
// Simulation
// ============================================================================

fn adder_vectors(width: usize, count: usize) -> Vec<InputVector> {
    let mask = if width >= 64 { u64::MAX } else { (1 << width) - 1 };
    (0..count as u64)
        .map(|i| {
            InputVector::new()
                .value("a", i.wrapping_mul(0x9e37_79b9) & mask)
                .value("b", i.wrapping_mul(0x85eb_ca6b) & mask)
                .bit("carryIn", i % 3 == 0)
        })
        .collect()
}

fn bench_levelized_vs_event(c: &mut Criterion) {
    let mut group = c.benchmark_group("adder_inputs");

    for width in WIDTHS {
        let adder = ripple_adder(width).unwrap();
        let vectors = adder_vectors(width, 64);
        group.throughput(Throughput::Elements(vectors.len() as u64));

        for approach in [Approach::Levelization, Approach::EventDriven] {
            group.bench_with_input(
                BenchmarkId::new(approach.name(), width),
                &vectors,
                |b, vectors| {
                    let mut sim = create_simulator(&adder, &SimOptions::new(approach)).unwrap();
                    b.iter(|| {
                        for v in vectors {
                            sim.input(v).unwrap();
                        }
                        black_box(sim.read_u64("sum").unwrap())
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_single_bit_toggle(c: &mut Criterion) {
    let mut group = c.benchmark_group("mux_select_toggle");
    let mux = mux4(8).unwrap();
    let data = InputVector::new()
        .value("d0", 0x11)
        .value("d1", 0x22)
        .value("d2", 0x44)
        .value("d3", 0x88);

    for approach in [Approach::Levelization, Approach::EventDriven] {
        group.bench_function(approach.name(), |b| {
            let mut sim = create_simulator(&mux, &SimOptions::new(approach)).unwrap();
            sim.input(&data).unwrap();
            let mut sel = 0u64;
            b.iter(|| {
                sel = (sel + 1) % 4;
                sim.input(&InputVector::new().value("sel", sel)).unwrap();
                black_box(sim.read_u64("q").unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_instantiate,
    bench_flatten,
    bench_levelized_vs_event,
    bench_single_bit_toggle,
);

criterion_main!(benches);
