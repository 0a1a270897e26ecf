//! Criterion benchmarks for the RVLab pipeline.
//!
//! Benchmarks:
//! 1. Path simulation (normal draws + compounding)
//! 2. Return derivation
//! 3. Day aggregation (unpivot + group + cumulative sums)
//! 4. Realized-volatility estimation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use rvlab_core::calendar;
use rvlab_core::{
    derive_returns, estimate, group_by_day, simulate, unpivot, ReturnSeries, RngSource,
    SimulationConfig, SimulationParams,
};

fn config(n_day: usize) -> SimulationConfig {
    SimulationConfig::new(SimulationParams {
        n_day,
        seed: Some(42),
        ..SimulationParams::default()
    })
    .unwrap()
}

fn bench_simulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulate");
    for n_day in [5usize, 50, 250] {
        let config = config(n_day);
        let rngs = RngSource::from_seed(config.seed());
        group.bench_with_input(BenchmarkId::from_parameter(n_day), &config, |b, config| {
            b.iter(|| simulate(black_box(config), &rngs).unwrap())
        });
    }
    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let config = config(50);
    let stamps = calendar::generate(&config);
    let paths = simulate(&config, &RngSource::from_seed(config.seed())).unwrap();

    c.bench_function("derive_returns/50d", |b| {
        b.iter(|| {
            paths
                .values()
                .map(|p| derive_returns(black_box(p), &stamps).unwrap())
                .collect::<Vec<_>>()
        })
    });

    let series: Vec<ReturnSeries> = paths
        .values()
        .map(|p| derive_returns(p, &stamps).unwrap())
        .collect();

    c.bench_function("group_by_day/50d", |b| {
        b.iter(|| {
            let rows = unpivot(black_box(&series));
            group_by_day(&rows, config.n_tick_per_day()).unwrap()
        })
    });

    let groups = group_by_day(&unpivot(&series), config.n_tick_per_day()).unwrap();
    c.bench_function("estimate/50d", |b| {
        b.iter(|| estimate(black_box(&groups), config.annualization()))
    });
}

criterion_group!(benches, bench_simulate, bench_aggregate);
criterion_main!(benches);
