//! Criterion benchmarks for PairLab hot paths.
//!
//! Benchmarks:
//! 1. Full engine run (cointegration + spread + loop)
//! 2. Engle–Granger test alone
//! 3. Signal / position / portfolio scan over a precomputed spread
//! 4. Rolling hedge fit

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use pairlab_core::engine::{simulate, PortfolioTracker};
use pairlab_core::signal::{FullSampleThresholds, SignalGenerator, ThresholdEstimator};
use pairlab_core::spread::{HedgeEstimator, RollingOls, SpreadModel};
use pairlab_core::synthetic::{generate_pair, SyntheticConfig, SyntheticKind};
use pairlab_core::{BacktestEngine, CointegrationTester, EngineConfig, PriceSeries};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(n: usize) -> PriceSeries {
    generate_pair(&SyntheticConfig {
        periods: n,
        kind: SyntheticKind::Cointegrated {
            hedge_ratio: 1.1,
            persistence: 0.8,
        },
        ..SyntheticConfig::default()
    })
    .unwrap()
}

// ── 1. Full run ──────────────────────────────────────────────────────

fn bench_engine_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_run");
    let engine = BacktestEngine::new(EngineConfig::default()).unwrap();
    for n in [500, 2_500, 10_000] {
        let series = make_series(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &series, |b, s| {
            b.iter(|| engine.run(black_box(s)).unwrap())
        });
    }
    group.finish();
}

// ── 2. Cointegration ─────────────────────────────────────────────────

fn bench_cointegration(c: &mut Criterion) {
    let mut group = c.benchmark_group("cointegration");
    let tester = CointegrationTester::default();
    for n in [500, 2_500] {
        let series = make_series(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &series, |b, s| {
            b.iter(|| tester.test(black_box(s)).unwrap())
        });
    }
    group.finish();
}

// ── 3. Loop only ─────────────────────────────────────────────────────

fn bench_simulate(c: &mut Criterion) {
    let series = make_series(10_000);
    let fit = SpreadModel::default().fit(&series).unwrap();
    let signal = SignalGenerator::with_multiplier(2.0).unwrap();
    let schedule = FullSampleThresholds.estimate(&fit.spread, 2.0).unwrap();
    let tracker = PortfolioTracker::default();

    c.bench_function("simulate_10k", |b| {
        b.iter(|| {
            simulate(
                black_box(&series),
                &fit.spread,
                schedule.clone(),
                &signal,
                &tracker,
            )
            .unwrap()
        })
    });
}

// ── 4. Rolling hedge ─────────────────────────────────────────────────

fn bench_rolling_hedge(c: &mut Criterion) {
    let series = make_series(2_500);
    let estimator = RollingOls::new(60).unwrap();
    c.bench_function("rolling_ols_2500_w60", |b| {
        b.iter(|| estimator.fit(black_box(&series)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_engine_run,
    bench_cointegration,
    bench_simulate,
    bench_rolling_hedge
);
criterion_main!(benches);
