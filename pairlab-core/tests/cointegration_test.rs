//! Engle–Granger test behaviour on synthetic pairs.

use pairlab_core::synthetic::{generate_pair, SyntheticConfig, SyntheticKind};
use pairlab_core::{CointegrationTester, EngineError, Verdict};

fn cointegrated(seed: u64) -> SyntheticConfig {
    SyntheticConfig {
        seed,
        periods: 500,
        kind: SyntheticKind::Cointegrated {
            hedge_ratio: 0.8,
            persistence: 0.5,
        },
        ..SyntheticConfig::default()
    }
}

#[test]
fn cointegrated_pairs_reject_at_five_percent() {
    let tester = CointegrationTester::default();
    for seed in [1, 2, 3, 42] {
        let series = generate_pair(&cointegrated(seed)).unwrap();
        let result = tester.test(&series).unwrap();
        assert!(result.p_value < 0.05, "seed {seed}: p = {}", result.p_value);
        assert!(result.test_statistic < result.critical_values.five_pct);
        assert_eq!(result.verdict(0.05), Verdict::Cointegrated);
    }
}

#[test]
fn independent_walks_mostly_fail_to_reject() {
    let tester = CointegrationTester::default();
    let rejected = (0..10u64)
        .filter(|&seed| {
            let series = generate_pair(&SyntheticConfig {
                seed,
                ..SyntheticConfig::default()
            })
            .unwrap();
            tester.test(&series).unwrap().p_value < 0.05
        })
        .count();
    assert!(rejected <= 3, "{rejected} of 10 independent pairs looked cointegrated");
}

#[test]
fn outputs_are_well_formed() {
    let tester = CointegrationTester::default();
    for seed in 0..5u64 {
        let series = generate_pair(&SyntheticConfig {
            seed,
            periods: 120,
            ..SyntheticConfig::default()
        })
        .unwrap();
        let r = tester.test(&series).unwrap();
        assert!((0.0..=1.0).contains(&r.p_value));
        let cv = r.critical_values;
        assert!(cv.one_pct < cv.five_pct && cv.five_pct < cv.ten_pct);
        assert!(r.lags_used <= 13);
        assert_eq!(r.nobs, 120 - 1 - r.lags_used);
    }
}

#[test]
fn critical_values_use_sample_size_minus_one() {
    let series = generate_pair(&SyntheticConfig {
        periods: 101,
        ..SyntheticConfig::default()
    })
    .unwrap();
    let r = CointegrationTester::default().test(&series).unwrap();
    let expected = -3.33613 - 6.1101 / 100.0 - 6.823 / 10_000.0;
    assert!((r.critical_values.five_pct - expected).abs() < 1e-12);
}

#[test]
fn below_configured_minimum_is_insufficient() {
    let series = generate_pair(&SyntheticConfig {
        periods: 40,
        ..SyntheticConfig::default()
    })
    .unwrap();
    let err = CointegrationTester::new(50).unwrap().test(&series).unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientData {
            required: 50,
            actual: 40
        }
    );
}

#[test]
fn report_carries_verdict_at_requested_level() {
    let series = generate_pair(&cointegrated(9)).unwrap();
    let report = CointegrationTester::default().report(&series, 0.10).unwrap();
    assert_eq!(report.significance, 0.10);
    assert_eq!(report.verdict, report.result.verdict(0.10));
}

// ── Degenerate residuals ─────────────────────────────────────────────

fn alternating_offset(n: usize) -> (Vec<f64>, Vec<f64>) {
    let leg2: Vec<f64> = (0..n).map(|i| 10.0 + i as f64).collect();
    let leg1 = leg2
        .iter()
        .enumerate()
        .map(|(i, p)| 2.0 * p + if i % 2 == 0 { 0.5 } else { -0.5 })
        .collect();
    (leg1, leg2)
}

#[test]
fn constant_leg1_reports_perfect_fit() {
    let leg1 = vec![100.0; 40];
    let leg2: Vec<f64> = (0..40).map(|i| 50.0 + i as f64).collect();
    let r = CointegrationTester::default().test_legs(&leg1, &leg2).unwrap();
    assert_eq!(r.test_statistic, f64::NEG_INFINITY);
    assert_eq!(r.p_value, 0.0);
    assert_eq!(r.lags_used, 0);
    assert_eq!(r.verdict(0.05), Verdict::Cointegrated);
}

#[test]
fn periodic_residuals_still_produce_a_result() {
    let (leg1, leg2) = alternating_offset(30);
    let r = CointegrationTester::default().test_legs(&leg1, &leg2).unwrap();
    assert!(!r.test_statistic.is_nan());
    assert!((0.0..=1.0).contains(&r.p_value));
}

#[test]
fn constant_leg2_is_still_singular() {
    let leg1: Vec<f64> = (0..30).map(|i| 10.0 + i as f64).collect();
    let err = CointegrationTester::default()
        .test_legs(&leg1, &[5.0; 30])
        .unwrap_err();
    assert!(matches!(err, EngineError::RegressionSingularity(_)));
}
