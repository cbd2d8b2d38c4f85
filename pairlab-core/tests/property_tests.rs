//! Property tests for engine invariants.
//!
//! 1. Threshold ordering: entry >= exit for every k >= 0
//! 2. Full-sample spread has zero mean
//! 3. Leg positions stay in {(0,0), (1,-1), (-1,1)}; output lengths match input
//! 4. Price-level accounting identity holds at every step
//! 5. Determinism: repeated runs are bit-identical

use chrono::NaiveDate;
use proptest::prelude::*;
use pairlab_core::signal::Thresholds;
use pairlab_core::spread::SpreadModel;
use pairlab_core::{BacktestEngine, EngineConfig, PricePoint, PriceSeries};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_increments(n: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-2.0..2.0_f64, n)
}

/// Two walks from proptest increments; leg1 loosely follows leg2.
fn arb_series() -> impl Strategy<Value = PriceSeries> {
    (30usize..120)
        .prop_flat_map(|n| (arb_increments(n), arb_increments(n), 0.2..3.0_f64))
        .prop_filter_map("degenerate series", |(d1, d2, beta)| {
            let start = NaiveDate::from_ymd_opt(2021, 3, 1)?;
            let mut leg2 = 50.0;
            let mut noise = 0.0;
            let points = d1
                .iter()
                .zip(&d2)
                .enumerate()
                .map(|(i, (e1, e2))| {
                    leg2 += e2;
                    noise = 0.7 * noise + e1;
                    let leg1 = 10.0 + beta * leg2 + noise;
                    PricePoint::new(start + chrono::Duration::days(i as i64), leg1, leg2)
                })
                .collect();
            PriceSeries::new(points).ok()
        })
}

// ── 1. Threshold ordering ────────────────────────────────────────────

proptest! {
    #[test]
    fn entry_never_below_exit(mean in -50.0..50.0_f64, std in 0.0..20.0_f64, k in 0.0..6.0_f64) {
        let t = Thresholds::from_stats(mean, std, k).unwrap();
        prop_assert!(t.entry >= t.exit);
    }
}

// ── 2. Zero-mean spread ──────────────────────────────────────────────

proptest! {
    #[test]
    fn full_sample_spread_has_zero_mean(series in arb_series()) {
        if let Ok(fit) = SpreadModel::default().fit(&series) {
            let values = fit.spread.values();
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let scale = values.iter().fold(1.0_f64, |m, v| m.max(v.abs()));
            prop_assert!(mean.abs() <= 1e-9 * scale, "mean {}", mean);
        }
    }
}

// ── 3 & 4. Position shape, lengths, accounting ───────────────────────

proptest! {
    #[test]
    fn positions_lengths_and_accounting(series in arb_series(), k in 0.0..3.0_f64) {
        let engine = BacktestEngine::new(EngineConfig::new(100_000.0, k)).unwrap();
        let Ok(report) = engine.run(&series) else {
            return Ok(());
        };
        let result = &report.result;
        prop_assert_eq!(result.len(), series.len());
        prop_assert_eq!(report.spread.len(), series.len());

        let mut prev = result.initial_capital();
        for (step, point) in result.steps().iter().zip(series.points()) {
            let legs = step.position.legs();
            prop_assert!(matches!((legs.leg1, legs.leg2), (0, 0) | (1, -1) | (-1, 1)));
            let expected = prev + legs.value_at(point.leg1, point.leg2);
            prop_assert_eq!(step.portfolio_value, expected);
            prev = step.portfolio_value;
        }
        prop_assert_eq!(result.final_portfolio_value(), prev);
        prop_assert!(result.exit_timestamps().len() <= result.entry_timestamps().len());
        prop_assert!(result.entry_timestamps().len() <= result.exit_timestamps().len() + 1);
    }
}

// ── 5. Determinism ───────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn runs_are_bit_identical(series in arb_series()) {
        let engine = BacktestEngine::new(EngineConfig::default()).unwrap();
        let (Ok(a), Ok(b)) = (engine.run(&series), engine.run(&series)) else {
            return Ok(());
        };
        let bits = |r: &pairlab_core::BacktestReport| -> Vec<u64> {
            r.result.portfolio_values().iter().map(|v| v.to_bits()).collect()
        };
        prop_assert_eq!(bits(&a), bits(&b));
        prop_assert_eq!(a.result.positions(), b.result.positions());
        prop_assert_eq!(a.cointegration.result.p_value.to_bits(), b.cointegration.result.p_value.to_bits());
    }
}
