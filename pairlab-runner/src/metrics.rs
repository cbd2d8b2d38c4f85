//! Performance metrics — pure functions over a finished backtest.
//!
//! Portfolio-curve metrics take the equity curve (starting capital followed by the
//! per-step values); trade metrics take the position sequence. The spread half-life comes from an AR(1) fit of Δspread on
//! the lagged spread.

use serde::{Deserialize, Serialize};

use pairlab_core::stats::ols;
use pairlab_core::{BacktestResult, PositionState, SpreadSeries};

/// Periods per year used to annualize the Sharpe ratio.
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub max_drawdown: f64,
    pub sharpe: f64,
    pub entries: usize,
    pub round_trips: usize,
    /// Mean length of completed positions, in steps.
    pub avg_holding_steps: f64,
    pub time_in_market: f64,
    /// Steps for a spread deviation to halve; `None` if the spread does not mean-revert.
    pub half_life: Option<f64>,
}

impl PerformanceMetrics {
    pub fn compute(result: &BacktestResult, spread: &SpreadSeries) -> Self {
        let values = equity_curve(result);
        let positions = result.positions();
        let holdings = holding_periods(&positions);
        Self {
            total_return: total_return(&values),
            max_drawdown: max_drawdown(&values),
            sharpe: sharpe_ratio(&values),
            entries: result.entry_timestamps().len(),
            round_trips: holdings.len(),
            avg_holding_steps: mean_f64(&holdings.iter().map(|&h| h as f64).collect::<Vec<_>>()),
            time_in_market: time_in_market(&positions),
            half_life: half_life(spread.defined()),
        }
    }
}

// ─── Portfolio curve ────────────────────────────────────────────────

/// Starting capital followed by the value after every step.
pub fn equity_curve(result: &BacktestResult) -> Vec<f64> {
    std::iter::once(result.initial_capital())
        .chain(result.portfolio_values())
        .collect()
}

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(&initial), Some(&last)) if values.len() >= 2 && initial > 0.0 => {
            (last - initial) / initial
        }
        _ => 0.0,
    }
}

/// Annualized Sharpe ratio of per-step returns (zero risk-free rate).
///
/// Returns 0.0 if variance is zero or fewer than 2 returns.
pub fn sharpe_ratio(values: &[f64]) -> f64 {
    let returns = step_returns(values);
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(&returns) / std * PERIODS_PER_YEAR.sqrt()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &v in values {
        peak = peak.max(v);
        if peak > 0.0 {
            max_dd = max_dd.min((v - peak) / peak);
        }
    }
    max_dd
}

/// Simple returns between consecutive values.
pub fn step_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

// ─── Positions ──────────────────────────────────────────────────────

/// Lengths of completed (closed) positions, in steps.
pub fn holding_periods(positions: &[PositionState]) -> Vec<usize> {
    let mut periods = Vec::new();
    let mut open = 0usize;
    for state in positions {
        if state.is_flat() {
            if open > 0 {
                periods.push(open);
            }
            open = 0;
        } else {
            open += 1;
        }
    }
    periods
}

/// Fraction of steps spent in a non-flat position.
pub fn time_in_market(positions: &[PositionState]) -> f64 {
    if positions.is_empty() {
        return 0.0;
    }
    positions.iter().filter(|p| !p.is_flat()).count() as f64 / positions.len() as f64
}

// ─── Spread ─────────────────────────────────────────────────────────

/// Half-life of mean reversion from Δs_t = a + b·s_{t-1}.
///
/// The AR(1) coefficient is φ = 1 + b; the half-life is ln 2 / −ln φ for φ in (0, 1).
pub fn half_life(spread: &[f64]) -> Option<f64> {
    if spread.len() < 3 {
        return None;
    }
    let lagged = &spread[..spread.len() - 1];
    let delta: Vec<f64> = spread.windows(2).map(|w| w[1] - w[0]).collect();
    let fit = ols::fit_with_intercept(&delta, lagged).ok()?;
    let phi = 1.0 + fit.coefficients[1];
    (phi > 0.0 && phi < 1.0).then(|| std::f64::consts::LN_2 / -phi.ln())
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pairlab_core::engine::{simulate, PortfolioTracker};
    use pairlab_core::signal::{SignalGenerator, ThresholdSchedule, Thresholds};
    use pairlab_core::{PricePoint, PriceSeries};
    use PositionState::*;

    /// Constant 50 / 30 prices with a position opened on the first step.
    fn entered_at_start() -> BacktestResult {
        let start = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap();
        let points = (0..3)
            .map(|i| PricePoint::new(start + chrono::Duration::days(i), 50.0, 30.0))
            .collect();
        let series = PriceSeries::new(points).unwrap();
        let spread = SpreadSeries::new(vec![3.0, 3.0, -0.5], 0).unwrap();
        let thresholds = ThresholdSchedule::Static(Thresholds::from_stats(0.0, 1.0, 2.0).unwrap());
        simulate(
            &series,
            &spread,
            thresholds,
            &SignalGenerator::with_multiplier(2.0).unwrap(),
            &PortfolioTracker::default(),
        )
        .unwrap()
    }

    #[test]
    fn total_return_basic() {
        assert!((total_return(&[100.0, 110.0]) - 0.1).abs() < 1e-12);
        assert_eq!(total_return(&[100.0]), 0.0);
        assert_eq!(total_return(&[]), 0.0);
    }

    #[test]
    fn total_return_counts_the_first_step() {
        let result = entered_at_start();
        assert_eq!(result.positions()[0], ShortSpread);
        let spread = SpreadSeries::new(vec![3.0, 3.0, -0.5], 0).unwrap();
        let m = PerformanceMetrics::compute(&result, &spread);
        // two held steps at leg2 - leg1 = -20 each
        assert!((m.total_return - (-40.0 / 100_000.0)).abs() < 1e-15);
        let curve = equity_curve(&result);
        assert_eq!(curve.len(), 4);
        assert_eq!(curve[0], result.initial_capital());
    }

    #[test]
    fn sharpe_constant_is_zero() {
        assert_eq!(sharpe_ratio(&[100.0; 10]), 0.0);
    }

    #[test]
    fn sharpe_known_returns() {
        let values = [100.0, 101.0, 100.5, 102.0, 101.0];
        let r = step_returns(&values);
        let expected = mean_f64(&r) / std_dev(&r) * 252.0_f64.sqrt();
        assert!((sharpe_ratio(&values) - expected).abs() < 1e-12);
    }

    #[test]
    fn max_drawdown_known() {
        let dd = max_drawdown(&[100.0, 120.0, 90.0, 130.0, 117.0]);
        assert!((dd - (-0.25)).abs() < 1e-12);
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn holding_periods_skip_open_position() {
        let positions = [Flat, ShortSpread, ShortSpread, Flat, LongSpread, Flat, ShortSpread];
        assert_eq!(holding_periods(&positions), vec![2, 1]);
        assert!((time_in_market(&positions) - 4.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn half_life_of_ar1() {
        // s_t = 0.5 s_{t-1} exactly, so φ = 0.5 and the half-life is one step
        let spread: Vec<f64> = (0..20).map(|i| 0.5_f64.powi(i)).collect();
        let hl = half_life(&spread).unwrap();
        assert!((hl - 1.0).abs() < 1e-6, "half-life {hl}");
    }

    #[test]
    fn random_walk_like_spread_has_no_half_life() {
        let trending: Vec<f64> = (0..50).map(|i| 1.05_f64.powi(i)).collect();
        assert_eq!(half_life(&trending), None);
    }
}
