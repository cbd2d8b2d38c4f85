//! Single left-to-right pass over the price series.
//!
//! Per timestep:
//! 1. Signal: decide the next position from the spread and that step's thresholds
//! 2. Position: classify the change as entry / exit
//! 3. Portfolio: accumulate value under the configured accounting mode
//!
//! The loop is a pure scan over `LoopState`. The cointegration test and the spread fit
//! happen before it and run in parallel with each other.

use tracing::{debug, info, warn};

use crate::cointegration::CointegrationTester;
use crate::domain::PriceSeries;
use crate::error::{EngineError, EngineResult};
use crate::signal::{FullSampleThresholds, SignalGenerator, ThresholdEstimator, ThresholdSchedule};
use crate::spread::{FullSampleOls, HedgeEstimator, SpreadModel, SpreadSeries};

use super::portfolio::PortfolioTracker;
use super::position::PositionSimulator;
use super::state::{BacktestReport, BacktestResult, BacktestStep, EngineConfig, LoopState};

/// Run the signal / position / portfolio loop over a precomputed spread.
pub fn simulate(
    series: &PriceSeries,
    spread: &SpreadSeries,
    thresholds: ThresholdSchedule,
    signal: &SignalGenerator,
    tracker: &PortfolioTracker,
) -> EngineResult<BacktestResult> {
    if spread.len() != series.len() {
        return Err(EngineError::DataAlignment(format!(
            "spread has {} values but price series has {}",
            spread.len(),
            series.len()
        )));
    }
    let simulator = PositionSimulator;

    let steps = series
        .iter()
        .zip(spread.values())
        .enumerate()
        .scan(LoopState::initial(tracker.initial_capital()), |state, (t, (point, &s))| {
            let decision = signal.decide(state.position, s, thresholds.at(t));
            let event = simulator.step(state.position, decision.next);
            if let Some(e) = event {
                debug!(index = t, date = %point.timestamp, spread = s, from = %e.from, to = %e.to, "position {}", e.kind.as_str());
            }
            let value = tracker.step(
                state.value,
                state.position,
                decision.next,
                point,
                state.prev.as_ref(),
            );
            *state = LoopState {
                position: decision.next,
                value,
                prev: Some(*point),
            };
            Some(BacktestStep {
                index: t,
                timestamp: point.timestamp,
                spread: s,
                position: decision.next,
                portfolio_value: value,
                event: event.map(|e| e.kind),
            })
        })
        .collect::<Vec<_>>();

    if let Some(bad) = steps.iter().find(|s| !s.portfolio_value.is_finite()) {
        return Err(EngineError::non_finite("portfolio_value", bad.index));
    }

    Ok(BacktestResult::from_steps(
        steps,
        thresholds,
        tracker.initial_capital(),
    ))
}

// ─── BacktestEngine ─────────────────────────────────────────────────

/// Orchestrates cointegration test, spread fit, thresholds and the loop.
pub struct BacktestEngine {
    config: EngineConfig,
    tester: CointegrationTester,
    spread_model: SpreadModel,
    signal: SignalGenerator,
    tracker: PortfolioTracker,
}

impl BacktestEngine {
    /// Full-sample hedge and thresholds.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        Self::with_estimators(config, Box::new(FullSampleOls), Box::new(FullSampleThresholds))
    }

    pub fn with_estimators(
        config: EngineConfig,
        hedge: Box<dyn HedgeEstimator>,
        thresholds: Box<dyn ThresholdEstimator>,
    ) -> EngineResult<Self> {
        config.validate()?;
        let tester = CointegrationTester::new(config.min_sample)?;
        let signal = SignalGenerator::new(
            config.entry_multiplier,
            thresholds,
            config.exit_rule.table(),
            config.precedence,
        )?;
        let tracker = PortfolioTracker::new(config.initial_capital, config.accounting)?;
        Ok(Self {
            config,
            tester,
            spread_model: SpreadModel::new(hedge),
            signal,
            tracker,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn run(&self, series: &PriceSeries) -> EngineResult<BacktestReport> {
        if series.len() < self.config.min_sample {
            return Err(EngineError::InsufficientData {
                required: self.config.min_sample,
                actual: series.len(),
            });
        }

        let (cointegration, fit) = rayon::join(
            || self.tester.report(series, self.config.significance),
            || self.spread_model.fit(series),
        );
        let cointegration = cointegration?;
        let fit = fit?;

        let r = &cointegration.result;
        if cointegration.verdict.is_cointegrated() {
            info!(statistic = r.test_statistic, p_value = r.p_value, lags = r.lags_used, "pair is cointegrated");
        } else {
            warn!(
                statistic = r.test_statistic,
                p_value = r.p_value,
                significance = self.config.significance,
                "pair is not cointegrated; backtesting anyway"
            );
        }

        let thresholds = self.signal.thresholds(&fit.spread)?;
        let result = simulate(series, &fit.spread, thresholds, &self.signal, &self.tracker)?;

        info!(
            steps = result.len(),
            entries = result.entry_timestamps().len(),
            exits = result.exit_timestamps().len(),
            final_value = result.final_portfolio_value(),
            hedge = self.spread_model.estimator_name(),
            thresholds = self.signal.estimator_name(),
            "backtest complete"
        );

        Ok(BacktestReport {
            cointegration,
            hedge: fit.hedge,
            spread: fit.spread,
            result,
        })
    }
}

impl std::fmt::Debug for BacktestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BacktestEngine")
            .field("config", &self.config)
            .field("spread_model", &self.spread_model)
            .field("signal", &self.signal)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PositionState;
    use crate::engine::EventKind;
    use crate::signal::Thresholds;
    use crate::PricePoint;
    use chrono::NaiveDate;

    fn flat_prices(n: usize) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let points = (0..n)
            .map(|i| PricePoint::new(start + chrono::Duration::days(i as i64), 10.0, 4.0))
            .collect();
        PriceSeries::new(points).unwrap()
    }

    #[test]
    fn scan_tracks_position_and_value() {
        let series = flat_prices(5);
        let spread = SpreadSeries::new(vec![0.0, 0.0, 3.0, 3.0, -0.5], 0).unwrap();
        let schedule = ThresholdSchedule::Static(Thresholds::from_stats(0.0, 1.0, 2.0).unwrap());
        let signal = SignalGenerator::with_multiplier(2.0).unwrap();
        let tracker = PortfolioTracker::default();

        let result = simulate(&series, &spread, schedule, &signal, &tracker).unwrap();
        assert_eq!(
            result.positions(),
            vec![
                PositionState::Flat,
                PositionState::Flat,
                PositionState::ShortSpread,
                PositionState::ShortSpread,
                PositionState::Flat
            ]
        );
        // short spread at (10, 4) adds -6 per held step
        assert_eq!(result.final_portfolio_value(), 100_000.0 - 12.0);
        assert_eq!(result.steps()[2].event, Some(EventKind::Entry));
        assert_eq!(result.steps()[4].event, Some(EventKind::Exit));
    }

    #[test]
    fn spread_length_must_match() {
        let series = flat_prices(4);
        let spread = SpreadSeries::new(vec![0.0; 3], 0).unwrap();
        let schedule = ThresholdSchedule::Static(Thresholds::from_stats(0.0, 1.0, 2.0).unwrap());
        let signal = SignalGenerator::with_multiplier(2.0).unwrap();
        let err = simulate(&series, &spread, schedule, &signal, &PortfolioTracker::default()).unwrap_err();
        assert!(matches!(err, EngineError::DataAlignment(_)));
    }

    #[test]
    fn invalid_config_rejected_before_data() {
        let config = EngineConfig {
            significance: 1.5,
            ..EngineConfig::default()
        };
        assert!(matches!(
            BacktestEngine::new(config),
            Err(EngineError::InvalidParameter(_))
        ));
    }
}
