//! Engine configuration, loop state, and run result types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cointegration::{CointegrationReport, CointegrationTester};
use crate::domain::{PositionState, PricePoint};
use crate::error::{EngineError, EngineResult};
use crate::signal::{validate_multiplier, ExitRule, Precedence, ThresholdSchedule};
use crate::spread::{HedgeFit, SpreadSeries};

use super::portfolio::{AccountingMode, PortfolioTracker};
use super::position::EventKind;

/// Configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub entry_multiplier: f64,
    /// Advisory cointegration significance level.
    pub significance: f64,
    pub initial_capital: f64,
    pub min_sample: usize,
    pub accounting: AccountingMode,
    pub exit_rule: ExitRule,
    pub precedence: Precedence,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            entry_multiplier: 2.0,
            significance: 0.05,
            initial_capital: PortfolioTracker::DEFAULT_INITIAL_CAPITAL,
            min_sample: CointegrationTester::DEFAULT_MIN_SAMPLE,
            accounting: AccountingMode::PriceLevel,
            exit_rule: ExitRule::Literal,
            precedence: Precedence::StateGated,
        }
    }
}

impl EngineConfig {
    pub fn new(initial_capital: f64, entry_multiplier: f64) -> Self {
        Self {
            initial_capital,
            entry_multiplier,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        validate_multiplier(self.entry_multiplier)?;
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(EngineError::InvalidParameter(format!(
                "significance must be in (0, 1), got {}",
                self.significance
            )));
        }
        PortfolioTracker::new(self.initial_capital, self.accounting)?;
        CointegrationTester::new(self.min_sample)?;
        Ok(())
    }
}

/// Carried from one timestep to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LoopState {
    pub position: PositionState,
    pub value: f64,
    pub prev: Option<PricePoint>,
}

impl LoopState {
    pub fn initial(initial_capital: f64) -> Self {
        Self {
            position: PositionState::Flat,
            value: initial_capital,
            prev: None,
        }
    }
}

/// One row of the backtest output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestStep {
    pub index: usize,
    pub timestamp: NaiveDate,
    /// NaN inside a rolling warmup.
    #[serde(with = "crate::serde_float")]
    pub spread: f64,
    pub position: PositionState,
    pub portfolio_value: f64,
    pub event: Option<EventKind>,
}

/// Immutable output of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    steps: Vec<BacktestStep>,
    entry_timestamps: Vec<NaiveDate>,
    exit_timestamps: Vec<NaiveDate>,
    thresholds: ThresholdSchedule,
    initial_capital: f64,
    final_portfolio_value: f64,
}

impl BacktestResult {
    pub(crate) fn from_steps(
        steps: Vec<BacktestStep>,
        thresholds: ThresholdSchedule,
        initial_capital: f64,
    ) -> Self {
        let marked = |kind: EventKind| {
            steps
                .iter()
                .filter(|s| s.event == Some(kind))
                .map(|s| s.timestamp)
                .collect::<Vec<_>>()
        };
        let entry_timestamps = marked(EventKind::Entry);
        let exit_timestamps = marked(EventKind::Exit);
        let final_portfolio_value = steps.last().map_or(initial_capital, |s| s.portfolio_value);
        Self {
            steps,
            entry_timestamps,
            exit_timestamps,
            thresholds,
            initial_capital,
            final_portfolio_value,
        }
    }

    pub fn steps(&self) -> &[BacktestStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn entry_timestamps(&self) -> &[NaiveDate] {
        &self.entry_timestamps
    }

    pub fn exit_timestamps(&self) -> &[NaiveDate] {
        &self.exit_timestamps
    }

    pub fn thresholds(&self) -> &ThresholdSchedule {
        &self.thresholds
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn final_portfolio_value(&self) -> f64 {
        self.final_portfolio_value
    }

    pub fn portfolio_values(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.portfolio_value).collect()
    }

    pub fn positions(&self) -> Vec<PositionState> {
        self.steps.iter().map(|s| s.position).collect()
    }

    pub fn spreads(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.spread).collect()
    }
}

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub cointegration: CointegrationReport,
    pub hedge: HedgeFit,
    pub spread: SpreadSeries,
    pub result: BacktestResult,
}
