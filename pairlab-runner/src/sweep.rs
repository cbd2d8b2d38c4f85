//! Entry-multiplier sweep over one pair.
//!
//! Prices are loaded once; each k runs independently, in parallel with rayon
//! unless disabled. Results come back in input order and are identical either way.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use pairlab_core::AccountingMode;

use crate::config::BacktestConfig;
use crate::data_loader::{load_prices, LoadedPrices};
use crate::runner::{run_on_prices, RunError, RunOutput};

/// One row of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub entry_multiplier: f64,
    pub accounting: AccountingMode,
    pub run_id: String,
    pub final_value: f64,
    pub total_return: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub entries: usize,
    pub round_trips: usize,
}

impl SweepPoint {
    fn from_output(output: &RunOutput) -> Self {
        let m = &output.metrics;
        Self {
            entry_multiplier: output.config.signal.entry_multiplier,
            accounting: output.config.backtest.accounting,
            run_id: output.run_id.clone(),
            final_value: output.report.result.final_portfolio_value(),
            total_return: m.total_return,
            sharpe: m.sharpe,
            max_drawdown: m.max_drawdown,
            entries: m.entries,
            round_trips: m.round_trips,
        }
    }
}

/// Sweep over entry multipliers, optionally crossed with accounting modes.
#[derive(Debug, Clone)]
pub struct Sweep {
    multipliers: Vec<f64>,
    accounting: Vec<AccountingMode>,
    parallel: bool,
}

impl Sweep {
    /// Sweep `multipliers` under the base config's accounting mode.
    pub fn new(multipliers: Vec<f64>) -> Self {
        Self {
            multipliers,
            accounting: Vec::new(),
            parallel: true,
        }
    }

    /// Also sweep these accounting modes (outer loop: k, inner loop: mode).
    pub fn with_accounting(mut self, modes: Vec<AccountingMode>) -> Self {
        self.accounting = modes;
        self
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Number of runs this sweep performs.
    pub fn size(&self) -> usize {
        self.multipliers.len() * self.accounting.len().max(1)
    }

    /// One config per (k, mode), in order.
    pub fn configs(&self, base: &BacktestConfig) -> Vec<BacktestConfig> {
        let modes = if self.accounting.is_empty() {
            vec![base.backtest.accounting]
        } else {
            self.accounting.clone()
        };
        self.multipliers
            .iter()
            .flat_map(|&k| {
                modes.iter().map(move |&mode| {
                    let mut config = base.with_entry_multiplier(k);
                    config.backtest.accounting = mode;
                    config
                })
            })
            .collect()
    }

    /// Load the base config's prices and run every configuration.
    pub fn run(&self, base: &BacktestConfig) -> Result<Vec<SweepPoint>, RunError> {
        let prices = load_prices(base)?;
        self.run_on_prices(base, &prices)
    }

    /// Run every configuration on pre-loaded prices.
    pub fn run_on_prices(
        &self,
        base: &BacktestConfig,
        prices: &LoadedPrices,
    ) -> Result<Vec<SweepPoint>, RunError> {
        let configs = self.configs(base);
        for config in &configs {
            config.validate()?;
        }
        info!(runs = configs.len(), parallel = self.parallel, "starting sweep");

        let run = |config: &BacktestConfig| {
            run_on_prices(config, prices).map(|output| SweepPoint::from_output(&output))
        };
        if self.parallel {
            configs.par_iter().map(run).collect()
        } else {
            configs.iter().map(run).collect()
        }
    }
}
