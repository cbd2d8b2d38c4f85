//! Backtest runner — wires together config, data loading, engine, and metrics.
//!
//! Two entry points:
//! - `run_from_config()`: loads prices from the configured source, then runs. Used by the CLI.
//! - `run_on_prices()`: takes pre-loaded prices. Used by sweeps so the CSV is read once.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use pairlab_core::{BacktestReport, EngineError};

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_prices, LoadError, LoadedPrices};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete output of a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub leg1: String,
    pub leg2: String,
    pub start_date: String,
    pub end_date: String,
    pub dataset_hash: String,
    pub is_synthetic: bool,
    pub metrics: PerformanceMetrics,
    pub report: BacktestReport,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RunOutput {
    pub fn is_cointegrated(&self) -> bool {
        self.report.cointegration.verdict.is_cointegrated()
    }
}

/// Load the configured prices and run.
pub fn run_from_config(config: &BacktestConfig) -> Result<RunOutput, RunError> {
    let prices = load_prices(config)?;
    run_on_prices(config, &prices)
}

/// Run on pre-loaded prices without touching the filesystem.
pub fn run_on_prices(
    config: &BacktestConfig,
    prices: &LoadedPrices,
) -> Result<RunOutput, RunError> {
    let engine = config.build_engine()?;
    let report = engine.run(&prices.series)?;
    let metrics = PerformanceMetrics::compute(&report.result, &report.spread);
    let run_id = config.run_id()?;

    info!(
        run_id = &run_id[..12],
        total_return = metrics.total_return,
        sharpe = metrics.sharpe,
        round_trips = metrics.round_trips,
        "run complete"
    );

    Ok(RunOutput {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: config.clone(),
        leg1: config.pair.leg1.clone(),
        leg2: config.pair.leg2.clone(),
        start_date: prices.series.first_timestamp().to_string(),
        end_date: prices.series.last_timestamp().to_string(),
        dataset_hash: prices.dataset_hash.clone(),
        is_synthetic: prices.is_synthetic,
        metrics,
        report,
    })
}
