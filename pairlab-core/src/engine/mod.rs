//! Backtesting engine: the per-timestep signal / position / portfolio loop and the
//! orchestrator that feeds it.
//!
//! 1. Cointegration test and hedge fit (in parallel)
//! 2. Thresholds from the spread
//! 3. Left-to-right scan producing one `BacktestStep` per timestamp

pub mod loop_runner;
pub mod portfolio;
pub mod position;
pub mod state;

pub use loop_runner::{simulate, BacktestEngine};
pub use portfolio::{AccountingMode, PortfolioTracker};
pub use position::{EventKind, PositionEvent, PositionSimulator};
pub use state::{BacktestReport, BacktestResult, BacktestStep, EngineConfig};
