//! PairLab Runner — pair backtest orchestration, metrics, artifacts, sweeps.
//!
//! This crate builds on `pairlab-core` to provide:
//! - TOML run configuration and the estimator factory
//! - Price loading from CSV (one pair file or two close files) or synthetic data
//! - Single-run orchestration with performance metrics
//! - JSON / CSV / Markdown artifacts with schema versioning
//! - Parallel entry-multiplier sweeps

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;

pub use config::{BacktestConfig, ConfigError, PriceSource, RunId};
pub use data_loader::{compute_dataset_hash, load_prices, LoadError, LoadedPrices};
pub use export::{generate_report, import_json, load_artifacts, save_artifacts};
pub use metrics::PerformanceMetrics;
pub use runner::{run_from_config, run_on_prices, RunError, RunOutput, SCHEMA_VERSION};
pub use sweep::{Sweep, SweepPoint};
