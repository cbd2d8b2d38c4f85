//! Serializable backtest configuration (TOML).
//!
//! Every section and field has a default, so an empty file is a valid config
//! apart from the price source. Unknown fields are rejected.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pairlab_core::signal::{FullSampleThresholds, RollingThresholds};
use pairlab_core::spread::{FullSampleOls, RollingOls};
use pairlab_core::synthetic::{SyntheticConfig, SyntheticKind};
use pairlab_core::{
    AccountingMode, BacktestEngine, EngineConfig, EngineError, ExitRule, HedgeEstimator,
    Precedence, ThresholdEstimator,
};

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("invalid engine parameter: {0}")]
    Engine(#[from] EngineError),
    #[error("config serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ─── Sections ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BacktestConfig {
    pub pair: PairSection,
    pub backtest: BacktestSection,
    pub cointegration: CointegrationSection,
    pub signal: SignalSection,
    pub model: ModelSection,
    pub synthetic: SyntheticSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PairSection {
    pub leg1: String,
    pub leg2: String,
    /// One CSV with `date,<leg1>,<leg2>`.
    pub prices: Option<PathBuf>,
    /// Two CSVs with `date,close`.
    pub leg1_prices: Option<PathBuf>,
    pub leg2_prices: Option<PathBuf>,
    pub synthetic: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Default for PairSection {
    fn default() -> Self {
        Self {
            leg1: "LEG1".into(),
            leg2: "LEG2".into(),
            prices: None,
            leg1_prices: None,
            leg2_prices: None,
            synthetic: false,
            start_date: None,
            end_date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BacktestSection {
    pub initial_capital: f64,
    pub accounting: AccountingMode,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            accounting: AccountingMode::PriceLevel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CointegrationSection {
    pub significance: f64,
    pub min_sample: usize,
}

impl Default for CointegrationSection {
    fn default() -> Self {
        Self {
            significance: 0.05,
            min_sample: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignalSection {
    pub entry_multiplier: f64,
    pub exit_rule: ExitRule,
    pub precedence: Precedence,
}

impl Default for SignalSection {
    fn default() -> Self {
        Self {
            entry_multiplier: 2.0,
            exit_rule: ExitRule::Literal,
            precedence: Precedence::StateGated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    #[default]
    FullSample,
    Rolling,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelSection {
    pub hedge: EstimatorKind,
    pub hedge_window: usize,
    pub thresholds: EstimatorKind,
    pub threshold_window: usize,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            hedge: EstimatorKind::FullSample,
            hedge_window: 60,
            thresholds: EstimatorKind::FullSample,
            threshold_window: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticPairKind {
    #[default]
    Independent,
    Cointegrated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticSection {
    pub seed: u64,
    pub periods: usize,
    pub start_date: NaiveDate,
    pub kind: SyntheticPairKind,
    /// Used when `kind = "cointegrated"`.
    pub hedge_ratio: f64,
    pub persistence: f64,
}

impl Default for SyntheticSection {
    fn default() -> Self {
        let defaults = SyntheticConfig::default();
        Self {
            seed: defaults.seed,
            periods: defaults.periods,
            start_date: defaults.start_date,
            kind: SyntheticPairKind::Independent,
            hedge_ratio: 1.0,
            persistence: 0.5,
        }
    }
}

/// Where the prices come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceSource {
    Combined(PathBuf),
    Separate { leg1: PathBuf, leg2: PathBuf },
    Synthetic,
}

// ─── Loading and validation ─────────────────────────────────────────

impl BacktestConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file. Relative price paths resolve against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&text)?;
        if let Some(dir) = path.parent() {
            config.pair.resolve_paths(dir);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.price_source()?;
        if let (Some(start), Some(end)) = (self.pair.start_date, self.pair.end_date) {
            if start > end {
                return Err(ConfigError::Invalid(format!(
                    "start_date {start} is after end_date {end}"
                )));
            }
        }
        if self.pair.leg1.trim().is_empty() || self.pair.leg2.trim().is_empty() {
            return Err(ConfigError::Invalid("leg names must not be empty".into()));
        }
        self.engine_config().validate()?;
        self.hedge_estimator()?;
        self.threshold_estimator()?;
        Ok(())
    }

    pub fn price_source(&self) -> Result<PriceSource, ConfigError> {
        let pair = &self.pair;
        let separate = (pair.leg1_prices.as_ref(), pair.leg2_prices.as_ref());
        let source = match (&pair.prices, separate, pair.synthetic) {
            (Some(path), (None, None), false) => PriceSource::Combined(path.clone()),
            (None, (Some(a), Some(b)), false) => PriceSource::Separate {
                leg1: a.clone(),
                leg2: b.clone(),
            },
            (None, (None, None), true) => PriceSource::Synthetic,
            (None, (None, None), false) => {
                return Err(ConfigError::Invalid(
                    "no price source: set pair.prices, pair.leg1_prices + pair.leg2_prices, \
                     or pair.synthetic = true"
                        .into(),
                ))
            }
            _ => {
                return Err(ConfigError::Invalid(
                    "price sources are mutually exclusive and leg files come in pairs".into(),
                ))
            }
        };
        Ok(source)
    }

    /// Deterministic hash of the canonical JSON form.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    // ── Factory ──

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            entry_multiplier: self.signal.entry_multiplier,
            significance: self.cointegration.significance,
            initial_capital: self.backtest.initial_capital,
            min_sample: self.cointegration.min_sample,
            accounting: self.backtest.accounting,
            exit_rule: self.signal.exit_rule,
            precedence: self.signal.precedence,
        }
    }

    pub fn hedge_estimator(&self) -> Result<Box<dyn HedgeEstimator>, ConfigError> {
        Ok(match self.model.hedge {
            EstimatorKind::FullSample => Box::new(FullSampleOls),
            EstimatorKind::Rolling => Box::new(RollingOls::new(self.model.hedge_window)?),
        })
    }

    pub fn threshold_estimator(&self) -> Result<Box<dyn ThresholdEstimator>, ConfigError> {
        Ok(match self.model.thresholds {
            EstimatorKind::FullSample => Box::new(FullSampleThresholds),
            EstimatorKind::Rolling => {
                Box::new(RollingThresholds::new(self.model.threshold_window)?)
            }
        })
    }

    pub fn build_engine(&self) -> Result<BacktestEngine, ConfigError> {
        Ok(BacktestEngine::with_estimators(
            self.engine_config(),
            self.hedge_estimator()?,
            self.threshold_estimator()?,
        )?)
    }

    pub fn synthetic_config(&self) -> SyntheticConfig {
        let s = &self.synthetic;
        SyntheticConfig {
            seed: s.seed,
            periods: s.periods,
            start_date: s.start_date,
            start_price: 100.0,
            kind: match s.kind {
                SyntheticPairKind::Independent => SyntheticKind::IndependentWalks,
                SyntheticPairKind::Cointegrated => SyntheticKind::Cointegrated {
                    hedge_ratio: s.hedge_ratio,
                    persistence: s.persistence,
                },
            },
        }
    }

    /// Copy with a different entry multiplier, for sweeps.
    pub fn with_entry_multiplier(&self, k: f64) -> Self {
        let mut config = self.clone();
        config.signal.entry_multiplier = k;
        config
    }
}

impl PairSection {
    fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.prices, &mut self.leg1_prices, &mut self.leg2_prices]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
