//! Entry / exit thresholds and the estimators that produce them.
//!
//! `entry = mean + k·std`, `lower entry = −entry`, `exit = mean`, where std is the
//! sample standard deviation (n − 1 denominator).

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::spread::SpreadSeries;
use crate::stats::{mean, sample_std};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub entry: f64,
    pub exit: f64,
}

impl Thresholds {
    pub fn from_stats(mean: f64, std: f64, k: f64) -> EngineResult<Self> {
        validate_multiplier(k)?;
        if !mean.is_finite() || !std.is_finite() || std < 0.0 {
            return Err(EngineError::InvalidParameter(format!(
                "threshold statistics must be finite with std >= 0 (mean {mean}, std {std})"
            )));
        }
        Ok(Self {
            entry: mean + k * std,
            exit: mean,
        })
    }

    /// Literal negation of the entry level, not `mean − k·std`.
    pub fn lower_entry(&self) -> f64 {
        -self.entry
    }
}

pub fn validate_multiplier(k: f64) -> EngineResult<()> {
    if !k.is_finite() || k < 0.0 {
        return Err(EngineError::InvalidParameter(format!(
            "entry multiplier must be finite and >= 0, got {k}"
        )));
    }
    Ok(())
}

/// Thresholds per timestep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThresholdSchedule {
    Static(Thresholds),
    Rolling {
        window: usize,
        levels: Vec<Option<Thresholds>>,
    },
}

impl ThresholdSchedule {
    pub fn at(&self, index: usize) -> Option<Thresholds> {
        match self {
            Self::Static(t) => Some(*t),
            Self::Rolling { levels, .. } => levels.get(index).copied().flatten(),
        }
    }
}

// ── Estimators ──

/// Threshold estimation policy.
pub trait ThresholdEstimator: Send + Sync {
    fn name(&self) -> &str;

    fn estimate(&self, spread: &SpreadSeries, k: f64) -> EngineResult<ThresholdSchedule>;
}

/// Mean and std over every defined spread value (look-ahead).
#[derive(Debug, Clone, Copy, Default)]
pub struct FullSampleThresholds;

impl ThresholdEstimator for FullSampleThresholds {
    fn name(&self) -> &str {
        "full_sample"
    }

    fn estimate(&self, spread: &SpreadSeries, k: f64) -> EngineResult<ThresholdSchedule> {
        let values = spread.defined();
        if values.len() < 2 {
            return Err(EngineError::InsufficientData {
                required: 2,
                actual: values.len(),
            });
        }
        let t = Thresholds::from_stats(mean(values), sample_std(values), k)?;
        Ok(ThresholdSchedule::Static(t))
    }
}

/// Mean and std over the trailing `window` spread values ending at t.
#[derive(Debug, Clone, Copy)]
pub struct RollingThresholds {
    window: usize,
}

impl RollingThresholds {
    pub fn new(window: usize) -> EngineResult<Self> {
        if window < 2 {
            return Err(EngineError::InvalidParameter(format!(
                "threshold window must be at least 2, got {window}"
            )));
        }
        Ok(Self { window })
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl ThresholdEstimator for RollingThresholds {
    fn name(&self) -> &str {
        "rolling"
    }

    fn estimate(&self, spread: &SpreadSeries, k: f64) -> EngineResult<ThresholdSchedule> {
        validate_multiplier(k)?;
        let values = spread.values();
        let first = spread.warmup() + self.window - 1;

        let levels = (0..values.len())
            .map(|t| {
                if t < first {
                    return Ok(None);
                }
                let tail = &values[t + 1 - self.window..=t];
                Thresholds::from_stats(mean(tail), sample_std(tail), k).map(Some)
            })
            .collect::<EngineResult<Vec<_>>>()?;

        Ok(ThresholdSchedule::Rolling {
            window: self.window,
            levels,
        })
    }
}
