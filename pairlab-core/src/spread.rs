//! SpreadModel: hedge-ratio fit and the residual spread series.
//!
//! `spread_t = leg1_t − (alpha + beta·leg2_t)`
//!
//! How alpha and beta are estimated is a [`HedgeEstimator`]:
//! - [`FullSampleOls`] fits once over the whole series. The ratio used at time t
//!   is estimated with data after t (look-ahead).
//! - [`RollingOls`] refits on the trailing window ending at t, inclusive. The first
//!   `window − 1` spread values are NaN.

use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;
use crate::error::{EngineError, EngineResult};
use crate::stats::ols;

// ─── Types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HedgeRatio {
    pub alpha: f64,
    pub beta: f64,
}

impl HedgeRatio {
    pub fn spread(&self, leg1: f64, leg2: f64) -> f64 {
        leg1 - (self.alpha + self.beta * leg2)
    }
}

/// The fitted hedge, static or one ratio per timestep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HedgeFit {
    Static(HedgeRatio),
    Rolling {
        window: usize,
        ratios: Vec<Option<HedgeRatio>>,
    },
}

impl HedgeFit {
    pub fn at(&self, index: usize) -> Option<HedgeRatio> {
        match self {
            Self::Static(ratio) => Some(*ratio),
            Self::Rolling { ratios, .. } => ratios.get(index).copied().flatten(),
        }
    }

    /// Leading timesteps without a ratio.
    pub fn warmup(&self) -> usize {
        match self {
            Self::Static(_) => 0,
            Self::Rolling { window, .. } => window - 1,
        }
    }
}

/// One spread value per input timestamp. Values inside the warmup are NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadSeries {
    #[serde(with = "crate::serde_float::vec")]
    values: Vec<f64>,
    warmup: usize,
}

impl SpreadSeries {
    pub fn new(values: Vec<f64>, warmup: usize) -> EngineResult<Self> {
        if warmup > values.len() {
            return Err(EngineError::InvalidParameter(format!(
                "warmup {warmup} exceeds spread length {}",
                values.len()
            )));
        }
        if let Some(i) = values[warmup..].iter().position(|v| !v.is_finite()) {
            return Err(EngineError::non_finite("spread", warmup + i));
        }
        Ok(Self { values, warmup })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn warmup(&self) -> usize {
        self.warmup
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Values after the warmup.
    pub fn defined(&self) -> &[f64] {
        &self.values[self.warmup..]
    }
}

// ─── Estimators ─────────────────────────────────────────────────────

/// Hedge-ratio estimation policy.
pub trait HedgeEstimator: Send + Sync {
    fn name(&self) -> &str;

    /// Leading timesteps without a hedge ratio.
    fn warmup(&self) -> usize;

    fn fit(&self, series: &PriceSeries) -> EngineResult<HedgeFit>;
}

/// OLS of leg1 on (1, leg2) over the entire series.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullSampleOls;

impl HedgeEstimator for FullSampleOls {
    fn name(&self) -> &str {
        "full_sample"
    }

    fn warmup(&self) -> usize {
        0
    }

    fn fit(&self, series: &PriceSeries) -> EngineResult<HedgeFit> {
        let fit = ols::fit_with_intercept(&series.leg1(), &series.leg2())?;
        Ok(HedgeFit::Static(HedgeRatio {
            alpha: fit.coefficients[0],
            beta: fit.coefficients[1],
        }))
    }
}

/// OLS of leg1 on (1, leg2) over the trailing `window` observations.
#[derive(Debug, Clone, Copy)]
pub struct RollingOls {
    window: usize,
}

impl RollingOls {
    pub const MIN_WINDOW: usize = 3;

    pub fn new(window: usize) -> EngineResult<Self> {
        if window < Self::MIN_WINDOW {
            return Err(EngineError::InvalidParameter(format!(
                "hedge window must be at least {}, got {window}",
                Self::MIN_WINDOW
            )));
        }
        Ok(Self { window })
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl HedgeEstimator for RollingOls {
    fn name(&self) -> &str {
        "rolling"
    }

    fn warmup(&self) -> usize {
        self.window - 1
    }

    fn fit(&self, series: &PriceSeries) -> EngineResult<HedgeFit> {
        let n = series.len();
        if n < self.window {
            return Err(EngineError::InsufficientData {
                required: self.window,
                actual: n,
            });
        }
        let leg1 = series.leg1();
        let leg2 = series.leg2();

        let mut ratios = vec![None; self.window - 1];
        for end in self.window..=n {
            let start = end - self.window;
            let fit = ols::fit_with_intercept(&leg1[start..end], &leg2[start..end]).map_err(
                |err| match err {
                    EngineError::RegressionSingularity(msg) => EngineError::RegressionSingularity(
                        format!("window ending at index {}: {msg}", end - 1),
                    ),
                    other => other,
                },
            )?;
            ratios.push(Some(HedgeRatio {
                alpha: fit.coefficients[0],
                beta: fit.coefficients[1],
            }));
        }

        Ok(HedgeFit::Rolling {
            window: self.window,
            ratios,
        })
    }
}

// ─── SpreadModel ────────────────────────────────────────────────────

/// Hedge fit plus the spread it implies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadFit {
    pub hedge: HedgeFit,
    pub spread: SpreadSeries,
}

pub struct SpreadModel {
    estimator: Box<dyn HedgeEstimator>,
}

impl Default for SpreadModel {
    fn default() -> Self {
        Self::new(Box::new(FullSampleOls))
    }
}

impl SpreadModel {
    pub fn new(estimator: Box<dyn HedgeEstimator>) -> Self {
        Self { estimator }
    }

    pub fn estimator_name(&self) -> &str {
        self.estimator.name()
    }

    pub fn fit(&self, series: &PriceSeries) -> EngineResult<SpreadFit> {
        let hedge = self.estimator.fit(series)?;
        let values = series
            .iter()
            .enumerate()
            .map(|(i, p)| hedge.at(i).map_or(f64::NAN, |h| h.spread(p.leg1, p.leg2)))
            .collect();
        let spread = SpreadSeries::new(values, hedge.warmup())?;
        Ok(SpreadFit { hedge, spread })
    }
}

impl std::fmt::Debug for SpreadModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpreadModel")
            .field("estimator", &self.estimator.name())
            .finish()
    }
}
