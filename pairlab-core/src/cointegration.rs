//! CointegrationTester: Engle–Granger test on the pair's regression residuals.
//!
//! The verdict is advisory. A pair that fails the test is still backtested; callers
//! decide what to do with the [`Verdict`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::PriceSeries;
use crate::error::{EngineError, EngineResult};
use crate::stats::{adf_no_constant, mackinnon, ols, CriticalValues};

/// R² at or above this is treated as a perfect fit (statistic −∞, p-value 0).
const PERFECT_FIT_RSQUARED: f64 = 1.0 - 100.0 * 1.490_116_119_384_765_6e-8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CointegrationResult {
    #[serde(with = "crate::serde_float")]
    pub test_statistic: f64,
    pub p_value: f64,
    pub critical_values: CriticalValues,
    pub lags_used: usize,
    /// Observations in the final ADF regression.
    pub nobs: usize,
}

impl CointegrationResult {
    /// Residuals with nothing left to test: statistic −∞, p-value 0.
    fn perfect_fit(critical_values: CriticalValues, nobs: usize) -> Self {
        Self {
            test_statistic: f64::NEG_INFINITY,
            p_value: 0.0,
            critical_values,
            lags_used: 0,
            nobs,
        }
    }

    pub fn verdict(&self, significance: f64) -> Verdict {
        if self.p_value < significance {
            Verdict::Cointegrated
        } else {
            Verdict::NotCointegrated
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Cointegrated,
    NotCointegrated,
}

impl Verdict {
    pub fn is_cointegrated(self) -> bool {
        self == Self::Cointegrated
    }
}

/// A result together with the verdict at a chosen significance level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CointegrationReport {
    pub result: CointegrationResult,
    pub significance: f64,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CointegrationTester {
    min_sample: usize,
}

impl Default for CointegrationTester {
    fn default() -> Self {
        Self {
            min_sample: Self::DEFAULT_MIN_SAMPLE,
        }
    }
}

impl CointegrationTester {
    pub const DEFAULT_MIN_SAMPLE: usize = 20;

    /// Smallest sample for which the ADF regression is defined.
    const FLOOR: usize = 4;

    pub fn new(min_sample: usize) -> EngineResult<Self> {
        if min_sample < Self::FLOOR {
            return Err(EngineError::InvalidParameter(format!(
                "min_sample must be at least {}, got {min_sample}",
                Self::FLOOR
            )));
        }
        Ok(Self { min_sample })
    }

    pub fn min_sample(&self) -> usize {
        self.min_sample
    }

    pub fn test(&self, series: &PriceSeries) -> EngineResult<CointegrationResult> {
        self.test_legs(&series.leg1(), &series.leg2())
    }

    pub fn report(&self, series: &PriceSeries, significance: f64) -> EngineResult<CointegrationReport> {
        let result = self.test(series)?;
        Ok(CointegrationReport {
            result,
            significance,
            verdict: result.verdict(significance),
        })
    }

    /// Test `leg1` against `leg2`. Both must have the same length.
    pub fn test_legs(&self, leg1: &[f64], leg2: &[f64]) -> EngineResult<CointegrationResult> {
        if leg1.len() != leg2.len() {
            return Err(EngineError::DataAlignment(format!(
                "leg1 has {} observations but leg2 has {}",
                leg1.len(),
                leg2.len()
            )));
        }
        let n = leg1.len();
        if n < self.min_sample {
            return Err(EngineError::InsufficientData {
                required: self.min_sample,
                actual: n,
            });
        }

        let critical_values = mackinnon::critical_values(n - 1);
        let fit = ols::fit_with_intercept(leg1, leg2)?;

        // A constant leg1 leaves no variance to explain, so R² is undefined.
        let rsquared = fit.rsquared();
        if !rsquared.is_finite() || rsquared >= PERFECT_FIT_RSQUARED {
            debug!(rsquared, "residuals identically zero");
            return Ok(CointegrationResult::perfect_fit(critical_values, n - 1));
        }

        let Some(adf) = adf_no_constant(&fit.residuals)? else {
            debug!("residuals explained exactly at every lag");
            return Ok(CointegrationResult::perfect_fit(critical_values, n - 1));
        };
        let p_value = mackinnon::p_value(adf.statistic);
        debug!(
            statistic = adf.statistic,
            p_value,
            lags = adf.lags_used,
            "engle-granger test"
        );

        Ok(CointegrationResult {
            test_statistic: adf.statistic,
            p_value,
            critical_values,
            lags_used: adf.lags_used,
            nobs: adf.nobs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_minimum_is_insufficient() {
        let tester = CointegrationTester::default();
        let x: Vec<f64> = (0..19).map(|i| i as f64).collect();
        let err = tester.test_legs(&x, &x).unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientData {
                required: 20,
                actual: 19
            }
        );
    }

    #[test]
    fn perfectly_collinear_pair_has_zero_p_value() {
        let tester = CointegrationTester::default();
        let leg2: Vec<f64> = (0..40).map(|i| 50.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let leg1: Vec<f64> = leg2.iter().map(|p| 2.0 + 1.5 * p).collect();
        let res = tester.test_legs(&leg1, &leg2).unwrap();
        assert_eq!(res.test_statistic, f64::NEG_INFINITY);
        assert_eq!(res.p_value, 0.0);
        assert_eq!(res.verdict(0.05), Verdict::Cointegrated);
    }

    #[test]
    fn constant_leg1_is_a_perfect_fit() {
        let tester = CointegrationTester::default();
        let leg1 = vec![100.0; 40];
        let leg2: Vec<f64> = (0..40).map(|i| 50.0 + i as f64).collect();
        let res = tester.test_legs(&leg1, &leg2).unwrap();
        assert_eq!(res.test_statistic, f64::NEG_INFINITY);
        assert_eq!(res.p_value, 0.0);
        assert_eq!(res.nobs, 39);
    }

    #[test]
    fn verdict_is_strictly_below_significance() {
        let res = CointegrationResult {
            test_statistic: -3.0,
            p_value: 0.05,
            critical_values: mackinnon::critical_values(100),
            lags_used: 0,
            nobs: 100,
        };
        assert_eq!(res.verdict(0.05), Verdict::NotCointegrated);
        assert_eq!(res.verdict(0.10), Verdict::Cointegrated);
    }

    #[test]
    fn min_sample_floor_is_enforced() {
        assert!(CointegrationTester::new(3).is_err());
        assert_eq!(CointegrationTester::new(30).unwrap().min_sample(), 30);
    }
}
