//! Augmented Dickey–Fuller regression without deterministic terms.
//!
//! `Δx_t = γ·x_{t−1} + Σ_{j=1..p} φ_j·Δx_{t−j} + u_t`
//!
//! The lag order `p` is chosen by AIC over a common sample, then the regression is
//! re-run on the maximal sample for that order. The statistic is the t-value of γ.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::descriptive::diff;
use super::ols::{self, OlsFit};
use crate::error::{EngineError, EngineResult};

/// A candidate whose residual sum of squares is at most this share of the response's
/// centered sum of squares explains the differences exactly.
const EXACT_FIT: f64 = 1e-20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdfResult {
    pub statistic: f64,
    pub lags_used: usize,
    /// Observations in the final regression.
    pub nobs: usize,
}

/// Schwert's rule `ceil(12·(n/100)^{1/4})`, capped at `n/2 − 1`.
pub fn default_maxlag(n: usize) -> usize {
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    schwert.min((n / 2).saturating_sub(1))
}

/// Run the test on `series` with automatic lag selection up to [`default_maxlag`].
///
/// Returns `Ok(None)` when the series is explained exactly at every candidate lag:
/// each design is singular or leaves a zero residual, so no finite statistic exists.
pub fn adf_no_constant(series: &[f64]) -> EngineResult<Option<AdfResult>> {
    if series.len() < 4 {
        return Err(EngineError::InsufficientData {
            required: 4,
            actual: series.len(),
        });
    }
    let maxlag = default_maxlag(series.len());
    let dx = diff(series);

    // ── AIC search on the common sample ──
    let mut best: Option<(f64, usize)> = None;
    let mut degenerate = 0usize;
    for lag in 0..=maxlag {
        let fit = match regress(series, &dx, maxlag, lag) {
            Some(Ok(fit)) => fit,
            Some(Err(EngineError::RegressionSingularity(reason))) => {
                trace!(lag, %reason, "adf candidate singular");
                degenerate += 1;
                continue;
            }
            Some(Err(e)) => return Err(e),
            None => continue,
        };
        let aic = fit.aic();
        trace!(lag, aic, "adf candidate");
        if !aic.is_finite() || is_exact(&fit) {
            degenerate += 1;
            continue;
        }
        if best.map_or(true, |(best_aic, _)| aic < best_aic) {
            best = Some((aic, lag));
        }
    }

    let Some((_, lag)) = best else {
        if degenerate > 0 {
            return Ok(None);
        }
        return Err(EngineError::InsufficientData {
            required: 3,
            actual: dx.len(),
        });
    };

    // ── Final regression on the maximal sample for the chosen lag ──
    let fit = match regress(series, &dx, lag, lag) {
        Some(Ok(fit)) => fit,
        Some(Err(EngineError::RegressionSingularity(_))) => return Ok(None),
        Some(Err(e)) => return Err(e),
        None => {
            return Err(EngineError::InsufficientData {
                required: lag + 2,
                actual: dx.len(),
            })
        }
    };

    let statistic = fit.t_value(0);
    if !statistic.is_finite() || is_exact(&fit) {
        return Ok(None);
    }

    Ok(Some(AdfResult {
        statistic,
        lags_used: lag,
        nobs: fit.nobs,
    }))
}

fn is_exact(fit: &OlsFit) -> bool {
    fit.ssr <= EXACT_FIT * fit.centered_tss
}

/// Regress `Δx_t` on `x_{t−1}` and `lag` lagged differences, dropping the first
/// `trim` usable rows so every lag in a search shares one sample.
///
/// Returns `None` when the regression would have no residual degrees of freedom.
fn regress(
    series: &[f64],
    dx: &[f64],
    trim: usize,
    lag: usize,
) -> Option<EngineResult<OlsFit>> {
    let rows = dx.len().checked_sub(trim)?;
    let k = lag + 1;
    if rows <= k {
        return None;
    }

    // Row r describes t = trim + r: response dx[t], level series[t], lags dx[t − j].
    let design = DMatrix::from_fn(rows, k, |r, c| {
        let t = trim + r;
        if c == 0 {
            series[t]
        } else {
            dx[t - c]
        }
    });
    let response = DVector::from_iterator(rows, (trim..dx.len()).map(|t| dx[t]));
    Some(ols::fit(&design, &response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, StandardNormal};

    fn noise(seed: u64, n: usize) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| StandardNormal.sample(&mut rng)).collect()
    }

    #[test]
    fn maxlag_follows_schwert_rule() {
        assert_eq!(default_maxlag(100), 12);
        assert_eq!(default_maxlag(500), 18);
        // capped by n/2 - 1 on short samples
        assert_eq!(default_maxlag(20), 9);
    }

    #[test]
    fn white_noise_strongly_rejects_unit_root() {
        let x = noise(7, 300);
        let res = adf_no_constant(&x).unwrap().unwrap();
        assert!(res.statistic < -4.0, "statistic {}", res.statistic);
        assert!(res.lags_used <= default_maxlag(300));
    }

    #[test]
    fn random_walk_does_not_reject() {
        let steps = noise(11, 300);
        let walk: Vec<f64> = steps
            .iter()
            .scan(0.0, |acc, s| {
                *acc += s;
                Some(*acc)
            })
            .collect();
        let res = adf_no_constant(&walk).unwrap().unwrap();
        assert!(res.statistic > -3.0, "statistic {}", res.statistic);
    }

    #[test]
    fn final_sample_size_matches_lag() {
        let x = noise(3, 120);
        let res = adf_no_constant(&x).unwrap().unwrap();
        assert_eq!(res.nobs, 120 - 1 - res.lags_used);
    }

    #[test]
    fn alternating_series_is_degenerate() {
        // x_{t-1} and every lagged difference span the same two-dimensional space
        let x: Vec<f64> = (0..30).map(|t| if t % 2 == 0 { 0.5 } else { -0.5 }).collect();
        assert_eq!(adf_no_constant(&x).unwrap(), None);
    }

    #[test]
    fn singular_lags_are_skipped() {
        // alternation plus a trend makes the longer lag designs rank-deficient
        let x: Vec<f64> = (0..40)
            .map(|t| (if t % 2 == 0 { 0.5 } else { -0.5 }) + 0.01 * t as f64)
            .collect();
        let res = adf_no_constant(&x).unwrap().unwrap();
        assert!(res.statistic.is_finite());
        assert!(res.lags_used < 2, "lags {}", res.lags_used);
    }

    #[test]
    fn too_short_is_insufficient() {
        assert!(matches!(
            adf_no_constant(&[1.0, 2.0, 1.5]),
            Err(EngineError::InsufficientData { .. })
        ));
    }
}
