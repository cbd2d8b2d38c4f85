//! Ordinary least squares on a dense design matrix.
//!
//! Rank is checked with an SVD before solving: a design whose smallest singular
//! value is at most `RANK_TOLERANCE` times its largest is treated as singular.

use nalgebra::{DMatrix, DVector};

use crate::error::{EngineError, EngineResult};

pub const RANK_TOLERANCE: f64 = 1e-10;

/// A fitted linear regression.
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    pub coefficients: Vec<f64>,
    /// NaN when there are no residual degrees of freedom.
    pub std_errors: Vec<f64>,
    pub residuals: Vec<f64>,
    pub ssr: f64,
    /// Total sum of squares about the mean of `y`.
    pub centered_tss: f64,
    pub nobs: usize,
}

impl OlsFit {
    pub fn k(&self) -> usize {
        self.coefficients.len()
    }

    pub fn df_resid(&self) -> usize {
        self.nobs.saturating_sub(self.k())
    }

    pub fn t_value(&self, index: usize) -> f64 {
        self.coefficients[index] / self.std_errors[index]
    }

    /// Centered R². Meaningful for designs that include an intercept.
    pub fn rsquared(&self) -> f64 {
        1.0 - self.ssr / self.centered_tss
    }

    /// Gaussian log-likelihood at the fitted coefficients.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -n / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    /// Akaike information criterion, counting every coefficient.
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.k() as f64
    }
}

/// Regress `y` on the columns of `design`.
pub fn fit(design: &DMatrix<f64>, y: &DVector<f64>) -> EngineResult<OlsFit> {
    let (nobs, k) = design.shape();
    if y.len() != nobs {
        return Err(EngineError::DataAlignment(format!(
            "design has {nobs} rows but response has {}",
            y.len()
        )));
    }
    if nobs < k || k == 0 {
        return Err(EngineError::InsufficientData {
            required: k.max(1),
            actual: nobs,
        });
    }

    check_rank(design)?;

    let xt = design.transpose();
    let xtx_inv = (&xt * design).try_inverse().ok_or_else(|| {
        EngineError::RegressionSingularity("normal equations not invertible".into())
    })?;
    let beta = &xtx_inv * (&xt * y);

    let residuals = y - design * &beta;
    let ssr = residuals.norm_squared();
    let y_mean = y.mean();
    let centered_tss = y.iter().map(|v| (v - y_mean).powi(2)).sum();

    let df = nobs - k;
    let std_errors = if df == 0 {
        vec![f64::NAN; k]
    } else {
        let s2 = ssr / df as f64;
        (0..k).map(|i| (s2 * xtx_inv[(i, i)]).sqrt()).collect()
    };

    Ok(OlsFit {
        coefficients: beta.iter().copied().collect(),
        std_errors,
        residuals: residuals.iter().copied().collect(),
        ssr,
        centered_tss,
        nobs,
    })
}

/// Regress `y` on `(1, x)`.
pub fn fit_with_intercept(y: &[f64], x: &[f64]) -> EngineResult<OlsFit> {
    let n = x.len();
    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { x[i] });
    fit(&design, &DVector::from_column_slice(y))
}

fn check_rank(design: &DMatrix<f64>) -> EngineResult<()> {
    let singular = design.clone().svd(false, false).singular_values;
    let largest = singular.max();
    let smallest = singular.min();
    if !largest.is_finite() || largest == 0.0 || smallest <= RANK_TOLERANCE * largest {
        return Err(EngineError::RegressionSingularity(format!(
            "design matrix is rank-deficient (singular values {smallest:.3e} / {largest:.3e})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_line() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 + 0.5 * v).collect();
        let fit = fit_with_intercept(&y, &x).unwrap();
        assert!((fit.coefficients[0] - 3.0).abs() < 1e-10);
        assert!((fit.coefficients[1] - 0.5).abs() < 1e-10);
        assert!(fit.ssr < 1e-18);
    }

    #[test]
    fn residuals_sum_to_zero_with_intercept() {
        let x = [1.0, 2.0, 4.0, 3.0, 7.0, 5.0];
        let y = [2.1, 3.9, 8.2, 5.8, 14.5, 9.7];
        let fit = fit_with_intercept(&y, &x).unwrap();
        let sum: f64 = fit.residuals.iter().sum();
        assert!(sum.abs() < 1e-9);
        assert!(fit.rsquared() > 0.99);
        assert!(fit.std_errors.iter().all(|s| s.is_finite() && *s > 0.0));
    }

    #[test]
    fn constant_regressor_is_singular() {
        let x = [5.0; 8];
        let y = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let err = fit_with_intercept(&y, &x).unwrap_err();
        assert!(matches!(err, EngineError::RegressionSingularity(_)));
    }

    #[test]
    fn exactly_determined_fit_has_nan_std_errors() {
        let fit = fit_with_intercept(&[1.0, 3.0], &[0.0, 1.0]).unwrap();
        assert_eq!(fit.df_resid(), 0);
        assert!(fit.std_errors.iter().all(|s| s.is_nan()));
    }

    #[test]
    fn aic_penalizes_parameters() {
        let design = DMatrix::from_row_slice(4, 1, &[1.0, 2.0, 3.0, 4.0]);
        let y = DVector::from_row_slice(&[1.1, 1.9, 3.2, 3.9]);
        let fit = fit(&design, &y).unwrap();
        assert!((fit.aic() - (-2.0 * fit.log_likelihood() + 2.0)).abs() < 1e-12);
    }
}
