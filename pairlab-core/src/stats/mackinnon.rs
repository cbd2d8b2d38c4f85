//! MacKinnon response surfaces for the two-variable Engle–Granger test with a constant.
//!
//! p-values: MacKinnon (1994), "Approximate asymptotic distribution functions for
//! unit-root and cointegration tests". Critical values: MacKinnon (2010),
//! "Critical values for cointegration tests".

use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;

// ── Approximate p-value, constant term, N = 2 ──

const TAU_MAX: f64 = 0.92;
const TAU_MIN: f64 = -18.86;
const TAU_STAR: f64 = -2.62;
const SMALL_P: [f64; 3] = [2.92, 1.5012, 0.039796];
const LARGE_P: [f64; 4] = [2.1945, 0.64695, -0.29198, -0.042377];

// ── Finite-sample critical values, constant term, N = 2 ──

const CRIT_1PCT: [f64; 4] = [-3.89644, -10.9519, -33.527, 0.0];
const CRIT_5PCT: [f64; 4] = [-3.33613, -6.1101, -6.823, 0.0];
const CRIT_10PCT: [f64; 4] = [-3.04445, -4.2412, -2.720, 0.0];

/// Critical values at the 1 %, 5 % and 10 % levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalValues {
    pub one_pct: f64,
    pub five_pct: f64,
    pub ten_pct: f64,
}

/// Approximate p-value of an Engle–Granger statistic.
pub fn p_value(statistic: f64) -> f64 {
    if statistic.is_nan() {
        return f64::NAN;
    }
    if statistic > TAU_MAX {
        return 1.0;
    }
    if statistic < TAU_MIN {
        return 0.0;
    }
    let z = if statistic <= TAU_STAR {
        polyval(&SMALL_P, statistic)
    } else {
        polyval(&LARGE_P, statistic)
    };
    standard_normal_cdf(z)
}

/// Critical values for a sample of `nobs` observations.
pub fn critical_values(nobs: usize) -> CriticalValues {
    let inv = 1.0 / nobs as f64;
    CriticalValues {
        one_pct: polyval(&CRIT_1PCT, inv),
        five_pct: polyval(&CRIT_5PCT, inv),
        ten_pct: polyval(&CRIT_10PCT, inv),
    }
}

/// `c[0] + c[1]·x + c[2]·x² + …`
fn polyval(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

fn standard_normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}
