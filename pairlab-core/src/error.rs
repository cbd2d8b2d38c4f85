//! Structured error types for the engine.
//!
//! Every failure is unrecoverable locally: the engine never retries and never skips
//! a timestep. A "not cointegrated" verdict is not an error.

use thiserror::Error;

/// Errors surfaced by the pairs engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Leg series differ in length or timestamps, or timestamps are not strictly increasing.
    #[error("data alignment error: {0}")]
    DataAlignment(String),

    #[error("insufficient data: {actual} observations < minimum {required}")]
    InsufficientData { required: usize, actual: usize },

    /// Design matrix is rank-deficient (e.g. a constant regressor).
    #[error("regression singular: {0}")]
    RegressionSingularity(String),

    /// A NaN or infinite value entered the computation.
    #[error("non-finite value in {field} at index {index}")]
    NumericPropagation { field: String, index: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub(crate) fn non_finite(field: &str, index: usize) -> Self {
        Self::NumericPropagation {
            field: field.to_string(),
            index,
        }
    }
}
