//! Statistics used by the engine components.

pub mod adf;
pub mod descriptive;
pub mod mackinnon;
pub mod ols;

pub use adf::{adf_no_constant, AdfResult};
pub use descriptive::{mean, sample_std};
pub use mackinnon::CriticalValues;
pub use ols::OlsFit;
