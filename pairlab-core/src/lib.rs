//! PairLab Core — pairs-trading engine: cointegration test, hedge-ratio spread,
//! threshold signal, position state machine, portfolio accounting.
//!
//! This crate is pure computation, no I/O:
//! - Domain types (aligned price pairs, the paired position)
//! - Statistics (OLS, augmented Dickey–Fuller, MacKinnon surfaces)
//! - Six components: `CointegrationTester`, `SpreadModel`, `SignalGenerator`,
//!   `PositionSimulator`, `PortfolioTracker`, `BacktestEngine`
//! - Deterministic synthetic pairs

pub mod cointegration;
pub mod domain;
pub mod engine;
pub mod error;
pub mod serde_float;
pub mod signal;
pub mod spread;
pub mod stats;
pub mod synthetic;

pub use cointegration::{CointegrationReport, CointegrationResult, CointegrationTester, Verdict};
pub use domain::{Legs, PositionState, PricePoint, PriceSeries};
pub use engine::{
    simulate, AccountingMode, BacktestEngine, BacktestReport, BacktestResult, BacktestStep,
    EngineConfig, EventKind, PortfolioTracker, PositionSimulator,
};
pub use error::{EngineError, EngineResult};
pub use signal::{
    ExitRule, Precedence, SignalGenerator, ThresholdEstimator, ThresholdSchedule, Thresholds,
    TransitionTable,
};
pub use spread::{HedgeEstimator, HedgeFit, HedgeRatio, SpreadModel, SpreadSeries};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: result types and engine components are Send + Sync,
    /// so runs can be fanned out across rayon workers.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<PriceSeries>();
        require_sync::<PriceSeries>();
        require_send::<BacktestReport>();
        require_sync::<BacktestReport>();
        require_send::<EngineConfig>();
        require_sync::<EngineConfig>();

        require_send::<BacktestEngine>();
        require_sync::<BacktestEngine>();
        require_send::<SpreadModel>();
        require_sync::<SpreadModel>();
        require_send::<SignalGenerator>();
        require_sync::<SignalGenerator>();
    }

    /// Architecture contract: the decision rule sees only the current state, the
    /// spread at t and the thresholds at t. It cannot look at later timesteps.
    #[test]
    fn decision_has_no_access_to_future_data() {
        fn _check(
            gen: &SignalGenerator,
            state: PositionState,
            spread_t: f64,
            thresholds_t: Option<Thresholds>,
        ) -> signal::Decision {
            gen.decide(state, spread_t, thresholds_t)
        }
    }
}
