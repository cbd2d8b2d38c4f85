//! SignalGenerator: thresholds from spread statistics, then one decision per timestep.

pub mod thresholds;
pub mod transition;

pub use thresholds::{
    validate_multiplier, FullSampleThresholds, RollingThresholds, ThresholdEstimator,
    ThresholdSchedule, Thresholds,
};
pub use transition::{Decision, ExitRule, Precedence, SpreadCondition, TransitionTable};

use crate::domain::PositionState;
use crate::error::EngineResult;
use crate::spread::SpreadSeries;

pub struct SignalGenerator {
    entry_multiplier: f64,
    estimator: Box<dyn ThresholdEstimator>,
    table: TransitionTable,
    precedence: Precedence,
}

impl SignalGenerator {
    pub const DEFAULT_ENTRY_MULTIPLIER: f64 = 2.0;

    pub fn new(
        entry_multiplier: f64,
        estimator: Box<dyn ThresholdEstimator>,
        table: TransitionTable,
        precedence: Precedence,
    ) -> EngineResult<Self> {
        validate_multiplier(entry_multiplier)?;
        Ok(Self {
            entry_multiplier,
            estimator,
            table,
            precedence,
        })
    }

    /// Full-sample thresholds, literal table, state-gated precedence.
    pub fn with_multiplier(entry_multiplier: f64) -> EngineResult<Self> {
        Self::new(
            entry_multiplier,
            Box::new(FullSampleThresholds),
            TransitionTable::literal(),
            Precedence::StateGated,
        )
    }

    pub fn entry_multiplier(&self) -> f64 {
        self.entry_multiplier
    }

    pub fn estimator_name(&self) -> &str {
        self.estimator.name()
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    pub fn precedence(&self) -> Precedence {
        self.precedence
    }

    pub fn thresholds(&self, spread: &SpreadSeries) -> EngineResult<ThresholdSchedule> {
        self.estimator.estimate(spread, self.entry_multiplier)
    }

    /// Decide the next state. Holds when the spread is NaN or no thresholds exist yet.
    pub fn decide(
        &self,
        state: PositionState,
        spread: f64,
        thresholds: Option<Thresholds>,
    ) -> Decision {
        match thresholds {
            Some(t) if !spread.is_nan() => self.table.decide(state, spread, &t, self.precedence),
            _ => Decision::hold(state),
        }
    }
}

impl std::fmt::Debug for SignalGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalGenerator")
            .field("entry_multiplier", &self.entry_multiplier)
            .field("estimator", &self.estimator.name())
            .field("table", &self.table.name())
            .field("precedence", &self.precedence)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_spread_or_missing_thresholds_hold() {
        let gen = SignalGenerator::with_multiplier(2.0).unwrap();
        let t = Thresholds::from_stats(0.0, 1.0, 2.0).unwrap();
        assert_eq!(
            gen.decide(PositionState::Flat, f64::NAN, Some(t)),
            Decision::hold(PositionState::Flat)
        );
        assert_eq!(
            gen.decide(PositionState::Flat, 10.0, None),
            Decision::hold(PositionState::Flat)
        );
        assert_eq!(
            gen.decide(PositionState::Flat, 10.0, Some(t)).next,
            PositionState::ShortSpread
        );
    }

    #[test]
    fn rejects_negative_multiplier() {
        assert!(SignalGenerator::with_multiplier(-1.0).is_err());
    }
}
