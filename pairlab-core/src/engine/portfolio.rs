//! PortfolioTracker: per-timestep portfolio value accumulation.
//!
//! `PriceLevel` adds the signed price level of the position held after the update,
//! `value_t = value_{t−1} + legs_t · price_t`. This is not mark-to-market P&L; it
//! reproduces the reference backtest's accounting.
//!
//! `PriceDelta` adds the P&L of the position held into t,
//! `value_t = value_{t−1} + legs_{t−1} · (price_t − price_{t−1})`, with no change at t = 0.

use serde::{Deserialize, Serialize};

use crate::domain::{PositionState, PricePoint};
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountingMode {
    #[default]
    PriceLevel,
    PriceDelta,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioTracker {
    initial_capital: f64,
    mode: AccountingMode,
}

impl PortfolioTracker {
    pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;

    pub fn new(initial_capital: f64, mode: AccountingMode) -> EngineResult<Self> {
        if !initial_capital.is_finite() {
            return Err(EngineError::InvalidParameter(format!(
                "initial capital must be finite, got {initial_capital}"
            )));
        }
        Ok(Self {
            initial_capital,
            mode,
        })
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn mode(&self) -> AccountingMode {
        self.mode
    }

    /// Value after timestep t.
    ///
    /// `held` is the position carried into t, `updated` the position after t's
    /// decision, `prev` the previous price point (None at t = 0).
    pub fn step(
        &self,
        value: f64,
        held: PositionState,
        updated: PositionState,
        point: &PricePoint,
        prev: Option<&PricePoint>,
    ) -> f64 {
        match self.mode {
            AccountingMode::PriceLevel => value + updated.legs().value_at(point.leg1, point.leg2),
            AccountingMode::PriceDelta => match prev {
                Some(p) => value + held.legs().value_at(point.leg1 - p.leg1, point.leg2 - p.leg2),
                None => value,
            },
        }
    }
}

impl Default for PortfolioTracker {
    fn default() -> Self {
        Self {
            initial_capital: Self::DEFAULT_INITIAL_CAPITAL,
            mode: AccountingMode::PriceLevel,
        }
    }
}
