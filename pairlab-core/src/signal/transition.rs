//! State-transition table for the spread signal.
//!
//! Rules are keyed by `(current state, spread condition)`. Conditions are tried in
//! the table's priority order; how a condition that matches the spread but has no
//! rule for the current state is handled depends on [`Precedence`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::thresholds::Thresholds;
use crate::domain::PositionState;

/// A strict comparison of the spread against one threshold band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadCondition {
    /// spread > entry
    AboveEntry,
    /// spread < −entry
    BelowLowerEntry,
    /// spread < exit
    BelowExit,
    /// spread > exit
    AboveExit,
}

impl SpreadCondition {
    pub fn holds(self, spread: f64, thresholds: &Thresholds) -> bool {
        match self {
            Self::AboveEntry => spread > thresholds.entry,
            Self::BelowLowerEntry => spread < thresholds.lower_entry(),
            Self::BelowExit => spread < thresholds.exit,
            Self::AboveExit => spread > thresholds.exit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precedence {
    /// First condition that holds *and* has a rule for the current state wins.
    #[default]
    StateGated,
    /// First condition that holds ends evaluation, even if the current state has no
    /// rule for it.
    BandExclusive,
}

/// Named transition tables, for configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitRule {
    #[default]
    Literal,
    Symmetric,
}

impl ExitRule {
    pub fn table(self) -> TransitionTable {
        match self {
            Self::Literal => TransitionTable::literal(),
            Self::Symmetric => TransitionTable::symmetric_exit(),
        }
    }
}

/// Outcome of one evaluation. `condition` is set only when a rule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub condition: Option<SpreadCondition>,
    pub next: PositionState,
}

impl Decision {
    pub fn hold(state: PositionState) -> Self {
        Self {
            condition: None,
            next: state,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    name: &'static str,
    priority: Vec<SpreadCondition>,
    rules: HashMap<(PositionState, SpreadCondition), PositionState>,
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::literal()
    }
}

impl TransitionTable {
    /// Enter on either band from FLAT; exit either side once spread < exit.
    pub fn literal() -> Self {
        use PositionState::*;
        use SpreadCondition::*;
        Self {
            name: "literal",
            priority: vec![AboveEntry, BelowLowerEntry, BelowExit],
            rules: HashMap::from([
                ((Flat, AboveEntry), ShortSpread),
                ((Flat, BelowLowerEntry), LongSpread),
                ((ShortSpread, BelowExit), Flat),
                ((LongSpread, BelowExit), Flat),
            ]),
        }
    }

    /// As [`literal`](Self::literal), but LONG_SPREAD exits once spread > exit.
    pub fn symmetric_exit() -> Self {
        use PositionState::*;
        use SpreadCondition::*;
        Self {
            name: "symmetric",
            priority: vec![AboveEntry, BelowLowerEntry, BelowExit, AboveExit],
            rules: HashMap::from([
                ((Flat, AboveEntry), ShortSpread),
                ((Flat, BelowLowerEntry), LongSpread),
                ((ShortSpread, BelowExit), Flat),
                ((LongSpread, AboveExit), Flat),
            ]),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn priority(&self) -> &[SpreadCondition] {
        &self.priority
    }

    pub fn next_state(&self, from: PositionState, condition: SpreadCondition) -> Option<PositionState> {
        self.rules.get(&(from, condition)).copied()
    }

    pub fn decide(
        &self,
        state: PositionState,
        spread: f64,
        thresholds: &Thresholds,
        precedence: Precedence,
    ) -> Decision {
        for &condition in &self.priority {
            if !condition.holds(spread, thresholds) {
                continue;
            }
            match (self.next_state(state, condition), precedence) {
                (Some(next), _) => {
                    return Decision {
                        condition: Some(condition),
                        next,
                    }
                }
                (None, Precedence::BandExclusive) => return Decision::hold(state),
                (None, Precedence::StateGated) => {}
            }
        }
        Decision::hold(state)
    }
}
