//! PositionSimulator: classifies each state change as an entry, an exit, or nothing.

use serde::{Deserialize, Serialize};

use crate::domain::PositionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Entry,
    Exit,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Exit => "exit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionEvent {
    pub kind: EventKind,
    pub from: PositionState,
    pub to: PositionState,
}

/// Stateless: the current position lives in the engine's loop state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionSimulator;

impl PositionSimulator {
    pub fn step(&self, current: PositionState, next: PositionState) -> Option<PositionEvent> {
        let kind = match (current, next) {
            (PositionState::Flat, PositionState::Flat) => return None,
            (PositionState::Flat, _) => EventKind::Entry,
            (_, PositionState::Flat) => EventKind::Exit,
            // transition tables never map one held state directly to another
            _ => return None,
        };
        Some(PositionEvent {
            kind,
            from: current,
            to: next,
        })
    }
}
