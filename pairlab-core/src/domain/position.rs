use serde::{Deserialize, Serialize};
use std::fmt;

/// The paired position. Leg quantities are derived from this, never set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionState {
    #[default]
    Flat,
    /// Short leg1, long leg2: a bet that the spread falls.
    ShortSpread,
    /// Long leg1, short leg2: a bet that the spread rises.
    LongSpread,
}

impl PositionState {
    pub const ALL: [PositionState; 3] = [Self::Flat, Self::ShortSpread, Self::LongSpread];

    pub fn legs(self) -> Legs {
        match self {
            Self::Flat => Legs { leg1: 0, leg2: 0 },
            Self::ShortSpread => Legs { leg1: -1, leg2: 1 },
            Self::LongSpread => Legs { leg1: 1, leg2: -1 },
        }
    }

    pub fn is_flat(self) -> bool {
        self == Self::Flat
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "FLAT",
            Self::ShortSpread => "SHORT_SPREAD",
            Self::LongSpread => "LONG_SPREAD",
        }
    }
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit quantities held in each leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Legs {
    pub leg1: i8,
    pub leg2: i8,
}

impl Legs {
    /// Signed value of the holding at the given prices.
    pub fn value_at(self, price1: f64, price2: f64) -> f64 {
        f64::from(self.leg1) * price1 + f64::from(self.leg2) * price2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legs_are_one_of_three_shapes() {
        for state in PositionState::ALL {
            let legs = state.legs();
            assert!(matches!(
                (legs.leg1, legs.leg2),
                (0, 0) | (1, -1) | (-1, 1)
            ));
        }
    }

    #[test]
    fn short_spread_is_short_leg1() {
        let legs = PositionState::ShortSpread.legs();
        assert_eq!(legs.leg1, -1);
        assert_eq!(legs.leg2, 1);
        assert_eq!(legs.value_at(100.0, 60.0), -40.0);
    }

    #[test]
    fn serializes_screaming_snake() {
        let json = serde_json::to_string(&PositionState::LongSpread).unwrap();
        assert_eq!(json, "\"LONG_SPREAD\"");
        assert_eq!(PositionState::ShortSpread.to_string(), "SHORT_SPREAD");
    }
}
