//! Domain types: aligned price pairs and the paired position.

pub mod position;
pub mod price;

pub use position::{Legs, PositionState};
pub use price::{PricePoint, PriceSeries};
