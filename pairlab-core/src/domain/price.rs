//! PricePoint / PriceSeries: the aligned two-leg input of a backtest.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// One aligned observation of both legs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: NaiveDate,
    pub leg1: f64,
    pub leg2: f64,
}

impl PricePoint {
    pub fn new(timestamp: NaiveDate, leg1: f64, leg2: f64) -> Self {
        Self {
            timestamp,
            leg1,
            leg2,
        }
    }
}

/// Ordered, validated pair of price series.
///
/// Invariants, checked at construction:
/// - at least 2 points,
/// - timestamps strictly increasing,
/// - every price finite.
///
/// Deserialization goes through the same validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PricePoint>", into = "Vec<PricePoint>")]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub const MIN_LEN: usize = 2;

    pub fn new(points: Vec<PricePoint>) -> EngineResult<Self> {
        if points.len() < Self::MIN_LEN {
            return Err(EngineError::InsufficientData {
                required: Self::MIN_LEN,
                actual: points.len(),
            });
        }

        for (i, p) in points.iter().enumerate() {
            if !p.leg1.is_finite() {
                return Err(EngineError::non_finite("leg1", i));
            }
            if !p.leg2.is_finite() {
                return Err(EngineError::non_finite("leg2", i));
            }
        }

        if let Some(i) = points
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(EngineError::DataAlignment(format!(
                "timestamps not strictly increasing at index {}: {} then {}",
                i + 1,
                points[i].timestamp,
                points[i + 1].timestamp
            )));
        }

        Ok(Self { points })
    }

    /// Join two independently indexed legs. Lengths and timestamps must match exactly.
    pub fn from_legs(leg1: &[(NaiveDate, f64)], leg2: &[(NaiveDate, f64)]) -> EngineResult<Self> {
        if leg1.len() != leg2.len() {
            return Err(EngineError::DataAlignment(format!(
                "leg1 has {} observations but leg2 has {}",
                leg1.len(),
                leg2.len()
            )));
        }

        let mut points = Vec::with_capacity(leg1.len());
        for (i, (&(d1, p1), &(d2, p2))) in leg1.iter().zip(leg2).enumerate() {
            if d1 != d2 {
                return Err(EngineError::DataAlignment(format!(
                    "timestamp mismatch at index {i}: leg1 {d1}, leg2 {d2}"
                )));
            }
            points.push(PricePoint::new(d1, p1, p2));
        }

        Self::new(points)
    }

    /// Build from a shared timestamp column and two price columns.
    pub fn from_columns(
        timestamps: &[NaiveDate],
        leg1: &[f64],
        leg2: &[f64],
    ) -> EngineResult<Self> {
        if leg1.len() != timestamps.len() || leg2.len() != timestamps.len() {
            return Err(EngineError::DataAlignment(format!(
                "column lengths differ: {} timestamps, {} leg1, {} leg2",
                timestamps.len(),
                leg1.len(),
                leg2.len()
            )));
        }
        let points = timestamps
            .iter()
            .zip(leg1.iter().zip(leg2))
            .map(|(&t, (&a, &b))| PricePoint::new(t, a, b))
            .collect();
        Self::new(points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&PricePoint> {
        self.points.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PricePoint> {
        self.points.iter()
    }

    pub fn timestamps(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn leg1(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.leg1).collect()
    }

    pub fn leg2(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.leg2).collect()
    }

    pub fn first_timestamp(&self) -> NaiveDate {
        self.points[0].timestamp
    }

    pub fn last_timestamp(&self) -> NaiveDate {
        self.points[self.points.len() - 1].timestamp
    }

    /// Restrict to an inclusive date range. Either bound may be open.
    pub fn between(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> EngineResult<Self> {
        let points = self
            .points
            .iter()
            .filter(|p| start.map_or(true, |s| p.timestamp >= s))
            .filter(|p| end.map_or(true, |e| p.timestamp <= e))
            .copied()
            .collect();
        Self::new(points)
    }

    /// The first `len` points.
    pub fn prefix(&self, len: usize) -> EngineResult<Self> {
        Self::new(self.points.iter().take(len).copied().collect())
    }
}

impl TryFrom<Vec<PricePoint>> for PriceSeries {
    type Error = EngineError;

    fn try_from(points: Vec<PricePoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<PriceSeries> for Vec<PricePoint> {
    fn from(series: PriceSeries) -> Self {
        series.points
    }
}

impl<'a> IntoIterator for &'a PriceSeries {
    type Item = &'a PricePoint;
    type IntoIter = std::slice::Iter<'a, PricePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
