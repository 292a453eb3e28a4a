//! Coordinate axes and validated value ranges.

use serde::{Deserialize, Serialize};

use crate::error::{OceanError, OceanResult};
use crate::grid::GridShape;

/// Inclusive coordinate interval used for spatial subsetting.
///
/// Serializes as `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "(f64, f64)", into = "(f64, f64)")]
pub struct CoordRange {
    pub min: f64,
    pub max: f64,
}

impl CoordRange {
    /// Create a range, rejecting NaN bounds and `min > max`.
    pub fn new(min: f64, max: f64) -> OceanResult<Self> {
        if min.is_nan() || max.is_nan() {
            return Err(OceanError::invalid_range(format!(
                "coordinate range [{}, {}] contains NaN",
                min, max
            )));
        }
        if min > max {
            return Err(OceanError::invalid_range(format!(
                "coordinate range min {} is greater than max {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl TryFrom<(f64, f64)> for CoordRange {
    type Error = OceanError;

    fn try_from((min, max): (f64, f64)) -> OceanResult<Self> {
        Self::new(min, max)
    }
}

impl From<CoordRange> for (f64, f64) {
    fn from(range: CoordRange) -> Self {
        (range.min, range.max)
    }
}

/// Inclusive missing-ratio window `[low, high]` within `[0, 1]`.
///
/// Serializes as `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "(f64, f64)", into = "(f64, f64)")]
pub struct RatioRange {
    low: f64,
    high: f64,
}

impl RatioRange {
    /// Create a ratio window.
    ///
    /// Bounds are never swapped: `low > high` is an error, as is any bound
    /// that is NaN or outside `[0, 1]`.
    pub fn new(low: f64, high: f64) -> OceanResult<Self> {
        if !(0.0..=1.0).contains(&low) || !(0.0..=1.0).contains(&high) {
            return Err(OceanError::invalid_range(format!(
                "missing ratio range [{}, {}] must lie within [0, 1]",
                low, high
            )));
        }
        if low > high {
            return Err(OceanError::invalid_range(format!(
                "missing ratio low {} is greater than high {}",
                low, high
            )));
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    /// Inclusive on both ends.
    pub fn contains(&self, ratio: f64) -> bool {
        ratio >= self.low && ratio <= self.high
    }
}

impl Default for RatioRange {
    /// The window `[0.1, 0.6]`.
    fn default() -> Self {
        Self {
            low: 0.1,
            high: 0.6,
        }
    }
}

impl TryFrom<(f64, f64)> for RatioRange {
    type Error = OceanError;

    fn try_from((low, high): (f64, f64)) -> OceanResult<Self> {
        Self::new(low, high)
    }
}

impl From<RatioRange> for (f64, f64) {
    fn from(range: RatioRange) -> Self {
        (range.low, range.high)
    }
}

/// Coordinate axes belonging to a frame stack.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoordinateAxes {
    /// One value per grid row.
    pub latitude: Vec<f64>,
    /// One value per grid column.
    pub longitude: Vec<f64>,
    /// One value per frame, when the source has a time coordinate.
    pub time: Option<Vec<f64>>,
    /// Units attribute of the time coordinate (e.g. "days since 1981-01-01").
    pub time_units: Option<String>,
}

impl CoordinateAxes {
    /// Create axes without a time coordinate.
    pub fn new(latitude: Vec<f64>, longitude: Vec<f64>) -> Self {
        Self {
            latitude,
            longitude,
            time: None,
            time_units: None,
        }
    }

    /// Attach a time coordinate.
    pub fn with_time(mut self, time: Vec<f64>, units: Option<String>) -> Self {
        self.time = Some(time);
        self.time_units = units;
        self
    }

    /// Grid shape implied by the spatial axes.
    pub fn shape(&self) -> GridShape {
        GridShape::new(self.latitude.len(), self.longitude.len())
    }

    /// Fails unless the spatial axes match `shape`.
    pub fn check_shape(&self, shape: GridShape) -> OceanResult<()> {
        if self.shape() != shape {
            return Err(OceanError::shape(format!(
                "coordinate axes describe a {} grid but data is {}",
                self.shape(),
                shape
            )));
        }
        Ok(())
    }

    /// Copy with the time axis sliced to its first `n` entries.
    pub fn with_time_truncated(&self, n: usize) -> Self {
        let mut axes = self.clone();
        if let Some(time) = axes.time.as_mut() {
            time.truncate(n);
        }
        axes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_range_inclusive() {
        let range = RatioRange::new(0.2, 0.5).unwrap();
        assert!(range.contains(0.2));
        assert!(range.contains(0.5));
        assert!(!range.contains(0.19999));
        assert!(!range.contains(0.50001));
    }

    #[test]
    fn test_ratio_range_rejects_inverted() {
        let err = RatioRange::new(0.6, 0.1).unwrap_err();
        assert!(matches!(err, OceanError::InvalidRange(_)));
    }

    #[test]
    fn test_ratio_range_rejects_out_of_unit_interval() {
        assert!(RatioRange::new(-0.1, 0.5).is_err());
        assert!(RatioRange::new(0.1, 1.5).is_err());
        assert!(RatioRange::new(f64::NAN, 0.5).is_err());
    }

    #[test]
    fn test_ratio_range_deserialize_validates() {
        let ok: RatioRange = serde_json::from_str("[0.1, 0.6]").unwrap();
        assert_eq!(ok.low(), 0.1);
        assert!(serde_json::from_str::<RatioRange>("[0.6, 0.1]").is_err());
    }

    #[test]
    fn test_coord_range() {
        let range = CoordRange::new(-10.0, 10.0).unwrap();
        assert!(range.contains(-10.0));
        assert!(range.contains(10.0));
        assert!(!range.contains(10.5));
        assert!(CoordRange::new(5.0, -5.0).is_err());
    }

    #[test]
    fn test_time_truncation() {
        let axes = CoordinateAxes::new(vec![0.0], vec![0.0]).with_time(vec![1.0, 2.0, 3.0], None);
        assert_eq!(axes.with_time_truncated(2).time, Some(vec![1.0, 2.0]));
        assert_eq!(axes.with_time_truncated(10).time, Some(vec![1.0, 2.0, 3.0]));
    }
}
