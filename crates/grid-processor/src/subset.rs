//! Spatial subsetting by coordinate value.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;

use ocean_common::{CoordRange, CoordinateAxes, FrameStack, OceanError, OceanResult};

/// Index span covering every value of `axis` inside `range`.
///
/// Takes the contiguous span from the first to the last matching index, so
/// both ascending and descending axes work. Returns `None` when nothing
/// matches.
pub fn index_span(axis: &[f64], range: &CoordRange) -> Option<Range<usize>> {
    let first = axis.iter().position(|&v| range.contains(v))?;
    let last = axis.iter().rposition(|&v| range.contains(v))?;
    Some(first..last + 1)
}

/// Latitude/longitude bounds for cropping a stack and its axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialSubset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<CoordRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<CoordRange>,
}

impl SpatialSubset {
    pub fn new(latitude: Option<CoordRange>, longitude: Option<CoordRange>) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.latitude.is_none() && self.longitude.is_none()
    }

    /// Crop `stack` and `axes` to the configured bounds.
    ///
    /// Values are copied, never resampled. Fails with a shape error if the
    /// axes do not match the stack or a bound selects no cells.
    pub fn apply(
        &self,
        stack: &FrameStack,
        axes: &CoordinateAxes,
    ) -> OceanResult<(FrameStack, CoordinateAxes)> {
        axes.check_shape(stack.shape())?;

        if self.is_empty() {
            return Ok((stack.clone(), axes.clone()));
        }

        let rows = span_for(&axes.latitude, self.latitude.as_ref(), "latitude")?;
        let cols = span_for(&axes.longitude, self.longitude.as_ref(), "longitude")?;

        let cropped = stack.crop(rows.clone(), cols.clone())?;
        let mut cropped_axes = axes.clone();
        cropped_axes.latitude = axes.latitude[rows].to_vec();
        cropped_axes.longitude = axes.longitude[cols].to_vec();

        debug!(
            from = %stack.shape(),
            to = %cropped.shape(),
            "Cropped frame stack"
        );

        Ok((cropped, cropped_axes))
    }
}

fn span_for(axis: &[f64], range: Option<&CoordRange>, name: &str) -> OceanResult<Range<usize>> {
    match range {
        None => Ok(0..axis.len()),
        Some(range) => index_span(axis, range).ok_or_else(|| {
            OceanError::shape(format!(
                "No {} values within [{}, {}]",
                name, range.min, range.max
            ))
        }),
    }
}
