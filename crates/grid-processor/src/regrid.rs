//! Order-1 (linear) regridding of frame stacks and coordinate axes.
//!
//! Output index `o` along an axis of input length `in` and output length
//! `out` samples the input at `o * (in - 1) / (out - 1)`, so the first and
//! last samples land exactly on the input end points. This is the alignment
//! used by `scipy.ndimage.zoom(order=1)`.
//!
//! A NaN input value propagates to every output value that gives it a
//! non-zero weight. The time axis is never resampled.

use ocean_common::{CoordinateAxes, FrameStack, GridShape, OceanError, OceanResult};
use tracing::debug;

/// Interpolation stencil for one output sample.
#[derive(Debug, Clone, Copy)]
struct Stencil {
    lower: usize,
    upper: usize,
    weight: f64,
}

fn stencils(in_len: usize, out_len: usize) -> Vec<Stencil> {
    (0..out_len)
        .map(|o| {
            if out_len == 1 || in_len == 1 {
                return Stencil {
                    lower: 0,
                    upper: 0,
                    weight: 0.0,
                };
            }
            // Integer numerator keeps the end points exact.
            let pos = (o * (in_len - 1)) as f64 / (out_len - 1) as f64;
            let lower = (pos.floor() as usize).min(in_len - 1);
            let upper = (lower + 1).min(in_len - 1);
            Stencil {
                lower,
                upper,
                weight: pos - lower as f64,
            }
        })
        .collect()
}

fn apply(stencil: Stencil, v0: f64, v1: f64) -> f64 {
    if stencil.weight == 0.0 {
        v0
    } else {
        v0 * (1.0 - stencil.weight) + v1 * stencil.weight
    }
}

/// Resample a 1-D coordinate axis to `target_len` values.
pub fn zoom_axis(values: &[f64], target_len: usize) -> OceanResult<Vec<f64>> {
    check_lengths(values.len(), target_len, "axis")?;

    Ok(stencils(values.len(), target_len)
        .into_iter()
        .map(|s| apply(s, values[s.lower], values[s.upper]))
        .collect())
}

/// Resample every frame of a stack to `target`.
///
/// Returns the stack unchanged when it already has the target shape.
pub fn resample_stack(stack: &FrameStack, target: GridShape) -> OceanResult<FrameStack> {
    let source = stack.shape();
    check_lengths(source.height, target.height, "latitude")?;
    check_lengths(source.width, target.width, "longitude")?;

    if source == target {
        return Ok(stack.clone());
    }

    let rows = stencils(source.height, target.height);
    let cols = stencils(source.width, target.width);

    let mut data = Vec::with_capacity(stack.frames() * target.cell_count());
    // Scratch buffer holding one frame resampled along longitude only.
    let mut widened = vec![0.0f64; source.height * target.width];

    for frame in stack.iter_frames() {
        for r in 0..source.height {
            let row = &frame[r * source.width..(r + 1) * source.width];
            for (c, s) in cols.iter().enumerate() {
                widened[r * target.width + c] =
                    apply(*s, row[s.lower] as f64, row[s.upper] as f64);
            }
        }

        for s in &rows {
            let lower = &widened[s.lower * target.width..(s.lower + 1) * target.width];
            let upper = &widened[s.upper * target.width..(s.upper + 1) * target.width];
            for c in 0..target.width {
                data.push(apply(*s, lower[c], upper[c]) as f32);
            }
        }
    }

    debug!(
        frames = stack.frames(),
        from = %source,
        to = %target,
        "Resampled frame stack"
    );

    FrameStack::new(data, stack.frames(), target)
}

/// Resample the latitude/longitude axes to `target`, keeping time as-is.
pub fn resample_axes(axes: &CoordinateAxes, target: GridShape) -> OceanResult<CoordinateAxes> {
    let mut resampled = axes.clone();
    resampled.latitude = zoom_axis(&axes.latitude, target.height)?;
    resampled.longitude = zoom_axis(&axes.longitude, target.width)?;
    Ok(resampled)
}

fn check_lengths(in_len: usize, out_len: usize, axis: &str) -> OceanResult<()> {
    if out_len == 0 {
        return Err(OceanError::shape(format!(
            "target {} length must be greater than zero",
            axis
        )));
    }
    if in_len == 0 {
        return Err(OceanError::shape(format!(
            "cannot resample an empty {} axis",
            axis
        )));
    }
    Ok(())
}
