//! Test data generators for creating synthetic ocean data.
//!
//! These generators create predictable, verifiable frame stacks: a smooth
//! sea-surface temperature field, a rectangle of land that is missing in
//! every frame, and per-frame occlusion patches.

use std::ops::Range;

use ocean_common::{CoordinateAxes, FrameStack, GridShape};

/// One frame of sea-surface temperature in Kelvin.
///
/// Warm at row 0, cooling towards the last row, with a small east-west
/// gradient. Values lie between roughly 275K and 303K.
fn create_sst_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let y_factor = row as f32 / height.max(1) as f32;
            let x_factor = col as f32 / width.max(1) as f32;
            data.push(303.0 - y_factor * 25.0 + x_factor * 2.0);
        }
    }
    data
}

/// Creates a stack of SST frames with no missing cells.
///
/// Frame `t` is the base field shifted by `0.01 * t`, so frames are
/// distinguishable.
pub fn create_sst_stack(frames: usize, shape: GridShape) -> FrameStack {
    let base = create_sst_grid(shape.width, shape.height);
    let mut data = Vec::with_capacity(frames * base.len());
    for t in 0..frames {
        data.extend(base.iter().map(|v| v + 0.01 * t as f32));
    }
    FrameStack::new(data, frames, shape).expect("generated stack has a consistent shape")
}

/// Sets a rectangle of cells to NaN in every frame (land).
pub fn apply_land_rect(stack: &mut FrameStack, rows: Range<usize>, cols: Range<usize>) {
    let width = stack.shape().width;
    for t in 0..stack.frames() {
        let frame = stack.frame_mut(t);
        for row in rows.clone() {
            for col in cols.clone() {
                frame[row * width + col] = f32::NAN;
            }
        }
    }
}

/// Sets the given (row, col) cells of frame `t` to NaN.
pub fn occlude_cells(stack: &mut FrameStack, t: usize, cells: &[(usize, usize)]) {
    let width = stack.shape().width;
    let frame = stack.frame_mut(t);
    for &(row, col) in cells {
        frame[row * width + col] = f32::NAN;
    }
}

/// Occludes the first `count` valid cells of frame `t` in row-major order.
///
/// Cells that are already NaN (land or earlier occlusion) are skipped, so
/// with land present the frame ends up with exactly `count` more missing
/// ocean cells, or every cell missing if there are fewer valid cells.
pub fn occlude_first_valid(stack: &mut FrameStack, t: usize, count: usize) {
    let frame = stack.frame_mut(t);
    let mut remaining = count;
    for value in frame.iter_mut() {
        if remaining == 0 {
            break;
        }
        if !value.is_nan() {
            *value = f32::NAN;
            remaining -= 1;
        }
    }
}

/// Creates evenly spaced latitude/longitude axes for `shape`.
///
/// Latitude starts at `lat0`, longitude at `lon0`, both stepping by `step`.
pub fn create_regular_axes(shape: GridShape, lat0: f64, lon0: f64, step: f64) -> CoordinateAxes {
    CoordinateAxes::new(
        (0..shape.height).map(|i| lat0 + step * i as f64).collect(),
        (0..shape.width).map(|i| lon0 + step * i as f64).collect(),
    )
}

/// Creates a daily time axis of `frames` entries starting at `start`.
pub fn create_daily_time(frames: usize, start: f64) -> Vec<f64> {
    (0..frames).map(|t| start + t as f64).collect()
}
