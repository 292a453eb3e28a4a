//! Frame stacks and boolean mask grids.
//!
//! All grids are stored row-major (row 0 first), one frame after another,
//! with missing values represented as NaN.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{OceanError, OceanResult};

/// Spatial shape of a grid (rows, columns).
///
/// Serializes as `[height, width]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct GridShape {
    pub height: usize,
    pub width: usize,
}

impl GridShape {
    /// Create a new grid shape.
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    /// Number of cells in one grid.
    pub fn cell_count(&self) -> usize {
        self.height * self.width
    }
}

impl From<(usize, usize)> for GridShape {
    fn from((height, width): (usize, usize)) -> Self {
        Self { height, width }
    }
}

impl From<GridShape> for (usize, usize) {
    fn from(shape: GridShape) -> Self {
        (shape.height, shape.width)
    }
}

impl std::fmt::Display for GridShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

/// Checks that `dims` describes a (T, H, W) volume holding `len` values.
fn check_volume_dims(dims: &[usize], len: usize) -> OceanResult<(usize, GridShape)> {
    if dims.len() != 3 {
        return Err(OceanError::shape(format!(
            "Expected 3D data (time, lat, lon), got shape {:?}",
            dims
        )));
    }
    let expected = dims[0] * dims[1] * dims[2];
    if expected != len {
        return Err(OceanError::shape(format!(
            "shape {:?} needs {} values, buffer holds {}",
            dims, expected, len
        )));
    }
    Ok((dims[0], GridShape::new(dims[1], dims[2])))
}

/// An ordered stack of T frames, each of shape (H, W).
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStack {
    data: Vec<f32>,
    frames: usize,
    shape: GridShape,
}

impl FrameStack {
    /// Create a stack from a flat buffer of `frames * height * width` values.
    pub fn new(data: Vec<f32>, frames: usize, shape: GridShape) -> OceanResult<Self> {
        Self::from_dims(data, &[frames, shape.height, shape.width])
    }

    /// Create a stack from a flat buffer and its dimension list.
    ///
    /// Fails with a shape error unless `dims` has exactly three entries.
    pub fn from_dims(data: Vec<f32>, dims: &[usize]) -> OceanResult<Self> {
        let (frames, shape) = check_volume_dims(dims, data.len())?;
        Ok(Self {
            data,
            frames,
            shape,
        })
    }

    /// Create a stack with every cell set to `value`.
    pub fn filled(frames: usize, shape: GridShape, value: f32) -> Self {
        Self {
            data: vec![value; frames * shape.cell_count()],
            frames,
            shape,
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Dimensions as `[T, H, W]`.
    pub fn dims(&self) -> [usize; 3] {
        [self.frames, self.shape.height, self.shape.width]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Borrow frame `t`.
    ///
    /// # Panics
    /// Panics if `t >= self.frames()`.
    pub fn frame(&self, t: usize) -> &[f32] {
        let len = self.shape.cell_count();
        &self.data[t * len..(t + 1) * len]
    }

    /// Mutably borrow frame `t`.
    ///
    /// # Panics
    /// Panics if `t >= self.frames()`.
    pub fn frame_mut(&mut self, t: usize) -> &mut [f32] {
        let len = self.shape.cell_count();
        &mut self.data[t * len..(t + 1) * len]
    }

    /// Iterate over frames in time order.
    pub fn iter_frames(&self) -> impl Iterator<Item = &[f32]> + '_ {
        (0..self.frames).map(move |t| self.frame(t))
    }

    /// Copy of the first `n` frames (or all of them if fewer exist).
    pub fn truncated(&self, n: usize) -> Self {
        let n = n.min(self.frames);
        Self {
            data: self.data[..n * self.shape.cell_count()].to_vec(),
            frames: n,
            shape: self.shape,
        }
    }

    /// Copy of the given row and column index ranges from every frame.
    pub fn crop(&self, rows: Range<usize>, cols: Range<usize>) -> OceanResult<Self> {
        if rows.end > self.shape.height || cols.end > self.shape.width {
            return Err(OceanError::shape(format!(
                "crop rows {:?} cols {:?} exceeds grid {}",
                rows, cols, self.shape
            )));
        }
        let shape = GridShape::new(rows.len(), cols.len());
        let mut data = Vec::with_capacity(self.frames * shape.cell_count());
        for frame in self.iter_frames() {
            for row in rows.clone() {
                let start = row * self.shape.width;
                data.extend_from_slice(&frame[start + cols.start..start + cols.end]);
            }
        }
        Ok(Self {
            data,
            frames: self.frames,
            shape,
        })
    }

    /// Number of NaN cells across the whole volume.
    pub fn nan_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_nan()).count()
    }
}

/// A single (H, W) boolean grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskGrid {
    cells: Vec<bool>,
    shape: GridShape,
}

impl MaskGrid {
    /// Create a mask from row-major cells.
    pub fn new(cells: Vec<bool>, shape: GridShape) -> OceanResult<Self> {
        if cells.len() != shape.cell_count() {
            return Err(OceanError::shape(format!(
                "mask of shape {} needs {} cells, got {}",
                shape,
                shape.cell_count(),
                cells.len()
            )));
        }
        Ok(Self { cells, shape })
    }

    /// Create a mask with every cell set to `value`.
    pub fn filled(shape: GridShape, value: bool) -> Self {
        Self {
            cells: vec![value; shape.cell_count()],
            shape,
        }
    }

    /// Decode a mask stored as 0/1 bytes (any non-zero byte is true).
    pub fn from_u8(bytes: &[u8], shape: GridShape) -> OceanResult<Self> {
        Self::new(bytes.iter().map(|&b| b != 0).collect(), shape)
    }

    /// Encode as 0/1 bytes.
    pub fn to_u8(&self) -> Vec<u8> {
        self.cells.iter().map(|&c| c as u8).collect()
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Mutable cells; the grid shape cannot change through this slice.
    pub fn cells_mut(&mut self) -> &mut [bool] {
        &mut self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> Option<bool> {
        if row >= self.shape.height || col >= self.shape.width {
            return None;
        }
        Some(self.cells[row * self.shape.width + col])
    }

    /// Number of true cells.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Nested rows, for JSON reports.
    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        if self.shape.width == 0 {
            return vec![Vec::new(); self.shape.height];
        }
        self.cells
            .chunks(self.shape.width)
            .map(|row| row.to_vec())
            .collect()
    }
}

/// An ordered stack of (H, W) boolean masks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskStack {
    cells: Vec<bool>,
    len: usize,
    shape: GridShape,
}

impl MaskStack {
    /// An empty stack of masks with the given grid shape.
    pub fn empty(shape: GridShape) -> Self {
        Self {
            cells: Vec::new(),
            len: 0,
            shape,
        }
    }

    /// Create a stack from `len` row-major masks laid end to end.
    pub fn new(cells: Vec<bool>, len: usize, shape: GridShape) -> OceanResult<Self> {
        if cells.len() != len * shape.cell_count() {
            return Err(OceanError::shape(format!(
                "{} masks of shape {} need {} cells, got {}",
                len,
                shape,
                len * shape.cell_count(),
                cells.len()
            )));
        }
        Ok(Self { cells, len, shape })
    }

    /// Decode a (K, H, W) stack stored as 0/1 bytes.
    pub fn from_u8(bytes: &[u8], dims: &[usize]) -> OceanResult<Self> {
        let (len, shape) = check_volume_dims(dims, bytes.len())?;
        Self::new(bytes.iter().map(|&b| b != 0).collect(), len, shape)
    }

    /// Append a mask; its shape must match the stack.
    pub fn push(&mut self, mask: &MaskGrid) -> OceanResult<()> {
        if mask.shape() != self.shape {
            return Err(OceanError::shape(format!(
                "mask shape {} does not match stack shape {}",
                mask.shape(),
                self.shape
            )));
        }
        self.cells.extend_from_slice(mask.cells());
        self.len += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Dimensions as `[K, H, W]`.
    pub fn dims(&self) -> [usize; 3] {
        [self.len, self.shape.height, self.shape.width]
    }

    /// Borrow mask `i`.
    ///
    /// # Panics
    /// Panics if `i >= self.len()`.
    pub fn mask(&self, i: usize) -> &[bool] {
        let n = self.shape.cell_count();
        &self.cells[i * n..(i + 1) * n]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[bool]> + '_ {
        (0..self.len).map(move |i| self.mask(i))
    }

    /// Copy of the first `n` masks (or all of them if fewer exist).
    pub fn truncated(&self, n: usize) -> Self {
        let n = n.min(self.len);
        Self {
            cells: self.cells[..n * self.shape.cell_count()].to_vec(),
            len: n,
            shape: self.shape,
        }
    }

    /// Encode as 0/1 bytes.
    pub fn to_u8(&self) -> Vec<u8> {
        self.cells.iter().map(|&c| c as u8).collect()
    }

    /// Total number of true cells across all masks.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}
