//! Static land/ocean mask extraction.
//!
//! A land cell is missing (NaN) in every frame of a stack. Transient
//! occlusion never makes a cell land, since some frame observed it.

use serde::{Deserialize, Serialize};

use ocean_common::{FrameStack, MaskGrid, OceanError, OceanResult};

/// Land mask of a stack: true where the cell is NaN in every frame.
///
/// A stack with no frames never observed any cell, so every cell is land.
pub fn extract_land_mask(stack: &FrameStack) -> MaskGrid {
    let mut land = MaskGrid::filled(stack.shape(), true);

    for frame in stack.iter_frames() {
        for (cell, value) in land.cells_mut().iter_mut().zip(frame) {
            if !value.is_nan() {
                *cell = false;
            }
        }
    }

    land
}

/// Land mask of a flat buffer with dimensions `dims`.
///
/// Fails with a shape error unless `dims` describes a (T, H, W) volume.
pub fn extract_land_mask_from_dims(data: Vec<f32>, dims: &[usize]) -> OceanResult<MaskGrid> {
    let stack = FrameStack::from_dims(data, dims)?;
    Ok(extract_land_mask(&stack))
}

/// Land and ocean cell counts of a land mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandSummary {
    pub land_cells: usize,
    pub ocean_cells: usize,
}

impl LandSummary {
    pub fn from_mask(land_mask: &MaskGrid) -> Self {
        let land_cells = land_mask.count();
        Self {
            land_cells,
            ocean_cells: land_mask.shape().cell_count() - land_cells,
        }
    }

    /// Ocean cell count, or `NoOceanData` when it is zero.
    ///
    /// Every missing-ratio computation divides by this value.
    pub fn ocean_cells_checked(&self) -> OceanResult<usize> {
        if self.ocean_cells == 0 {
            return Err(OceanError::NoOceanData {
                land_cells: self.land_cells,
            });
        }
        Ok(self.ocean_cells)
    }
}
