//! Occlusion sampling: harvesting real missing-data patterns as masks.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use ocean_common::{FrameStack, GridShape, MaskGrid, MaskStack, OceanResult, RatioRange};

use crate::bank::OcclusionBank;
use crate::land::{extract_land_mask, LandSummary};

/// Number of qualifying-frame missing ratios kept for diagnostics.
pub const MISSING_RATIO_PREVIEW: usize = 10;

/// Selection settings for the occlusion sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Inclusive window a frame's ocean missing ratio must fall in.
    pub missing_ratio_range: RatioRange,

    /// Maximum number of masks to harvest.
    pub mask_count: usize,

    /// Reserved. Accepted and recorded, has no effect on the land mask.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub land_threshold: Option<u32>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            missing_ratio_range: RatioRange::default(),
            mask_count: 360,
            land_threshold: None,
        }
    }
}

/// Summary of one sampler run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankStatistics {
    /// Frames in the source stack.
    pub total_frames: usize,
    /// Frames inspected before the cap stopped the scan.
    pub frames_scanned: usize,
    /// Qualifying frames retained.
    pub valid_frames_count: usize,
    pub land_pixel_count: usize,
    pub ocean_pixel_count: usize,
    pub grid_shape: GridShape,
    /// Missing ratios of the first retained frames, at most
    /// [`MISSING_RATIO_PREVIEW`] of them.
    pub missing_ratios: Vec<f64>,
}

/// Scans a stack in time order and keeps occlusion masks whose missing
/// ratio lies in the configured window, up to the configured cap.
#[derive(Debug, Clone)]
pub struct OcclusionSampler {
    config: SamplerConfig,
}

impl OcclusionSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Build an occlusion bank from `stack`.
    ///
    /// Fails with `NoOceanData` if every cell is land. Finding no qualifying
    /// frame is not an error; the bank is then empty.
    pub fn sample(&self, stack: &FrameStack) -> OceanResult<OcclusionBank> {
        let shape = stack.shape();
        let range = self.config.missing_ratio_range;
        let cap = self.config.mask_count;

        if let Some(threshold) = self.config.land_threshold {
            warn!(
                land_threshold = threshold,
                "land_threshold is reserved and has no effect"
            );
        }

        let land_mask = extract_land_mask(stack);
        let land = LandSummary::from_mask(&land_mask);
        let ocean_cells = land.ocean_cells_checked()? as f64;

        let mut masks = MaskStack::empty(shape);
        let mut frame_indices = Vec::new();
        let mut missing_ratios = Vec::new();
        let mut frames_scanned = 0;

        if cap > 0 {
            for (t, frame) in stack.iter_frames().enumerate() {
                frames_scanned += 1;

                let mut mask = MaskGrid::filled(shape, false);
                let mut occluded = 0usize;
                for ((cell, value), is_land) in mask
                    .cells_mut()
                    .iter_mut()
                    .zip(frame)
                    .zip(land_mask.cells())
                {
                    if value.is_nan() && !is_land {
                        *cell = true;
                        occluded += 1;
                    }
                }

                let ratio = occluded as f64 / ocean_cells;
                if !range.contains(ratio) {
                    continue;
                }

                debug!(frame = t, missing_ratio = ratio, "Frame qualifies");
                masks.push(&mask)?;
                frame_indices.push(t);
                if missing_ratios.len() < MISSING_RATIO_PREVIEW {
                    missing_ratios.push(ratio);
                }

                if frame_indices.len() >= cap {
                    break;
                }
            }
        }

        let statistics = BankStatistics {
            total_frames: stack.frames(),
            frames_scanned,
            valid_frames_count: frame_indices.len(),
            land_pixel_count: land.land_cells,
            ocean_pixel_count: land.ocean_cells,
            grid_shape: shape,
            missing_ratios,
        };

        if frame_indices.is_empty() {
            warn!(
                total_frames = statistics.total_frames,
                low = range.low(),
                high = range.high(),
                "No frame qualified; occlusion bank is empty"
            );
        } else {
            info!(
                masks = frame_indices.len(),
                frames_scanned,
                total_frames = statistics.total_frames,
                land_cells = land.land_cells,
                ocean_cells = land.ocean_cells,
                "Built occlusion bank"
            );
        }

        OcclusionBank::new(land_mask, masks, frame_indices, statistics)
    }
}
