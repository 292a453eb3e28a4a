//! Occlusion banks, mask inputs and their persisted form.
//!
//! A persisted bank is a Zarr V3 store whose root group carries
//! `kind = "occlusion_bank"` and the sampler statistics, with arrays:
//!
//! | array         | type | shape     |
//! |---------------|------|-----------|
//! | `land_mask`   | u8   | (H, W)    |
//! | `cloud_masks` | u8   | (K, H, W) |
//! | `valid_frames`| u64  | (K)       |
//!
//! A store whose root is a single u8 (K, H, W) array holds bare masks.

use std::path::Path;

use tracing::{debug, info};

use grid_processor::{SinkConfig, SinkReport, ZarrStoreReader, ZarrStoreWriter};
use ocean_common::{GridShape, MaskGrid, MaskStack, OceanError, OceanResult};

use crate::sampler::BankStatistics;

/// Value of the `kind` attribute on a persisted bank.
pub const BANK_KIND: &str = "occlusion_bank";

/// Land mask plus an ordered, capped set of occlusion masks and the frames
/// they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct OcclusionBank {
    land_mask: MaskGrid,
    masks: MaskStack,
    frame_indices: Vec<usize>,
    statistics: BankStatistics,
}

impl OcclusionBank {
    /// Assemble a bank, checking that shapes and counts agree and that
    /// frame indices are strictly increasing.
    pub fn new(
        land_mask: MaskGrid,
        masks: MaskStack,
        frame_indices: Vec<usize>,
        statistics: BankStatistics,
    ) -> OceanResult<Self> {
        if land_mask.shape() != masks.shape() {
            return Err(OceanError::shape(format!(
                "land mask shape {} does not match occlusion mask shape {}",
                land_mask.shape(),
                masks.shape()
            )));
        }
        if frame_indices.len() != masks.len() {
            return Err(OceanError::shape(format!(
                "{} frame indices for {} occlusion masks",
                frame_indices.len(),
                masks.len()
            )));
        }
        if frame_indices.windows(2).any(|w| w[0] >= w[1]) {
            return Err(OceanError::invalid_range(
                "occlusion bank frame indices must be strictly increasing",
            ));
        }

        Ok(Self {
            land_mask,
            masks,
            frame_indices,
            statistics,
        })
    }

    pub fn land_mask(&self) -> &MaskGrid {
        &self.land_mask
    }

    pub fn masks(&self) -> &MaskStack {
        &self.masks
    }

    /// Source frame of each mask, in bank order.
    pub fn frame_indices(&self) -> &[usize] {
        &self.frame_indices
    }

    pub fn statistics(&self) -> &BankStatistics {
        &self.statistics
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    pub fn shape(&self) -> GridShape {
        self.masks.shape()
    }

    /// Persist the bank as a Zarr store at `path`.
    pub fn save(&self, path: impl AsRef<Path>, sink: &SinkConfig) -> OceanResult<SinkReport> {
        let shape = self.shape();
        let mut writer = ZarrStoreWriter::create(path.as_ref(), sink.clone())?;

        writer.write_u8(
            "land_mask",
            &self.land_mask.to_u8(),
            &[shape.height, shape.width],
        )?;
        writer.write_u8("cloud_masks", &self.masks.to_u8(), &self.masks.dims())?;
        let frames: Vec<u64> = self.frame_indices.iter().map(|&t| t as u64).collect();
        writer.write_u64("valid_frames", &frames, &[frames.len()])?;

        writer.set_attribute("kind", serde_json::json!(BANK_KIND));
        writer.set_attribute("statistics", serde_json::to_value(&self.statistics)?);

        let report = writer.finish()?;
        info!(path = %report.path.display(), masks = self.len(), "Saved occlusion bank");
        Ok(report)
    }

    /// Load a bank persisted with [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> OceanResult<Self> {
        let reader = open_store(path.as_ref())?;
        Self::from_reader(&reader)
    }

    fn from_reader(reader: &ZarrStoreReader) -> OceanResult<Self> {
        let attrs = reader.group_attributes()?;
        match attrs.get("kind").and_then(|v| v.as_str()) {
            Some(BANK_KIND) => {}
            _ => {
                return Err(OceanError::UnsupportedFormat(format!(
                    "{} is not an occlusion bank store",
                    reader.path().display()
                )))
            }
        }

        let statistics: BankStatistics = match attrs.get("statistics") {
            Some(value) => serde_json::from_value(value.clone())?,
            None => {
                return Err(OceanError::io(format!(
                    "occlusion bank {} has no statistics attribute",
                    reader.path().display()
                )))
            }
        };

        let land = reader.read_u8("land_mask")?;
        if land.shape.len() != 2 {
            return Err(OceanError::shape(format!(
                "land_mask must be 2-D, got shape {:?}",
                land.shape
            )));
        }
        let land_shape = GridShape::new(land.shape[0], land.shape[1]);
        let land_mask = MaskGrid::from_u8(&land.data, land_shape)?;

        let clouds = reader.read_u8("cloud_masks")?;
        let masks = MaskStack::from_u8(&clouds.data, &clouds.shape)?;

        let frames = reader.read_u64("valid_frames")?;
        let frame_indices = frames.data.iter().map(|&t| t as usize).collect();

        debug!(path = %reader.path().display(), masks = masks.len(), "Loaded occlusion bank");

        Self::new(land_mask, masks, frame_indices, statistics)
    }
}

/// Occlusion masks handed to the training pair builder.
///
/// Resolved once from whatever the caller supplied; the builder never
/// inspects the on-disk layout itself.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskInput {
    /// Bare masks, without a land mask.
    Masks(MaskStack),
    /// A full occlusion bank, carrying its land mask.
    Bank(OcclusionBank),
}

impl MaskInput {
    /// Load either a bare mask array or a persisted bank from `path`.
    pub fn load(path: impl AsRef<Path>) -> OceanResult<Self> {
        let reader = open_store(path.as_ref())?;

        if reader.root_is_array() {
            let masks = reader.read_u8("")?;
            let stack = MaskStack::from_u8(&masks.data, &masks.shape)?;
            debug!(path = %reader.path().display(), masks = stack.len(), "Loaded bare masks");
            return Ok(Self::Masks(stack));
        }

        Ok(Self::Bank(OcclusionBank::from_reader(&reader)?))
    }

    pub fn masks(&self) -> &MaskStack {
        match self {
            Self::Masks(masks) => masks,
            Self::Bank(bank) => bank.masks(),
        }
    }

    /// The land mask, when the input carries one.
    pub fn land_mask(&self) -> Option<&MaskGrid> {
        match self {
            Self::Masks(_) => None,
            Self::Bank(bank) => Some(bank.land_mask()),
        }
    }

    pub fn len(&self) -> usize {
        self.masks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks().is_empty()
    }

    pub fn shape(&self) -> GridShape {
        self.masks().shape()
    }
}

impl From<OcclusionBank> for MaskInput {
    fn from(bank: OcclusionBank) -> Self {
        Self::Bank(bank)
    }
}

impl From<MaskStack> for MaskInput {
    fn from(masks: MaskStack) -> Self {
        Self::Masks(masks)
    }
}

/// Persist bare masks as a store whose root is a single u8 array.
pub fn save_masks(
    masks: &MaskStack,
    path: impl AsRef<Path>,
    sink: &SinkConfig,
) -> OceanResult<SinkReport> {
    let mut writer = ZarrStoreWriter::create(path.as_ref(), sink.clone())?;
    writer.write_u8("", &masks.to_u8(), &masks.dims())?;
    Ok(writer.finish()?)
}

fn open_store(path: &Path) -> OceanResult<ZarrStoreReader> {
    if !path.exists() {
        return Err(OceanError::io(format!(
            "mask store {} does not exist",
            path.display()
        )));
    }
    Ok(ZarrStoreReader::open(path)?)
}
