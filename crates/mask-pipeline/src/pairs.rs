//! Training pair construction.
//!
//! Ground truth is cropped, optionally regridded, then paired index by
//! index with occlusion masks. The input of pair `i` is ground-truth frame
//! `i` with every masked cell set to NaN.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use grid_processor::{
    resample_axes, resample_stack, SinkConfig, SinkReport, SpatialSubset, ZarrStoreWriter,
};
use netcdf_parser::ArraySource;
use ocean_common::{
    CoordRange, CoordinateAxes, FrameStack, GridShape, MaskGrid, MaskStack, OceanError,
    OceanResult,
};

use crate::bank::MaskInput;

/// Value of the `description` attribute on a training pair store.
pub const PAIRS_DESCRIPTION: &str = "Ocean training pairs with cloud occlusion masks";

/// Optional crop and regrid applied to ground truth before pairing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairRequest {
    /// Inclusive latitude bounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude_range: Option<CoordRange>,

    /// Inclusive longitude bounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude_range: Option<CoordRange>,

    /// Grid to resample to after cropping, as `[height, width]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_grid: Option<GridShape>,
}

impl PairRequest {
    pub fn subset(&self) -> SpatialSubset {
        SpatialSubset::new(self.latitude_range, self.longitude_range)
    }

    /// Validate the target grid; coordinate ranges validate on construction.
    pub fn validate(&self) -> OceanResult<()> {
        if let Some(target) = self.target_grid {
            if target.height == 0 || target.width == 0 {
                return Err(OceanError::shape(format!(
                    "target grid {} must have non-zero dimensions",
                    target
                )));
            }
        }
        Ok(())
    }
}

/// Paired input/ground-truth stacks ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingPairs {
    pub variable_name: String,
    /// Ground truth with occluded cells set to NaN.
    pub input: FrameStack,
    pub ground_truth: FrameStack,
    /// The masks actually applied, one per pair.
    pub masks: MaskStack,
    pub land_mask: Option<MaskGrid>,
    /// Axes of the final grid; time is cut to the number of pairs.
    pub axes: CoordinateAxes,
}

impl TrainingPairs {
    pub fn n_frames(&self) -> usize {
        self.input.frames()
    }

    pub fn grid_shape(&self) -> GridShape {
        self.input.shape()
    }

    /// Fraction of NaN cells over the whole input volume (0 when empty).
    pub fn input_nan_ratio(&self) -> f64 {
        let total = self.input.data().len();
        if total == 0 {
            return 0.0;
        }
        self.input.nan_count() as f64 / total as f64
    }

    /// Write the pairs to a Zarr store at `path`.
    ///
    /// Nothing is left at `path` unless every array was written.
    pub fn write(&self, path: impl AsRef<Path>, sink: &SinkConfig) -> OceanResult<SinkReport> {
        let shape = self.grid_shape();
        let dims = self.input.dims();
        let mut writer = ZarrStoreWriter::create(path.as_ref(), sink.clone())?;

        writer.write_f32("input", self.input.data(), &dims)?;
        writer.write_f32("ground_truth", self.ground_truth.data(), &dims)?;
        writer.write_u8("effective_cloud_mask", &self.masks.to_u8(), &dims)?;
        if let Some(land) = &self.land_mask {
            writer.write_u8("land_mask", &land.to_u8(), &[shape.height, shape.width])?;
        }
        writer.write_f64("latitude", &self.axes.latitude, &[shape.height])?;
        writer.write_f64("longitude", &self.axes.longitude, &[shape.width])?;
        if let Some(time) = &self.axes.time {
            writer.write_f64("time", time, &[time.len()])?;
        }

        writer.set_attribute("description", serde_json::json!(PAIRS_DESCRIPTION));
        writer.set_attribute("variable_name", serde_json::json!(self.variable_name));
        writer.set_attribute("n_frames", serde_json::json!(self.n_frames()));
        writer.set_attribute("grid_shape", serde_json::to_value(shape)?);
        writer.set_attribute(
            "created_at",
            serde_json::json!(chrono::Utc::now().to_rfc3339()),
        );
        if let Some(units) = &self.axes.time_units {
            writer.set_attribute("time_units", serde_json::json!(units));
        }

        Ok(writer.finish()?)
    }
}

/// Result of a file-level build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub output_path: PathBuf,
    pub n_frames: usize,
    pub grid_shape: GridShape,
    pub input_nan_ratio: f64,
}

/// Builds training pairs from ground truth and occlusion masks.
#[derive(Debug, Clone, Default)]
pub struct TrainingPairBuilder {
    request: PairRequest,
}

impl TrainingPairBuilder {
    pub fn new(request: PairRequest) -> Self {
        Self { request }
    }

    pub fn request(&self) -> &PairRequest {
        &self.request
    }

    /// Pair `ground_truth` with `masks`.
    ///
    /// Produces `min(ground_truth.frames(), masks.len())` pairs from the
    /// leading frames of each. Fails with a shape error when the mask grid
    /// does not match the final ground-truth grid.
    pub fn build(
        &self,
        variable_name: &str,
        ground_truth: &FrameStack,
        axes: &CoordinateAxes,
        masks: &MaskInput,
    ) -> OceanResult<TrainingPairs> {
        self.request.validate()?;

        let (mut truth, mut axes) = self.request.subset().apply(ground_truth, axes)?;

        if let Some(target) = self.request.target_grid {
            if target != truth.shape() {
                truth = resample_stack(&truth, target)?;
                axes = resample_axes(&axes, target)?;
            }
        }

        let shape = truth.shape();
        if masks.shape() != shape {
            return Err(OceanError::shape(format!(
                "occlusion mask grid {} does not match ground truth grid {}",
                masks.shape(),
                shape
            )));
        }

        let n = truth.frames().min(masks.len());
        let truth = truth.truncated(n);
        let effective = masks.masks().truncated(n);

        let mut input = truth.clone();
        for (i, mask) in effective.iter().enumerate() {
            for (value, &occluded) in input.frame_mut(i).iter_mut().zip(mask) {
                if occluded {
                    *value = f32::NAN;
                }
            }
        }

        debug!(
            variable = variable_name,
            pairs = n,
            ground_truth_frames = ground_truth.frames(),
            masks = masks.len(),
            grid = %shape,
            "Paired ground truth with occlusion masks"
        );

        Ok(TrainingPairs {
            variable_name: variable_name.to_string(),
            input,
            ground_truth: truth,
            masks: effective,
            land_mask: masks.land_mask().cloned(),
            axes: axes.with_time_truncated(n),
        })
    }
}

/// Read `variable` from `source`, build pairs and write them to `output`.
pub fn build_training_pairs(
    source: &dyn ArraySource,
    variable: &str,
    masks: &MaskInput,
    request: &PairRequest,
    output: &Path,
    sink: &SinkConfig,
) -> OceanResult<BuildSummary> {
    let ground_truth = source.read_variable(variable)?;
    let axes = source.read_axes()?;

    let builder = TrainingPairBuilder::new(request.clone());
    let pairs = builder.build(variable, &ground_truth, &axes, masks)?;
    let report = pairs.write(output, sink)?;

    let summary = BuildSummary {
        output_path: report.path,
        n_frames: pairs.n_frames(),
        grid_shape: pairs.grid_shape(),
        input_nan_ratio: pairs.input_nan_ratio(),
    };

    info!(
        output = %summary.output_path.display(),
        n_frames = summary.n_frames,
        grid = %summary.grid_shape,
        input_nan_ratio = summary.input_nan_ratio,
        "Built training pairs"
    );

    Ok(summary)
}
