//! Entry points returning a single structured outcome.
//!
//! Each operation captures every error into [`Outcome::Error`] rather than
//! returning early, so callers get one serializable value per call.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info};

use grid_processor::SinkConfig;
use netcdf_parser::{open_source, ArraySource};
use ocean_common::{OceanResult, Outcome};

use crate::bank::{MaskInput, OcclusionBank};
use crate::config::{MaskConfig, PairConfig};
use crate::pairs::{build_training_pairs, BuildSummary};
use crate::sampler::{BankStatistics, OcclusionSampler, SamplerConfig};
use crate::stats::{compute_statistics, VariableStatistics};

/// Result of mask generation.
#[derive(Debug, Clone, Serialize)]
pub struct MaskReport {
    /// Land mask as rows of booleans.
    pub land_mask: Vec<Vec<bool>>,
    pub cloud_masks_count: usize,
    pub valid_frames: Vec<usize>,
    pub statistics: BankStatistics,
    /// Where the bank was persisted, if requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_path: Option<PathBuf>,
}

impl MaskReport {
    fn from_bank(bank: &OcclusionBank, bank_path: Option<PathBuf>) -> Self {
        Self {
            land_mask: bank.land_mask().to_rows(),
            cloud_masks_count: bank.len(),
            valid_frames: bank.frame_indices().to_vec(),
            statistics: bank.statistics().clone(),
            bank_path,
        }
    }
}

/// Read `variable` from `source` and sample an occlusion bank from it.
pub fn build_occlusion_bank(
    source: &dyn ArraySource,
    variable: &str,
    config: &SamplerConfig,
) -> OceanResult<OcclusionBank> {
    let stack = source.read_variable(variable)?;
    OcclusionSampler::new(config.clone()).sample(&stack)
}

/// Generate a land mask and occlusion bank from a source file, optionally
/// persisting the bank.
pub fn generate_masks(
    source_path: &Path,
    variable: &str,
    config: &MaskConfig,
    bank_output: Option<&Path>,
    sink: &SinkConfig,
) -> Outcome<MaskReport> {
    info!(
        source = %source_path.display(),
        variable,
        mask_count = config.mask_count,
        "Generating occlusion masks"
    );
    finish(
        "generate_masks",
        try_generate_masks(source_path, variable, config, bank_output, sink),
    )
}

fn try_generate_masks(
    source_path: &Path,
    variable: &str,
    config: &MaskConfig,
    bank_output: Option<&Path>,
    sink: &SinkConfig,
) -> OceanResult<MaskReport> {
    let bank = {
        let source = open_source(source_path)?;
        build_occlusion_bank(source.as_ref(), variable, config)?
    };

    let bank_path = match bank_output {
        Some(path) => Some(bank.save(path, sink)?.path),
        None => None,
    };
    Ok(MaskReport::from_bank(&bank, bank_path))
}

/// Apply persisted masks to a source variable and write training pairs.
pub fn apply_masks(
    source_path: &Path,
    variable: &str,
    mask_path: &Path,
    output_path: &Path,
    config: &PairConfig,
    sink: &SinkConfig,
) -> Outcome<BuildSummary> {
    info!(
        source = %source_path.display(),
        variable,
        masks = %mask_path.display(),
        output = %output_path.display(),
        "Applying occlusion masks"
    );
    finish(
        "apply_masks",
        try_apply_masks(source_path, variable, mask_path, output_path, config, sink),
    )
}

fn try_apply_masks(
    source_path: &Path,
    variable: &str,
    mask_path: &Path,
    output_path: &Path,
    config: &PairConfig,
    sink: &SinkConfig,
) -> OceanResult<BuildSummary> {
    let masks = MaskInput::load(mask_path)?;
    let source = open_source(source_path)?;
    build_training_pairs(source.as_ref(), variable, &masks, config, output_path, sink)
}

/// NaN-ignoring statistics of a source variable.
pub fn calculate_statistics(source_path: &Path, variable: &str) -> Outcome<VariableStatistics> {
    finish(
        "calculate_statistics",
        try_calculate_statistics(source_path, variable),
    )
}

fn try_calculate_statistics(source_path: &Path, variable: &str) -> OceanResult<VariableStatistics> {
    let source = open_source(source_path)?;
    let stack = source.read_variable(variable)?;
    Ok(compute_statistics(&stack))
}

fn finish<T>(operation: &str, result: OceanResult<T>) -> Outcome<T> {
    if let Err(e) = &result {
        error!(operation, kind = %e.kind(), error = %e, "Operation failed");
    }
    result.into()
}
