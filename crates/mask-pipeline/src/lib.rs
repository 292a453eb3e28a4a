//! Mask-driven training pair construction for gridded ocean data.
//!
//! Three steps, each consuming the output of the one before:
//!
//! 1. [`land`]: derive the static land mask of a frame stack (cells that
//!    are missing in every frame).
//! 2. [`sampler`]: scan frames in time order and harvest occlusion masks
//!    whose ocean missing ratio lies in a configured window, up to a cap.
//!    The result is an [`OcclusionBank`], which can be persisted and
//!    reloaded as a [`MaskInput`].
//! 3. [`pairs`]: crop and optionally regrid ground truth, then pair each
//!    leading frame with a mask to produce occluded input / ground truth
//!    records, written as a Zarr store.
//!
//! The [`api`] functions wrap these steps for file-based callers and
//! return a single serializable [`Outcome`](ocean_common::Outcome).
//!
//! # Example
//!
//! ```ignore
//! use mask_pipeline::{OcclusionSampler, SamplerConfig, TrainingPairBuilder, PairRequest};
//!
//! let bank = OcclusionSampler::new(SamplerConfig::default()).sample(&observed)?;
//! let pairs = TrainingPairBuilder::new(PairRequest::default())
//!     .build("sst", &reanalysis, &axes, &bank.into())?;
//! pairs.write("pairs.zarr", &SinkConfig::default())?;
//! ```

pub mod api;
pub mod bank;
pub mod config;
pub mod land;
pub mod pairs;
pub mod sampler;
pub mod stats;

pub use api::{
    apply_masks, build_occlusion_bank, calculate_statistics, generate_masks, MaskReport,
};
pub use bank::{save_masks, MaskInput, OcclusionBank, BANK_KIND};
pub use config::{MaskConfig, PairConfig, PipelineConfig};
pub use land::{extract_land_mask, extract_land_mask_from_dims, LandSummary};
pub use pairs::{
    build_training_pairs, BuildSummary, PairRequest, TrainingPairBuilder, TrainingPairs,
};
pub use sampler::{BankStatistics, OcclusionSampler, SamplerConfig, MISSING_RATIO_PREVIEW};
pub use stats::{compute_statistics, VariableStatistics};
