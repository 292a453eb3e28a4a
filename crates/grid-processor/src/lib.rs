//! Grid processing for ocean frame stacks, with Zarr V3 storage.
//!
//! This crate provides the spatial operations and the structured array
//! store used by the mask pipeline:
//!
//! - **Subsetting**: crop a stack and its axes to latitude/longitude bounds
//! - **Regridding**: order-1 resampling of stacks and axes to a target grid
//! - **Storage**: Zarr V3 directory stores written through a staging
//!   directory, so a failed write never leaves a partial store behind
//!
//! # Architecture
//!
//! ```text
//! FrameStack + CoordinateAxes
//!      │
//!      ├─► SpatialSubset::apply      (crop by coordinate value)
//!      │
//!      ├─► resample_stack / resample_axes   (optional, order 1)
//!      │
//!      └─► ZarrStoreWriter
//!               │
//!               ├─► write_f32 / write_u8 / ... into <output>.partial
//!               │
//!               └─► finish(): root group attributes, rename onto <output>
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_processor::{SinkConfig, ZarrStoreReader, ZarrStoreWriter};
//!
//! let mut writer = ZarrStoreWriter::create("pairs.zarr", SinkConfig::default())?;
//! writer.write_f32("ground_truth", stack.data(), &stack.dims())?;
//! writer.set_attribute("variable_name", serde_json::json!("sst"));
//! writer.finish()?;
//!
//! let reader = ZarrStoreReader::open("pairs.zarr")?;
//! let truth = reader.read_f32("ground_truth")?;
//! ```

pub mod config;
pub mod error;
pub mod reader;
pub mod regrid;
pub mod subset;
pub mod writer;

// Re-export commonly used types at crate root
pub use config::{SinkConfig, ZarrCompression};
pub use error::{GridProcessorError, Result};
pub use reader::{ArrayData, ZarrStoreReader};
pub use regrid::{resample_axes, resample_stack, zoom_axis};
pub use subset::{index_span, SpatialSubset};
pub use writer::{staging_path, SinkReport, ZarrStoreWriter};
