//! Zarr writer for persisting frame stacks and masks.
//!
//! Stores are written into a staging directory and only moved onto the
//! output path once every array has been written.

mod zarr_writer;

pub(crate) use zarr_writer::node_path;
pub use zarr_writer::{staging_path, SinkReport, ZarrStoreWriter};
