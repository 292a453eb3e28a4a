//! Reading Zarr stores written by [`ZarrStoreWriter`](crate::ZarrStoreWriter).

mod zarr_reader;

pub use zarr_reader::{ArrayData, ZarrStoreReader};
