//! Structured array source for gridded ocean data.
//!
//! This crate reads self-describing, attribute-carrying array files
//! (NetCDF-4 and the HDF5 files it is built on) into [`FrameStack`]s and
//! [`CoordinateAxes`].
//!
//! # Implementation Notes
//!
//! Reading goes through the native `netcdf` library (libnetcdf + HDF5),
//! enabled by the default `native` feature. Builds without it still compile;
//! opening a file then reports `DependencyUnavailable`.
//!
//! # Data conventions
//!
//! - Variables are read as `f32` with `_FillValue` / `missing_value` cells
//!   replaced by NaN and `scale_factor` / `add_offset` applied.
//! - Latitude comes from `lat` (or `latitude`), longitude from `lon`
//!   (or `longitude`), and the optional time axis from `time`.
//!
//! [`FrameStack`]: ocean_common::FrameStack
//! [`CoordinateAxes`]: ocean_common::CoordinateAxes

#[cfg(feature = "native")]
pub mod native;
pub mod source;

use std::path::Path;

use ocean_common::{OceanError, OceanResult};

#[cfg(feature = "native")]
pub use native::{silence_hdf5_errors, NetCdfSource};
pub use source::{ArraySource, MemorySource, SourceMetadata};

/// Names tried, in order, for the latitude coordinate.
pub const LATITUDE_NAMES: [&str; 2] = ["lat", "latitude"];
/// Names tried, in order, for the longitude coordinate.
pub const LONGITUDE_NAMES: [&str; 2] = ["lon", "longitude"];
/// Name of the optional time coordinate.
pub const TIME_NAME: &str = "time";

/// File formats this crate can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// NetCDF-4 / NetCDF classic (`.nc`, `.nc4`, `.netcdf`).
    NetCdf,
    /// HDF5 files, read through the NetCDF-4 HDF5 layer (`.h5`, `.hdf5`).
    Hdf5,
}

impl SourceFormat {
    /// Determine the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> OceanResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "nc" | "nc4" | "netcdf" => Ok(Self::NetCdf),
            "h5" | "hdf5" => Ok(Self::Hdf5),
            "" => Err(OceanError::UnsupportedFormat(format!(
                "{} has no file extension",
                path.display()
            ))),
            other => Err(OceanError::UnsupportedFormat(format!(".{}", other))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetCdf => "netcdf",
            Self::Hdf5 => "hdf5",
        }
    }
}

/// Open a structured array source, choosing the reader from the extension.
pub fn open_source(path: impl AsRef<Path>) -> OceanResult<Box<dyn ArraySource>> {
    let path = path.as_ref();
    let format = SourceFormat::from_path(path)?;
    tracing::debug!(path = %path.display(), format = format.as_str(), "Opening array source");
    open_with_format(path, format)
}

#[cfg(feature = "native")]
fn open_with_format(path: &Path, _format: SourceFormat) -> OceanResult<Box<dyn ArraySource>> {
    Ok(Box::new(NetCdfSource::open(path)?))
}

#[cfg(not(feature = "native"))]
fn open_with_format(_path: &Path, format: SourceFormat) -> OceanResult<Box<dyn ArraySource>> {
    Err(OceanError::DependencyUnavailable(format!(
        "{} support requires the `native` feature (libnetcdf/HDF5)",
        format.as_str()
    )))
}
