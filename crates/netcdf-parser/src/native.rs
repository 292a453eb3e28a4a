//! Native NetCDF reading using the netcdf library.
//!
//! The netcdf library wraps libnetcdf/HDF5 and needs a file path. The open
//! file handle is owned by [`NetCdfSource`] and closed when it is dropped,
//! including when a read fails partway.

use std::path::{Path, PathBuf};
use std::sync::Once;

use tracing::{debug, info};

use ocean_common::{CoordinateAxes, FrameStack, OceanError, OceanResult};

use crate::source::{ArraySource, SourceMetadata};
use crate::{LATITUDE_NAMES, LONGITUDE_NAMES, TIME_NAME};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints diagnostics to stderr even when the Rust side
/// handles the condition (e.g. probing for an optional attribute). Call once
/// before any NetCDF operation; repeated calls are no-ops.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are a
        // documented way to disable automatic error output.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// An open NetCDF-4 (or HDF5) file.
pub struct NetCdfSource {
    file: netcdf::File,
    path: PathBuf,
}

impl NetCdfSource {
    /// Open a file for reading.
    pub fn open(path: impl AsRef<Path>) -> OceanResult<Self> {
        silence_hdf5_errors();

        let path = path.as_ref();
        let file = netcdf::open(path).map_err(|e| {
            OceanError::io(format!("Failed to open NetCDF {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), "Opened NetCDF file");

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of all dimensions in the file.
    fn dimension_names(&self) -> Vec<String> {
        self.file.dimensions().map(|d| d.name()).collect()
    }

    /// Read a 1-D coordinate variable, trying each name in turn.
    fn read_coord(&self, names: &[&str]) -> OceanResult<Vec<f64>> {
        for name in names {
            if let Some(var) = self.file.variable(name) {
                return var.get_values::<f64, _>(..).map_err(|e| {
                    OceanError::io(format!("Failed to read coordinate '{}': {}", name, e))
                });
            }
        }
        Err(OceanError::missing_variable(
            names.join(" or "),
            self.file.variables().map(|v| v.name()).collect(),
        ))
    }
}

impl ArraySource for NetCdfSource {
    fn metadata(&self) -> OceanResult<SourceMetadata> {
        let dimension_names = self.dimension_names();

        let mut meta = SourceMetadata {
            dimensions: self.file.dimensions().map(|d| (d.name(), d.len())).collect(),
            attributes: self
                .file
                .attributes()
                .filter_map(|attr| {
                    let value = attr.value().ok()?;
                    Some((attr.name().to_string(), attribute_to_string(value)))
                })
                .collect(),
            ..Default::default()
        };

        for var in self.file.variables() {
            let name = var.name();
            if dimension_names.contains(&name) {
                meta.coordinates.push(name);
            } else {
                let shape = var.dimensions().iter().map(|d| d.len()).collect();
                meta.shapes.insert(name.clone(), shape);
                meta.variables.push(name);
            }
        }

        Ok(meta)
    }

    fn variable_names(&self) -> Vec<String> {
        let dimension_names = self.dimension_names();
        self.file
            .variables()
            .map(|v| v.name())
            .filter(|name| !dimension_names.contains(name))
            .collect()
    }

    fn read_variable(&self, name: &str) -> OceanResult<FrameStack> {
        let var = self
            .file
            .variable(name)
            .ok_or_else(|| OceanError::missing_variable(name, self.variable_names()))?;

        let dims: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        if dims.len() != 3 {
            return Err(OceanError::shape(format!(
                "Expected 3D data (time, lat, lon), got shape {:?}",
                dims
            )));
        }

        let raw: Vec<f32> = var
            .get_values(..)
            .map_err(|e| OceanError::io(format!("Failed to read '{}': {}", name, e)))?;

        let fill_value =
            get_f32_attr(&var, "_FillValue").or_else(|| get_f32_attr(&var, "missing_value"));
        let scale_factor = get_f32_attr(&var, "scale_factor").unwrap_or(1.0);
        let add_offset = get_f32_attr(&var, "add_offset").unwrap_or(0.0);

        let data: Vec<f32> = raw
            .into_iter()
            .map(|val| {
                if fill_value.map_or(false, |fill| val == fill) {
                    f32::NAN
                } else {
                    val * scale_factor + add_offset
                }
            })
            .collect();

        info!(
            path = %self.path.display(),
            variable = name,
            shape = ?dims,
            "Read NetCDF variable"
        );

        FrameStack::from_dims(data, &dims)
    }

    fn read_axes(&self) -> OceanResult<CoordinateAxes> {
        let latitude = self.read_coord(&LATITUDE_NAMES)?;
        let longitude = self.read_coord(&LONGITUDE_NAMES)?;
        let axes = CoordinateAxes::new(latitude, longitude);

        match self.file.variable(TIME_NAME) {
            Some(var) => {
                let time: Vec<f64> = var
                    .get_values(..)
                    .map_err(|e| OceanError::io(format!("Failed to read time: {}", e)))?;
                let units = get_string_attr(&var, "units");
                Ok(axes.with_time(time, units))
            }
            None => Ok(axes),
        }
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get f32 attribute.
fn get_f32_attr(var: &netcdf::Variable, name: &str) -> Option<f32> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f32::try_from(attr_value).ok()
}

/// Helper to get a string attribute.
fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

fn attribute_to_string(value: netcdf::AttributeValue) -> String {
    match value {
        netcdf::AttributeValue::Str(s) => s,
        netcdf::AttributeValue::Strs(parts) => parts.join(", "),
        other => format!("{:?}", other),
    }
}

