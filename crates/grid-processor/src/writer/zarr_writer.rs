//! Zarr V3 store writer with a staging-directory guard.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::{Array, ArrayBuilder, DataType, Element, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::group::GroupBuilder;
use zarrs_filesystem::FilesystemStore;

use crate::config::{SinkConfig, ZarrCompression};
use crate::error::{GridProcessorError, Result};

/// Path of the staging directory used while writing `output`.
///
/// `ocean.zarr` stages into `ocean.zarr.partial` next to it.
pub fn staging_path(output: &Path) -> Option<PathBuf> {
    let mut name = output.file_name()?.to_os_string();
    name.push(".partial");
    Some(output.with_file_name(name))
}

/// Store path for a named array; an empty name is the store root.
pub(crate) fn node_path(name: &str) -> String {
    let name = name.trim_matches('/');
    if name.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", name)
    }
}

/// Removes the staging directory on drop unless it was committed.
struct StagingDir {
    path: PathBuf,
    committed: bool,
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if self.committed || !self.path.exists() {
            return;
        }
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed unfinished store"),
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove unfinished store"
            ),
        }
    }
}

/// Result of finishing a store.
#[derive(Debug, Clone, Serialize)]
pub struct SinkReport {
    /// Final location of the store.
    pub path: PathBuf,
    /// Names of the arrays written, in write order.
    pub arrays: Vec<String>,
    /// Uncompressed bytes written across all arrays.
    pub bytes_written: u64,
}

/// Writer for a Zarr V3 directory store.
///
/// Arrays are written into `<output>.partial`. [`finish`](Self::finish)
/// writes the root group and moves the staging directory onto `output`,
/// replacing any previous store there. Dropping the writer without
/// finishing removes the staging directory and leaves `output` untouched.
pub struct ZarrStoreWriter {
    output: PathBuf,
    staging: StagingDir,
    store: Arc<FilesystemStore>,
    config: SinkConfig,
    attributes: serde_json::Map<String, serde_json::Value>,
    arrays: Vec<String>,
    root_array: bool,
    bytes_written: u64,
}

impl ZarrStoreWriter {
    /// Start a new store that will end up at `output`.
    pub fn create(output: impl AsRef<Path>, config: SinkConfig) -> Result<Self> {
        config.validate().map_err(GridProcessorError::ConfigError)?;

        let output = output.as_ref().to_path_buf();
        let staging_dir = staging_path(&output).ok_or_else(|| {
            GridProcessorError::ConfigError(format!(
                "output path {} has no file name",
                output.display()
            ))
        })?;

        if staging_dir.exists() {
            warn!(path = %staging_dir.display(), "Removing stale staging directory");
            fs::remove_dir_all(&staging_dir)?;
        }
        fs::create_dir_all(&staging_dir)?;
        let staging = StagingDir {
            path: staging_dir,
            committed: false,
        };

        let store = FilesystemStore::new(&staging.path)
            .map_err(|e| GridProcessorError::storage_error(e.to_string()))?;

        debug!(
            output = %output.display(),
            compression = %config.compression,
            "Created Zarr store writer"
        );

        Ok(Self {
            output,
            staging,
            store: Arc::new(store),
            config,
            attributes: serde_json::Map::new(),
            arrays: Vec::new(),
            root_array: false,
            bytes_written: 0,
        })
    }

    /// Final output path.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Set a root group attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.attributes.insert(key.into(), value);
    }

    /// Write an `f32` array; missing cells are NaN.
    pub fn write_f32(&mut self, name: &str, data: &[f32], shape: &[usize]) -> Result<()> {
        self.write_array(name, data, shape, DataType::Float32, FillValue::from(f32::NAN))
    }

    /// Write an `f64` array (coordinate axes).
    pub fn write_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) -> Result<()> {
        self.write_array(name, data, shape, DataType::Float64, FillValue::from(f64::NAN))
    }

    /// Write a `u8` array (boolean masks as 0/1).
    pub fn write_u8(&mut self, name: &str, data: &[u8], shape: &[usize]) -> Result<()> {
        self.write_array(name, data, shape, DataType::UInt8, FillValue::from(0u8))
    }

    /// Write a `u64` array (frame indices).
    pub fn write_u64(&mut self, name: &str, data: &[u64], shape: &[usize]) -> Result<()> {
        self.write_array(name, data, shape, DataType::UInt64, FillValue::from(0u64))
    }

    fn write_array<T: Element>(
        &mut self,
        name: &str,
        data: &[T],
        shape: &[usize],
        data_type: DataType,
        fill_value: FillValue,
    ) -> Result<()> {
        let type_size = std::mem::size_of::<T>();
        let array = self.build_array(name, shape, data.len(), data_type, fill_value, type_size)?;
        if !data.is_empty() {
            let subset = full_subset(shape)?;
            array
                .store_array_subset_elements(&subset, data)
                .map_err(|e| GridProcessorError::StorageError(e.to_string()))?;
        }
        self.record(name, data.len() * type_size);
        Ok(())
    }

    /// Write the root group (unless the root is an array) and move the
    /// store into place.
    pub fn finish(mut self) -> Result<SinkReport> {
        if !self.root_array {
            let group = GroupBuilder::new()
                .attributes(self.attributes.clone())
                .build(self.store.clone(), "/")
                .map_err(|e| GridProcessorError::zarr_error(e.to_string()))?;
            group
                .store_metadata()
                .map_err(|e| GridProcessorError::StorageError(e.to_string()))?;
        } else if !self.attributes.is_empty() {
            warn!("Group attributes ignored for a store whose root is an array");
        }

        swap_into_place(&self.staging.path, &self.output)?;
        self.staging.committed = true;

        info!(
            path = %self.output.display(),
            arrays = self.arrays.len(),
            bytes = self.bytes_written,
            "Finished Zarr store"
        );

        Ok(SinkReport {
            path: self.output.clone(),
            arrays: std::mem::take(&mut self.arrays),
            bytes_written: self.bytes_written,
        })
    }

    fn record(&mut self, name: &str, bytes: usize) {
        debug!(array = name, bytes, "Wrote array");
        self.arrays.push(name.to_string());
        self.bytes_written += bytes as u64;
    }

    /// Build and store the metadata for one array.
    fn build_array(
        &mut self,
        name: &str,
        shape: &[usize],
        len: usize,
        data_type: DataType,
        fill_value: FillValue,
        type_size: usize,
    ) -> Result<Array<FilesystemStore>> {
        if shape.is_empty() {
            return Err(GridProcessorError::invalid_shape(format!(
                "array '{}' needs at least one dimension",
                name
            )));
        }
        let expected: usize = shape.iter().product();
        if expected != len {
            return Err(GridProcessorError::invalid_shape(format!(
                "array '{}' of shape {:?} needs {} values, got {}",
                name, shape, expected, len
            )));
        }

        let path = node_path(name);
        if path == "/" {
            if !self.arrays.is_empty() {
                return Err(GridProcessorError::invalid_metadata(
                    "a root array cannot share a store with named arrays",
                ));
            }
            self.root_array = true;
        } else if self.root_array {
            return Err(GridProcessorError::invalid_metadata(
                "a store whose root is an array cannot hold named arrays",
            ));
        }

        let chunk_grid: zarrs::array::ChunkGrid = chunk_shape(shape)
            .try_into()
            .map_err(|e| GridProcessorError::ConfigError(format!("{:?}", e)))?;

        let mut binding = ArrayBuilder::new(
            shape.iter().map(|&d| d as u64).collect::<Vec<_>>(),
            data_type,
            chunk_grid,
            fill_value,
        );
        let mut builder = &mut binding;

        if self.config.compression != ZarrCompression::None {
            let codec = self.create_compression_codec(type_size)?;
            builder = builder.bytes_to_bytes_codecs(vec![codec]);
        }

        let array = builder
            .build(self.store.clone(), &path)
            .map_err(|e| GridProcessorError::StorageError(e.to_string()))?;

        array
            .store_metadata()
            .map_err(|e| GridProcessorError::StorageError(e.to_string()))?;

        Ok(array)
    }

    /// Create the compression codec based on configuration.
    fn create_compression_codec(
        &self,
        type_size: usize,
    ) -> Result<Arc<dyn zarrs::array::codec::BytesToBytesCodecTraits>> {
        let level = BloscCompressionLevel::try_from(self.config.compression_level)
            .map_err(|_| GridProcessorError::ConfigError("Invalid compression level".to_string()))?;

        let shuffle = if self.config.shuffle {
            BloscShuffleMode::Shuffle
        } else {
            BloscShuffleMode::NoShuffle
        };

        // typesize is required when shuffle is enabled
        let typesize = if self.config.shuffle {
            Some(type_size)
        } else {
            None
        };

        let compressor = match self.config.compression {
            ZarrCompression::None => {
                return Err(GridProcessorError::ConfigError(
                    "No compression configured".to_string(),
                ))
            }
            ZarrCompression::Lz4 | ZarrCompression::BloscLz4 => BloscCompressor::LZ4,
            ZarrCompression::Zstd | ZarrCompression::BloscZstd => BloscCompressor::Zstd,
        };

        let codec = BloscCodec::new(compressor, level, None, shuffle, typesize)
            .map_err(|e| GridProcessorError::ConfigError(e.to_string()))?;

        Ok(Arc::new(codec))
    }
}

/// Move `staging` onto `output`.
///
/// A previous store at `output` is first renamed aside and only removed
/// once the new store is in place. If the move fails it is restored.
fn swap_into_place(staging: &Path, output: &Path) -> Result<()> {
    let backup = if output.exists() {
        let mut name = output
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".replaced");
        let backup = output.with_file_name(name);
        remove_path(&backup)?;
        fs::rename(output, &backup)?;
        Some(backup)
    } else {
        None
    };

    if let Err(e) = fs::rename(staging, output) {
        if let Some(backup) = &backup {
            if let Err(restore) = fs::rename(backup, output) {
                warn!(
                    path = %backup.display(),
                    error = %restore,
                    "Failed to restore previous store"
                );
            }
        }
        return Err(e.into());
    }

    if let Some(backup) = backup {
        if let Err(e) = remove_path(&backup) {
            warn!(path = %backup.display(), error = %e, "Failed to remove replaced store");
        }
    }
    Ok(())
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else if path.exists() {
        fs::remove_file(path)
    } else {
        Ok(())
    }
}

/// One frame per chunk for 3-D arrays, a single chunk otherwise.
fn chunk_shape(shape: &[usize]) -> Vec<u64> {
    shape
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            if shape.len() == 3 && i == 0 {
                1
            } else {
                d.max(1) as u64
            }
        })
        .collect()
}

fn full_subset(shape: &[usize]) -> Result<ArraySubset> {
    ArraySubset::new_with_start_shape(
        vec![0; shape.len()],
        shape.iter().map(|&d| d as u64).collect(),
    )
    .map_err(|e| GridProcessorError::StorageError(e.to_string()))
}
