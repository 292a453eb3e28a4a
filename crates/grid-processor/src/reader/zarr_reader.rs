//! Zarr V3 directory store reader.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use zarrs::array::{Array, ElementOwned};
use zarrs::array_subset::ArraySubset;
use zarrs::group::Group;
use zarrs_filesystem::FilesystemStore;

use crate::error::{GridProcessorError, Result};
use crate::writer::node_path;

/// An array read back from a store, with its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayData<T> {
    pub data: Vec<T>,
    pub shape: Vec<usize>,
}

/// Reader for a Zarr V3 directory store.
pub struct ZarrStoreReader {
    path: PathBuf,
    store: Arc<FilesystemStore>,
}

impl ZarrStoreReader {
    /// Open an existing store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.join("zarr.json").is_file() {
            return Err(GridProcessorError::open_failed(format!(
                "{} is not a Zarr V3 store",
                path.display()
            )));
        }

        let store = FilesystemStore::new(path)
            .map_err(|e| GridProcessorError::open_failed(e.to_string()))?;

        debug!(path = %path.display(), "Opened Zarr store");

        Ok(Self {
            path: path.to_path_buf(),
            store: Arc::new(store),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the store root is a single array rather than a group.
    pub fn root_is_array(&self) -> bool {
        Array::open(self.store.clone(), "/").is_ok()
    }

    /// True when the store holds an array called `name`.
    pub fn has_array(&self, name: &str) -> bool {
        let name = name.trim_matches('/');
        self.path.join(name).join("zarr.json").is_file()
            && Array::open(self.store.clone(), &node_path(name)).is_ok()
    }

    /// Attributes of the root group.
    pub fn group_attributes(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        let group = Group::open(self.store.clone(), "/")
            .map_err(|e| GridProcessorError::open_failed(e.to_string()))?;
        Ok(group.attributes().clone())
    }

    /// Shape of the array called `name`.
    pub fn shape(&self, name: &str) -> Result<Vec<usize>> {
        let array = self.open_array(name)?;
        Ok(array.shape().iter().map(|&d| d as usize).collect())
    }

    pub fn read_f32(&self, name: &str) -> Result<ArrayData<f32>> {
        self.read_array(name)
    }

    pub fn read_f64(&self, name: &str) -> Result<ArrayData<f64>> {
        self.read_array(name)
    }

    pub fn read_u8(&self, name: &str) -> Result<ArrayData<u8>> {
        self.read_array(name)
    }

    pub fn read_u64(&self, name: &str) -> Result<ArrayData<u64>> {
        self.read_array(name)
    }

    /// Read a whole array; zero-element arrays come back empty.
    fn read_array<T: ElementOwned>(&self, name: &str) -> Result<ArrayData<T>> {
        let array = self.open_array(name)?;
        let (subset, shape) = full_subset(&array)?;
        let data = if subset.num_elements() == 0 {
            Vec::new()
        } else {
            array
                .retrieve_array_subset_elements::<T>(&subset)
                .map_err(|e| GridProcessorError::read_failed(format!("{}: {}", name, e)))?
        };
        Ok(ArrayData { data, shape })
    }

    fn open_array(&self, name: &str) -> Result<Array<FilesystemStore>> {
        Array::open(self.store.clone(), &node_path(name)).map_err(|e| {
            GridProcessorError::open_failed(format!(
                "array '{}' in {}: {}",
                name,
                self.path.display(),
                e
            ))
        })
    }
}

fn full_subset(array: &Array<FilesystemStore>) -> Result<(ArraySubset, Vec<usize>)> {
    let shape: Vec<u64> = array.shape().to_vec();
    let subset = ArraySubset::new_with_start_shape(vec![0; shape.len()], shape.clone())
        .map_err(|e| GridProcessorError::read_failed(e.to_string()))?;
    Ok((subset, shape.into_iter().map(|d| d as usize).collect()))
}
