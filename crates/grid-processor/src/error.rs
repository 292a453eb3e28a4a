//! Error types for grid processing.

use ocean_common::OceanError;
use thiserror::Error;

/// Errors that can occur while writing or reading Zarr stores.
#[derive(Error, Debug)]
pub enum GridProcessorError {
    /// Failed to open a store or array.
    #[error("failed to open store: {0}")]
    OpenFailed(String),

    /// Failed to read data from an array.
    #[error("failed to read array data: {0}")]
    ReadFailed(String),

    /// Data length or dimensionality does not match the declared shape.
    #[error("invalid array shape: {0}")]
    InvalidShape(String),

    /// Invalid metadata in the store.
    #[error("invalid store metadata: {0}")]
    InvalidMetadata(String),

    /// Zarr format error.
    #[error("Zarr format error: {0}")]
    ZarrError(String),

    /// Storage/IO error.
    #[error("storage error: {0}")]
    StorageError(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl GridProcessorError {
    /// Create an OpenFailed error.
    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// Create an InvalidShape error.
    pub fn invalid_shape(msg: impl Into<String>) -> Self {
        Self::InvalidShape(msg.into())
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    /// Create a ZarrError.
    pub fn zarr_error(msg: impl Into<String>) -> Self {
        Self::ZarrError(msg.into())
    }

    /// Create a StorageError.
    pub fn storage_error(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }
}

impl From<std::io::Error> for GridProcessorError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for GridProcessorError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidMetadata(err.to_string())
    }
}

impl From<GridProcessorError> for OceanError {
    fn from(err: GridProcessorError) -> Self {
        match err {
            GridProcessorError::InvalidShape(msg) => OceanError::Shape(msg),
            other => OceanError::IoFailure(other.to_string()),
        }
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;
