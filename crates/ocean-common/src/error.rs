//! Error types for the ocean mask pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using OceanError.
pub type OceanResult<T> = Result<T, OceanError>;

/// Primary error type shared by every pipeline crate.
#[derive(Debug, Error)]
pub enum OceanError {
    // === Data shape errors ===
    #[error("Shape error: {0}")]
    Shape(String),

    #[error("Variable '{name}' not found. Available: {available:?}")]
    MissingVariable { name: String, available: Vec<String> },

    #[error("No ocean data: all {land_cells} grid cells are land")]
    NoOceanData { land_cells: usize },

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    // === Source/sink errors ===
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O failure: {0}")]
    IoFailure(String),

    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),
}

impl OceanError {
    /// Create a Shape error.
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    /// Create an InvalidRange error.
    pub fn invalid_range(msg: impl Into<String>) -> Self {
        Self::InvalidRange(msg.into())
    }

    /// Create an IoFailure error.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::IoFailure(msg.into())
    }

    /// Create a MissingVariable error, listing what the source does offer.
    pub fn missing_variable(name: impl Into<String>, available: Vec<String>) -> Self {
        Self::MissingVariable {
            name: name.into(),
            available,
        }
    }

    /// Get the reported error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OceanError::Shape(_) => ErrorKind::Shape,
            OceanError::MissingVariable { .. } => ErrorKind::MissingVariable,
            OceanError::NoOceanData { .. } => ErrorKind::NoOceanData,
            OceanError::InvalidRange(_) => ErrorKind::InvalidRange,
            OceanError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            OceanError::IoFailure(_) => ErrorKind::IoFailure,
            OceanError::DependencyUnavailable(_) => ErrorKind::DependencyUnavailable,
        }
    }
}

impl From<std::io::Error> for OceanError {
    fn from(err: std::io::Error) -> Self {
        OceanError::IoFailure(err.to_string())
    }
}

impl From<serde_json::Error> for OceanError {
    fn from(err: serde_json::Error) -> Self {
        OceanError::IoFailure(format!("JSON error: {}", err))
    }
}

/// Stable, serializable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "ShapeError")]
    Shape,
    #[serde(rename = "MissingVariableError")]
    MissingVariable,
    #[serde(rename = "NoOceanDataError")]
    NoOceanData,
    #[serde(rename = "InvalidRangeError")]
    InvalidRange,
    #[serde(rename = "UnsupportedFormatError")]
    UnsupportedFormat,
    #[serde(rename = "IOFailure")]
    IoFailure,
    #[serde(rename = "DependencyUnavailable")]
    DependencyUnavailable,
}

impl ErrorKind {
    /// Name used in serialized reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Shape => "ShapeError",
            ErrorKind::MissingVariable => "MissingVariableError",
            ErrorKind::NoOceanData => "NoOceanDataError",
            ErrorKind::InvalidRange => "InvalidRangeError",
            ErrorKind::UnsupportedFormat => "UnsupportedFormatError",
            ErrorKind::IoFailure => "IOFailure",
            ErrorKind::DependencyUnavailable => "DependencyUnavailable",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error payload returned from a pipeline entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    /// Debug rendering plus the error source chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorReport {
    /// Build a report from an error, capturing its source chain as detail.
    pub fn from_error(err: &OceanError) -> Self {
        let mut detail = format!("{:?}", err);
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            detail.push_str("\ncaused by: ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }

        Self {
            kind: err.kind(),
            message: err.to_string(),
            detail: Some(detail),
        }
    }
}

/// Single structured outcome of a pipeline entry point.
///
/// Serializes as `{"status": "success", ...payload}` or
/// `{"status": "error", "kind": ..., "message": ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Success(T),
    Error(ErrorReport),
}

impl<T> Outcome<T> {
    /// Whether this outcome carries a success payload.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Borrow the success payload, if any.
    pub fn success(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    /// Borrow the error report, if any.
    pub fn error(&self) -> Option<&ErrorReport> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Error(report) => Some(report),
        }
    }
}

impl<T> From<OceanResult<T>> for Outcome<T> {
    fn from(result: OceanResult<T>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(err) => Outcome::Error(ErrorReport::from_error(&err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(OceanError::shape("x").kind(), ErrorKind::Shape);
        assert_eq!(
            OceanError::NoOceanData { land_cells: 4 }.kind(),
            ErrorKind::NoOceanData
        );
        assert_eq!(
            OceanError::missing_variable("sst", vec![]).kind(),
            ErrorKind::MissingVariable
        );
    }

    #[test]
    fn test_missing_variable_lists_available() {
        let err = OceanError::missing_variable("sst", vec!["analysed_sst".into(), "mask".into()]);
        let msg = err.to_string();
        assert!(msg.contains("'sst'"));
        assert!(msg.contains("analysed_sst"));
        assert!(msg.contains("mask"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: OceanError = io.into();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
    }

    #[test]
    fn test_error_kind_serialized_names() {
        let json = serde_json::to_string(&ErrorKind::IoFailure).unwrap();
        assert_eq!(json, "\"IOFailure\"");
        let json = serde_json::to_string(&ErrorKind::InvalidRange).unwrap();
        assert_eq!(json, "\"InvalidRangeError\"");
    }

    #[derive(Debug, Serialize)]
    struct Payload {
        n_frames: usize,
    }

    #[test]
    fn test_outcome_serialization() {
        let ok: Outcome<Payload> = Ok(Payload { n_frames: 3 }).into();
        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["n_frames"], 3);

        let failed: Outcome<Payload> = Err(OceanError::invalid_range("low > high")).into();
        assert!(!failed.is_success());
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["kind"], "InvalidRangeError");
        assert!(value["message"].as_str().unwrap().contains("low > high"));
        assert!(value["detail"].is_string());
    }
}
