//! The structured array source abstraction.

use std::collections::BTreeMap;

use serde::Serialize;

use ocean_common::{CoordinateAxes, FrameStack, OceanError, OceanResult};

/// Summary of what a source contains.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceMetadata {
    /// Data variables (anything that is not a coordinate).
    pub variables: Vec<String>,
    /// Coordinate variables (variables named after a dimension).
    pub coordinates: Vec<String>,
    /// Dimension name to length.
    pub dimensions: BTreeMap<String, usize>,
    /// Global attributes rendered as strings.
    pub attributes: BTreeMap<String, String>,
    /// Shape of each data variable.
    pub shapes: BTreeMap<String, Vec<usize>>,
}

/// A readable, self-describing collection of named arrays.
///
/// Implementations own whatever handle they read from and release it on drop.
pub trait ArraySource {
    /// Enumerate variables, coordinates, dimensions and attributes.
    fn metadata(&self) -> OceanResult<SourceMetadata>;

    /// Names of the data variables, used when reporting a missing variable.
    fn variable_names(&self) -> Vec<String>;

    /// Read a (time, lat, lon) variable as a frame stack.
    ///
    /// Fails with `MissingVariable` if absent and `Shape` if not rank 3.
    fn read_variable(&self, name: &str) -> OceanResult<FrameStack>;

    /// Read the latitude/longitude axes and, when present, the time axis.
    fn read_axes(&self) -> OceanResult<CoordinateAxes>;
}

/// An [`ArraySource`] backed by arrays already in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    variables: BTreeMap<String, FrameStack>,
    axes: Option<CoordinateAxes>,
    attributes: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a data variable.
    pub fn with_variable(mut self, name: impl Into<String>, stack: FrameStack) -> Self {
        self.variables.insert(name.into(), stack);
        self
    }

    /// Set the coordinate axes.
    pub fn with_axes(mut self, axes: CoordinateAxes) -> Self {
        self.axes = Some(axes);
        self
    }

    /// Add a global attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl ArraySource for MemorySource {
    fn metadata(&self) -> OceanResult<SourceMetadata> {
        let mut dimensions = BTreeMap::new();
        let mut coordinates = Vec::new();
        if let Some(axes) = &self.axes {
            dimensions.insert("lat".to_string(), axes.latitude.len());
            dimensions.insert("lon".to_string(), axes.longitude.len());
            coordinates.push("lat".to_string());
            coordinates.push("lon".to_string());
            if let Some(time) = &axes.time {
                dimensions.insert("time".to_string(), time.len());
                coordinates.push("time".to_string());
            }
        }

        Ok(SourceMetadata {
            variables: self.variable_names(),
            coordinates,
            dimensions,
            attributes: self.attributes.clone(),
            shapes: self
                .variables
                .iter()
                .map(|(name, stack)| (name.clone(), stack.dims().to_vec()))
                .collect(),
        })
    }

    fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    fn read_variable(&self, name: &str) -> OceanResult<FrameStack> {
        self.variables
            .get(name)
            .cloned()
            .ok_or_else(|| OceanError::missing_variable(name, self.variable_names()))
    }

    fn read_axes(&self) -> OceanResult<CoordinateAxes> {
        self.axes
            .clone()
            .ok_or_else(|| OceanError::missing_variable("lat", self.variable_names()))
    }
}
