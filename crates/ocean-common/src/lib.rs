//! Common types shared across the ocean mask pipeline crates.
//!
//! Frame stacks, boolean mask grids, coordinate axes and the shared
//! error type all live here so that the source, processing and pipeline
//! crates agree on one representation.

pub mod coords;
pub mod error;
pub mod grid;

pub use coords::{CoordRange, CoordinateAxes, RatioRange};
pub use error::{ErrorKind, ErrorReport, OceanError, OceanResult, Outcome};
pub use grid::{FrameStack, GridShape, MaskGrid, MaskStack};
