//! Common test fixtures for ocean mask pipeline tests.
//!
//! This module provides pre-defined grids, variable names and settings
//! that show up across the test suite.

/// Common grid specifications for testing.
pub mod grid {
    use ocean_common::{CoordinateAxes, GridShape};

    /// Small coastal patch (0.25 degree resolution).
    pub const COASTAL_8X10: GridSpec = GridSpec {
        height: 8,
        width: 10,
        min_lat: 20.0,
        max_lat: 21.75,
        min_lon: 110.0,
        max_lon: 112.25,
    };

    /// Grid specification for testing.
    ///
    /// Bounds are the first and last cell centres.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub height: usize,
        pub width: usize,
        pub min_lat: f64,
        pub max_lat: f64,
        pub min_lon: f64,
        pub max_lon: f64,
    }

    impl GridSpec {
        /// Returns the grid shape.
        pub fn shape(&self) -> GridShape {
            GridShape::new(self.height, self.width)
        }

        /// Returns ascending latitude/longitude axes spanning the bounds.
        pub fn axes(&self) -> CoordinateAxes {
            CoordinateAxes::new(
                linspace(self.min_lat, self.max_lat, self.height),
                linspace(self.min_lon, self.max_lon, self.width),
            )
        }
    }

    fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
        if n <= 1 {
            return vec![start; n];
        }
        let step = (end - start) / (n - 1) as f64;
        (0..n).map(|i| start + step * i as f64).collect()
    }
}

/// Common time values for testing.
pub mod time {
    /// Units of the daily time axis used in tests.
    pub const DAILY_UNITS: &str = "days since 1981-01-01 00:00:00";

    /// First day of 2020 in `DAILY_UNITS`.
    pub const DAY_2020_01_01: f64 = 14245.0;
}

/// Variable names commonly found in SST products.
pub mod variables {
    pub const SST: &str = "sst";
    pub const ANALYSED_SST: &str = "analysed_sst";
}

/// Missing-ratio windows used in sampler tests.
pub mod ratios {
    /// Accept every frame.
    pub const ALL: (f64, f64) = (0.0, 1.0);
}
