//! Integration tests: write a small NetCDF file and read it back through
//! the ArraySource interface.

#![cfg(feature = "native")]

use std::path::Path;

use netcdf_parser::{open_source, ArraySource, NetCdfSource};
use ocean_common::{ErrorKind, GridShape, OceanError};

const FILL: f32 = -999.0;

/// Write a (time=3, lat=2, lon=4) SST file with one filled cell per frame.
fn write_sst_file(path: &Path) -> Result<(), netcdf::Error> {
    let mut file = netcdf::create(path)?;
    file.add_dimension("time", 3)?;
    file.add_dimension("lat", 2)?;
    file.add_dimension("lon", 4)?;
    file.add_attribute("title", "synthetic sst")?;

    let mut time = file.add_variable::<f64>("time", &["time"])?;
    time.put_attribute("units", "days since 2020-01-01")?;
    time.put_values(&[0.0, 1.0, 2.0], ..)?;

    let mut lat = file.add_variable::<f64>("lat", &["lat"])?;
    lat.put_values(&[10.0, 10.5], ..)?;

    let mut lon = file.add_variable::<f64>("lon", &["lon"])?;
    lon.put_values(&[120.0, 120.5, 121.0, 121.5], ..)?;

    let mut values = Vec::with_capacity(24);
    for t in 0..3 {
        for cell in 0..8 {
            if cell == t {
                values.push(FILL);
            } else {
                values.push(290.0 + cell as f32);
            }
        }
    }
    let mut sst = file.add_variable::<f32>("sst", &["time", "lat", "lon"])?;
    sst.put_attribute("_FillValue", FILL)?;
    sst.put_values(&values, ..)?;

    let mut flat = file.add_variable::<f32>("depth", &["lat", "lon"])?;
    flat.put_values(&[0.0f32; 8], ..)?;

    Ok(())
}

#[test]
fn test_read_variable_decodes_fill_values() {
    let dir = test_utils::temp_test_dir_with_prefix("netcdf_test_");
    let path = dir.path().join("sst.nc");
    write_sst_file(&path).expect("Failed to write NetCDF");

    let source = NetCdfSource::open(&path).expect("Failed to open NetCDF");
    let stack = source.read_variable("sst").expect("Failed to read sst");

    assert_eq!(stack.frames(), 3);
    assert_eq!(stack.shape(), GridShape::new(2, 4));
    for t in 0..3 {
        let frame = stack.frame(t);
        assert!(frame[t].is_nan(), "cell {} of frame {} should be NaN", t, t);
        assert_eq!(frame.iter().filter(|v| v.is_nan()).count(), 1);
    }
    assert_eq!(stack.frame(0)[7], 297.0);
}

#[test]
fn test_read_axes_with_time() {
    let dir = test_utils::temp_test_dir_with_prefix("netcdf_test_");
    let path = dir.path().join("sst.nc");
    write_sst_file(&path).expect("Failed to write NetCDF");

    let source = open_source(&path).expect("Failed to open source");
    let axes = source.read_axes().expect("Failed to read axes");

    assert_eq!(axes.latitude, vec![10.0, 10.5]);
    assert_eq!(axes.longitude.len(), 4);
    assert_eq!(axes.time, Some(vec![0.0, 1.0, 2.0]));
    assert_eq!(axes.time_units.as_deref(), Some("days since 2020-01-01"));
}

#[test]
fn test_metadata_separates_coordinates() {
    let dir = test_utils::temp_test_dir_with_prefix("netcdf_test_");
    let path = dir.path().join("sst.nc");
    write_sst_file(&path).expect("Failed to write NetCDF");

    let source = NetCdfSource::open(&path).expect("Failed to open NetCDF");
    let meta = source.metadata().expect("Failed to read metadata");

    assert!(meta.variables.contains(&"sst".to_string()));
    assert!(meta.coordinates.contains(&"lat".to_string()));
    assert!(!meta.variables.contains(&"time".to_string()));
    assert_eq!(meta.dimensions["lon"], 4);
    assert_eq!(meta.shapes["sst"], vec![3, 2, 4]);
    assert_eq!(meta.attributes["title"], "synthetic sst");
}

#[test]
fn test_missing_variable_lists_available() {
    let dir = test_utils::temp_test_dir_with_prefix("netcdf_test_");
    let path = dir.path().join("sst.nc");
    write_sst_file(&path).expect("Failed to write NetCDF");

    let source = NetCdfSource::open(&path).expect("Failed to open NetCDF");
    match source.read_variable("analysed_sst") {
        Err(OceanError::MissingVariable { name, available }) => {
            assert_eq!(name, "analysed_sst");
            assert!(available.contains(&"sst".to_string()));
            assert!(available.contains(&"depth".to_string()));
        }
        other => panic!("expected MissingVariable, got {:?}", other.map(|s| s.dims())),
    }
}

#[test]
fn test_rank_two_variable_is_shape_error() {
    let dir = test_utils::temp_test_dir_with_prefix("netcdf_test_");
    let path = dir.path().join("sst.nc");
    write_sst_file(&path).expect("Failed to write NetCDF");

    let source = NetCdfSource::open(&path).expect("Failed to open NetCDF");
    let err = source.read_variable("depth").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Shape);
}

#[test]
fn test_open_missing_file_is_io_failure() {
    let dir = test_utils::temp_test_dir_with_prefix("netcdf_test_");
    let err = open_source(dir.path().join("absent.nc")).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::IoFailure);
}

#[test]
fn test_real_sample_if_present() {
    let path = test_utils::require_test_file!("sst_sample.nc");
    let source = open_source(&path).expect("Failed to open sample");
    let meta = source.metadata().expect("Failed to read metadata");
    assert!(!meta.variables.is_empty());
}
