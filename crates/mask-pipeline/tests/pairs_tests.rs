//! Training pair construction, persistence and failure handling.

use std::path::Path;

use grid_processor::{staging_path, SinkConfig, ZarrStoreReader};
use mask_pipeline::{
    build_training_pairs, compute_statistics, save_masks, MaskInput, OcclusionBank,
    OcclusionSampler, PairRequest, SamplerConfig, TrainingPairBuilder,
};
use netcdf_parser::MemorySource;
use ocean_common::{CoordRange, ErrorKind, FrameStack, GridShape, MaskGrid, MaskStack};
use test_utils::{
    assert_approx_eq, create_daily_time, create_regular_axes, create_sst_stack, grid,
    init_test_tracing, occlude_first_valid, temp_test_dir_with_prefix, time, variables,
};

/// Masks for a `shape` grid where mask `i` occludes cells `i` and `i + 1`.
fn diagonal_masks(count: usize, shape: GridShape) -> MaskStack {
    let mut stack = MaskStack::empty(shape);
    for i in 0..count {
        let mut mask = MaskGrid::filled(shape, false);
        mask.cells_mut()[i] = true;
        mask.cells_mut()[i + 1] = true;
        stack.push(&mask).unwrap();
    }
    stack
}

/// Bank of `count` masks harvested from a 2x5 observed stack.
fn observed_bank(count: usize) -> OcclusionBank {
    let frames = count * 2;
    let mut observed = create_sst_stack(frames + 1, GridShape::new(2, 5));
    for t in 0..frames {
        occlude_first_valid(&mut observed, t, 3);
    }

    let config = SamplerConfig {
        mask_count: count,
        ..SamplerConfig::default()
    };
    OcclusionSampler::new(config).sample(&observed).unwrap()
}

fn truth_source(frames: usize, shape: GridShape) -> MemorySource {
    let axes = create_regular_axes(shape, 20.0, 110.0, 0.25).with_time(
        create_daily_time(frames, time::DAY_2020_01_01),
        Some(time::DAILY_UNITS.to_string()),
    );
    MemorySource::new()
        .with_variable(variables::ANALYSED_SST, create_sst_stack(frames, shape))
        .with_axes(axes)
}

/// Bit patterns of every cell, so NaN cells compare equal by position.
fn bits(stack: &FrameStack) -> Vec<u32> {
    stack.data().iter().map(|v| v.to_bits()).collect()
}

fn stored_frames(path: &Path) -> u64 {
    let reader = ZarrStoreReader::open(path).unwrap();
    reader.group_attributes().unwrap()["n_frames"]
        .as_u64()
        .unwrap()
}

// ============================================================================
// Pairing
// ============================================================================

#[test]
fn test_input_is_truth_with_masked_cells_removed() {
    init_test_tracing();
    let shape = GridShape::new(4, 6);
    let truth = create_sst_stack(5, shape);
    let axes = create_regular_axes(shape, 0.0, 0.0, 1.0);
    let masks: MaskInput = diagonal_masks(3, shape).into();

    let pairs = TrainingPairBuilder::default()
        .build(variables::SST, &truth, &axes, &masks)
        .unwrap();

    assert_eq!(pairs.n_frames(), 3);
    assert_eq!(pairs.ground_truth, truth.truncated(3));
    for i in 0..3 {
        let mask = pairs.masks.mask(i);
        for (cell, (&input, &expected)) in pairs
            .input
            .frame(i)
            .iter()
            .zip(truth.frame(i))
            .enumerate()
        {
            if mask[cell] {
                assert!(input.is_nan(), "pair {} cell {} should be occluded", i, cell);
            } else {
                assert_eq!(input, expected);
            }
        }
    }
    assert!(pairs.land_mask.is_none());
    assert_approx_eq!(pairs.input_nan_ratio(), 6.0 / 72.0, 1e-12);
}

#[test]
fn test_hundred_frames_twenty_masks() {
    let shape = GridShape::new(2, 5);
    let truth = create_sst_stack(100, shape);
    let axes = create_regular_axes(shape, 0.0, 0.0, 1.0)
        .with_time(create_daily_time(100, 0.0), None);
    let bank = observed_bank(20);
    assert_eq!(bank.len(), 20);

    let pairs = TrainingPairBuilder::default()
        .build(variables::SST, &truth, &axes, &bank.clone().into())
        .unwrap();

    assert_eq!(pairs.n_frames(), 20);
    assert_eq!(pairs.ground_truth, truth.truncated(20));
    assert_eq!(pairs.masks, *bank.masks());
    assert_eq!(pairs.land_mask.as_ref(), Some(bank.land_mask()));
    assert_eq!(pairs.axes.time, Some(create_daily_time(20, 0.0)));
}

#[test]
fn test_fewer_truth_frames_than_masks() {
    let shape = GridShape::new(2, 5);
    let truth = create_sst_stack(4, shape);
    let axes = create_regular_axes(shape, 0.0, 0.0, 1.0);
    let masks: MaskInput = diagonal_masks(7, shape).into();

    let pairs = TrainingPairBuilder::default()
        .build(variables::SST, &truth, &axes, &masks)
        .unwrap();
    assert_eq!(pairs.n_frames(), 4);
    assert_eq!(pairs.masks.len(), 4);
}

#[test]
fn test_crop_then_pair() {
    let spec = grid::COASTAL_8X10;
    let truth = create_sst_stack(3, spec.shape());
    let request = PairRequest {
        latitude_range: Some(CoordRange::new(20.5, 21.0).unwrap()),
        longitude_range: Some(CoordRange::new(110.0, 110.75).unwrap()),
        target_grid: None,
    };
    // Rows at 20.5, 20.75, 21.0 and columns at 110.0 .. 110.75.
    let masks: MaskInput = diagonal_masks(3, GridShape::new(3, 4)).into();

    let pairs = TrainingPairBuilder::new(request)
        .build(variables::SST, &truth, &spec.axes(), &masks)
        .unwrap();

    assert_eq!(pairs.grid_shape(), GridShape::new(3, 4));
    assert_eq!(pairs.axes.latitude.len(), 3);
    assert_eq!(pairs.ground_truth.frame(0)[0], truth.frame(0)[2 * spec.width]);
}

#[test]
fn test_regrid_sets_output_shape() {
    let spec = grid::COASTAL_8X10;
    let truth = create_sst_stack(2, spec.shape());
    let target = GridShape::new(4, 5);
    let request = PairRequest {
        target_grid: Some(target),
        ..PairRequest::default()
    };
    let masks: MaskInput = diagonal_masks(2, target).into();

    let pairs = TrainingPairBuilder::new(request)
        .build(variables::SST, &truth, &spec.axes(), &masks)
        .unwrap();

    assert_eq!(pairs.grid_shape(), target);
    assert_eq!(pairs.ground_truth.dims(), [2, 4, 5]);
    assert_eq!(pairs.axes.latitude.len(), 4);
    assert_eq!(pairs.axes.longitude.len(), 5);
    assert_approx_eq!(pairs.axes.latitude[0], spec.min_lat, 1e-9);
    assert_approx_eq!(pairs.axes.longitude[4], spec.max_lon, 1e-9);
    // Corners survive order-1 resampling.
    assert_approx_eq!(pairs.ground_truth.frame(0)[0], truth.frame(0)[0], 1e-4);
}

#[test]
fn test_mask_shape_mismatch_is_shape_error() {
    let shape = GridShape::new(4, 6);
    let truth = create_sst_stack(2, shape);
    let axes = create_regular_axes(shape, 0.0, 0.0, 1.0);
    let masks: MaskInput = diagonal_masks(2, GridShape::new(3, 3)).into();

    let err = TrainingPairBuilder::default()
        .build(variables::SST, &truth, &axes, &masks)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Shape);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_persisted_bank_pairs_match_in_memory() {
    let dir = temp_test_dir_with_prefix("pairs_test_");
    let bank_path = dir.path().join("bank.zarr");
    let bank = observed_bank(5);
    bank.save(&bank_path, &SinkConfig::default()).unwrap();

    let loaded = OcclusionBank::load(&bank_path).unwrap();
    assert_eq!(loaded, bank);
    assert_eq!(loaded.statistics(), bank.statistics());
    assert_eq!(loaded.statistics().missing_ratios.len(), 5);

    let shape = bank.shape();
    let truth = create_sst_stack(8, shape);
    let axes = create_regular_axes(shape, 0.0, 0.0, 1.0);
    let builder = TrainingPairBuilder::default();

    let from_memory = builder
        .build(variables::SST, &truth, &axes, &bank.into())
        .unwrap();
    let from_disk = builder
        .build(variables::SST, &truth, &axes, &MaskInput::load(&bank_path).unwrap())
        .unwrap();

    assert_eq!(from_memory.ground_truth, from_disk.ground_truth);
    assert_eq!(from_memory.masks, from_disk.masks);
    assert_eq!(from_memory.land_mask, from_disk.land_mask);
    assert_eq!(from_memory.axes, from_disk.axes);
    assert_eq!(bits(&from_memory.input), bits(&from_disk.input));
    assert_eq!(from_memory.input.nan_count(), 15);
}

#[test]
fn test_bare_masks_load_without_land() {
    let dir = temp_test_dir_with_prefix("pairs_test_");
    let path = dir.path().join("masks.zarr");
    let masks = diagonal_masks(3, GridShape::new(2, 5));
    save_masks(&masks, &path, &SinkConfig::default()).unwrap();

    let input = MaskInput::load(&path).unwrap();
    assert_eq!(input, MaskInput::Masks(masks));
    assert!(input.land_mask().is_none());
}

#[test]
fn test_build_writes_pair_store() {
    let dir = temp_test_dir_with_prefix("pairs_test_");
    let output = dir.path().join("pairs.zarr");
    let shape = GridShape::new(2, 5);
    let source = truth_source(6, shape);
    let masks: MaskInput = observed_bank(4).into();

    let summary = build_training_pairs(
        &source,
        variables::ANALYSED_SST,
        &masks,
        &PairRequest::default(),
        &output,
        &SinkConfig::default(),
    )
    .unwrap();

    assert_eq!(summary.n_frames, 4);
    assert_eq!(summary.grid_shape, shape);
    assert_eq!(summary.output_path, output);
    assert_approx_eq!(summary.input_nan_ratio, 0.3, 1e-12);

    let reader = ZarrStoreReader::open(&output).unwrap();
    let attrs = reader.group_attributes().unwrap();
    assert_eq!(attrs["variable_name"], variables::ANALYSED_SST);
    assert_eq!(attrs["time_units"], time::DAILY_UNITS);
    assert!(attrs.contains_key("created_at"));
    assert_eq!(reader.shape("input").unwrap(), vec![4, 2, 5]);
    assert_eq!(reader.shape("effective_cloud_mask").unwrap(), vec![4, 2, 5]);
    assert_eq!(reader.shape("land_mask").unwrap(), vec![2, 5]);
    assert_eq!(reader.read_f64("time").unwrap().data.len(), 4);

    let truth = reader.read_f32("ground_truth").unwrap();
    let expected = create_sst_stack(4, shape);
    assert_eq!(truth.data, expected.data());
}

#[test]
fn test_failed_build_keeps_previous_store() {
    let dir = temp_test_dir_with_prefix("pairs_test_");
    let output = dir.path().join("pairs.zarr");
    let shape = GridShape::new(2, 5);
    let source = truth_source(6, shape);

    build_training_pairs(
        &source,
        variables::ANALYSED_SST,
        &diagonal_masks(2, shape).into(),
        &PairRequest::default(),
        &output,
        &SinkConfig::default(),
    )
    .unwrap();
    assert_eq!(stored_frames(&output), 2);

    let err = build_training_pairs(
        &source,
        variables::ANALYSED_SST,
        &diagonal_masks(3, GridShape::new(3, 3)).into(),
        &PairRequest::default(),
        &output,
        &SinkConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Shape);

    assert_eq!(stored_frames(&output), 2);
    assert!(!staging_path(&output).unwrap().exists());
}

#[test]
fn test_failed_build_creates_nothing() {
    let dir = temp_test_dir_with_prefix("pairs_test_");
    let output = dir.path().join("pairs.zarr");
    let source = truth_source(3, GridShape::new(2, 5));

    let err = build_training_pairs(
        &source,
        variables::SST,
        &diagonal_masks(2, GridShape::new(2, 5)).into(),
        &PairRequest::default(),
        &output,
        &SinkConfig::default(),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingVariable);
    assert!(!output.exists());
    assert!(!staging_path(&output).unwrap().exists());
}

// ============================================================================
// Statistics
// ============================================================================

#[test]
fn test_statistics_ignore_missing_cells() {
    let data = vec![1.0, 2.0, f32::NAN, 4.0, 5.0, f32::NAN];
    let stack = FrameStack::new(data, 2, GridShape::new(1, 3)).unwrap();

    let stats = compute_statistics(&stack);
    assert_eq!(stats.total_count, 6);
    assert_eq!(stats.nan_count, 2);
    assert_approx_eq!(stats.nan_ratio, 2.0 / 6.0, 1e-12);
    assert_approx_eq!(stats.mean.unwrap(), 3.0, 1e-12);
    assert_approx_eq!(stats.std.unwrap(), 2.5f64.sqrt(), 1e-12);
    assert_eq!(stats.min, Some(1.0));
    assert_eq!(stats.max, Some(5.0));
    assert_approx_eq!(stats.median.unwrap(), 3.0, 1e-12);
    assert_eq!(stats.shape, vec![2, 1, 3]);
}

#[test]
fn test_statistics_all_missing() {
    let stack = FrameStack::filled(2, GridShape::new(2, 2), f32::NAN);
    let stats = compute_statistics(&stack);

    assert_eq!(stats.nan_ratio, 1.0);
    assert!(stats.mean.is_none());
    assert!(stats.median.is_none());
}
