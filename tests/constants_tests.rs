// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use procamera::constants::{
    CAMERA_TYPE_FRONT, CAMERA_TYPE_REAR, EffectMode, FaceDetectMode, NoiseReductionMode,
};

#[test]
fn test_camera_types() {
    assert_eq!(CAMERA_TYPE_FRONT, 0);
    assert_eq!(CAMERA_TYPE_REAR, 1);
}

#[test]
fn test_mode_tables_are_complete() {
    assert_eq!(EffectMode::ALL.len(), 9);
    assert_eq!(NoiseReductionMode::ALL.len(), 5);
    assert_eq!(FaceDetectMode::ALL.len(), 3);
}

#[test]
fn test_raw_values_are_dense() {
    // Device values are the table positions
    for (index, mode) in EffectMode::ALL.iter().enumerate() {
        assert_eq!(mode.raw(), index as i32);
    }
    for (index, mode) in NoiseReductionMode::ALL.iter().enumerate() {
        assert_eq!(mode.raw(), index as i32);
    }
    for (index, mode) in FaceDetectMode::ALL.iter().enumerate() {
        assert_eq!(mode.raw(), index as i32);
    }
}

#[test]
fn test_display_names() {
    for mode in EffectMode::ALL {
        assert!(!mode.display_name().is_empty(), "{:?} has empty display name", mode);
    }
    assert_eq!(EffectMode::Off.display_name(), "Default");
    assert_eq!(FaceDetectMode::Full.display_name(), "High");
}
