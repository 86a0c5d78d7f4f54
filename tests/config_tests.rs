// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use procamera::Config;
use procamera::backends::camera::event_channel;
use procamera::backends::virtual_camera::{VirtualCameraProvider, VirtualSurface};
use procamera::constants::{CAMERA_TYPE_FRONT, EffectMode, NoiseReductionMode};
use procamera::session::{LogNotifier, SessionController};
use procamera::storage::FsImageWriter;
use std::sync::Arc;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.camera_index, CAMERA_TYPE_FRONT);
    assert!(config.pinch_to_zoom, "Pinch to zoom should be enabled by default");
    assert!(config.visible);
    assert!(!config.flash);
    assert!(config.output_path.is_none());
}

#[test]
fn test_config_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let config = Config {
        camera_index: 1,
        enhance: true,
        effect_mode: EffectMode::Negative,
        noise_reduction: NoiseReductionMode::HighQuality,
        photo_dir: Some(dir.path().to_path_buf()),
        ..Config::default()
    };
    config.save_to(&path).unwrap();

    assert_eq!(Config::load_from(&path), config);
}

#[test]
fn test_invalid_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert_eq!(Config::load_from(&path), Config::default());
}

#[test]
fn test_config_applies_to_controller() {
    let dir = tempfile::tempdir().unwrap();
    let (sender, _events) = event_channel();
    let mut controller = SessionController::new(
        Arc::new(VirtualCameraProvider::new()),
        Arc::new(VirtualSurface::new()),
        Arc::new(LogNotifier),
        Arc::new(FsImageWriter),
        sender,
    );

    let config = Config {
        pinch_to_zoom: false,
        flash: true,
        effect_mode: EffectMode::Sepia,
        visible: false,
        output_path: Some(dir.path().join("fixed.jpg")),
        photo_dir: Some(dir.path().to_path_buf()),
        ..Config::default()
    };
    config.apply_to(&mut controller);

    assert!(!controller.pinch_to_zoom());
    assert!(controller.flash());
    assert_eq!(controller.effect_mode(), EffectMode::Sepia);
    assert!(!controller.visible());
    assert_eq!(controller.output_path(), Some(dir.path().join("fixed.jpg").as_path()));
    assert_eq!(controller.photo_dir(), dir.path());
}
