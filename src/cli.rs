// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking photos and preview snapshots
//! - Inspecting and resetting the stored configuration

use futures::StreamExt;
use futures::channel::mpsc::UnboundedReceiver;
use procamera::backends::camera::event_channel;
use procamera::backends::virtual_camera::{VirtualCameraProvider, VirtualSurface};
use procamera::constants::EffectMode;
use procamera::session::{CameraEvent, CameraHandle, ChannelNotifier, SessionController};
use procamera::storage::{self, FsImageWriter};
use procamera::Config;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// How long to wait for the camera to report back
const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Options for `procamera photo`
pub struct CaptureOptions {
    pub camera: usize,
    pub output: Option<PathBuf>,
    pub zoom: Option<f32>,
    pub flash: bool,
    pub enhance: bool,
    pub effect: Option<EffectMode>,
}

/// Parse an effect by name, case-insensitively
pub fn parse_effect(value: &str) -> Result<EffectMode, String> {
    EffectMode::ALL
        .into_iter()
        .find(|mode| format!("{:?}", mode).eq_ignore_ascii_case(value))
        .ok_or_else(|| {
            let names: Vec<String> = EffectMode::ALL
                .iter()
                .map(|mode| format!("{:?}", mode).to_lowercase())
                .collect();
            format!("unknown effect '{}' (expected one of: {})", value, names.join(", "))
        })
}

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let provider = VirtualCameraProvider::new();
    let cameras = provider.cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        let c = &camera.characteristics;
        println!("  [{}] {} ({})", index, camera.name, camera.id);
        println!("      Sensor: {}", c.active_array);
        match c.max_digital_zoom {
            Some(zoom) => println!("      Max zoom: {:.1}x", zoom),
            None => println!("      Max zoom: none"),
        }
        let stills: Vec<String> = c.still_sizes.iter().map(ToString::to_string).collect();
        println!("      Still sizes: {}", stills.join(", "));
        println!();
    }

    Ok(())
}

/// Take a photo using the specified camera
pub fn take_photo(config: &Config, options: CaptureOptions) -> Result<(), Box<dyn std::error::Error>> {
    let destination = resolve_destination(config, options.output.as_deref());
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let mut session = Session::start(config, &destination, |controller| {
            if options.flash {
                controller.set_flash(true);
            }
            if options.enhance {
                controller.set_enhance(true);
            }
            if let Some(effect) = options.effect {
                controller.set_effect_mode(effect);
            }
        });
        session.handle.initialize(options.camera);
        session.wait_for(CameraEvent::Initialized).await?;
        println!("Using camera: {}", options.camera);

        if let Some(zoom) = options.zoom {
            session.handle.set_zoom(zoom);
            if let Some(status) = session.handle.status().await {
                println!("Zoom: {:.2}x (max {:.1}x)", status.zoom, status.max_zoom);
            }
        }

        println!("Capturing...");
        session.handle.take_picture();
        let saved = session.wait_for(CameraEvent::SavedPhoto).await;
        session.handle.shutdown().await;
        saved
    })?;

    println!("Photo saved: {}", destination.display());
    Ok(())
}

/// Save the current preview of the specified camera
pub fn take_snapshot(
    config: &Config,
    camera: usize,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let destination = resolve_destination(config, output.as_deref());
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let mut session = Session::start(config, &destination, |_| {});
        session.handle.initialize(camera);
        session.wait_for(CameraEvent::Initialized).await?;

        session.handle.take_preview_snapshot();
        let saved = session.wait_for(CameraEvent::SavedPhoto).await;
        session.handle.shutdown().await;
        saved
    })?;

    println!("Snapshot saved: {}", destination.display());
    Ok(())
}

/// Print the stored configuration
pub fn show_config(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = Config::default_path() {
        println!("# {}", path.display());
    }
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

/// Overwrite the stored configuration with defaults
pub fn reset_config() -> Result<(), Box<dyn std::error::Error>> {
    let path = Config::default().save()?;
    println!("Configuration reset: {}", path.display());
    Ok(())
}

/// Store the camera opened when none is given on the command line
pub fn set_default_camera(mut config: Config, index: usize) -> Result<(), Box<dyn std::error::Error>> {
    let count = VirtualCameraProvider::new().cameras().len();
    if index >= count {
        return Err(format!(
            "Camera index {} out of range (0-{})",
            index,
            count.saturating_sub(1)
        )
        .into());
    }
    config.camera_index = index;
    let path = config.save()?;
    println!("Default camera set to {} in {}", index, path.display());
    Ok(())
}

/// File the next photo is written to
///
/// An explicit file wins; a directory or no argument gets a timestamped name.
fn resolve_destination(config: &Config, output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) if !path.is_dir() => path.to_path_buf(),
        Some(dir) => storage::timestamped_photo_path(dir),
        None => match (&config.output_path, &config.photo_dir) {
            (Some(path), _) => path.clone(),
            (None, Some(dir)) => storage::timestamped_photo_path(dir),
            (None, None) => storage::timestamped_photo_path(&storage::default_photo_dir()),
        },
    }
}

/// Camera task plus the notifications it raises
struct Session {
    handle: CameraHandle,
    notifications: UnboundedReceiver<CameraEvent>,
}

impl Session {
    fn start<F>(config: &Config, destination: &Path, customize: F) -> Self
    where
        F: FnOnce(&mut SessionController),
    {
        let (sender, events) = event_channel();
        let (notifier, notifications) = ChannelNotifier::new();
        let mut controller = SessionController::new(
            Arc::new(VirtualCameraProvider::new()),
            Arc::new(VirtualSurface::new()),
            Arc::new(notifier),
            Arc::new(FsImageWriter),
            sender,
        );
        config.apply_to(&mut controller);
        controller.set_output_path(Some(destination.to_path_buf()));
        customize(&mut controller);

        Self {
            handle: CameraHandle::spawn(controller, events),
            notifications,
        }
    }

    async fn wait_for(&mut self, wanted: CameraEvent) -> Result<(), String> {
        let notifications = &mut self.notifications;
        let waited = tokio::time::timeout(EVENT_TIMEOUT, async {
            while let Some(event) = notifications.next().await {
                if event == wanted {
                    return Ok(());
                }
                if event == CameraEvent::InitializeFailed {
                    return Err("Camera failed to start the preview".to_string());
                }
            }
            Err("Camera task stopped".to_string())
        })
        .await;

        match waited {
            Ok(result) => result,
            Err(_) => Err(format!("Timed out waiting for {}", wanted)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_effect_names() {
        assert_eq!(parse_effect("sepia"), Ok(EffectMode::Sepia));
        assert_eq!(parse_effect("MONO"), Ok(EffectMode::Mono));
        assert!(parse_effect("vintage").is_err());
    }

    #[test]
    fn test_explicit_file_destination_wins() {
        let config = Config::default();
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("shot.jpg");
        assert_eq!(resolve_destination(&config, Some(&file)), file);

        let generated = resolve_destination(&config, Some(dir.path()));
        assert_eq!(generated.parent(), Some(dir.path()));
    }
}
