// SPDX-License-Identifier: GPL-3.0-only

//! Persistent user configuration
//!
//! Stored as JSON under the user config directory. A missing or unreadable
//! file never stops the camera from starting; defaults are used instead.

use crate::constants::{APP_DIR_NAME, CAMERA_TYPE_FRONT, EffectMode, FaceDetectMode, NoiseReductionMode};
use crate::errors::{AppError, AppResult};
use crate::session::SessionController;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Config file name inside the application config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logical camera to open (0 = front, 1 = rear)
    pub camera_index: usize,
    /// Two-finger pinch changes the zoom
    pub pinch_to_zoom: bool,
    /// Torch during preview and capture
    pub flash: bool,
    /// High quality processing bundle
    pub enhance: bool,
    pub effect_mode: EffectMode,
    pub noise_reduction: NoiseReductionMode,
    pub face_detect: FaceDetectMode,
    /// Preview surface visibility
    pub visible: bool,
    /// Fixed destination for photos; unset writes timestamped files
    pub output_path: Option<PathBuf>,
    /// Directory for timestamped photos; unset uses the pictures directory
    pub photo_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_index: CAMERA_TYPE_FRONT,
            pinch_to_zoom: true,
            flash: false,
            enhance: false,
            effect_mode: EffectMode::default(),
            noise_reduction: NoiseReductionMode::default(),
            face_detect: FaceDetectMode::default(),
            visible: true,
            output_path: None,
            photo_dir: None,
        }
    }
}

impl Config {
    /// `<config dir>/procamera/config.json`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("No config directory available, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `path`, falling back to defaults when it is missing or invalid
    pub fn load_from(path: &Path) -> Self {
        match Self::read(path) {
            Ok(Some(config)) => {
                debug!(path = %path.display(), "Config loaded");
                config
            }
            Ok(None) => {
                debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Invalid config, using defaults");
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> AppResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Write to the default location
    pub fn save(&self) -> AppResult<PathBuf> {
        let path = Self::default_path()
            .ok_or_else(|| AppError::Config("no config directory available".to_string()))?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Push the stored preferences into a controller
    ///
    /// The camera index is not applied here; it is passed to
    /// [`SessionController::initialize`].
    pub fn apply_to(&self, controller: &mut SessionController) {
        controller.set_pinch_to_zoom(self.pinch_to_zoom);
        controller.set_flash(self.flash);
        controller.set_enhance(self.enhance);
        controller.set_effect_mode(self.effect_mode);
        controller.set_noise_reduction(self.noise_reduction);
        controller.set_face_detect(self.face_detect);
        controller.set_visible(self.visible);
        controller.set_output_path(self.output_path.clone());
        if let Some(dir) = &self.photo_dir {
            controller.set_photo_dir(dir.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{ "camera_index": 1, "effect_mode": "Sepia" }"#).unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.camera_index, 1);
        assert_eq!(config.effect_mode, EffectMode::Sepia);
        assert!(config.pinch_to_zoom);
        assert!(config.visible);
    }
}
