// SPDX-License-Identifier: MPL-2.0

//! User-tunable capture parameters
//!
//! The parameter set is shared between the API surface (property setters,
//! gesture zoom) and the session controller. Writers update it at any time;
//! the controller takes one [`CaptureParameters`] snapshot per request it
//! builds and stamps that snapshot in full, so a preview request and a still
//! request built from the same snapshot never disagree.

use crate::backends::camera::request::{
    CONTROL_AF_MODE_OFF, ENHANCE_CONTROLS, FLASH_MODE_OFF, FLASH_MODE_TORCH,
};
use crate::backends::camera::{CaptureRequest, ControlKey, ControlValue};
use crate::constants::{EffectMode, FaceDetectMode, JPEG_QUALITY, MIN_ZOOM, NoiseReductionMode};
use std::sync::{Arc, Mutex, PoisonError};

/// Current value of every tunable option
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureParameters {
    /// Torch while the camera runs
    pub flash: bool,
    pub effect_mode: EffectMode,
    pub noise_reduction: NoiseReductionMode,
    pub face_detect: FaceDetectMode,
    /// Maximise quality of every processing stage
    pub enhance: bool,
    /// Digital zoom factor, kept within `[1.0, max zoom]` by the controller
    pub zoom: f32,
    /// Manual lens focus distance in diopters; `None` leaves autofocus on
    pub focus_distance: Option<f32>,
}

impl Default for CaptureParameters {
    fn default() -> Self {
        Self {
            flash: false,
            effect_mode: EffectMode::default(),
            noise_reduction: NoiseReductionMode::default(),
            face_detect: FaceDetectMode::default(),
            enhance: false,
            zoom: MIN_ZOOM,
            focus_distance: None,
        }
    }
}

impl CaptureParameters {
    /// Stamp every parameter onto `request`
    ///
    /// Zoom is not stamped here: the crop region depends on sensor geometry
    /// and is stamped by the controller.
    pub fn apply(&self, request: &mut CaptureRequest) {
        for (key, value) in ENHANCE_CONTROLS {
            if self.enhance {
                request.set(key, ControlValue::Int(value));
            } else {
                request.remove(key);
            }
        }

        request.set(ControlKey::JpegQuality, ControlValue::Byte(JPEG_QUALITY));
        let flash_mode = if self.flash {
            FLASH_MODE_TORCH
        } else {
            FLASH_MODE_OFF
        };
        request.set(ControlKey::FlashMode, ControlValue::Int(flash_mode));
        request.set(
            ControlKey::EffectMode,
            ControlValue::Int(self.effect_mode.raw()),
        );
        request.set(
            ControlKey::NoiseReductionMode,
            ControlValue::Int(self.noise_reduction.raw()),
        );
        request.set(
            ControlKey::FaceDetectMode,
            ControlValue::Int(self.face_detect.raw()),
        );

        match self.focus_distance {
            Some(distance) => {
                request.set(ControlKey::AfMode, ControlValue::Int(CONTROL_AF_MODE_OFF));
                request.set(ControlKey::LensFocusDistance, ControlValue::Float(distance));
            }
            None => {
                request.remove(ControlKey::AfMode);
                request.remove(ControlKey::LensFocusDistance);
            }
        }
    }
}

/// Parameter set shared between setters and the controller
#[derive(Debug, Clone, Default)]
pub struct SharedParameters {
    inner: Arc<Mutex<CaptureParameters>>,
}

impl SharedParameters {
    pub fn new(parameters: CaptureParameters) -> Self {
        Self {
            inner: Arc::new(Mutex::new(parameters)),
        }
    }

    /// Copy of all values, taken under a single lock
    pub fn snapshot(&self) -> CaptureParameters {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut CaptureParameters),
    {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }
}
