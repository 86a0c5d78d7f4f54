// SPDX-License-Identifier: GPL-3.0-only

//! In-flight capture request representation
//!
//! A [`CaptureRequest`] is a plain value: the controller builds and mutates it,
//! and sessions receive it by reference when a repeating or one-shot request is
//! issued. Control values use the raw integers of the device layer so that
//! backends can pass them through unchanged.

use super::types::OutputTarget;
use crate::geometry::Rect;
use std::collections::BTreeMap;

// Raw control values
pub const FLASH_MODE_OFF: i32 = 0;
pub const FLASH_MODE_TORCH: i32 = 2;
pub const CONTROL_MODE_AUTO: i32 = 1;
pub const CONTROL_AF_MODE_OFF: i32 = 0;
pub const CONTROL_AF_TRIGGER_IDLE: i32 = 0;
pub const CONTROL_AF_TRIGGER_START: i32 = 1;
pub const CONTROL_AF_TRIGGER_CANCEL: i32 = 2;
pub const EDGE_MODE_HIGH_QUALITY: i32 = 2;
pub const SHADING_MODE_HIGH_QUALITY: i32 = 2;
pub const TONEMAP_MODE_HIGH_QUALITY: i32 = 2;
pub const COLOR_CORRECTION_ABERRATION_MODE_HIGH_QUALITY: i32 = 2;
pub const COLOR_CORRECTION_MODE_HIGH_QUALITY: i32 = 2;
pub const HOT_PIXEL_MODE_HIGH_QUALITY: i32 = 2;
pub const LENS_OPTICAL_STABILIZATION_MODE_ON: i32 = 1;

/// Request template chosen when the device creates a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestTemplate {
    /// Continuous preview stream
    Preview,
    /// High quality still capture
    StillCapture,
}

impl RequestTemplate {
    pub fn raw(&self) -> i32 {
        match self {
            RequestTemplate::Preview => 1,
            RequestTemplate::StillCapture => 2,
        }
    }
}

/// Capture controls understood by the session core
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ControlKey {
    FlashMode,
    EffectMode,
    NoiseReductionMode,
    FaceDetectMode,
    EdgeMode,
    ShadingMode,
    TonemapMode,
    ColorCorrectionAberrationMode,
    ColorCorrectionMode,
    HotPixelMode,
    OpticalStabilizationMode,
    JpegQuality,
    CropRegion,
    ControlMode,
    AfTrigger,
    AfMode,
    LensFocusDistance,
}

/// The seven controls stamped together by the enhance option
pub const ENHANCE_CONTROLS: [(ControlKey, i32); 7] = [
    (ControlKey::EdgeMode, EDGE_MODE_HIGH_QUALITY),
    (ControlKey::ShadingMode, SHADING_MODE_HIGH_QUALITY),
    (ControlKey::TonemapMode, TONEMAP_MODE_HIGH_QUALITY),
    (
        ControlKey::ColorCorrectionAberrationMode,
        COLOR_CORRECTION_ABERRATION_MODE_HIGH_QUALITY,
    ),
    (
        ControlKey::ColorCorrectionMode,
        COLOR_CORRECTION_MODE_HIGH_QUALITY,
    ),
    (ControlKey::HotPixelMode, HOT_PIXEL_MODE_HIGH_QUALITY),
    (
        ControlKey::OpticalStabilizationMode,
        LENS_OPTICAL_STABILIZATION_MODE_ON,
    ),
];

/// Value stamped for a control
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlValue {
    Int(i32),
    Byte(u8),
    Float(f32),
    Rect(Rect),
}

impl ControlValue {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            ControlValue::Int(v) => Some(*v),
            ControlValue::Byte(v) => Some(*v as i32),
            _ => None,
        }
    }

    pub fn as_rect(&self) -> Option<Rect> {
        match self {
            ControlValue::Rect(r) => Some(*r),
            _ => None,
        }
    }
}

/// Request builder with output targets and control values
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    template: RequestTemplate,
    targets: Vec<OutputTarget>,
    controls: BTreeMap<ControlKey, ControlValue>,
}

impl CaptureRequest {
    pub fn new(template: RequestTemplate) -> Self {
        Self {
            template,
            targets: Vec::new(),
            controls: BTreeMap::new(),
        }
    }

    pub fn template(&self) -> RequestTemplate {
        self.template
    }

    pub fn add_target(&mut self, target: OutputTarget) {
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
    }

    pub fn targets(&self) -> &[OutputTarget] {
        &self.targets
    }

    pub fn set(&mut self, key: ControlKey, value: ControlValue) {
        self.controls.insert(key, value);
    }

    pub fn remove(&mut self, key: ControlKey) -> Option<ControlValue> {
        self.controls.remove(&key)
    }

    pub fn get(&self, key: ControlKey) -> Option<ControlValue> {
        self.controls.get(&key).copied()
    }

    pub fn get_int(&self, key: ControlKey) -> Option<i32> {
        self.get(key).and_then(|v| v.as_int())
    }

    pub fn crop_region(&self) -> Option<Rect> {
        self.get(ControlKey::CropRegion).and_then(|v| v.as_rect())
    }

    pub fn controls(&self) -> impl Iterator<Item = (&ControlKey, &ControlValue)> {
        self.controls.iter()
    }
}
