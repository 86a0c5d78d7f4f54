// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use crate::geometry::Size;
use serde::{Deserialize, Serialize};

/// Logical index of the front-facing camera
pub const CAMERA_TYPE_FRONT: usize = 0;
/// Logical index of the rear-facing camera
pub const CAMERA_TYPE_REAR: usize = 1;

/// Zoom change per pinch event
pub const ZOOM_STEP: f32 = 0.1;
/// Smallest zoom factor (no crop)
pub const MIN_ZOOM: f32 = 1.0;

/// Preview buffer size used when the device reports no stream sizes
pub const DEFAULT_PREVIEW_SIZE: Size = Size::new(640, 480);
/// Still size used when the device reports no JPEG sizes
pub const DEFAULT_STILL_SIZE: Size = Size::new(640, 480);
/// Images the still sink may hold at once
pub const STILL_READER_MAX_IMAGES: usize = 1;
/// JPEG quality stamped on every request and used for preview snapshots
pub const JPEG_QUALITY: u8 = 100;

/// Upper bound of the manual focus scale (percent of the closest distance)
pub const FOCUS_DISTANCE_SCALE: f32 = 100.0;

/// Directory and config namespace
pub const APP_DIR_NAME: &str = "procamera";
/// File name prefix for photos written without an explicit output path
pub const PHOTO_FILE_PREFIX: &str = "photo";

/// Color effect applied by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EffectMode {
    #[default]
    Off,
    Mono,
    Negative,
    Solarize,
    Sepia,
    Posterize,
    Whiteboard,
    Blackboard,
    Aqua,
}

impl EffectMode {
    pub const ALL: [EffectMode; 9] = [
        EffectMode::Off,
        EffectMode::Mono,
        EffectMode::Negative,
        EffectMode::Solarize,
        EffectMode::Sepia,
        EffectMode::Posterize,
        EffectMode::Whiteboard,
        EffectMode::Blackboard,
        EffectMode::Aqua,
    ];

    /// Value passed to the device
    pub fn raw(&self) -> i32 {
        match self {
            EffectMode::Off => 0,
            EffectMode::Mono => 1,
            EffectMode::Negative => 2,
            EffectMode::Solarize => 3,
            EffectMode::Sepia => 4,
            EffectMode::Posterize => 5,
            EffectMode::Whiteboard => 6,
            EffectMode::Blackboard => 7,
            EffectMode::Aqua => 8,
        }
    }

    pub fn from_raw(value: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.raw() == value)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EffectMode::Off => "Default",
            EffectMode::Mono => "Mono",
            EffectMode::Negative => "Negative",
            EffectMode::Solarize => "Solarize",
            EffectMode::Sepia => "Sepia",
            EffectMode::Posterize => "Posterize",
            EffectMode::Whiteboard => "Whiteboard",
            EffectMode::Blackboard => "Blackboard",
            EffectMode::Aqua => "Aqua",
        }
    }
}

/// Noise reduction applied by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NoiseReductionMode {
    #[default]
    Off,
    Fast,
    HighQuality,
    Minimal,
    ZeroShutterLag,
}

impl NoiseReductionMode {
    pub const ALL: [NoiseReductionMode; 5] = [
        NoiseReductionMode::Off,
        NoiseReductionMode::Fast,
        NoiseReductionMode::HighQuality,
        NoiseReductionMode::Minimal,
        NoiseReductionMode::ZeroShutterLag,
    ];

    pub fn raw(&self) -> i32 {
        match self {
            NoiseReductionMode::Off => 0,
            NoiseReductionMode::Fast => 1,
            NoiseReductionMode::HighQuality => 2,
            NoiseReductionMode::Minimal => 3,
            NoiseReductionMode::ZeroShutterLag => 4,
        }
    }

    pub fn from_raw(value: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.raw() == value)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            NoiseReductionMode::Off => "Default",
            NoiseReductionMode::Fast => "Fast",
            NoiseReductionMode::HighQuality => "High quality",
            NoiseReductionMode::Minimal => "Minimal",
            NoiseReductionMode::ZeroShutterLag => "No shutter lag",
        }
    }
}

/// Face detection reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FaceDetectMode {
    #[default]
    Off,
    Simple,
    Full,
}

impl FaceDetectMode {
    pub const ALL: [FaceDetectMode; 3] = [
        FaceDetectMode::Off,
        FaceDetectMode::Simple,
        FaceDetectMode::Full,
    ];

    pub fn raw(&self) -> i32 {
        match self {
            FaceDetectMode::Off => 0,
            FaceDetectMode::Simple => 1,
            FaceDetectMode::Full => 2,
        }
    }

    pub fn from_raw(value: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.raw() == value)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FaceDetectMode::Off => "Default",
            FaceDetectMode::Simple => "Simple",
            FaceDetectMode::Full => "High",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_values_round_trip_through_lookup() {
        for mode in EffectMode::ALL {
            assert_eq!(EffectMode::from_raw(mode.raw()), Some(mode));
        }
        for mode in NoiseReductionMode::ALL {
            assert_eq!(NoiseReductionMode::from_raw(mode.raw()), Some(mode));
        }
        for mode in FaceDetectMode::ALL {
            assert_eq!(FaceDetectMode::from_raw(mode.raw()), Some(mode));
        }
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert_eq!(EffectMode::from_raw(9), None);
        assert_eq!(NoiseReductionMode::from_raw(-1), None);
        assert_eq!(FaceDetectMode::from_raw(3), None);
    }
}
