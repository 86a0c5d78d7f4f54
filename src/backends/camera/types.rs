// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::geometry::{Rect, Size};
use std::fmt;

/// Static capabilities of one camera, as reported by the device layer
#[derive(Debug, Clone, PartialEq)]
pub struct CameraCharacteristics {
    /// Active pixel array of the sensor
    pub active_array: Rect,
    /// Maximum digital zoom ratio, if the device reports one
    pub max_digital_zoom: Option<f32>,
    /// Closest focus distance in diopters (None for fixed-focus lenses)
    pub min_focus_distance: Option<f32>,
    /// Sizes the device can stream to a preview surface, preferred first
    pub preview_sizes: Vec<Size>,
    /// Sizes the device can encode as JPEG stills, preferred first
    pub still_sizes: Vec<Size>,
}

/// Sensor facts fixed for the lifetime of one device open
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorGeometry {
    pub active_array: Rect,
    pub max_zoom: f32,
    pub min_focus_distance: f32,
}

impl SensorGeometry {
    /// Derive geometry from characteristics; unreported or sub-unity zoom means 1.0
    pub fn from_characteristics(characteristics: &CameraCharacteristics) -> Self {
        let max_zoom = match characteristics.max_digital_zoom {
            Some(value) if value.is_finite() && value >= 1.0 => value,
            _ => 1.0,
        };
        Self {
            active_array: characteristics.active_array,
            max_zoom,
            min_focus_distance: characteristics.min_focus_distance.unwrap_or(0.0),
        }
    }

    /// Digital zoom is only offered when the device can crop past 1.0
    pub fn has_zoom_support(&self) -> bool {
        self.max_zoom > 1.0
    }
}

/// Kind of surface an output target refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// Drawable preview surface
    Preview,
    /// One-shot still image sink
    StillSink,
}

/// Opaque handle to a surface a session can render into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputTarget {
    pub id: u64,
    pub kind: TargetKind,
}

impl OutputTarget {
    pub const fn new(id: u64, kind: TargetKind) -> Self {
        Self { id, kind }
    }
}

/// Autofocus state reported with a completed capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AfState {
    #[default]
    Inactive,
    PassiveScan,
    PassiveFocused,
    ActiveScan,
    FocusedLocked,
    NotFocusedLocked,
    PassiveUnfocused,
}

impl AfState {
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(AfState::Inactive),
            1 => Some(AfState::PassiveScan),
            2 => Some(AfState::PassiveFocused),
            3 => Some(AfState::ActiveScan),
            4 => Some(AfState::FocusedLocked),
            5 => Some(AfState::NotFocusedLocked),
            6 => Some(AfState::PassiveUnfocused),
            _ => None,
        }
    }

    pub fn raw(&self) -> i32 {
        match self {
            AfState::Inactive => 0,
            AfState::PassiveScan => 1,
            AfState::PassiveFocused => 2,
            AfState::ActiveScan => 3,
            AfState::FocusedLocked => 4,
            AfState::NotFocusedLocked => 5,
            AfState::PassiveUnfocused => 6,
        }
    }
}

/// Why a one-shot capture was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureTag {
    /// High resolution still into the still sink
    Still,
    /// Autofocus trigger on the preview request
    FocusTrigger,
}

/// Metadata returned when a one-shot capture completes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureResult {
    pub tag: CaptureTag,
    pub af_state: Option<AfState>,
    /// Frame number assigned by the device
    pub frame_number: u64,
}

/// A device-side image held by a still sink
///
/// Dropping the box releases the image back to the device.
pub trait Image: Send {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn plane_count(&self) -> usize;
    /// Payload of one plane
    fn plane(&self, index: usize) -> Option<&[u8]>;
}

/// RGBA pixels currently rendered on the preview surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA, `width * height * 4` bytes
    pub rgba: Vec<u8>,
}

impl Bitmap {
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.rgba.len() == self.width as usize * self.height as usize * 4
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Permission or hardware access was refused
    AccessDenied(String),
    /// The device went away
    Disconnected,
    /// Outputs could not be combined into a session
    ConfigurationFailed(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// The device or session was already closed
    Closed,
    /// Other errors
    Other(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::AccessDenied(msg) => write!(f, "Access denied: {}", msg),
            BackendError::Disconnected => write!(f, "Device disconnected"),
            BackendError::ConfigurationFailed(msg) => write!(f, "Configuration failed: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::Closed => write!(f, "Device or session closed"),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}
