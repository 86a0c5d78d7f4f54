// SPDX-License-Identifier: MPL-2.0

//! Error types for the camera controller
//!
//! Nothing in the session core propagates these past its own boundary: each
//! failure is logged where it happens and turned into a no-op, a fallback
//! action or a notification. The types exist so that the individual steps can
//! use `?` internally and so the log lines carry a consistent vocabulary.

use crate::backends::camera::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera device / session errors
    Camera(CameraError),
    /// Photo capture and persistence errors
    Photo(PhotoError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
#[derive(Debug, Clone)]
pub enum CameraError {
    /// Permission or hardware access denied by the device layer
    DeviceAccess(String),
    /// A capture session could not be configured
    ConfigurationFailure(String),
    /// Camera disconnected during operation
    Disconnected,
    /// No camera at the requested logical index
    NotFound(usize),
}

/// Photo capture errors
#[derive(Debug, Clone)]
pub enum PhotoError {
    /// The still sink signalled an image but none could be acquired
    NoImageAvailable,
    /// The preview surface has no rendered content to snapshot
    NoPreviewBitmap,
    /// Encoding a bitmap failed
    EncodingFailed(String),
    /// Writing the output file failed
    IoFailure(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Photo(e) => write!(f, "Photo error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::DeviceAccess(msg) => write!(f, "Device access failed: {}", msg),
            CameraError::ConfigurationFailure(msg) => {
                write!(f, "Session configuration failed: {}", msg)
            }
            CameraError::Disconnected => write!(f, "Camera disconnected"),
            CameraError::NotFound(index) => write!(f, "No camera at index {}", index),
        }
    }
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::NoImageAvailable => write!(f, "No image available in still sink"),
            PhotoError::NoPreviewBitmap => write!(f, "Preview surface has no bitmap"),
            PhotoError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            PhotoError::IoFailure(msg) => write!(f, "Write failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for PhotoError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        AppError::Photo(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<std::io::Error> for PhotoError {
    fn from(err: std::io::Error) -> Self {
        PhotoError::IoFailure(err.to_string())
    }
}

impl From<image::ImageError> for PhotoError {
    fn from(err: image::ImageError) -> Self {
        PhotoError::EncodingFailed(err.to_string())
    }
}

// Backend failures are classified by where they happen: anything raised while
// building a session is a configuration failure, the rest is device access.
impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Disconnected => CameraError::Disconnected,
            BackendError::ConfigurationFailed(msg) => CameraError::ConfigurationFailure(msg),
            other => CameraError::DeviceAccess(other.to_string()),
        }
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Camera(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_classification() {
        let err: CameraError = BackendError::Disconnected.into();
        assert!(matches!(err, CameraError::Disconnected));

        let err: CameraError = BackendError::ConfigurationFailed("outputs".into()).into();
        assert!(matches!(err, CameraError::ConfigurationFailure(_)));

        let err: CameraError = BackendError::AccessDenied("permission".into()).into();
        assert!(matches!(err, CameraError::DeviceAccess(_)));
    }

    #[test]
    fn test_display_messages() {
        let err = AppError::from(CameraError::NotFound(3));
        assert_eq!(err.to_string(), "Camera error: No camera at index 3");

        let err = AppError::from(PhotoError::IoFailure("disk full".into()));
        assert_eq!(err.to_string(), "Photo error: Write failed: disk full");
    }
}
