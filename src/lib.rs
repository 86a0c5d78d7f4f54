// SPDX-License-Identifier: MPL-2.0

//! procamera - session-based camera control
//!
//! This library drives a camera device through preview, capture parameter
//! changes, digital zoom and still capture, and hands the results to the host
//! as notifications and JPEG files.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Camera device abstraction and the virtual camera
//! - [`session`]: Session state machine, parameters, gestures and the async handle
//! - [`pipelines`]: Still capture and JPEG encoding
//! - [`geometry`]: Crop regions and preview transforms
//! - [`config`]: User configuration handling
//! - [`storage`]: Photo destinations and file writing
//!
//! # Example
//!
//! ```ignore
//! let (sender, events) = procamera::backends::camera::event_channel();
//! let controller = SessionController::new(provider, surface, notifier, writer, sender);
//! let handle = CameraHandle::spawn(controller, events);
//! handle.initialize(procamera::constants::CAMERA_TYPE_REAR);
//! handle.take_picture();
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod geometry;
pub mod pipelines;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use errors::{AppError, AppResult, CameraError, PhotoError};
pub use session::{CameraEvent, CameraHandle, SessionController, SessionState};
