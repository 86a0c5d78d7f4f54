// SPDX-License-Identifier: MPL-2.0

//! Camera session core
//!
//! - [`controller`]: the session state machine
//! - [`parameters`]: tunable capture parameters and request stamping
//! - [`gesture`]: pinch-to-zoom tracking
//! - [`notify`]: notifications raised to the host
//! - [`handle`]: async actor wrapping the controller

pub mod controller;
pub mod gesture;
pub mod handle;
pub mod notify;
pub mod parameters;

pub use controller::{SessionController, SessionState};
pub use gesture::{GestureOutcome, TouchAction, TouchEvent, ZoomGesture};
pub use handle::{CameraHandle, CameraStatus};
pub use notify::{CameraEvent, ChannelNotifier, EventNotifier, LogNotifier, RecordingNotifier};
pub use parameters::{CaptureParameters, SharedParameters};
