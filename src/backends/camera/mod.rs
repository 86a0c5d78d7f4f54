// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! The session core never talks to hardware directly. It drives the traits in
//! this module, and every asynchronous completion comes back as a
//! [`DeviceEvent`] posted through the [`EventSender`] handed to the backend.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  SessionController   │  ← State machine, parameter stamping
//! └──────────┬───────────┘
//!            │ calls                     ▲ DeviceEvent queue
//!            ▼                           │
//! ┌──────────────────────┐   ┌───────────┴──────────┐
//! │   CameraProvider     │──▶│     CameraDevice     │
//! │ ids, characteristics │   │ requests, sessions,  │
//! │ open                 │   │ image readers        │
//! └──────────────────────┘   └───────────┬──────────┘
//!                                        ▼
//!                            ┌──────────────────────┐
//!                            │    CaptureSession    │
//!                            │ repeating / one-shot │
//!                            └──────────────────────┘
//! ```

pub mod events;
pub mod request;
pub mod types;

pub use events::{DeviceEvent, Envelope, EventReceiver, EventSender, SessionPurpose, event_channel};
pub use request::{CaptureRequest, ControlKey, ControlValue, RequestTemplate};
pub use types::*;

use crate::geometry::{DisplayRotation, Matrix, Size};

/// Entry point of a camera stack: enumeration and opening
pub trait CameraProvider: Send + Sync {
    /// Device ids ordered by logical index (0 = front, 1 = rear)
    fn camera_ids(&self) -> BackendResult<Vec<String>>;

    /// Static capabilities of a device
    fn characteristics(&self, camera_id: &str) -> BackendResult<CameraCharacteristics>;

    /// Start opening a device
    ///
    /// Completion arrives as [`DeviceEvent::Opened`], or as
    /// [`DeviceEvent::Error`] / [`DeviceEvent::Disconnected`]. The sender is
    /// kept by the device for all of its later callbacks.
    fn open(&self, camera_id: &str, events: EventSender) -> BackendResult<()>;

    /// Whether the camera stack can be used on this system
    fn is_available(&self) -> bool {
        true
    }
}

/// An open camera
pub trait CameraDevice: Send {
    fn id(&self) -> &str;

    /// Fresh request pre-populated from a template
    fn create_capture_request(&self, template: RequestTemplate) -> BackendResult<CaptureRequest>;

    /// Still sink producing JPEG images of `size`
    ///
    /// The reader posts [`DeviceEvent::ImageAvailable`] whenever a capture
    /// lands in it.
    fn create_image_reader(
        &mut self,
        size: Size,
        max_images: usize,
    ) -> BackendResult<Box<dyn ImageReader>>;

    /// Start building a session over `outputs`
    ///
    /// Completion arrives as [`DeviceEvent::SessionConfigured`] or
    /// [`DeviceEvent::SessionConfigureFailed`]. A new session replaces any
    /// session previously created on this device.
    fn create_capture_session(
        &mut self,
        outputs: &[OutputTarget],
        purpose: SessionPurpose,
    ) -> BackendResult<()>;

    fn close(&mut self);
}

/// A configured session binding the device to its outputs
pub trait CaptureSession: Send {
    /// Replace the request re-issued for every preview frame
    fn set_repeating_request(&mut self, request: &CaptureRequest) -> BackendResult<()>;

    /// Issue a single request; completion arrives as [`DeviceEvent::CaptureCompleted`]
    fn capture(&mut self, request: &CaptureRequest, tag: CaptureTag) -> BackendResult<()>;

    fn close(&mut self);
}

/// One-shot image sink for still capture
pub trait ImageReader: Send {
    fn id(&self) -> u64;

    fn target(&self) -> OutputTarget;

    fn size(&self) -> Size;

    /// Most recent image, discarding older ones
    fn acquire_latest_image(&mut self) -> Option<Box<dyn Image>>;
}

/// Drawable surface showing the preview, owned by the host UI
///
/// Methods take `&self`: the host keeps its own handle to the surface and the
/// implementation is expected to synchronise internally.
pub trait PreviewSurface: Send + Sync {
    /// Attach to the host container; availability is reported through
    /// [`DeviceEvent::SurfaceAvailable`] on `events`
    fn attach(&self, events: EventSender);

    /// Remove from the host container
    fn detach(&self);

    fn is_attached(&self) -> bool;

    /// Whether the surface can currently be drawn into
    fn is_available(&self) -> bool;

    /// Current view size, if laid out
    fn view_size(&self) -> Option<Size>;

    /// Rotation of the display the surface is shown on
    fn display_rotation(&self) -> DisplayRotation;

    /// Size of the buffers the camera will render
    fn set_default_buffer_size(&self, size: Size);

    /// Render target handle, if available
    fn target(&self) -> Option<OutputTarget>;

    fn set_transform(&self, matrix: Matrix);

    /// Pixels currently rendered on the surface
    fn bitmap(&self) -> Option<Bitmap>;

    fn set_visible(&self, visible: bool);
}
