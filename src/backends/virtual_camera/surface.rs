// SPDX-License-Identifier: GPL-3.0-only

//! In-memory preview surface

use crate::backends::camera::{Bitmap, DeviceEvent, EventSender, OutputTarget, PreviewSurface, TargetKind};
use crate::geometry::{DisplayRotation, Matrix, Size};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Target id of the virtual preview surface
pub const PREVIEW_TARGET_ID: u64 = 1;

#[derive(Debug)]
struct SurfaceState {
    attached: bool,
    available: bool,
    ready_on_attach: bool,
    view_size: Size,
    rotation: DisplayRotation,
    buffer_size: Option<Size>,
    transform: Matrix,
    visible: bool,
    bitmap_enabled: bool,
    events: Option<EventSender>,
}

/// Preview surface that renders a flat test pattern
#[derive(Debug)]
pub struct VirtualSurface {
    state: Mutex<SurfaceState>,
}

impl VirtualSurface {
    /// Portrait 480x640 view, drawable as soon as it is attached
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SurfaceState {
                attached: false,
                available: false,
                ready_on_attach: true,
                view_size: Size::new(480, 640),
                rotation: DisplayRotation::Rotation0,
                buffer_size: None,
                transform: Matrix::identity(),
                visible: false,
                bitmap_enabled: true,
                events: None,
            }),
        }
    }

    pub fn with_view_size(self, size: Size) -> Self {
        self.state().view_size = size;
        self
    }

    pub fn with_rotation(self, rotation: DisplayRotation) -> Self {
        self.state().rotation = rotation;
        self
    }

    /// Stay unavailable after attaching until [`Self::make_available`]
    pub fn deferred(self) -> Self {
        self.state().ready_on_attach = false;
        self
    }

    fn state(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Report the surface as drawable
    pub fn make_available(&self) {
        let (events, size) = {
            let mut state = self.state();
            if !state.attached {
                return;
            }
            state.available = true;
            (state.events.clone(), state.view_size)
        };
        if let Some(events) = events {
            events.post(DeviceEvent::SurfaceAvailable { size });
        }
    }

    /// Whether [`PreviewSurface::bitmap`] returns pixels
    pub fn set_bitmap_enabled(&self, enabled: bool) {
        self.state().bitmap_enabled = enabled;
    }

    pub fn transform(&self) -> Matrix {
        self.state().transform
    }

    pub fn buffer_size(&self) -> Option<Size> {
        self.state().buffer_size
    }

    pub fn is_visible(&self) -> bool {
        self.state().visible
    }
}

impl Default for VirtualSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewSurface for VirtualSurface {
    fn attach(&self, events: EventSender) {
        let ready = {
            let mut state = self.state();
            state.attached = true;
            state.events = Some(events);
            state.ready_on_attach
        };
        debug!("Virtual surface attached");
        if ready {
            self.make_available();
        }
    }

    fn detach(&self) {
        let events = {
            let mut state = self.state();
            state.attached = false;
            state.available = false;
            state.events.take()
        };
        debug!("Virtual surface detached");
        if let Some(events) = events {
            events.post(DeviceEvent::SurfaceDestroyed);
        }
    }

    fn is_attached(&self) -> bool {
        self.state().attached
    }

    fn is_available(&self) -> bool {
        self.state().available
    }

    fn view_size(&self) -> Option<Size> {
        let state = self.state();
        state.attached.then_some(state.view_size)
    }

    fn display_rotation(&self) -> DisplayRotation {
        self.state().rotation
    }

    fn set_default_buffer_size(&self, size: Size) {
        self.state().buffer_size = Some(size);
    }

    fn target(&self) -> Option<OutputTarget> {
        self.state()
            .available
            .then_some(OutputTarget::new(PREVIEW_TARGET_ID, TargetKind::Preview))
    }

    fn set_transform(&self, matrix: Matrix) {
        self.state().transform = matrix;
    }

    fn bitmap(&self) -> Option<Bitmap> {
        let state = self.state();
        if !state.available || !state.bitmap_enabled {
            return None;
        }
        let Size { width, height } = state.view_size;
        let rgba = [96, 160, 224, 255].repeat(width as usize * height as usize);
        Some(Bitmap {
            width,
            height,
            rgba,
        })
    }

    fn set_visible(&self, visible: bool) {
        self.state().visible = visible;
    }
}
