// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! An in-process camera stack with a synthetic sensor. It implements the same
//! contracts as a hardware backend and records every request it receives,
//! which makes it usable both from the command line and from tests.
//!
//! # Architecture
//!
//! ```text
//! VirtualCameraProvider ── open ──▶ VirtualDevice ── session ──▶ VirtualSession
//!        │                              │                           │
//!        │ Faults (injected failures)   │ still sinks               │ JPEG test card
//!        ▼                              ▼                           ▼
//!   VirtualLog ◀────────────── every request, session and release ───┘
//! ```

mod device;
mod log;
mod surface;

pub use device::VirtualImage;
pub use log::VirtualLog;
pub use surface::{PREVIEW_TARGET_ID, VirtualSurface};

use crate::backends::camera::{
    BackendError, BackendResult, CameraCharacteristics, CameraProvider, DeviceEvent, EventSender,
};
use crate::geometry::{Rect, Size};
use device::VirtualDevice;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// Device error code posted when an asynchronous open failure is injected
pub const OPEN_ERROR_CODE: i32 = 4;

/// Failures the virtual camera should produce
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultPlan {
    /// Refuse `open` synchronously
    pub deny_open: bool,
    /// Accept `open` but report a device error
    pub fail_open_async: bool,
    pub fail_preview_sessions: bool,
    pub fail_still_sessions: bool,
    /// Reject every repeating request
    pub fail_repeating: bool,
    /// Autofocus triggers end focused and locked
    pub af_locks: bool,
}

/// Shared, adjustable fault plan
#[derive(Debug, Clone, Default)]
pub struct Faults {
    inner: Arc<Mutex<FaultPlan>>,
}

impl Faults {
    pub fn get(&self) -> FaultPlan {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut FaultPlan),
    {
        f(&mut self.inner.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

/// One synthetic camera
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualCamera {
    pub id: String,
    pub name: String,
    pub characteristics: CameraCharacteristics,
}

/// Camera stack backed by synthetic sensors
#[derive(Debug)]
pub struct VirtualCameraProvider {
    cameras: Vec<VirtualCamera>,
    faults: Faults,
    log: VirtualLog,
    available: bool,
    last_open: Mutex<Option<EventSender>>,
}

impl VirtualCameraProvider {
    /// Front (index 0) and rear (index 1) camera
    pub fn new() -> Self {
        Self {
            cameras: default_cameras(),
            faults: Faults::default(),
            log: VirtualLog::default(),
            available: true,
            last_open: Mutex::new(None),
        }
    }

    /// Override the reported maximum digital zoom of every camera
    pub fn with_max_zoom(mut self, max_zoom: Option<f32>) -> Self {
        for camera in &mut self.cameras {
            camera.characteristics.max_digital_zoom = max_zoom;
        }
        self
    }

    /// Override the JPEG sizes of every camera
    pub fn with_still_sizes(mut self, sizes: Vec<Size>) -> Self {
        for camera in &mut self.cameras {
            camera.characteristics.still_sizes = sizes.clone();
        }
        self
    }

    /// Report the camera stack as unusable
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn cameras(&self) -> &[VirtualCamera] {
        &self.cameras
    }

    pub fn faults(&self) -> &Faults {
        &self.faults
    }

    pub fn log(&self) -> &VirtualLog {
        &self.log
    }

    /// Report the most recently opened device as disconnected
    pub fn disconnect(&self) {
        match self.last_open().clone() {
            Some(events) => events.post(DeviceEvent::Disconnected),
            None => warn!("No virtual device to disconnect"),
        }
    }

    fn last_open(&self) -> MutexGuard<'_, Option<EventSender>> {
        self.last_open.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn find(&self, camera_id: &str) -> BackendResult<&VirtualCamera> {
        self.cameras
            .iter()
            .find(|camera| camera.id == camera_id)
            .ok_or_else(|| BackendError::DeviceNotFound(camera_id.to_string()))
    }
}

impl Default for VirtualCameraProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraProvider for VirtualCameraProvider {
    fn camera_ids(&self) -> BackendResult<Vec<String>> {
        Ok(self.cameras.iter().map(|camera| camera.id.clone()).collect())
    }

    fn characteristics(&self, camera_id: &str) -> BackendResult<CameraCharacteristics> {
        Ok(self.find(camera_id)?.characteristics.clone())
    }

    fn open(&self, camera_id: &str, events: EventSender) -> BackendResult<()> {
        let camera = self.find(camera_id)?;
        let faults = self.faults.get();
        if faults.deny_open {
            return Err(BackendError::AccessDenied(format!(
                "access to {} refused",
                camera.id
            )));
        }

        *self.last_open() = Some(events.clone());
        if faults.fail_open_async {
            events.post(DeviceEvent::Error {
                code: OPEN_ERROR_CODE,
            });
            return Ok(());
        }

        info!(camera = %camera.id, name = %camera.name, "Virtual camera opened");
        self.log.record_device_opened();
        let device = VirtualDevice::new(
            &camera.id,
            events.clone(),
            self.faults.clone(),
            self.log.clone(),
        );
        events.post(DeviceEvent::Opened(Box::new(device)));
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

fn default_cameras() -> Vec<VirtualCamera> {
    vec![
        VirtualCamera {
            id: "virtual-front".to_string(),
            name: "Virtual Front Camera".to_string(),
            characteristics: CameraCharacteristics {
                active_array: Rect::from_size(3264, 2448),
                max_digital_zoom: Some(4.0),
                min_focus_distance: None,
                preview_sizes: vec![Size::new(1280, 720), Size::new(640, 480)],
                still_sizes: vec![Size::new(640, 480)],
            },
        },
        VirtualCamera {
            id: "virtual-rear".to_string(),
            name: "Virtual Rear Camera".to_string(),
            characteristics: CameraCharacteristics {
                active_array: Rect::from_size(4000, 3000),
                max_digital_zoom: Some(8.0),
                min_focus_distance: Some(10.0),
                preview_sizes: vec![Size::new(1920, 1080), Size::new(1280, 720)],
                still_sizes: vec![Size::new(640, 480), Size::new(320, 240)],
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::event_channel;

    #[test]
    fn test_default_cameras_by_index() {
        let provider = VirtualCameraProvider::new();
        let ids = provider.camera_ids().unwrap();
        assert_eq!(ids, vec!["virtual-front", "virtual-rear"]);
        let rear = provider.characteristics(&ids[1]).unwrap();
        assert_eq!(rear.active_array, Rect::from_size(4000, 3000));
    }

    #[test]
    fn test_open_posts_device() {
        let provider = VirtualCameraProvider::new();
        let (sender, mut receiver) = event_channel();
        provider.open("virtual-rear", sender).unwrap();
        let envelope = receiver.try_recv().unwrap();
        assert!(matches!(envelope.event, DeviceEvent::Opened(_)));
        assert_eq!(provider.log().devices_opened(), 1);
    }

    #[test]
    fn test_open_faults() {
        let provider = VirtualCameraProvider::new();
        let (sender, mut receiver) = event_channel();

        assert!(matches!(
            provider.open("missing", sender.clone()),
            Err(BackendError::DeviceNotFound(_))
        ));

        provider.faults().update(|f| f.deny_open = true);
        assert!(matches!(
            provider.open("virtual-front", sender.clone()),
            Err(BackendError::AccessDenied(_))
        ));

        provider.faults().update(|f| {
            f.deny_open = false;
            f.fail_open_async = true;
        });
        provider.open("virtual-front", sender).unwrap();
        assert!(matches!(
            receiver.try_recv().map(|e| e.event),
            Some(DeviceEvent::Error { code: OPEN_ERROR_CODE })
        ));
    }
}
