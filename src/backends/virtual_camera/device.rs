// SPDX-License-Identifier: GPL-3.0-only

//! Virtual device, session and still sink
//!
//! Every asynchronous completion is posted synchronously from inside the call
//! that caused it. The callbacks still travel through the event queue, so the
//! controller sees them in protocol order after the call returns.

use super::log::VirtualLog;
use super::Faults;
use crate::backends::camera::request::{CONTROL_AF_TRIGGER_CANCEL, CONTROL_AF_TRIGGER_START};
use crate::backends::camera::{
    AfState, BackendError, BackendResult, CameraDevice, CaptureRequest, CaptureResult,
    CaptureSession, CaptureTag, ControlKey, DeviceEvent, EventSender, Image, ImageReader,
    OutputTarget, RequestTemplate, SessionPurpose, TargetKind,
};
use crate::geometry::Size;
use crate::pipelines::photo::PhotoEncoder;
use image::{Rgb, RgbImage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Still sink ids start here; the preview surface uses small ids
const FIRST_SINK_ID: u64 = 100;

struct SinkSlot {
    size: Size,
    pending: Option<VirtualImage>,
}

/// Still sinks of one device, keyed by target id
#[derive(Clone, Default)]
struct SinkRegistry {
    slots: Arc<Mutex<HashMap<u64, SinkSlot>>>,
}

impl SinkRegistry {
    fn lock(&self) -> MutexGuard<'_, HashMap<u64, SinkSlot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(super) struct VirtualDevice {
    id: String,
    events: EventSender,
    faults: Faults,
    log: VirtualLog,
    sinks: SinkRegistry,
    next_sink: Arc<AtomicU64>,
    frame_number: Arc<AtomicU64>,
    closed: bool,
}

impl VirtualDevice {
    pub(super) fn new(id: &str, events: EventSender, faults: Faults, log: VirtualLog) -> Self {
        Self {
            id: id.to_string(),
            events,
            faults,
            log,
            sinks: SinkRegistry::default(),
            next_sink: Arc::new(AtomicU64::new(FIRST_SINK_ID)),
            frame_number: Arc::new(AtomicU64::new(0)),
            closed: false,
        }
    }

    fn ensure_open(&self) -> BackendResult<()> {
        if self.closed {
            Err(BackendError::Closed)
        } else {
            Ok(())
        }
    }
}

impl CameraDevice for VirtualDevice {
    fn id(&self) -> &str {
        &self.id
    }

    fn create_capture_request(&self, template: RequestTemplate) -> BackendResult<CaptureRequest> {
        self.ensure_open()?;
        Ok(CaptureRequest::new(template))
    }

    fn create_image_reader(
        &mut self,
        size: Size,
        max_images: usize,
    ) -> BackendResult<Box<dyn ImageReader>> {
        self.ensure_open()?;
        let id = self.next_sink.fetch_add(1, Ordering::SeqCst);
        self.sinks.lock().insert(
            id,
            SinkSlot {
                size,
                pending: None,
            },
        );
        debug!(id, %size, max_images, "Virtual still sink created");
        Ok(Box::new(VirtualImageReader {
            id,
            size,
            sinks: self.sinks.clone(),
        }))
    }

    fn create_capture_session(
        &mut self,
        outputs: &[OutputTarget],
        purpose: SessionPurpose,
    ) -> BackendResult<()> {
        self.ensure_open()?;
        self.log.record_session(purpose, outputs);

        let faults = self.faults.get();
        let fail = match purpose {
            SessionPurpose::Preview => faults.fail_preview_sessions,
            SessionPurpose::StillCapture => faults.fail_still_sessions,
        };
        if fail {
            self.events.post(DeviceEvent::SessionConfigureFailed {
                purpose,
                reason: "outputs rejected by virtual device".to_string(),
            });
            return Ok(());
        }

        let session = VirtualSession {
            purpose,
            events: self.events.clone(),
            faults: self.faults.clone(),
            log: self.log.clone(),
            sinks: self.sinks.clone(),
            frame_number: self.frame_number.clone(),
            closed: false,
        };
        self.events.post(DeviceEvent::SessionConfigured {
            purpose,
            session: Box::new(session),
        });
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.sinks.lock().clear();
            self.log.record_device_closed();
            debug!(camera = %self.id, "Virtual device closed");
        }
    }
}

struct VirtualSession {
    purpose: SessionPurpose,
    events: EventSender,
    faults: Faults,
    log: VirtualLog,
    sinks: SinkRegistry,
    frame_number: Arc<AtomicU64>,
    closed: bool,
}

impl VirtualSession {
    fn deliver_still(&self, target: OutputTarget) {
        let mut sinks = self.sinks.lock();
        let Some(slot) = sinks.get_mut(&target.id) else {
            warn!(target = target.id, "Capture into an unknown still sink");
            return;
        };
        match synthesize_jpeg(slot.size, self.log.clone()) {
            Some(image) => slot.pending = Some(image),
            None => return,
        }
        drop(sinks);
        self.events.post(DeviceEvent::ImageAvailable {
            reader_id: target.id,
        });
    }
}

impl CaptureSession for VirtualSession {
    fn set_repeating_request(&mut self, request: &CaptureRequest) -> BackendResult<()> {
        if self.closed {
            return Err(BackendError::Closed);
        }
        if self.faults.get().fail_repeating {
            return Err(BackendError::Other("repeating request rejected".to_string()));
        }
        self.log.record_repeating(request);
        Ok(())
    }

    fn capture(&mut self, request: &CaptureRequest, tag: CaptureTag) -> BackendResult<()> {
        if self.closed {
            return Err(BackendError::Closed);
        }
        self.log.record_capture(tag, request);
        let frame_number = self.frame_number.fetch_add(1, Ordering::SeqCst);

        let af_state = match tag {
            CaptureTag::Still => {
                for target in request.targets() {
                    if target.kind == TargetKind::StillSink {
                        self.deliver_still(*target);
                    }
                }
                AfState::Inactive
            }
            CaptureTag::FocusTrigger => match request.get_int(ControlKey::AfTrigger) {
                Some(CONTROL_AF_TRIGGER_START) if self.faults.get().af_locks => {
                    AfState::FocusedLocked
                }
                Some(CONTROL_AF_TRIGGER_START) => AfState::NotFocusedLocked,
                Some(CONTROL_AF_TRIGGER_CANCEL) => AfState::Inactive,
                _ => AfState::PassiveFocused,
            },
        };

        self.events.post(DeviceEvent::CaptureCompleted(CaptureResult {
            tag,
            af_state: Some(af_state),
            frame_number,
        }));
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.log.record_session_closed();
            debug!(purpose = ?self.purpose, "Virtual session closed");
        }
    }
}

struct VirtualImageReader {
    id: u64,
    size: Size,
    sinks: SinkRegistry,
}

impl ImageReader for VirtualImageReader {
    fn id(&self) -> u64 {
        self.id
    }

    fn target(&self) -> OutputTarget {
        OutputTarget::new(self.id, TargetKind::StillSink)
    }

    fn size(&self) -> Size {
        self.size
    }

    fn acquire_latest_image(&mut self) -> Option<Box<dyn Image>> {
        let mut sinks = self.sinks.lock();
        let image = sinks.get_mut(&self.id)?.pending.take()?;
        Some(Box::new(image))
    }
}

impl Drop for VirtualImageReader {
    fn drop(&mut self) {
        self.sinks.lock().remove(&self.id);
    }
}

/// JPEG still held by a virtual sink; dropping it releases it
pub struct VirtualImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
    log: VirtualLog,
}

impl Image for VirtualImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn plane_count(&self) -> usize {
        1
    }

    fn plane(&self, index: usize) -> Option<&[u8]> {
        (index == 0).then_some(self.data.as_slice())
    }
}

impl Drop for VirtualImage {
    fn drop(&mut self) {
        self.log.record_image_released();
    }
}

/// Gradient test card encoded as JPEG
fn synthesize_jpeg(size: Size, log: VirtualLog) -> Option<VirtualImage> {
    let card = RgbImage::from_fn(size.width.max(1), size.height.max(1), |x, y| {
        let r = (x * 255 / size.width.max(1)) as u8;
        let g = (y * 255 / size.height.max(1)) as u8;
        Rgb([r, g, 128])
    });
    match PhotoEncoder::new().encode_rgb(&card) {
        Ok(encoded) => Some(VirtualImage {
            data: encoded.data,
            width: encoded.width,
            height: encoded.height,
            log,
        }),
        Err(e) => {
            warn!(error = %e, "Failed to synthesize still image");
            None
        }
    }
}
