// SPDX-License-Identifier: GPL-3.0-only

//! Camera session state machine
//!
//! The controller owns the open device, the active capture session and the
//! preview request. Every transition is driven either by an explicit call or
//! by a [`DeviceEvent`] handed to [`SessionController::handle_event`]; the
//! controller never polls the device.
//!
//! ```text
//!            initialize            open ok, preview configured
//! Closed ─────────────────▶ Opening ─────────────────────────▶ PreviewActive
//!   ▲                          │                                 │      ▲
//!   │ reset / error /          │ preview configure failed        │      │ capture
//!   │ disconnect               ▼                     take_picture│      │ completed
//!   └───────────────────────  Failed                             ▼      │
//!                                                           StillCapturing
//! ```
//!
//! Failures never escape the controller. They are logged and turned into a
//! no-op, a fallback or a host notification.

use super::gesture::{GestureOutcome, TouchEvent, ZoomGesture};
use super::notify::{CameraEvent, EventNotifier};
use super::parameters::{CaptureParameters, SharedParameters};
use crate::backends::camera::request::{
    CONTROL_AF_TRIGGER_CANCEL, CONTROL_AF_TRIGGER_START, CONTROL_MODE_AUTO,
};
use crate::backends::camera::{
    AfState, Bitmap, CameraCharacteristics, CameraDevice, CameraProvider, CaptureRequest,
    CaptureResult, CaptureSession, CaptureTag, ControlKey, ControlValue, DeviceEvent, Envelope,
    EventReceiver, EventSender, PreviewSurface, RequestTemplate, SensorGeometry, SessionPurpose,
};
use crate::constants::{
    CAMERA_TYPE_FRONT, DEFAULT_PREVIEW_SIZE, EffectMode, FOCUS_DISTANCE_SCALE, FaceDetectMode,
    MIN_ZOOM, NoiseReductionMode, STILL_READER_MAX_IMAGES,
};
use crate::errors::{CameraError, PhotoError};
use crate::geometry::{Size, clamp_zoom, compute_crop_region, compute_transform};
use crate::pipelines::photo::{PendingStill, build_still_request, select_still_size};
use crate::storage::{self, ImageWriter};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Lifecycle state of the camera session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Closed,
    Opening,
    PreviewActive,
    StillCapturing,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Closed => "closed",
            SessionState::Opening => "opening",
            SessionState::PreviewActive => "preview",
            SessionState::StillCapturing => "still capture",
            SessionState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Drives one camera through open, preview, still capture and teardown
pub struct SessionController {
    provider: Arc<dyn CameraProvider>,
    surface: Arc<dyn PreviewSurface>,
    notifier: Arc<dyn EventNotifier>,
    writer: Arc<dyn ImageWriter>,
    events: EventSender,
    /// Bumped on every reset; callbacks stamped with an older value are dropped
    generation: u64,
    state: SessionState,
    parameters: SharedParameters,
    gesture: ZoomGesture,
    pinch_to_zoom: bool,
    visible: bool,
    output_path: Option<PathBuf>,
    photo_dir: PathBuf,
    camera_index: usize,
    /// Open as soon as the preview surface becomes available
    open_pending: bool,
    camera_id: Option<String>,
    characteristics: Option<CameraCharacteristics>,
    geometry: Option<SensorGeometry>,
    preview_size: Option<Size>,
    device: Option<Box<dyn CameraDevice>>,
    session: Option<Box<dyn CaptureSession>>,
    preview_request: Option<CaptureRequest>,
    still: Option<PendingStill>,
    initialized_notified: bool,
    /// A visible zoom was stored while no preview could take it
    zoom_pending: bool,
}

impl SessionController {
    pub fn new(
        provider: Arc<dyn CameraProvider>,
        surface: Arc<dyn PreviewSurface>,
        notifier: Arc<dyn EventNotifier>,
        writer: Arc<dyn ImageWriter>,
        events: EventSender,
    ) -> Self {
        Self {
            provider,
            surface,
            notifier,
            writer,
            generation: events.generation(),
            events,
            state: SessionState::Closed,
            parameters: SharedParameters::default(),
            gesture: ZoomGesture::new(),
            pinch_to_zoom: false,
            visible: true,
            output_path: None,
            photo_dir: storage::default_photo_dir(),
            camera_index: CAMERA_TYPE_FRONT,
            open_pending: false,
            camera_id: None,
            characteristics: None,
            geometry: None,
            preview_size: None,
            device: None,
            session: None,
            preview_request: None,
            still: None,
            initialized_notified: false,
            zoom_pending: false,
        }
    }

    // ===== Lifecycle =====

    /// Attach the preview surface and open the camera at `camera_index`
    ///
    /// Any previous camera is closed first. The device is opened as soon as
    /// the surface reports it is available.
    pub fn initialize(&mut self, camera_index: usize) {
        self.reset();

        info!(camera_index, "Initializing camera");
        self.camera_index = camera_index;
        self.open_pending = true;
        self.surface.attach(self.sender());
        self.surface.set_visible(self.visible);

        if self.surface.is_available() {
            self.open_camera();
        }
    }

    /// Close the device and detach the surface
    ///
    /// Safe in any state. Callbacks still in flight for the closed device are
    /// ignored when they arrive.
    pub fn reset(&mut self) {
        if self.state != SessionState::Closed || self.surface.is_attached() {
            info!(state = %self.state, camera = ?self.camera_id, "Resetting camera");
        }

        self.generation += 1;
        self.open_pending = false;
        self.still = None;
        self.preview_request = None;
        self.close_session();
        if let Some(mut device) = self.device.take() {
            device.close();
        }
        self.camera_id = None;
        self.characteristics = None;
        self.geometry = None;
        self.preview_size = None;
        self.gesture.reset();
        self.initialized_notified = false;
        self.zoom_pending = false;

        if self.surface.is_attached() {
            self.surface.detach();
        }
        self.state = SessionState::Closed;
    }

    /// Apply one device callback
    pub fn handle_event(&mut self, envelope: Envelope) {
        let Envelope { generation, event } = envelope;
        if generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                event = ?event,
                "Ignoring callback for a closed camera"
            );
            discard(event);
            return;
        }

        debug!(event = ?event, state = %self.state, "Device callback");
        match event {
            DeviceEvent::SurfaceAvailable { size } => self.on_surface_available(size),
            DeviceEvent::SurfaceDestroyed => debug!("Preview surface destroyed"),
            DeviceEvent::Opened(device) => self.on_opened(device),
            DeviceEvent::Disconnected => {
                warn!(camera = ?self.camera_id, "Camera disconnected");
                self.close_device();
            }
            DeviceEvent::Error { code } => {
                let err = CameraError::DeviceAccess(format!("device error {}", code));
                error!(error = %err, camera = ?self.camera_id, "Camera device failed");
                self.close_device();
            }
            DeviceEvent::SessionConfigured { purpose, session } => match purpose {
                SessionPurpose::Preview => self.on_preview_configured(session),
                SessionPurpose::StillCapture => self.on_still_configured(session),
            },
            DeviceEvent::SessionConfigureFailed { purpose, reason } => match purpose {
                SessionPurpose::Preview => {
                    let err = CameraError::ConfigurationFailure(reason);
                    error!(error = %err, "Preview session could not be configured");
                    self.fail_initialize();
                }
                SessionPurpose::StillCapture => self.on_still_configure_failed(&reason),
            },
            DeviceEvent::CaptureCompleted(result) => match result.tag {
                CaptureTag::Still => self.on_still_completed(),
                CaptureTag::FocusTrigger => self.on_focus_completed(result),
            },
            DeviceEvent::ImageAvailable { reader_id } => self.on_image_available(reader_id),
        }
    }

    /// Apply every queued callback, including ones posted while applying
    ///
    /// Returns the number of callbacks handled.
    pub fn dispatch_pending(&mut self, receiver: &mut EventReceiver) -> usize {
        let mut handled = 0;
        while let Some(envelope) = receiver.try_recv() {
            self.handle_event(envelope);
            handled += 1;
        }
        handled
    }

    // ===== Capture =====

    /// Capture a full resolution still into the output path
    ///
    /// A transient session is built over a still sink and the preview
    /// surface. When it cannot be configured the rendered preview is saved
    /// instead.
    pub fn take_picture(&mut self) {
        if self.state != SessionState::PreviewActive || self.session.is_none() {
            debug!(state = %self.state, "Cannot take a picture now");
            return;
        }
        let Some(characteristics) = self.characteristics.as_ref() else {
            return;
        };

        let size = select_still_size(characteristics);
        let destination = self.resolve_destination();
        let preview_target = self.surface.target();
        let parameters = self.parameters.snapshot();

        let Some(device) = self.device.as_mut() else {
            debug!("Cannot take a picture without a device");
            return;
        };
        let reader = match device.create_image_reader(size, STILL_READER_MAX_IMAGES) {
            Ok(reader) => reader,
            Err(e) => {
                warn!(error = %e, %size, "Failed to create still sink");
                return;
            }
        };
        let request = match build_still_request(&**device, reader.target(), preview_target, &parameters) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Failed to build still request");
                return;
            }
        };

        let mut outputs = vec![reader.target()];
        outputs.extend(preview_target);

        info!(%size, path = %destination.display(), "Taking picture");
        self.still = Some(PendingStill::new(reader, request, destination));
        self.set_zoom_on(parameters.zoom, true);
        self.close_session();
        self.state = SessionState::StillCapturing;

        let result = match self.device.as_mut() {
            Some(device) => device.create_capture_session(&outputs, SessionPurpose::StillCapture),
            None => return,
        };
        if let Err(e) = result {
            self.on_still_configure_failed(&e.to_string());
        }
    }

    /// Save the pixels currently shown on the preview surface
    pub fn take_preview_snapshot(&mut self) {
        let destination = self.resolve_destination();
        self.save_preview_snapshot(&destination);
    }

    // ===== Zoom =====

    /// Set a visible zoom factor, clamped to `[1.0, max_zoom()]`
    ///
    /// No-op until the camera is open or when the device cannot zoom.
    pub fn set_zoom(&mut self, zoom: f32) {
        match self.geometry {
            Some(geometry) if geometry.has_zoom_support() => {
                self.set_zoom_on(zoom, false);
            }
            Some(_) => debug!(zoom, "Camera has no digital zoom"),
            None => debug!(zoom, "Zoom requested before the camera was opened"),
        }
    }

    pub fn zoom(&self) -> f32 {
        self.parameters.snapshot().zoom
    }

    /// Largest zoom factor, 1.0 until the camera is open
    pub fn max_zoom(&self) -> f32 {
        self.geometry.map_or(MIN_ZOOM, |g| g.max_zoom)
    }

    pub fn has_zoom_support(&self) -> bool {
        self.geometry.is_some_and(|g| g.has_zoom_support())
    }

    /// Recompute the crop region and stamp it
    ///
    /// With `capture_only` the crop lands on the pending still request only
    /// and the live preview stream is left alone. Otherwise it lands on the
    /// preview request, which is re-issued once; `ZoomChanged` fires when the
    /// device accepted it. Returns whether the crop was stamped.
    fn set_zoom_on(&mut self, zoom: f32, capture_only: bool) -> bool {
        let Some(geometry) = self.geometry else {
            debug!(zoom, "Zoom ignored, camera not open");
            return false;
        };
        let zoom = clamp_zoom(zoom, geometry.max_zoom);
        self.parameters.update(|p| p.zoom = zoom);

        if capture_only {
            return match self.still.as_mut() {
                Some(still) => stamp_crop(still.request_mut(), &geometry, zoom),
                None => false,
            };
        }

        if self.state != SessionState::PreviewActive {
            debug!(zoom, state = %self.state, "Zoom stored, preview not running");
            self.zoom_pending = true;
            return false;
        }
        let (Some(request), Some(session)) = (self.preview_request.as_mut(), self.session.as_mut())
        else {
            debug!(zoom, "Zoom stored, no preview session yet");
            self.zoom_pending = true;
            return false;
        };
        if !stamp_crop(request, &geometry, zoom) {
            return false;
        }

        match session.set_repeating_request(request) {
            Ok(()) => {
                debug!(zoom, "Zoom applied");
                self.zoom_pending = false;
                self.notifier.notify(CameraEvent::ZoomChanged);
            }
            Err(e) => warn!(error = %e, zoom, "Failed to re-issue preview for zoom"),
        }
        true
    }

    // ===== Focus =====

    /// Trigger an autofocus lock on the running preview
    pub fn lock_focus(&mut self) {
        self.trigger_focus(CONTROL_AF_TRIGGER_START);
    }

    /// Cancel an autofocus lock
    pub fn unlock_focus(&mut self) {
        self.trigger_focus(CONTROL_AF_TRIGGER_CANCEL);
    }

    fn trigger_focus(&mut self, trigger: i32) {
        if self.state != SessionState::PreviewActive || self.session.is_none() {
            debug!(state = %self.state, trigger, "Focus trigger needs a running preview");
            return;
        }
        let (Some(preview), Some(session)) = (self.preview_request.as_ref(), self.session.as_mut())
        else {
            return;
        };

        let mut request = preview.clone();
        request.set(ControlKey::AfTrigger, ControlValue::Int(trigger));
        if let Err(e) = session.capture(&request, CaptureTag::FocusTrigger) {
            warn!(error = %e, trigger, "Failed to issue focus trigger");
        }
    }

    /// Manual focus, `distance` on a 0 (infinity) to 100 (closest) scale
    ///
    /// Switches autofocus off and refreshes the preview.
    pub fn set_focus_distance(&mut self, distance: f32) {
        if self.preview_request.is_none() {
            debug!(distance, "Focus distance needs a preview request");
            return;
        }
        let Some(geometry) = self.geometry else {
            return;
        };
        if !distance.is_finite() {
            warn!(distance, "Ignoring invalid focus distance");
            return;
        }

        let distance = distance.clamp(0.0, FOCUS_DISTANCE_SCALE);
        let diopters = distance * geometry.min_focus_distance / FOCUS_DISTANCE_SCALE;
        debug!(distance, diopters, "Manual focus");
        self.parameters.update(|p| p.focus_distance = Some(diopters));
        self.refresh();
    }

    /// Return to continuous autofocus
    pub fn clear_focus_distance(&mut self) {
        self.parameters.update(|p| p.focus_distance = None);
        self.refresh();
    }

    /// Re-stamp every parameter onto the preview and re-issue it
    pub fn refresh(&mut self) {
        if self.device.is_none() || self.preview_request.is_none() || !self.surface.is_attached() {
            debug!(state = %self.state, "Nothing to refresh");
            return;
        }
        self.update_preview();
        self.notifier.notify(CameraEvent::RefreshedCamera);
    }

    // ===== Touch =====

    /// Feed a touch event from the preview surface
    pub fn on_touch(&mut self, event: &TouchEvent) {
        let outcome =
            self.gesture
                .on_touch(event, self.pinch_to_zoom, self.zoom(), self.max_zoom());

        match outcome {
            GestureOutcome::Ignored => {}
            GestureOutcome::Touched => self.notifier.notify(CameraEvent::Touched),
            GestureOutcome::Zoom { zoom, increasing } => {
                if let Some(increasing) = increasing {
                    self.notifier.notify(CameraEvent::ZoomByPinch(increasing));
                }
                self.set_zoom_on(zoom, false);
            }
        }
    }

    // ===== Properties =====

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Handle to the shared parameter set
    pub fn parameters(&self) -> SharedParameters {
        self.parameters.clone()
    }

    pub fn snapshot(&self) -> CaptureParameters {
        self.parameters.snapshot()
    }

    pub fn preview_request(&self) -> Option<&CaptureRequest> {
        self.preview_request.as_ref()
    }

    pub fn camera_id(&self) -> Option<&str> {
        self.camera_id.as_deref()
    }

    pub fn current_camera_index(&self) -> usize {
        self.camera_index
    }

    /// Surface attached and drawable
    pub fn is_camera_active(&self) -> bool {
        self.surface.is_attached() && self.surface.is_available()
    }

    pub fn is_supported(&self) -> bool {
        self.provider.is_available()
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if self.surface.is_attached() {
            self.surface.set_visible(visible);
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_flash(&mut self, flash: bool) {
        self.parameters.update(|p| p.flash = flash);
    }

    pub fn flash(&self) -> bool {
        self.parameters.snapshot().flash
    }

    pub fn set_enhance(&mut self, enhance: bool) {
        self.parameters.update(|p| p.enhance = enhance);
    }

    pub fn enhance(&self) -> bool {
        self.parameters.snapshot().enhance
    }

    pub fn set_effect_mode(&mut self, mode: EffectMode) {
        self.parameters.update(|p| p.effect_mode = mode);
    }

    pub fn effect_mode(&self) -> EffectMode {
        self.parameters.snapshot().effect_mode
    }

    pub fn set_noise_reduction(&mut self, mode: NoiseReductionMode) {
        self.parameters.update(|p| p.noise_reduction = mode);
    }

    pub fn noise_reduction(&self) -> NoiseReductionMode {
        self.parameters.snapshot().noise_reduction
    }

    pub fn set_face_detect(&mut self, mode: FaceDetectMode) {
        self.parameters.update(|p| p.face_detect = mode);
    }

    pub fn face_detect(&self) -> FaceDetectMode {
        self.parameters.snapshot().face_detect
    }

    /// Destination of the next photo; `None` writes a timestamped file into the photo directory
    pub fn set_output_path(&mut self, path: Option<PathBuf>) {
        self.output_path = path;
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    pub fn set_photo_dir(&mut self, dir: PathBuf) {
        self.photo_dir = dir;
    }

    pub fn photo_dir(&self) -> &Path {
        &self.photo_dir
    }

    pub fn set_pinch_to_zoom(&mut self, enabled: bool) {
        self.pinch_to_zoom = enabled;
        if !enabled {
            self.gesture.reset();
        }
    }

    pub fn pinch_to_zoom(&self) -> bool {
        self.pinch_to_zoom
    }

    // ===== Device callbacks =====

    fn on_surface_available(&mut self, size: Size) {
        debug!(%size, "Preview surface available");
        if self.open_pending {
            self.open_camera();
        } else {
            self.configure_transform();
        }
    }

    fn open_camera(&mut self) {
        self.open_pending = false;

        let camera_id = match self.resolve_camera_id() {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, camera_index = self.camera_index, "Cannot open camera");
                self.state = SessionState::Closed;
                return;
            }
        };
        let characteristics = match self.provider.characteristics(&camera_id) {
            Ok(characteristics) => characteristics,
            Err(e) => {
                error!(error = %e, camera = %camera_id, "Failed to read camera characteristics");
                self.state = SessionState::Closed;
                return;
            }
        };

        let geometry = SensorGeometry::from_characteristics(&characteristics);
        let preview_size = characteristics
            .preview_sizes
            .first()
            .copied()
            .or_else(|| self.surface.view_size())
            .unwrap_or(DEFAULT_PREVIEW_SIZE);
        info!(
            camera = %camera_id,
            active_array = %geometry.active_array,
            max_zoom = geometry.max_zoom,
            %preview_size,
            "Opening camera"
        );

        self.surface.set_default_buffer_size(preview_size);
        self.camera_id = Some(camera_id.clone());
        self.characteristics = Some(characteristics);
        self.geometry = Some(geometry);
        self.preview_size = Some(preview_size);
        self.configure_transform();
        self.state = SessionState::Opening;

        if let Err(e) = self.provider.open(&camera_id, self.sender()) {
            let err = CameraError::from(e);
            error!(error = %err, camera = %camera_id, "Failed to open camera");
            self.state = SessionState::Closed;
        }
    }

    fn on_opened(&mut self, mut device: Box<dyn CameraDevice>) {
        if self.state != SessionState::Opening || self.device.is_some() {
            warn!(camera = device.id(), state = %self.state, "Unexpected open, closing device");
            device.close();
            return;
        }
        info!(camera = device.id(), "Camera opened");
        self.device = Some(device);
        self.create_preview_session();
    }

    fn on_preview_configured(&mut self, mut session: Box<dyn CaptureSession>) {
        if self.device.is_none() || self.state == SessionState::StillCapturing {
            debug!(state = %self.state, "Preview session no longer wanted");
            session.close();
            return;
        }
        if let Some(mut previous) = self.session.replace(session) {
            previous.close();
        }
        self.state = SessionState::PreviewActive;

        if !self.initialized_notified {
            self.initialized_notified = true;
            info!(camera = ?self.camera_id, "Camera initialized");
            self.notifier.notify(CameraEvent::Initialized);
        }
        if self.update_preview() && std::mem::take(&mut self.zoom_pending) {
            debug!(zoom = self.zoom(), "Stored zoom reached the preview");
            self.notifier.notify(CameraEvent::ZoomChanged);
        }
    }

    fn on_still_configured(&mut self, mut session: Box<dyn CaptureSession>) {
        if self.state != SessionState::StillCapturing || self.still.is_none() {
            debug!(state = %self.state, "Still session configured with nothing to capture");
            session.close();
            return;
        }

        // Parameters may have changed while the session was configured
        let parameters = self.parameters.snapshot();
        let geometry = self.geometry;
        let Some(still) = self.still.as_mut() else {
            return;
        };
        parameters.apply(still.request_mut());
        if let Some(geometry) = geometry {
            stamp_crop(still.request_mut(), &geometry, clamp_zoom(parameters.zoom, geometry.max_zoom));
        }

        let session = self.session.insert(session);
        if let Err(e) = session.capture(still.request(), CaptureTag::Still) {
            warn!(error = %e, "Still capture request failed");
            self.still = None;
            self.restore_preview();
        }
    }

    fn on_still_configure_failed(&mut self, reason: &str) {
        let err = CameraError::ConfigurationFailure(reason.to_string());
        warn!(error = %err, "Still session failed, saving the preview instead");

        let destination = match self.still.take() {
            Some(still) => still.destination().to_path_buf(),
            None => self.resolve_destination(),
        };
        self.restore_preview();
        self.save_preview_snapshot(&destination);
    }

    fn on_still_completed(&mut self) {
        if self.state != SessionState::StillCapturing {
            debug!(state = %self.state, "Still completion outside a capture");
            return;
        }
        debug!("Still capture completed, restoring preview");
        self.restore_preview();
    }

    fn on_focus_completed(&mut self, result: CaptureResult) {
        match result.af_state {
            Some(AfState::FocusedLocked) => self.notifier.notify(CameraEvent::FocusLocked),
            Some(AfState::NotFocusedLocked) => self.notifier.notify(CameraEvent::FocusUnlocked),
            other => debug!(af_state = ?other, "Focus trigger completed"),
        }
        if self.state == SessionState::PreviewActive {
            self.update_preview();
        }
    }

    fn on_image_available(&mut self, reader_id: u64) {
        let Some(mut still) = self.still.take_if(|s| s.reader_id() == reader_id) else {
            debug!(reader_id, "Image from an unknown still sink");
            return;
        };

        let image = match still.extract() {
            Ok(image) => image,
            Err(e) => {
                warn!(error = %e, "Still sink signalled an image but had none");
                return;
            }
        };
        match self.writer.write_bytes(still.destination(), &image.data) {
            Ok(()) => {
                info!(path = %still.destination().display(), "Photo saved");
                self.notifier.notify(CameraEvent::SavedPhoto);
            }
            Err(e) => {
                let err = PhotoError::from(e);
                error!(error = %err, path = %still.destination().display(), "Failed to save photo");
            }
        }
    }

    // ===== Internals =====

    fn sender(&self) -> EventSender {
        self.events.with_generation(self.generation)
    }

    fn resolve_camera_id(&self) -> Result<String, CameraError> {
        let ids = self.provider.camera_ids()?;
        ids.get(self.camera_index)
            .cloned()
            .ok_or(CameraError::NotFound(self.camera_index))
    }

    fn resolve_destination(&self) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| storage::timestamped_photo_path(&self.photo_dir))
    }

    fn configure_transform(&self) {
        let (Some(view), Some(buffer)) = (self.surface.view_size(), self.preview_size) else {
            return;
        };
        let rotation = self.surface.display_rotation();
        let matrix = compute_transform(view, buffer, rotation);
        debug!(%view, %buffer, %rotation, "Preview transform configured");
        self.surface.set_transform(matrix);
    }

    fn create_preview_session(&mut self) {
        self.close_session();

        let Some(target) = self.surface.target() else {
            warn!("Preview surface has no render target");
            return;
        };
        if let Some(size) = self.preview_size {
            self.surface.set_default_buffer_size(size);
        }
        let Some(device) = self.device.as_mut() else {
            debug!("No device for the preview session");
            return;
        };

        let mut request = match device.create_capture_request(RequestTemplate::Preview) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Failed to create preview request");
                return;
            }
        };
        request.add_target(target);
        self.preview_request = Some(request);

        if let Err(e) = device.create_capture_session(&[target], SessionPurpose::Preview) {
            let err = CameraError::from(e);
            error!(error = %err, "Failed to create preview session");
            self.fail_initialize();
        }
    }

    /// Stamp the current parameters and crop on the preview and re-issue it
    fn update_preview(&mut self) -> bool {
        let parameters = self.parameters.snapshot();
        let (Some(request), Some(session)) = (self.preview_request.as_mut(), self.session.as_mut())
        else {
            debug!("No preview to update");
            return false;
        };

        request.set(ControlKey::ControlMode, ControlValue::Int(CONTROL_MODE_AUTO));
        parameters.apply(request);
        if let Some(geometry) = self.geometry.as_ref() {
            stamp_crop(request, geometry, clamp_zoom(parameters.zoom, geometry.max_zoom));
        }

        match session.set_repeating_request(request) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to issue repeating preview request");
                false
            }
        }
    }

    fn restore_preview(&mut self) {
        self.state = SessionState::PreviewActive;
        self.create_preview_session();
    }

    fn save_preview_snapshot(&self, destination: &Path) {
        let Some(bitmap) = self.surface.bitmap().filter(Bitmap::is_valid) else {
            warn!(error = %PhotoError::NoPreviewBitmap, "Cannot take preview snapshot");
            return;
        };
        match self.writer.write_bitmap(destination, &bitmap) {
            Ok(()) => {
                info!(path = %destination.display(), "Preview snapshot saved");
                self.notifier.notify(CameraEvent::SavedPhoto);
            }
            Err(e) => {
                let err = PhotoError::from(e);
                error!(error = %err, path = %destination.display(), "Failed to save preview snapshot");
            }
        }
    }

    fn fail_initialize(&mut self) {
        self.state = SessionState::Failed;
        self.notifier.notify(CameraEvent::InitializeFailed);
    }

    fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
    }

    /// Drop the device after an error or disconnect
    fn close_device(&mut self) {
        self.still = None;
        self.preview_request = None;
        self.close_session();
        if let Some(mut device) = self.device.take() {
            device.close();
        }
        self.state = SessionState::Closed;
    }
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("camera_index", &self.camera_index)
            .field("camera_id", &self.camera_id)
            .field("still", &self.still)
            .finish_non_exhaustive()
    }
}

/// Stamp the crop region for `zoom` onto `request`
fn stamp_crop(request: &mut CaptureRequest, geometry: &SensorGeometry, zoom: f32) -> bool {
    match compute_crop_region(geometry.active_array, zoom) {
        Some(crop) => {
            request.set(ControlKey::CropRegion, ControlValue::Rect(crop));
            true
        }
        None => false,
    }
}

/// Release resources carried by a callback that arrived too late
fn discard(event: DeviceEvent) {
    match event {
        DeviceEvent::Opened(mut device) => device.close(),
        DeviceEvent::SessionConfigured { mut session, .. } => session.close(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::event_channel;
    use crate::backends::virtual_camera::{VirtualCameraProvider, VirtualSurface};
    use crate::session::notify::RecordingNotifier;
    use crate::storage::FsImageWriter;

    struct Fixture {
        controller: SessionController,
        receiver: EventReceiver,
        provider: Arc<VirtualCameraProvider>,
        notifier: Arc<RecordingNotifier>,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let (sender, receiver) = event_channel();
        let provider = Arc::new(VirtualCameraProvider::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let dir = tempfile::tempdir().unwrap();
        let mut controller = SessionController::new(
            provider.clone(),
            Arc::new(VirtualSurface::new()),
            notifier.clone(),
            Arc::new(FsImageWriter),
            sender,
        );
        controller.set_photo_dir(dir.path().to_path_buf());
        Fixture {
            controller,
            receiver,
            provider,
            notifier,
            _dir: dir,
        }
    }

    fn open(f: &mut Fixture) {
        f.controller.initialize(1);
        f.controller.dispatch_pending(&mut f.receiver);
        assert_eq!(f.controller.state(), SessionState::PreviewActive);
    }

    #[test]
    fn test_capture_only_zoom_leaves_preview_alone() {
        let mut f = fixture();
        open(&mut f);
        let issued = f.provider.log().repeating_requests().len();
        f.notifier.clear();

        assert!(!f.controller.set_zoom_on(2.0, true));
        assert_eq!(f.provider.log().repeating_requests().len(), issued);
        assert_eq!(f.notifier.count(CameraEvent::ZoomChanged), 0);
        assert_eq!(f.controller.zoom(), 2.0);
    }

    #[test]
    fn test_preview_zoom_reissues_once() {
        let mut f = fixture();
        open(&mut f);
        let issued = f.provider.log().repeating_requests().len();
        f.notifier.clear();

        assert!(f.controller.set_zoom_on(2.0, false));
        assert_eq!(f.provider.log().repeating_requests().len(), issued + 1);
        assert_eq!(f.notifier.count(CameraEvent::ZoomChanged), 1);
        let last = f.provider.log().last_repeating().unwrap();
        assert_eq!(last.crop_region(), compute_crop_region(f.controller.geometry.unwrap().active_array, 2.0));
    }

    #[test]
    fn test_zoom_clamped_to_sensor_limit() {
        let mut f = fixture();
        open(&mut f);
        f.controller.set_zoom(100.0);
        assert_eq!(f.controller.zoom(), f.controller.max_zoom());
        f.controller.set_zoom(0.2);
        assert_eq!(f.controller.zoom(), 1.0);
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let mut f = fixture();
        open(&mut f);
        let stale = Envelope {
            generation: f.controller.generation - 1,
            event: DeviceEvent::Disconnected,
        };
        f.controller.handle_event(stale);
        assert_eq!(f.controller.state(), SessionState::PreviewActive);
    }

    #[test]
    fn test_zoom_before_open_is_noop() {
        let mut f = fixture();
        f.controller.set_zoom(3.0);
        assert_eq!(f.controller.zoom(), 1.0);
        assert_eq!(f.controller.max_zoom(), 1.0);
        assert!(!f.controller.has_zoom_support());
    }
}
