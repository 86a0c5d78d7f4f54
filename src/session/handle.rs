// SPDX-License-Identifier: GPL-3.0-only

//! Async handle to a camera session
//!
//! The controller runs inside a single tokio task. API calls arrive on a
//! command queue and device callbacks on the event queue; the task applies
//! one of them at a time and drains every callback queued as a consequence
//! before it looks at the next command. Capture parameters are shared
//! directly, so setters never wait for the task.

use super::controller::{SessionController, SessionState};
use super::gesture::TouchEvent;
use super::parameters::SharedParameters;
use crate::backends::camera::EventReceiver;
use crate::constants::{EffectMode, FaceDetectMode, NoiseReductionMode};
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Point-in-time view of the session
#[derive(Debug, Clone, PartialEq)]
pub struct CameraStatus {
    pub state: SessionState,
    pub camera_index: usize,
    pub zoom: f32,
    pub max_zoom: f32,
    pub camera_active: bool,
}

enum Command {
    Initialize(usize),
    TakePicture,
    TakePreviewSnapshot,
    SetZoom(f32),
    LockFocus,
    UnlockFocus,
    SetFocusDistance(f32),
    Refresh,
    Reset,
    SetVisible(bool),
    SetPinchToZoom(bool),
    SetOutputPath(Option<PathBuf>),
    Touch(TouchEvent),
    Status(oneshot::Sender<CameraStatus>),
    Flush(oneshot::Sender<()>),
    Shutdown,
}

/// Handle to a controller running on its own task
pub struct CameraHandle {
    commands: mpsc::UnboundedSender<Command>,
    parameters: SharedParameters,
    task: JoinHandle<()>,
}

impl CameraHandle {
    /// Move `controller` onto a new task fed by `events`
    pub fn spawn(controller: SessionController, events: EventReceiver) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let parameters = controller.parameters();
        let task = tokio::spawn(run(controller, events, receiver));
        Self {
            commands,
            parameters,
            task,
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("Camera task stopped, command dropped");
        }
    }

    pub fn initialize(&self, camera_index: usize) {
        self.send(Command::Initialize(camera_index));
    }

    pub fn take_picture(&self) {
        self.send(Command::TakePicture);
    }

    pub fn take_preview_snapshot(&self) {
        self.send(Command::TakePreviewSnapshot);
    }

    pub fn set_zoom(&self, zoom: f32) {
        self.send(Command::SetZoom(zoom));
    }

    pub fn lock_focus(&self) {
        self.send(Command::LockFocus);
    }

    pub fn unlock_focus(&self) {
        self.send(Command::UnlockFocus);
    }

    pub fn set_focus_distance(&self, distance: f32) {
        self.send(Command::SetFocusDistance(distance));
    }

    pub fn refresh(&self) {
        self.send(Command::Refresh);
    }

    pub fn reset(&self) {
        self.send(Command::Reset);
    }

    pub fn set_visible(&self, visible: bool) {
        self.send(Command::SetVisible(visible));
    }

    pub fn set_pinch_to_zoom(&self, enabled: bool) {
        self.send(Command::SetPinchToZoom(enabled));
    }

    pub fn set_output_path(&self, path: Option<PathBuf>) {
        self.send(Command::SetOutputPath(path));
    }

    pub fn on_touch(&self, event: TouchEvent) {
        self.send(Command::Touch(event));
    }

    pub fn set_flash(&self, flash: bool) {
        self.parameters.update(|p| p.flash = flash);
    }

    pub fn set_enhance(&self, enhance: bool) {
        self.parameters.update(|p| p.enhance = enhance);
    }

    pub fn set_effect_mode(&self, mode: EffectMode) {
        self.parameters.update(|p| p.effect_mode = mode);
    }

    pub fn set_noise_reduction(&self, mode: NoiseReductionMode) {
        self.parameters.update(|p| p.noise_reduction = mode);
    }

    pub fn set_face_detect(&self, mode: FaceDetectMode) {
        self.parameters.update(|p| p.face_detect = mode);
    }

    /// Shared parameter set
    pub fn parameters(&self) -> &SharedParameters {
        &self.parameters
    }

    /// Current session status, `None` once the task has stopped
    pub async fn status(&self) -> Option<CameraStatus> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Status(tx));
        rx.await.ok()
    }

    /// Wait until every command sent so far and every callback they caused
    /// has been applied
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Flush(tx));
        let _ = rx.await;
    }

    /// Close the camera and stop the task
    pub async fn shutdown(self) {
        self.send(Command::Shutdown);
        if let Err(e) = self.task.await {
            debug!(error = %e, "Camera task ended abnormally");
        }
    }
}

async fn run(
    mut controller: SessionController,
    mut events: EventReceiver,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    debug!("Camera task started");
    loop {
        tokio::select! {
            command = commands.recv() => {
                match command {
                    None | Some(Command::Shutdown) => break,
                    Some(command) => apply(&mut controller, &mut events, command),
                }
            }
            Some(envelope) = events.recv() => controller.handle_event(envelope),
        }
        controller.dispatch_pending(&mut events);
    }

    controller.reset();
    info!("Camera task stopped");
}

fn apply(controller: &mut SessionController, events: &mut EventReceiver, command: Command) {
    match command {
        Command::Initialize(index) => controller.initialize(index),
        Command::TakePicture => controller.take_picture(),
        Command::TakePreviewSnapshot => controller.take_preview_snapshot(),
        Command::SetZoom(zoom) => controller.set_zoom(zoom),
        Command::LockFocus => controller.lock_focus(),
        Command::UnlockFocus => controller.unlock_focus(),
        Command::SetFocusDistance(distance) => controller.set_focus_distance(distance),
        Command::Refresh => controller.refresh(),
        Command::Reset => controller.reset(),
        Command::SetVisible(visible) => controller.set_visible(visible),
        Command::SetPinchToZoom(enabled) => controller.set_pinch_to_zoom(enabled),
        Command::SetOutputPath(path) => controller.set_output_path(path),
        Command::Touch(event) => controller.on_touch(&event),
        Command::Status(reply) => {
            controller.dispatch_pending(events);
            let _ = reply.send(CameraStatus {
                state: controller.state(),
                camera_index: controller.current_camera_index(),
                zoom: controller.zoom(),
                max_zoom: controller.max_zoom(),
                camera_active: controller.is_camera_active(),
            });
        }
        Command::Flush(reply) => {
            controller.dispatch_pending(events);
            let _ = reply.send(());
        }
        Command::Shutdown => {}
    }
}
