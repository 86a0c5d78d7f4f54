// SPDX-License-Identifier: GPL-3.0-only

//! Notifications surfaced to the host
//!
//! Notifications are fire-and-forget: the controller never waits on the host
//! and never learns whether anybody listened.

use futures::channel::mpsc;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

/// Named notification raised by the session core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraEvent {
    /// Preview is running for the first time since the device was opened
    Initialized,
    /// The preview session could not be configured
    InitializeFailed,
    /// A photo or preview snapshot was written
    SavedPhoto,
    /// Parameters were re-stamped and the preview re-issued
    RefreshedCamera,
    /// A visible zoom change reached the preview
    ZoomChanged,
    /// Pinch gesture changed the zoom; `true` when zooming in
    ZoomByPinch(bool),
    FocusLocked,
    FocusUnlocked,
    /// Pointer released without an active pinch
    Touched,
}

impl CameraEvent {
    /// Event name as seen by the host
    pub fn name(&self) -> &'static str {
        match self {
            CameraEvent::Initialized => "Initialized",
            CameraEvent::InitializeFailed => "InitializeFailed",
            CameraEvent::SavedPhoto => "SavedPhoto",
            CameraEvent::RefreshedCamera => "RefreshedCamera",
            CameraEvent::ZoomChanged => "ZoomChanged",
            CameraEvent::ZoomByPinch(_) => "ZoomByPinch",
            CameraEvent::FocusLocked => "FocusLocked",
            CameraEvent::FocusUnlocked => "FocusUnlocked",
            CameraEvent::Touched => "Touched",
        }
    }
}

impl fmt::Display for CameraEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraEvent::ZoomByPinch(increasing) => write!(f, "ZoomByPinch({})", increasing),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Sink for host notifications
pub trait EventNotifier: Send + Sync {
    fn notify(&self, event: CameraEvent);
}

/// Forwards notifications into a futures channel
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<CameraEvent>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CameraEvent>) {
        let (sender, receiver) = mpsc::unbounded();
        (Self { sender }, receiver)
    }
}

impl EventNotifier for ChannelNotifier {
    fn notify(&self, event: CameraEvent) {
        if self.sender.unbounded_send(event).is_err() {
            debug!(%event, "Notification receiver gone");
        }
    }
}

/// Writes notifications to the log only
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl EventNotifier for LogNotifier {
    fn notify(&self, event: CameraEvent) {
        info!(%event, "Camera event");
    }
}

/// Keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<CameraEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications so far, oldest first
    pub fn events(&self) -> Vec<CameraEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, event: CameraEvent) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| **e == event)
            .count()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl EventNotifier for RecordingNotifier {
    fn notify(&self, event: CameraEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
