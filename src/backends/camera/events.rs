// SPDX-License-Identifier: GPL-3.0-only

//! Asynchronous device callbacks
//!
//! Backends report completion of every asynchronous operation by posting a
//! [`DeviceEvent`] through an [`EventSender`]. Posting never blocks and may
//! happen from any thread, including from inside a call the controller is
//! currently making. Events land on a single-consumer queue and are applied to
//! the controller one at a time.
//!
//! Each sender carries the controller generation it was handed out for. A
//! reset bumps the generation, so callbacks that belong to a closed device are
//! recognised and dropped when they finally arrive.

use super::types::CaptureResult;
use super::{CameraDevice, CaptureSession};
use crate::geometry::Size;
use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;

/// What a capture session was created for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPurpose {
    /// Repeating preview into the preview surface
    Preview,
    /// Transient session for one still capture
    StillCapture,
}

/// Callback from the device layer or the preview surface
pub enum DeviceEvent {
    /// Preview surface is ready to be drawn into
    SurfaceAvailable { size: Size },
    /// Preview surface was torn down by the host
    SurfaceDestroyed,
    /// Device open completed
    Opened(Box<dyn CameraDevice>),
    /// Device was disconnected
    Disconnected,
    /// Device reported a fatal error
    Error { code: i32 },
    /// Session with the requested outputs is ready
    SessionConfigured {
        purpose: SessionPurpose,
        session: Box<dyn CaptureSession>,
    },
    /// Requested outputs could not be combined into a session
    SessionConfigureFailed {
        purpose: SessionPurpose,
        reason: String,
    },
    /// One-shot capture finished
    CaptureCompleted(CaptureResult),
    /// Still sink has an image ready
    ImageAvailable { reader_id: u64 },
}

impl fmt::Debug for DeviceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceEvent::SurfaceAvailable { size } => write!(f, "SurfaceAvailable({})", size),
            DeviceEvent::SurfaceDestroyed => write!(f, "SurfaceDestroyed"),
            DeviceEvent::Opened(device) => write!(f, "Opened({})", device.id()),
            DeviceEvent::Disconnected => write!(f, "Disconnected"),
            DeviceEvent::Error { code } => write!(f, "Error({})", code),
            DeviceEvent::SessionConfigured { purpose, .. } => {
                write!(f, "SessionConfigured({:?})", purpose)
            }
            DeviceEvent::SessionConfigureFailed { purpose, reason } => {
                write!(f, "SessionConfigureFailed({:?}, {})", purpose, reason)
            }
            DeviceEvent::CaptureCompleted(result) => {
                write!(f, "CaptureCompleted({:?})", result.tag)
            }
            DeviceEvent::ImageAvailable { reader_id } => {
                write!(f, "ImageAvailable({})", reader_id)
            }
        }
    }
}

/// Event stamped with the generation of the sender that posted it
#[derive(Debug)]
pub struct Envelope {
    pub generation: u64,
    pub event: DeviceEvent,
}

/// Cloneable handle backends use to post callbacks
#[derive(Clone)]
pub struct EventSender {
    generation: u64,
    tx: mpsc::UnboundedSender<Envelope>,
}

impl EventSender {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Same queue, stamped with another generation
    pub fn with_generation(&self, generation: u64) -> Self {
        Self {
            generation,
            tx: self.tx.clone(),
        }
    }

    /// Post a callback; dropped silently once the consumer is gone
    pub fn post(&self, event: DeviceEvent) {
        let envelope = Envelope {
            generation: self.generation,
            event,
        };
        if let Err(e) = self.tx.send(envelope) {
            debug!(event = ?e.0.event, "Event receiver gone, dropping callback");
        }
    }
}

impl fmt::Debug for EventSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender")
            .field("generation", &self.generation)
            .finish()
    }
}

/// Consumer side of the callback queue
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<Envelope>,
}

impl EventReceiver {
    /// Wait for the next callback
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    /// Next callback if one is already queued
    pub fn try_recv(&mut self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }
}

/// Create a callback queue; the sender starts at generation 0
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { generation: 0, tx }, EventReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_carry_sender_generation() {
        let (sender, mut receiver) = event_channel();
        sender.post(DeviceEvent::Disconnected);
        sender.with_generation(3).post(DeviceEvent::Error { code: 4 });

        let first = receiver.try_recv().unwrap();
        assert_eq!(first.generation, 0);
        assert!(matches!(first.event, DeviceEvent::Disconnected));

        let second = receiver.try_recv().unwrap();
        assert_eq!(second.generation, 3);
        assert!(matches!(second.event, DeviceEvent::Error { code: 4 }));

        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn test_post_after_receiver_dropped_is_harmless() {
        let (sender, receiver) = event_channel();
        drop(receiver);
        sender.post(DeviceEvent::SurfaceDestroyed);
    }
}
