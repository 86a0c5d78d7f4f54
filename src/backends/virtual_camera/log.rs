// SPDX-License-Identifier: GPL-3.0-only

//! Record of everything the virtual camera was asked to do

use crate::backends::camera::{CaptureRequest, CaptureTag, OutputTarget, SessionPurpose};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct LogState {
    repeating: Vec<CaptureRequest>,
    captures: Vec<(CaptureTag, CaptureRequest)>,
    sessions: Vec<(SessionPurpose, Vec<OutputTarget>)>,
    sessions_closed: usize,
    images_released: usize,
    devices_opened: usize,
    devices_closed: usize,
}

/// Shared, cloneable request log
#[derive(Debug, Clone, Default)]
pub struct VirtualLog {
    inner: Arc<Mutex<LogState>>,
}

impl VirtualLog {
    fn state(&self) -> MutexGuard<'_, LogState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn record_repeating(&self, request: &CaptureRequest) {
        self.state().repeating.push(request.clone());
    }

    pub(super) fn record_capture(&self, tag: CaptureTag, request: &CaptureRequest) {
        self.state().captures.push((tag, request.clone()));
    }

    pub(super) fn record_session(&self, purpose: SessionPurpose, outputs: &[OutputTarget]) {
        self.state().sessions.push((purpose, outputs.to_vec()));
    }

    pub(super) fn record_session_closed(&self) {
        self.state().sessions_closed += 1;
    }

    pub(super) fn record_image_released(&self) {
        self.state().images_released += 1;
    }

    pub(super) fn record_device_opened(&self) {
        self.state().devices_opened += 1;
    }

    pub(super) fn record_device_closed(&self) {
        self.state().devices_closed += 1;
    }

    /// Every repeating request issued, oldest first
    pub fn repeating_requests(&self) -> Vec<CaptureRequest> {
        self.state().repeating.clone()
    }

    pub fn last_repeating(&self) -> Option<CaptureRequest> {
        self.state().repeating.last().cloned()
    }

    /// Every one-shot request issued, oldest first
    pub fn captures(&self) -> Vec<(CaptureTag, CaptureRequest)> {
        self.state().captures.clone()
    }

    /// Last one-shot request with the given tag
    pub fn last_capture(&self, tag: CaptureTag) -> Option<CaptureRequest> {
        self.state()
            .captures
            .iter()
            .rev()
            .find(|(t, _)| *t == tag)
            .map(|(_, request)| request.clone())
    }

    /// Sessions requested, including those that failed to configure
    pub fn sessions(&self) -> Vec<(SessionPurpose, Vec<OutputTarget>)> {
        self.state().sessions.clone()
    }

    pub fn sessions_closed(&self) -> usize {
        self.state().sessions_closed
    }

    pub fn images_released(&self) -> usize {
        self.state().images_released
    }

    pub fn devices_opened(&self) -> usize {
        self.state().devices_opened
    }

    pub fn devices_closed(&self) -> usize {
        self.state().devices_closed
    }
}
