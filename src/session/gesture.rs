// SPDX-License-Identifier: GPL-3.0-only

//! Pinch-to-zoom gesture tracking
//!
//! Zoom moves by a fixed [`ZOOM_STEP`] per move event in the direction the
//! two fingers travelled, independent of how far they moved.

use crate::constants::{MIN_ZOOM, ZOOM_STEP};

/// Pointer action reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchAction {
    Down,
    Move,
    Up,
    Cancel,
}

/// One touch event with the position of every active pointer
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    pub action: TouchAction,
    pub pointers: Vec<(f32, f32)>,
}

impl TouchEvent {
    pub fn new(action: TouchAction, pointers: Vec<(f32, f32)>) -> Self {
        Self { action, pointers }
    }

    /// Distance between the first two pointers
    pub fn finger_spacing(&self) -> Option<f32> {
        match self.pointers.as_slice() {
            [(x0, y0), (x1, y1), ..] => Some((x1 - x0).hypot(y1 - y0)),
            _ => None,
        }
    }
}

/// What a touch event asks the controller to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    /// Nothing to do
    Ignored,
    /// Single pointer released without a pinch
    Touched,
    /// Pinch move; `increasing` is set when the zoom was stepped
    Zoom { zoom: f32, increasing: Option<bool> },
}

/// Tracks the finger spacing between move events
#[derive(Debug, Clone, Default)]
pub struct ZoomGesture {
    finger_spacing: f32,
}

impl ZoomGesture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last recorded spacing, 0 when no pinch is active
    pub fn finger_spacing(&self) -> f32 {
        self.finger_spacing
    }

    pub fn reset(&mut self) {
        self.finger_spacing = 0.0;
    }

    /// Feed one touch event
    ///
    /// `enabled` is the pinch-to-zoom toggle. The returned zoom always lies in
    /// `[1.0, max_zoom]`.
    pub fn on_touch(
        &mut self,
        event: &TouchEvent,
        enabled: bool,
        current_zoom: f32,
        max_zoom: f32,
    ) -> GestureOutcome {
        let spacing = match event.finger_spacing() {
            Some(spacing) if enabled => spacing,
            _ => {
                self.reset();
                return if event.action == TouchAction::Up {
                    GestureOutcome::Touched
                } else {
                    GestureOutcome::Ignored
                };
            }
        };

        if event.action != TouchAction::Move {
            return GestureOutcome::Ignored;
        }

        let previous = std::mem::replace(&mut self.finger_spacing, spacing);
        if previous == 0.0 {
            return GestureOutcome::Ignored;
        }

        let max_zoom = max_zoom.max(MIN_ZOOM);
        let mut zoom = current_zoom.clamp(MIN_ZOOM, max_zoom);
        let mut increasing = None;

        if spacing > previous && zoom < max_zoom {
            zoom = step(zoom, ZOOM_STEP).min(max_zoom);
            increasing = Some(true);
        } else if spacing < previous && zoom > MIN_ZOOM {
            zoom = step(zoom, -ZOOM_STEP).max(MIN_ZOOM);
            increasing = Some(false);
        }

        GestureOutcome::Zoom { zoom, increasing }
    }
}

/// Add `delta` and round to four decimals so repeated steps do not drift
fn step(zoom: f32, delta: f32) -> f32 {
    ((zoom + delta) * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pinch(spacing: f32) -> TouchEvent {
        TouchEvent::new(TouchAction::Move, vec![(0.0, 0.0), (spacing, 0.0)])
    }

    #[test]
    fn test_first_move_only_records_baseline() {
        let mut gesture = ZoomGesture::new();
        let outcome = gesture.on_touch(&pinch(10.0), true, 1.0, 4.0);
        assert_eq!(outcome, GestureOutcome::Ignored);
        assert_eq!(gesture.finger_spacing(), 10.0);
    }

    #[test]
    fn test_spread_steps_exactly() {
        let mut gesture = ZoomGesture::new();
        let mut zoom = 1.0;
        let mut seen = vec![zoom];
        for spacing in [10.0, 20.0, 30.0] {
            if let GestureOutcome::Zoom { zoom: z, .. } = gesture.on_touch(&pinch(spacing), true, zoom, 4.0) {
                zoom = z;
                seen.push(z);
            }
        }
        assert_eq!(seen, vec![1.0, 1.1, 1.2]);
    }

    #[test]
    fn test_unchanged_spacing_keeps_zoom() {
        let mut gesture = ZoomGesture::new();
        gesture.on_touch(&pinch(40.0), true, 1.5, 4.0);
        assert_eq!(
            gesture.on_touch(&pinch(40.0), true, 1.5, 4.0),
            GestureOutcome::Zoom {
                zoom: 1.5,
                increasing: None
            }
        );
    }

    #[test]
    fn test_zoom_stays_in_bounds() {
        let mut gesture = ZoomGesture::new();
        let mut zoom = 1.0;
        for i in 1..200 {
            if let GestureOutcome::Zoom { zoom: z, .. } = gesture.on_touch(&pinch(i as f32), true, zoom, 2.5) {
                zoom = z;
            }
            assert!(zoom <= 2.5);
        }
        assert_eq!(zoom, 2.5);

        for i in (1..200).rev() {
            if let GestureOutcome::Zoom { zoom: z, .. } = gesture.on_touch(&pinch(i as f32), true, zoom, 2.5) {
                zoom = z;
            }
            assert!(zoom >= 1.0);
        }
        assert_eq!(zoom, 1.0);
    }

    #[test]
    fn test_pinch_direction_reported() {
        let mut gesture = ZoomGesture::new();
        gesture.on_touch(&pinch(50.0), true, 2.0, 4.0);
        assert_eq!(
            gesture.on_touch(&pinch(40.0), true, 2.0, 4.0),
            GestureOutcome::Zoom {
                zoom: 1.9,
                increasing: Some(false)
            }
        );
    }

    #[test]
    fn test_single_pointer_release_is_touch() {
        let mut gesture = ZoomGesture::new();
        gesture.on_touch(&pinch(50.0), true, 1.0, 4.0);
        let release = TouchEvent::new(TouchAction::Up, vec![(3.0, 4.0)]);
        assert_eq!(gesture.on_touch(&release, true, 1.0, 4.0), GestureOutcome::Touched);
        assert_eq!(gesture.finger_spacing(), 0.0);
    }

    #[test]
    fn test_disabled_gesture_resets_baseline() {
        let mut gesture = ZoomGesture::new();
        gesture.on_touch(&pinch(50.0), true, 1.0, 4.0);
        assert_eq!(gesture.on_touch(&pinch(80.0), false, 1.0, 4.0), GestureOutcome::Ignored);
        assert_eq!(gesture.finger_spacing(), 0.0);
    }
}
