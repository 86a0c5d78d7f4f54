// SPDX-License-Identifier: MPL-2.0

//! Zoom crop regions and preview transforms
//!
//! Two pure computations live here:
//!
//! - [`compute_crop_region`]: the sensor sub-rectangle that implements digital
//!   zoom, always centered on the optical center of the active array.
//! - [`compute_transform`]: the matrix applied to the preview surface so that a
//!   landscape sensor buffer fills a view shown at any display rotation.
//!
//! The matrix follows the usual 2D graphics convention of `post_*` operations:
//! each call appends a transform that is applied after everything already in
//! the matrix.

use std::fmt;

/// Degrees for each display rotation quadrant (0 = natural orientation)
pub const ORIENTATIONS: [u32; 4] = [0, 90, 180, 270];

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Integer rectangle in sensor pixel coordinates (right/bottom exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle anchored at the origin
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Center with doubled coordinates, exact for odd dimensions
    pub fn center_x2(&self) -> (i32, i32) {
        (self.left + self.right, self.top + self.bottom)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Floating point rectangle in view coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectF {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl RectF {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) * 0.5
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) * 0.5
    }

    pub fn offset(&mut self, dx: f32, dy: f32) {
        self.left += dx;
        self.right += dx;
        self.top += dy;
        self.bottom += dy;
    }

    /// Whether `other` lies inside this rectangle, allowing `epsilon` slack
    pub fn contains_rect(&self, other: &RectF, epsilon: f32) -> bool {
        self.left <= other.left + epsilon
            && self.top <= other.top + epsilon
            && self.right + epsilon >= other.right
            && self.bottom + epsilon >= other.bottom
    }
}

/// Display rotation quadrant of the preview surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplayRotation {
    #[default]
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl DisplayRotation {
    /// Quadrant index as reported by the display (values wrap modulo 4)
    pub fn from_quadrant(quadrant: u32) -> Self {
        match quadrant % 4 {
            1 => DisplayRotation::Rotation90,
            2 => DisplayRotation::Rotation180,
            3 => DisplayRotation::Rotation270,
            _ => DisplayRotation::Rotation0,
        }
    }

    pub fn quadrant(&self) -> u32 {
        match self {
            DisplayRotation::Rotation0 => 0,
            DisplayRotation::Rotation90 => 1,
            DisplayRotation::Rotation180 => 2,
            DisplayRotation::Rotation270 => 3,
        }
    }

    pub fn degrees(&self) -> u32 {
        ORIENTATIONS[self.quadrant() as usize]
    }

    /// 90° and 270° swap width and height between buffer and view
    pub fn swaps_dimensions(&self) -> bool {
        matches!(
            self,
            DisplayRotation::Rotation90 | DisplayRotation::Rotation270
        )
    }
}

impl fmt::Display for DisplayRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// 2D affine transform
///
/// Stored row-major as `[sx, kx, tx, ky, sy, ty]`, mapping
/// `x' = sx*x + kx*y + tx` and `y' = ky*x + sy*y + ty`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    values: [f32; 6],
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    pub const fn identity() -> Self {
        Self {
            values: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        }
    }

    pub fn values(&self) -> [f32; 6] {
        self.values
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Replace this matrix with one mapping `src` onto `dst`, scaling each axis
    /// independently (fill). Returns false and resets to identity if `src` is empty.
    pub fn set_rect_to_rect(&mut self, src: &RectF, dst: &RectF) -> bool {
        if src.width() <= 0.0 || src.height() <= 0.0 {
            *self = Self::identity();
            return false;
        }
        let sx = dst.width() / src.width();
        let sy = dst.height() / src.height();
        self.values = [
            sx,
            0.0,
            dst.left - src.left * sx,
            0.0,
            sy,
            dst.top - src.top * sy,
        ];
        true
    }

    /// Append `other` so that it is applied after this matrix
    pub fn post_concat(&mut self, other: &Matrix) {
        let [a, b, c, d, e, f] = self.values;
        let [oa, ob, oc, od, oe, of] = other.values;
        self.values = [
            oa * a + ob * d,
            oa * b + ob * e,
            oa * c + ob * f + oc,
            od * a + oe * d,
            od * b + oe * e,
            od * c + oe * f + of,
        ];
    }

    pub fn post_scale(&mut self, sx: f32, sy: f32, px: f32, py: f32) {
        let scale = Matrix {
            values: [sx, 0.0, px - sx * px, 0.0, sy, py - sy * py],
        };
        self.post_concat(&scale);
    }

    /// Append a clockwise rotation (screen coordinates, y down) about a pivot
    pub fn post_rotate(&mut self, degrees: f32, px: f32, py: f32) {
        let (sin, cos) = sin_cos_degrees(degrees);
        let rotate = Matrix {
            values: [
                cos,
                -sin,
                sin * py + (1.0 - cos) * px,
                sin,
                cos,
                -sin * px + (1.0 - cos) * py,
            ],
        };
        self.post_concat(&rotate);
    }

    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.values;
        (a * x + b * y + c, d * x + e * y + f)
    }

    /// Bounding box of the mapped corners of `rect`
    pub fn map_rect(&self, rect: &RectF) -> RectF {
        let corners = [
            self.map_point(rect.left, rect.top),
            self.map_point(rect.right, rect.top),
            self.map_point(rect.left, rect.bottom),
            self.map_point(rect.right, rect.bottom),
        ];
        let mut out = RectF::new(f32::MAX, f32::MAX, f32::MIN, f32::MIN);
        for (x, y) in corners {
            out.left = out.left.min(x);
            out.top = out.top.min(y);
            out.right = out.right.max(x);
            out.bottom = out.bottom.max(y);
        }
        out
    }
}

// Exact values on quarter turns keep rotated rectangles axis-aligned.
fn sin_cos_degrees(degrees: f32) -> (f32, f32) {
    let normalized = degrees.rem_euclid(360.0);
    if normalized == 0.0 {
        (0.0, 1.0)
    } else if normalized == 90.0 {
        (1.0, 0.0)
    } else if normalized == 180.0 {
        (0.0, -1.0)
    } else if normalized == 270.0 {
        (-1.0, 0.0)
    } else {
        normalized.to_radians().sin_cos()
    }
}

/// Clamp a requested zoom factor into `[1.0, max_zoom]`
///
/// Non-finite requests collapse to 1.0; a `max_zoom` below 1.0 is treated as 1.0.
pub fn clamp_zoom(zoom: f32, max_zoom: f32) -> f32 {
    if !zoom.is_finite() {
        return 1.0;
    }
    let max_zoom = if max_zoom.is_finite() {
        max_zoom.max(1.0)
    } else {
        1.0
    };
    zoom.clamp(1.0, max_zoom)
}

/// Sensor crop rectangle for a zoom factor
///
/// The result is centered on the active array and measures `sensor / zoom` in
/// each dimension, within one pixel. Returns `None` for zoom factors that are
/// not strictly positive; callers clamp with [`clamp_zoom`] beforehand.
pub fn compute_crop_region(sensor: Rect, zoom: f32) -> Option<Rect> {
    if !zoom.is_finite() || zoom <= 0.0 {
        return None;
    }

    let center_x = sensor.left + sensor.width() / 2;
    let center_y = sensor.top + sensor.height() / 2;
    let delta_x = (0.5 * sensor.width() as f32 / zoom).round() as i32;
    let delta_y = (0.5 * sensor.height() as f32 / zoom).round() as i32;

    Some(Rect::new(
        center_x - delta_x,
        center_y - delta_y,
        center_x + delta_x,
        center_y + delta_y,
    ))
}

/// Transform for the preview surface
///
/// `buffer` is the sensor output size, which is delivered in landscape no
/// matter how the device is held. At 90° and 270° the buffer is centered on the
/// view, stretched to it, scaled up by the larger fill factor and rotated back
/// upright. At 180° the content is only turned around the view center.
pub fn compute_transform(view: Size, buffer: Size, rotation: DisplayRotation) -> Matrix {
    let mut matrix = Matrix::identity();
    let view_rect = RectF::new(0.0, 0.0, view.width as f32, view.height as f32);
    let center_x = view_rect.center_x();
    let center_y = view_rect.center_y();

    match rotation {
        DisplayRotation::Rotation90 | DisplayRotation::Rotation270 => {
            if buffer.width == 0 || buffer.height == 0 {
                return matrix;
            }
            let mut buffer_rect = RectF::new(0.0, 0.0, buffer.height as f32, buffer.width as f32);
            buffer_rect.offset(
                center_x - buffer_rect.center_x(),
                center_y - buffer_rect.center_y(),
            );
            matrix.set_rect_to_rect(&view_rect, &buffer_rect);
            let scale = f32::max(
                view.height as f32 / buffer.height as f32,
                view.width as f32 / buffer.width as f32,
            );
            matrix.post_scale(scale, scale, center_x, center_y);
            let degrees = 90.0 * (rotation.quadrant() as f32 - 2.0);
            matrix.post_rotate(degrees, center_x, center_y);
        }
        DisplayRotation::Rotation180 => {
            matrix.post_rotate(180.0, center_x, center_y);
        }
        DisplayRotation::Rotation0 => {}
    }

    matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENSOR: Rect = Rect::from_size(4000, 3000);

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_crop_region_no_zoom_is_full_sensor() {
        assert_eq!(compute_crop_region(SENSOR, 1.0), Some(SENSOR));
    }

    #[test]
    fn test_crop_region_centered_and_scaled() {
        let mut zoom = 1.0f32;
        while zoom <= 8.0 {
            let crop = compute_crop_region(SENSOR, zoom).unwrap();
            assert_eq!(crop.center_x2(), SENSOR.center_x2(), "zoom {}", zoom);
            let expected_w = SENSOR.width() as f32 / zoom;
            let expected_h = SENSOR.height() as f32 / zoom;
            assert!((crop.width() as f32 - expected_w).abs() <= 1.0, "zoom {}", zoom);
            assert!((crop.height() as f32 - expected_h).abs() <= 1.0, "zoom {}", zoom);
            zoom += 0.25;
        }
    }

    #[test]
    fn test_crop_region_offset_sensor() {
        let sensor = Rect::new(8, 4, 4008, 3004);
        let crop = compute_crop_region(sensor, 2.0).unwrap();
        assert_eq!(crop, Rect::new(1008, 754, 3008, 2254));
        assert_eq!(crop.center_x2(), sensor.center_x2());
    }

    #[test]
    fn test_crop_region_monotonic() {
        let mut previous = compute_crop_region(SENSOR, 1.0).unwrap().area();
        for step in 1..=70 {
            let zoom = 1.0 + step as f32 * 0.1;
            let area = compute_crop_region(SENSOR, zoom).unwrap().area();
            assert!(area < previous, "zoom {} did not shrink crop", zoom);
            previous = area;
        }
    }

    #[test]
    fn test_crop_region_rejects_non_positive_zoom() {
        assert_eq!(compute_crop_region(SENSOR, 0.0), None);
        assert_eq!(compute_crop_region(SENSOR, -2.0), None);
        assert_eq!(compute_crop_region(SENSOR, f32::NAN), None);
    }

    #[test]
    fn test_clamp_zoom() {
        assert_eq!(clamp_zoom(0.5, 4.0), 1.0);
        assert_eq!(clamp_zoom(2.5, 4.0), 2.5);
        assert_eq!(clamp_zoom(9.0, 4.0), 4.0);
        assert_eq!(clamp_zoom(3.0, 0.5), 1.0);
        assert_eq!(clamp_zoom(f32::INFINITY, 4.0), 1.0);
    }

    #[test]
    fn test_transform_rotation_0_is_identity() {
        let m = compute_transform(
            Size::new(1080, 1920),
            Size::new(1920, 1080),
            DisplayRotation::Rotation0,
        );
        assert!(m.is_identity());
    }

    #[test]
    fn test_transform_rotation_180() {
        let m = compute_transform(
            Size::new(1080, 1920),
            Size::new(1920, 1080),
            DisplayRotation::Rotation180,
        );
        let (x, y) = m.map_point(0.0, 0.0);
        assert!(approx(x, 1080.0) && approx(y, 1920.0));
        let (x, y) = m.map_point(540.0, 960.0);
        assert!(approx(x, 540.0) && approx(y, 960.0));
        let [sx, kx, _, ky, sy, _] = m.values();
        assert_eq!((sx, kx, ky, sy), (-1.0, 0.0, 0.0, -1.0));
    }

    #[test]
    fn test_transform_quarter_turns_fill_view() {
        let views = [Size::new(1920, 1080), Size::new(1280, 720), Size::new(800, 800)];
        let buffers = [Size::new(1920, 1080), Size::new(640, 480), Size::new(4000, 3000)];
        for rotation in [DisplayRotation::Rotation90, DisplayRotation::Rotation270] {
            for view in views {
                for buffer in buffers {
                    let m = compute_transform(view, buffer, rotation);
                    let view_rect = RectF::new(0.0, 0.0, view.width as f32, view.height as f32);
                    let mapped = m.map_rect(&view_rect);
                    assert!(
                        mapped.contains_rect(&view_rect, 1e-2),
                        "{} view {} buffer {} mapped {:?}",
                        rotation,
                        view,
                        buffer,
                        mapped
                    );
                }
            }
        }
    }

    #[test]
    fn test_display_rotation_table() {
        for quadrant in 0..4 {
            let rotation = DisplayRotation::from_quadrant(quadrant);
            assert_eq!(rotation.quadrant(), quadrant);
            assert_eq!(rotation.degrees(), ORIENTATIONS[quadrant as usize]);
        }
        assert!(DisplayRotation::Rotation270.swaps_dimensions());
        assert!(!DisplayRotation::Rotation180.swaps_dimensions());
    }
}
