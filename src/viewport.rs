//! Mapping between input device (view) space and image space.

use crate::geometry::Point;

const VIEWPORT_SCALE_MIN: f32 = 0.01;
const VIEWPORT_SCALE_MAX: f32 = 16.0;

/// Zoom and pan state of the drawing view.
///
/// `offset` is where the image origin lands in view space and `scale` is view
/// pixels per image pixel. A viewport is a plain value: zooming or panning
/// returns a new one.
///
/// `scale` must be strictly positive. A zero or negative scale is a caller bug
/// and is not checked on the mapping path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    scale: f32,
    offset: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::identity()
    }
}

impl Viewport {
    pub const fn new(scale: f32, offset: Point) -> Self {
        Self { scale, offset }
    }

    pub const fn identity() -> Self {
        Self::new(1.0, Point::ORIGIN)
    }

    pub const fn scale(&self) -> f32 {
        self.scale
    }

    pub const fn offset(&self) -> Point {
        self.offset
    }

    pub fn to_image_space(&self, view_point: Point, image_width: u32, image_height: u32) -> Point {
        to_image_space(view_point, self, image_width, image_height)
    }

    /// Inverse of the unclamped mapping: where an image point shows up in the view.
    pub fn to_view_space(&self, image_point: Point) -> Point {
        Point::new(
            image_point.x * self.scale + self.offset.x,
            image_point.y * self.scale + self.offset.y,
        )
    }

    /// Zooms by `factor` keeping the image point under `anchor` (view space) fixed.
    pub fn zoomed_about(self, anchor: Point, factor: f32) -> Self {
        let next_scale = (self.scale * factor).clamp(VIEWPORT_SCALE_MIN, VIEWPORT_SCALE_MAX);
        let image_x = (anchor.x - self.offset.x) / self.scale;
        let image_y = (anchor.y - self.offset.y) / self.scale;
        Self::new(
            next_scale,
            Point::new(anchor.x - image_x * next_scale, anchor.y - image_y * next_scale),
        )
    }

    pub fn panned_by(self, dx: f32, dy: f32) -> Self {
        Self::new(self.scale, Point::new(self.offset.x + dx, self.offset.y + dy))
    }
}

/// Maps a view-space point into image space and clamps it to the image.
///
/// The result always lies within `[0, width - 1] x [0, height - 1]`.
pub fn to_image_space(
    view_point: Point,
    viewport: &Viewport,
    image_width: u32,
    image_height: u32,
) -> Point {
    let x = (view_point.x - viewport.offset.x) / viewport.scale;
    let y = (view_point.y - viewport.offset.y) / viewport.scale;
    Point::new(
        clamp_axis(x, image_width),
        clamp_axis(y, image_height),
    )
}

fn clamp_axis(value: f32, dimension: u32) -> f32 {
    let max = dimension.saturating_sub(1) as f32;
    // f32::max drops NaN, so a NaN coordinate lands on 0.
    value.max(0.0).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_image_space_undoes_offset_then_scale() {
        let viewport = Viewport::new(2.0, Point::new(10.0, 20.0));
        let point = to_image_space(Point::new(30.0, 40.0), &viewport, 100, 100);
        assert_eq!(point, Point::new(10.0, 10.0));
    }

    #[test]
    fn to_image_space_clamps_outside_points_to_image_edges() {
        let viewport = Viewport::identity();
        assert_eq!(
            to_image_space(Point::new(-50.0, 500.0), &viewport, 64, 48),
            Point::new(0.0, 47.0)
        );
    }

    #[test]
    fn to_image_space_stays_in_bounds_for_any_point_and_scale() {
        let scales = [0.01, 0.5, 1.0, 3.0, 16.0];
        let coords = [-1.0e6, -3.5, 0.0, 7.25, 99.9, 1.0e6, f32::NAN];
        for &scale in &scales {
            let viewport = Viewport::new(scale, Point::new(12.0, -7.0));
            for &x in &coords {
                for &y in &coords {
                    let mapped = to_image_space(Point::new(x, y), &viewport, 40, 30);
                    assert!((0.0..=39.0).contains(&mapped.x), "x out of range: {mapped:?}");
                    assert!((0.0..=29.0).contains(&mapped.y), "y out of range: {mapped:?}");
                }
            }
        }
    }

    #[test]
    fn zoomed_about_keeps_anchor_fixed() {
        let viewport = Viewport::new(1.5, Point::new(30.0, 10.0));
        let anchor = Point::new(200.0, 120.0);
        let before = to_image_space(anchor, &viewport, 10_000, 10_000);
        let zoomed = viewport.zoomed_about(anchor, 2.0);
        let after = to_image_space(anchor, &zoomed, 10_000, 10_000);
        assert!((before.x - after.x).abs() < 1e-3);
        assert!((before.y - after.y).abs() < 1e-3);
        assert_eq!(zoomed.scale(), 3.0);
    }

    #[test]
    fn zoomed_about_clamps_scale() {
        let viewport = Viewport::identity().zoomed_about(Point::ORIGIN, 1000.0);
        assert_eq!(viewport.scale(), VIEWPORT_SCALE_MAX);
    }

    #[test]
    fn to_view_space_inverts_unclamped_mapping() {
        let viewport = Viewport::new(4.0, Point::new(-8.0, 3.0));
        let image_point = Point::new(5.0, 6.0);
        let view_point = viewport.to_view_space(image_point);
        assert_eq!(viewport.to_image_space(view_point, 100, 100), image_point);
    }

    #[test]
    fn panned_by_returns_new_value() {
        let viewport = Viewport::identity();
        let panned = viewport.panned_by(5.0, -2.0);
        assert_eq!(viewport.offset(), Point::ORIGIN);
        assert_eq!(panned.offset(), Point::new(5.0, -2.0));
    }
}
