//! Raster surface interface consumed by the renderer, tools and flood fill.
//!
//! The engine never owns long-lived raster memory. Hosts hand in a surface per
//! call; `ImageSurface` is the bundled software implementation.

mod image_surface;
mod pixel_buffer;
#[cfg(test)]
pub(crate) mod recording;

use std::f32::consts::SQRT_2;
use std::sync::Arc;

use image::RgbaImage;

use crate::geometry::{Argb, Point};

pub use image_surface::ImageSurface;
pub use pixel_buffer::PixelBuffer;

/// Compositing rule applied when drawing onto a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    SourceOver,
    Multiply,
    Screen,
    Darken,
    Lighten,
    /// Removes destination alpha under the source coverage.
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    Butt,
    #[default]
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    Miter,
    #[default]
    Round,
    Bevel,
}

/// Longest miter, as a multiple of half the stroke width, before a join is
/// expected to fall back to a bevel.
pub const MITER_LIMIT: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Argb,
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub blend: BlendMode,
}

impl StrokeStyle {
    pub const fn new(color: Argb, width: f32) -> Self {
        Self {
            color,
            width,
            cap: LineCap::Round,
            join: LineJoin::Round,
            blend: BlendMode::SourceOver,
        }
    }

    /// How far paint may land from the stroked points on either axis.
    ///
    /// Square caps reach the corner of a half-width square past each end;
    /// miter joins reach up to `MITER_LIMIT` half-widths.
    pub fn reach(&self) -> f32 {
        let half = self.width / 2.0;
        let cap = match self.cap {
            LineCap::Square => half * SQRT_2,
            LineCap::Butt | LineCap::Round => half,
        };
        match self.join {
            LineJoin::Miter => cap.max(half * MITER_LIMIT),
            LineJoin::Round | LineJoin::Bevel => cap,
        }
    }
}

/// Bitmap stamped along a path by texture brushes.
#[derive(Debug, Clone, PartialEq)]
pub struct StampImage {
    width: u32,
    height: u32,
    pixels: Vec<Argb>,
}

impl StampImage {
    /// Returns `None` when the pixel count does not match the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<Argb>) -> Option<Self> {
        let expected = usize::try_from(width)
            .ok()?
            .checked_mul(usize::try_from(height).ok()?)?;
        if width == 0 || height == 0 || pixels.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn from_rgba_image(image: &RgbaImage) -> Option<Self> {
        let pixels = image
            .pixels()
            .map(|pixel| Argb::from_rgba_bytes(pixel.0))
            .collect();
        Self::new(image.width(), image.height(), pixels)
    }

    /// Soft round dab: opaque core fading out over the outer third.
    pub fn soft_disc(diameter: u32) -> Self {
        let diameter = diameter.max(1);
        let radius = diameter as f32 / 2.0;
        let mut pixels = Vec::with_capacity((diameter * diameter) as usize);
        for y in 0..diameter {
            for x in 0..diameter {
                let dx = x as f32 + 0.5 - radius;
                let dy = y as f32 + 0.5 - radius;
                let falloff = 1.0 - ((dx.hypot(dy) / radius - 0.66) / 0.34).clamp(0.0, 1.0);
                pixels.push(Argb::from_argb((falloff * 255.0).round() as u8, 0, 0, 0));
            }
        }
        Self {
            width: diameter,
            height: diameter,
            pixels,
        }
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Argb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }
}

pub type SharedStamp = Arc<StampImage>;

/// One placement of a stamp image.
///
/// The stamp covers a `size` x `size` square centered on `center`, rotated by
/// `rotation` radians about that center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampPlacement {
    pub center: Point,
    pub size: f32,
    pub rotation: f32,
    pub opacity: f32,
    /// Replaces the stamp's color channels, keeping its alpha as a mask.
    pub tint: Option<Argb>,
    pub blend: BlendMode,
}

impl StampPlacement {
    /// Translate to the position, rotate, then translate back by half the stamp size.
    pub fn local_to_image(&self, local: Point) -> Point {
        let half = self.size / 2.0;
        let (sin, cos) = self.rotation.sin_cos();
        let x = local.x - half;
        let y = local.y - half;
        Point::new(
            self.center.x + x * cos - y * sin,
            self.center.y + x * sin + y * cos,
        )
    }

    pub fn image_to_local(&self, point: Point) -> Point {
        let half = self.size / 2.0;
        let (sin, cos) = self.rotation.sin_cos();
        let x = point.x - self.center.x;
        let y = point.y - self.center.y;
        Point::new(x * cos + y * sin + half, -x * sin + y * cos + half)
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            self.local_to_image(Point::new(0.0, 0.0)),
            self.local_to_image(Point::new(self.size, 0.0)),
            self.local_to_image(Point::new(self.size, self.size)),
            self.local_to_image(Point::new(0.0, self.size)),
        ]
    }
}

/// Drawing target handed to the engine for the duration of one call.
pub trait RasterSurface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Strokes an open polyline. A single point draws a dot.
    fn stroke_polyline(&mut self, points: &[Point], style: &StrokeStyle);

    fn fill_polygon(&mut self, points: &[Point], color: Argb, blend: BlendMode);

    fn draw_stamp(&mut self, stamp: &StampImage, placement: &StampPlacement);

    /// Resets every pixel to transparent.
    fn clear(&mut self);

    /// Row-major packed pixels, `width * height` entries.
    fn read_pixels(&self) -> Vec<Argb>;

    fn write_pixels(&mut self, pixels: &[Argb]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_placement_round_trips_between_local_and_image_space() {
        let placement = StampPlacement {
            center: Point::new(40.0, 25.0),
            size: 10.0,
            rotation: 0.7,
            opacity: 1.0,
            tint: None,
            blend: BlendMode::SourceOver,
        };
        let local = Point::new(2.0, 8.0);
        let back = placement.image_to_local(placement.local_to_image(local));
        assert!((back.x - local.x).abs() < 1e-4);
        assert!((back.y - local.y).abs() < 1e-4);
    }

    #[test]
    fn stamp_placement_rotates_about_its_own_center() {
        let placement = StampPlacement {
            center: Point::new(5.0, 5.0),
            size: 4.0,
            rotation: std::f32::consts::FRAC_PI_2,
            opacity: 1.0,
            tint: None,
            blend: BlendMode::SourceOver,
        };
        let center = placement.local_to_image(Point::new(2.0, 2.0));
        assert!((center.x - 5.0).abs() < 1e-5 && (center.y - 5.0).abs() < 1e-5);
        let corner = placement.local_to_image(Point::new(0.0, 0.0));
        assert!((corner.x - 7.0).abs() < 1e-5);
        assert!((corner.y - 3.0).abs() < 1e-5);
    }

    #[test]
    fn stroke_reach_grows_for_square_caps_and_miter_joins() {
        let mut style = StrokeStyle::new(Argb::BLACK, 10.0);
        assert_eq!(style.reach(), 5.0);

        style.cap = LineCap::Square;
        assert!((style.reach() - 5.0 * SQRT_2).abs() < 1e-5);

        style.join = LineJoin::Miter;
        assert_eq!(style.reach(), 5.0 * MITER_LIMIT);
    }

    #[test]
    fn stamp_image_rejects_mismatched_pixel_count() {
        assert!(StampImage::new(2, 2, vec![Argb::BLACK; 3]).is_none());
        assert!(StampImage::new(0, 2, Vec::new()).is_none());
        assert!(StampImage::new(2, 1, vec![Argb::BLACK; 2]).is_some());
    }
}
