use std::path::Path;

use image::{ImageFormat, ImageResult, Rgba, RgbaImage};

use super::{BlendMode, LineCap, RasterSurface, StampImage, StampPlacement, StrokeStyle};
use crate::geometry::{Argb, Point, Rect};

/// Software raster surface backed by an `image::RgbaImage` (straight alpha).
///
/// Strokes are anti-aliased by distance to the polyline. Joins always render
/// round; butt and square caps are honored at the two free ends.
#[derive(Debug, Clone)]
pub struct ImageSurface {
    image: RgbaImage,
}

impl ImageSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn filled(width: u32, height: u32, color: Argb) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba(color.to_rgba_bytes())),
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Argb> {
        self.image
            .get_pixel_checked(x, y)
            .map(|pixel| Argb::from_rgba_bytes(pixel.0))
    }

    pub fn save_png(&self, path: &Path) -> ImageResult<()> {
        self.image.save_with_format(path, ImageFormat::Png)
    }

    fn blend_at(&mut self, x: u32, y: u32, color: Argb, coverage: f32, blend: BlendMode) {
        if let Some(pixel) = self.image.get_pixel_mut_checked(x, y) {
            pixel.0 = composite(pixel.0, color, coverage, blend);
        }
    }

    fn span(&self, bounds: Rect) -> Option<(u32, u32, u32, u32)> {
        let (x0, x1) = pixel_span(bounds.left, bounds.right, self.image.width())?;
        let (y0, y1) = pixel_span(bounds.top, bounds.bottom, self.image.height())?;
        Some((x0, x1, y0, y1))
    }
}

impl RasterSurface for ImageSurface {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn stroke_polyline(&mut self, points: &[Point], style: &StrokeStyle) {
        if points.is_empty() || style.width <= 0.0 {
            return;
        }
        let radius = style.width / 2.0;
        let mut points = points.to_vec();
        if style.cap == LineCap::Square {
            extend_free_ends(&mut points, radius);
        }
        let Some(bounds) = Rect::bounding(&points) else {
            return;
        };
        let Some((x0, x1, y0, y1)) = self.span(bounds.expand(radius + 1.0)) else {
            return;
        };

        let mask_width = (x1 - x0 + 1) as usize;
        let mut mask = vec![0.0_f32; mask_width * (y1 - y0 + 1) as usize];
        let segments: Vec<(Point, Point)> = if points.len() == 1 {
            vec![(points[0], points[0])]
        } else {
            points.windows(2).map(|pair| (pair[0], pair[1])).collect()
        };
        let last_segment = segments.len() - 1;
        // Square caps are butt ends on the extended polyline.
        let clip_ends = matches!(style.cap, LineCap::Butt | LineCap::Square);

        for (index, &(a, b)) in segments.iter().enumerate() {
            let Some((sx0, sx1, sy0, sy1)) =
                self.span(Rect::from_points(a, b).expand(radius + 1.0))
            else {
                continue;
            };
            for y in sy0.max(y0)..=sy1.min(y1) {
                for x in sx0.max(x0)..=sx1.min(x1) {
                    let center = Point::new(x as f32 + 0.5, y as f32 + 0.5);
                    let (distance, t) = distance_to_segment(center, a, b);
                    if clip_ends
                        && ((index == 0 && t < 0.0) || (index == last_segment && t > 1.0))
                    {
                        continue;
                    }
                    let coverage = (radius + 0.5 - distance).clamp(0.0, 1.0);
                    let slot = &mut mask[(y - y0) as usize * mask_width + (x - x0) as usize];
                    *slot = slot.max(coverage);
                }
            }
        }

        for y in y0..=y1 {
            for x in x0..=x1 {
                let coverage = mask[(y - y0) as usize * mask_width + (x - x0) as usize];
                if coverage > 0.0 {
                    self.blend_at(x, y, style.color, coverage, style.blend);
                }
            }
        }
    }

    fn fill_polygon(&mut self, points: &[Point], color: Argb, blend: BlendMode) {
        if points.len() < 3 {
            return;
        }
        let Some(bounds) = Rect::bounding(points) else {
            return;
        };
        let Some((x0, x1, y0, y1)) = self.span(bounds) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                if point_in_polygon(Point::new(x as f32 + 0.5, y as f32 + 0.5), points) {
                    self.blend_at(x, y, color, 1.0, blend);
                }
            }
        }
    }

    fn draw_stamp(&mut self, stamp: &StampImage, placement: &StampPlacement) {
        let opacity = placement.opacity.clamp(0.0, 1.0);
        if placement.size <= 0.0 || opacity <= 0.0 {
            return;
        }
        let Some(bounds) = Rect::bounding(&placement.corners()) else {
            return;
        };
        let Some((x0, x1, y0, y1)) = self.span(bounds) else {
            return;
        };
        let scale_x = stamp.width() as f32 / placement.size;
        let scale_y = stamp.height() as f32 / placement.size;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let local = placement.image_to_local(Point::new(x as f32 + 0.5, y as f32 + 0.5));
                if local.x < 0.0
                    || local.y < 0.0
                    || local.x >= placement.size
                    || local.y >= placement.size
                {
                    continue;
                }
                let sample_x = ((local.x * scale_x) as u32).min(stamp.width() - 1);
                let sample_y = ((local.y * scale_y) as u32).min(stamp.height() - 1);
                let Some(source) = stamp.pixel(sample_x, sample_y) else {
                    continue;
                };
                let color = placement
                    .tint
                    .map_or(source, |tint| tint.with_alpha(source.alpha()));
                self.blend_at(x, y, color, opacity, placement.blend);
            }
        }
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    fn read_pixels(&self) -> Vec<Argb> {
        self.image
            .pixels()
            .map(|pixel| Argb::from_rgba_bytes(pixel.0))
            .collect()
    }

    fn write_pixels(&mut self, pixels: &[Argb]) {
        for (target, source) in self.image.pixels_mut().zip(pixels) {
            *target = Rgba(source.to_rgba_bytes());
        }
    }
}

/// Pixel indices whose centers may fall inside `[min, max]`, clipped to `0..limit`.
fn pixel_span(min: f32, max: f32, limit: u32) -> Option<(u32, u32)> {
    if limit == 0 || !min.is_finite() || !max.is_finite() || max < 0.0 {
        return None;
    }
    let start = min.floor().max(0.0);
    let end = max.ceil().min((limit - 1) as f32);
    if start > end {
        return None;
    }
    Some((start as u32, end as u32))
}

/// Distance from `point` to segment `a-b` and the unclamped projection parameter.
fn distance_to_segment(point: Point, a: Point, b: Point) -> (f32, f32) {
    let ab = b - a;
    let length_squared = ab.x * ab.x + ab.y * ab.y;
    if length_squared <= f32::EPSILON {
        return (point.distance(a), 0.0);
    }
    let ap = point - a;
    let t = (ap.x * ab.x + ap.y * ab.y) / length_squared;
    let closest = a + ab * t.clamp(0.0, 1.0);
    (point.distance(closest), t)
}

fn extend_free_ends(points: &mut [Point], amount: f32) {
    let len = points.len();
    if len < 2 {
        return;
    }
    let (first, second) = (points[0], points[1]);
    if first.distance(second) > f32::EPSILON {
        points[0] = second.polar(second.angle_to(first), second.distance(first) + amount);
    }
    let (before_last, last) = (points[len - 2], points[len - 1]);
    if before_last.distance(last) > f32::EPSILON {
        points[len - 1] =
            before_last.polar(before_last.angle_to(last), before_last.distance(last) + amount);
    }
}

fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    let mut inside = false;
    let mut previous = polygon[polygon.len() - 1];
    for &current in polygon {
        if (current.y > point.y) != (previous.y > point.y) {
            let crossing_x = (previous.x - current.x) * (point.y - current.y)
                / (previous.y - current.y)
                + current.x;
            if point.x < crossing_x {
                inside = !inside;
            }
        }
        previous = current;
    }
    inside
}

fn channel_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Composites `source` over a straight-alpha RGBA destination pixel.
fn composite(destination: [u8; 4], source: Argb, coverage: f32, blend: BlendMode) -> [u8; 4] {
    let source_alpha = source.alpha_f32() * coverage.clamp(0.0, 1.0);
    if source_alpha <= 0.0 {
        return destination;
    }
    let destination_alpha = f32::from(destination[3]) / 255.0;
    if blend == BlendMode::Clear {
        let alpha = destination_alpha * (1.0 - source_alpha);
        return [
            destination[0],
            destination[1],
            destination[2],
            channel_to_u8(alpha),
        ];
    }

    let out_alpha = source_alpha + destination_alpha * (1.0 - source_alpha);
    let source_channels = [source.red(), source.green(), source.blue()];
    let mut out = [0_u8; 4];
    for (channel, (&source_channel, &destination_channel)) in source_channels
        .iter()
        .zip(&destination[..3])
        .enumerate()
    {
        let cs = f32::from(source_channel) / 255.0;
        let cd = f32::from(destination_channel) / 255.0;
        let mixed = match blend {
            BlendMode::SourceOver | BlendMode::Clear => cs,
            BlendMode::Multiply => cs * cd,
            BlendMode::Screen => cs + cd - cs * cd,
            BlendMode::Darken => cs.min(cd),
            BlendMode::Lighten => cs.max(cd),
        };
        let premultiplied = source_alpha * (1.0 - destination_alpha) * cs
            + source_alpha * destination_alpha * mixed
            + (1.0 - source_alpha) * destination_alpha * cd;
        out[channel] = channel_to_u8(premultiplied / out_alpha);
    }
    out[3] = channel_to_u8(out_alpha);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Argb = Argb::from_rgb(255, 0, 0);

    #[test]
    fn stroke_polyline_paints_pixels_along_the_line() {
        let mut surface = ImageSurface::filled(20, 20, Argb::WHITE);
        let style = StrokeStyle::new(RED, 3.0);
        surface.stroke_polyline(&[Point::new(2.0, 10.5), Point::new(18.0, 10.5)], &style);

        assert_eq!(surface.pixel(10, 10), Some(RED));
        assert_eq!(surface.pixel(10, 2), Some(Argb::WHITE));
    }

    #[test]
    fn butt_cap_leaves_pixels_past_the_end_untouched() {
        let mut surface = ImageSurface::filled(30, 10, Argb::WHITE);
        let mut style = StrokeStyle::new(RED, 4.0);
        style.cap = LineCap::Butt;
        surface.stroke_polyline(&[Point::new(10.0, 5.0), Point::new(20.0, 5.0)], &style);

        assert_eq!(surface.pixel(15, 4), Some(RED));
        assert_eq!(surface.pixel(8, 4), Some(Argb::WHITE));
        assert_eq!(surface.pixel(21, 4), Some(Argb::WHITE));
    }

    #[test]
    fn square_cap_ends_flat_half_a_width_past_the_end() {
        let mut surface = ImageSurface::filled(40, 12, Argb::WHITE);
        let mut style = StrokeStyle::new(RED, 4.0);
        style.cap = LineCap::Square;
        surface.stroke_polyline(&[Point::new(10.0, 6.0), Point::new(20.0, 6.0)], &style);

        assert_eq!(surface.pixel(21, 4), Some(RED));
        assert_eq!(surface.pixel(21, 7), Some(RED));
        assert_eq!(surface.pixel(8, 4), Some(RED));
        assert_eq!(surface.pixel(22, 6), Some(Argb::WHITE));
        assert_eq!(surface.pixel(7, 6), Some(Argb::WHITE));
    }

    #[test]
    fn fill_polygon_covers_interior() {
        let mut surface = ImageSurface::new(10, 10);
        let square = [
            Point::new(2.0, 2.0),
            Point::new(8.0, 2.0),
            Point::new(8.0, 8.0),
            Point::new(2.0, 8.0),
        ];
        surface.fill_polygon(&square, Argb::BLACK, BlendMode::SourceOver);
        assert_eq!(surface.pixel(5, 5), Some(Argb::BLACK));
        assert_eq!(surface.pixel(0, 0), Some(Argb::TRANSPARENT));
    }

    #[test]
    fn clear_blend_erases_destination_alpha() {
        let mut surface = ImageSurface::filled(10, 10, RED);
        let square = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        surface.fill_polygon(&square, Argb::BLACK, BlendMode::Clear);
        assert_eq!(surface.pixel(4, 4).map(Argb::alpha), Some(0));
    }

    #[test]
    fn draw_stamp_tints_and_scales_opacity() {
        let mut surface = ImageSurface::filled(16, 16, Argb::WHITE);
        let stamp = StampImage::new(2, 2, vec![Argb::BLACK; 4]).expect("valid stamp");
        let placement = StampPlacement {
            center: Point::new(8.0, 8.0),
            size: 6.0,
            rotation: 0.0,
            opacity: 1.0,
            tint: Some(RED),
            blend: BlendMode::SourceOver,
        };
        surface.draw_stamp(&stamp, &placement);
        assert_eq!(surface.pixel(8, 8), Some(RED));
        assert_eq!(surface.pixel(1, 1), Some(Argb::WHITE));
    }

    #[test]
    fn composite_modes_follow_their_channel_rules() {
        let gray = [128, 128, 128, 255];
        let white = Argb::WHITE;
        assert_eq!(composite(gray, white, 1.0, BlendMode::Multiply), gray);
        assert_eq!(
            composite(gray, white, 1.0, BlendMode::Screen),
            [255, 255, 255, 255]
        );
        assert_eq!(composite(gray, white, 1.0, BlendMode::Darken), gray);
        assert_eq!(composite(gray, white, 0.0, BlendMode::SourceOver), gray);
    }

    #[test]
    fn write_pixels_round_trips_through_read_pixels() {
        let mut surface = ImageSurface::new(3, 2);
        let pixels: Vec<Argb> = (0..6).map(|i| Argb::from_argb(255, i * 10, 0, 0)).collect();
        surface.write_pixels(&pixels);
        assert_eq!(surface.read_pixels(), pixels);
    }
}
