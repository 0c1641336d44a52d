use std::f32::consts::{FRAC_1_SQRT_2, TAU};

use rand::Rng;

use super::{Brush, BrushKind, BrushParams, NibShape, ProceduralPattern};
use super::{SMOOTHING_ALPHA, SMOOTHING_WIDTH};
use crate::geometry::{Argb, DirtyRect, Point, Rect};
use crate::path::ShapePath;
use crate::surface::{
    BlendMode, LineCap, LineJoin, RasterSurface, StampImage, StampPlacement, StrokeStyle,
};

/// Distance between consecutive stamps for a given stamp size.
pub fn stamp_spacing(size: f32) -> f32 {
    (size * 0.33).clamp(0.8, 10.0)
}

/// Evenly interpolated stamp positions from `start` towards `end`.
///
/// Emits `max(1, round(distance / spacing))` positions beginning at `start`;
/// `end` itself belongs to the next segment or to the final stamp.
pub fn stamp_between(start: Point, end: Point, size: f32) -> Vec<Point> {
    let step = stamp_spacing(size);
    let steps = ((start.distance(end) / step).round() as usize).max(1);
    (0..steps)
        .map(|index| start.lerp(end, index as f32 / steps as f32))
        .collect()
}

/// Opacity difference of the color alpha and the brush's own opacity.
pub fn stamp_opacity(color_alpha: f32, opacity_diff: f32) -> f32 {
    (color_alpha.max(opacity_diff) - color_alpha.min(opacity_diff)).max(0.0)
}

/// Turns a recorded stroke into draw calls on `surface`.
///
/// Procedural brushes paint their own pattern, texture brushes with an image
/// stamp it along the path, and every other case is a vector stroke. Returns
/// the affected area, or `None` for an empty path.
pub fn render_stroke<S, R>(
    surface: &mut S,
    brush: &Brush,
    params: &BrushParams,
    points: &[Point],
    rng: &mut R,
) -> DirtyRect
where
    S: RasterSurface + ?Sized,
    R: Rng + ?Sized,
{
    let bounds = Rect::bounding(points)?;
    let width = params.width();
    if width <= 0.0 {
        return None;
    }
    let blend = brush.blend_for(params);

    let reach = match &brush.kind {
        BrushKind::Procedural(pattern) => {
            paint_procedural(surface, *pattern, points, params.color, width, blend, rng)
        }
        BrushKind::Texture {
            image: Some(image),
            rotation_randomness,
            opacity_diff,
        } => {
            let stamper = Stamper {
                size: width,
                opacity: stamp_opacity(params.color.alpha_f32(), *opacity_diff),
                tint: params.color,
                blend,
                rotation_randomness: *rotation_randomness,
            };
            stamper.stamp_path(surface, image, points, rng);
            width * FRAC_1_SQRT_2
        }
        BrushKind::Shape(NibShape::Chisel { angle }) => {
            sweep_chisel(surface, points, *angle, params.color, width, blend);
            width / 2.0
        }
        _ => stroke_vector(surface, brush, points, params.color, width, blend),
    };
    Some(bounds.expand(reach))
}

fn stroke_vector<S: RasterSurface + ?Sized>(
    surface: &mut S,
    brush: &Brush,
    points: &[Point],
    color: Argb,
    width: f32,
    blend: BlendMode,
) -> f32 {
    let (cap, join) = brush.cap_and_join();
    let style = StrokeStyle {
        color,
        width,
        cap,
        join,
        blend,
    };
    surface.stroke_polyline(points, &style);

    if brush.smoothing && points.len() > 2 && !brush.is_shape() {
        let softened_alpha = (f32::from(color.alpha()) * SMOOTHING_ALPHA).round() as u8;
        let softened = StrokeStyle {
            color: color.with_alpha(softened_alpha),
            width: width * SMOOTHING_WIDTH,
            ..style
        };
        surface.stroke_polyline(points, &softened);
    }
    style.reach()
}

struct Stamper {
    size: f32,
    opacity: f32,
    tint: Argb,
    blend: BlendMode,
    rotation_randomness: f32,
}

impl Stamper {
    fn stamp_path<S, R>(&self, surface: &mut S, image: &StampImage, points: &[Point], rng: &mut R)
    where
        S: RasterSurface + ?Sized,
        R: Rng + ?Sized,
    {
        for (center, direction) in stamp_positions(points, self.size) {
            self.place(surface, image, center, direction, rng);
        }
    }

    fn place<S, R>(
        &self,
        surface: &mut S,
        image: &StampImage,
        center: Point,
        direction: f32,
        rng: &mut R,
    ) where
        S: RasterSurface + ?Sized,
        R: Rng + ?Sized,
    {
        let jitter = if self.rotation_randomness > 0.0 {
            rng.gen_range(-self.rotation_randomness..=self.rotation_randomness)
        } else {
            0.0
        };
        surface.draw_stamp(
            image,
            &StampPlacement {
                center,
                size: self.size,
                rotation: direction + jitter,
                opacity: self.opacity,
                tint: Some(self.tint),
                blend: self.blend,
            },
        );
    }
}

/// Stamp centers with the direction of the segment they sit on: the
/// `stamp_between` positions of every segment, then the last point.
fn stamp_positions(points: &[Point], size: f32) -> Vec<(Point, f32)> {
    let Some((&last, _)) = points.split_last() else {
        return Vec::new();
    };
    if points.len() == 1 {
        return vec![(last, 0.0)];
    }

    let mut positions = Vec::new();
    for pair in points.windows(2) {
        let direction = pair[0].angle_to(pair[1]);
        positions.extend(
            stamp_between(pair[0], pair[1], size)
                .into_iter()
                .map(|center| (center, direction)),
        );
    }
    let before_last = points[points.len() - 2];
    positions.push((last, before_last.angle_to(last)));
    positions
}

fn dot_style(color: Argb, width: f32, blend: BlendMode) -> StrokeStyle {
    StrokeStyle {
        color,
        width,
        cap: LineCap::Round,
        join: LineJoin::Round,
        blend,
    }
}

fn paint_procedural<S, R>(
    surface: &mut S,
    pattern: ProceduralPattern,
    points: &[Point],
    color: Argb,
    width: f32,
    blend: BlendMode,
    rng: &mut R,
) -> f32
where
    S: RasterSurface + ?Sized,
    R: Rng + ?Sized,
{
    match pattern {
        ProceduralPattern::Spray { density } => {
            let radius = width / 2.0;
            let dot = dot_style(color, (width * 0.08).max(1.0), blend);
            let count = ((width * density).round() as usize).max(1);
            for (center, _) in stamp_positions(points, width) {
                for _ in 0..count {
                    let angle = rng.gen_range(0.0..TAU);
                    let distance = radius * rng.gen::<f32>().sqrt();
                    surface.stroke_polyline(&[center.polar(angle, distance)], &dot);
                }
            }
            radius + dot.width / 2.0
        }
        ProceduralPattern::Dots => {
            let dot = dot_style(color, width, blend);
            let path = ShapePath::polyline(points.to_vec());
            for contour in path.contours() {
                for center in contour.sample_by_arc_length(width * 2.0) {
                    surface.stroke_polyline(&[center], &dot);
                }
            }
            width / 2.0
        }
    }
}

fn sweep_chisel<S: RasterSurface + ?Sized>(
    surface: &mut S,
    points: &[Point],
    angle: f32,
    color: Argb,
    width: f32,
    blend: BlendMode,
) {
    let half = Point::ORIGIN.polar(angle, width / 2.0);
    if let [only] = points {
        let style = StrokeStyle {
            cap: LineCap::Butt,
            ..dot_style(color, (width * 0.15).max(1.0), blend)
        };
        surface.stroke_polyline(&[*only - half, *only + half], &style);
        return;
    }
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        surface.fill_polygon(&[a + half, b + half, b - half, a - half], color, blend);
    }
}
