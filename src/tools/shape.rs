use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, FRAC_PI_6, PI, TAU};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::brush::{Brush, BrushParams};
use crate::geometry::{merge_dirty, DirtyRect, Point, Rect};
use crate::gesture::{GestureEvent, GestureSession};
use crate::path::{Contour, ShapePath};
use crate::surface::{RasterSurface, StrokeStyle};

pub const MIN_POLYGON_SIDES: u32 = 3;
pub const DEFAULT_POLYGON_SIDES: u32 = 6;
const STAR_POINTS: u32 = 5;
const STAR_INNER_RATIO: f32 = 0.4;
const ARROW_HEAD_MAX: f32 = 50.0;
/// Arc-length step of the committed stroke, as a fraction of the brush size.
const COMMIT_STEP_RATIO: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeType {
    #[default]
    Rectangle,
    Circle,
    Ellipse,
    Line,
    Triangle,
    Arrow,
    Star,
    Polygon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeConstraints {
    pub maintain_aspect_ratio: bool,
    pub snap_to_angles: bool,
    polygon_sides: u32,
}

impl Default for ShapeConstraints {
    fn default() -> Self {
        Self {
            maintain_aspect_ratio: false,
            snap_to_angles: false,
            polygon_sides: DEFAULT_POLYGON_SIDES,
        }
    }
}

impl ShapeConstraints {
    pub const fn polygon_sides(&self) -> u32 {
        self.polygon_sides
    }

    pub fn set_polygon_sides(&mut self, sides: u32) {
        self.polygon_sides = sides.max(MIN_POLYGON_SIDES);
    }

    pub fn with_polygon_sides(mut self, sides: u32) -> Self {
        self.set_polygon_sides(sides);
        self
    }
}

impl ShapeType {
    pub const ALL: [ShapeType; 8] = [
        Self::Rectangle,
        Self::Circle,
        Self::Ellipse,
        Self::Line,
        Self::Triangle,
        Self::Arrow,
        Self::Star,
        Self::Polygon,
    ];

    /// Geometry for a drag from `start` to `end`.
    pub fn create_path(
        self,
        start: Point,
        end: Point,
        constraints: &ShapeConstraints,
    ) -> ShapePath {
        match self {
            Self::Rectangle => {
                let end = square_end(start, end, constraints);
                ShapePath::polygon(vec![
                    start,
                    Point::new(end.x, start.y),
                    end,
                    Point::new(start.x, end.y),
                ])
            }
            Self::Circle => {
                let radius = start.distance(end) / 2.0;
                ShapePath::polygon(oval(start.midpoint(end), radius, radius))
            }
            Self::Ellipse => {
                let bounds = Rect::from_points(start, square_end(start, end, constraints));
                ShapePath::polygon(oval(
                    bounds.center(),
                    bounds.width() / 2.0,
                    bounds.height() / 2.0,
                ))
            }
            Self::Line => ShapePath::polyline(vec![start, snapped_end(start, end, constraints)]),
            Self::Triangle => {
                let bounds = Rect::from_points(start, square_end(start, end, constraints));
                ShapePath::polygon(vec![
                    Point::new(bounds.center().x, bounds.top),
                    Point::new(bounds.right, bounds.bottom),
                    Point::new(bounds.left, bounds.bottom),
                ])
            }
            Self::Arrow => arrow(start, snapped_end(start, end, constraints)),
            Self::Star => {
                let bounds = Rect::from_points(start, square_end(start, end, constraints));
                ShapePath::polygon(star(bounds))
            }
            Self::Polygon => {
                let bounds = Rect::from_points(start, square_end(start, end, constraints));
                ShapePath::polygon(regular_polygon(bounds, constraints.polygon_sides()))
            }
        }
    }
}

/// Snaps the segment `start -> end` to the nearest multiple of 45 degrees and
/// projects its length onto that direction.
pub fn snap_to_angle(start: Point, end: Point) -> Point {
    let raw = start.angle_to(end);
    let snapped = (-3..=4)
        .map(|step| step as f32 * FRAC_PI_4)
        .min_by(|a, b| angular_distance(raw, *a).total_cmp(&angular_distance(raw, *b)))
        .unwrap_or(0.0);
    let delta = end - start;
    let length = delta.x * snapped.cos() + delta.y * snapped.sin();
    start.polar(snapped, length)
}

fn angular_distance(a: f32, b: f32) -> f32 {
    ((a - b + PI).rem_euclid(TAU) - PI).abs()
}

fn snapped_end(start: Point, end: Point, constraints: &ShapeConstraints) -> Point {
    if constraints.snap_to_angles {
        snap_to_angle(start, end)
    } else {
        end
    }
}

/// With the aspect lock on, shrinks the drag to a square on its shorter side,
/// keeping the drag direction.
fn square_end(start: Point, end: Point, constraints: &ShapeConstraints) -> Point {
    if !constraints.maintain_aspect_ratio {
        return end;
    }
    let delta = end - start;
    let side = delta.x.abs().min(delta.y.abs());
    Point::new(
        start.x + side * delta.x.signum(),
        start.y + side * delta.y.signum(),
    )
}

fn oval(center: Point, radius_x: f32, radius_y: f32) -> Vec<Point> {
    let segments = ((radius_x + radius_y) * PI / 3.0).ceil().clamp(24.0, 256.0) as u32;
    (0..segments)
        .map(|index| {
            let angle = TAU * index as f32 / segments as f32;
            Point::new(
                center.x + radius_x * angle.cos(),
                center.y + radius_y * angle.sin(),
            )
        })
        .collect()
}

fn arrow(start: Point, end: Point) -> ShapePath {
    let mut path = ShapePath::polyline(vec![start, end]);
    let length = start.distance(end);
    if length <= f32::EPSILON {
        return path;
    }
    let head = (length * 0.3).min(ARROW_HEAD_MAX);
    let back = end.angle_to(start);
    path.move_to(end.polar(back + FRAC_PI_6, head))
        .line_to(end)
        .line_to(end.polar(back - FRAC_PI_6, head));
    path
}

fn star(bounds: Rect) -> Vec<Point> {
    let center = bounds.center();
    let (outer_x, outer_y) = (bounds.width() / 2.0, bounds.height() / 2.0);
    let vertices = STAR_POINTS * 2;
    (0..vertices)
        .map(|index| {
            let angle = -FRAC_PI_2 + PI * index as f32 / STAR_POINTS as f32;
            let ratio = if index % 2 == 0 { 1.0 } else { STAR_INNER_RATIO };
            Point::new(
                center.x + outer_x * ratio * angle.cos(),
                center.y + outer_y * ratio * angle.sin(),
            )
        })
        .collect()
}

fn regular_polygon(bounds: Rect, sides: u32) -> Vec<Point> {
    let center = bounds.center();
    let sides = sides.max(MIN_POLYGON_SIDES);
    (0..sides)
        .map(|index| {
            let angle = -FRAC_PI_2 + TAU * index as f32 / sides as f32;
            Point::new(
                center.x + bounds.width() / 2.0 * angle.cos(),
                center.y + bounds.height() / 2.0 * angle.sin(),
            )
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Default)]
enum ShapeToolState {
    #[default]
    Idle,
    Drawing { start: Point, preview: ShapePath },
}

/// Drag-to-draw shape tool: previews while dragging, strokes with a brush on release.
#[derive(Debug, Clone)]
pub struct ShapeTool {
    shape: ShapeType,
    constraints: ShapeConstraints,
    brush: Brush,
    params: BrushParams,
    state: ShapeToolState,
}

impl ShapeTool {
    pub fn new(shape: ShapeType, brush: Brush, params: BrushParams) -> Self {
        Self {
            shape,
            constraints: ShapeConstraints::default(),
            brush,
            params,
            state: ShapeToolState::Idle,
        }
    }

    pub fn shape(&self) -> ShapeType {
        self.shape
    }

    pub fn set_shape(&mut self, shape: ShapeType) {
        self.shape = shape;
    }

    pub fn constraints(&self) -> &ShapeConstraints {
        &self.constraints
    }

    pub fn constraints_mut(&mut self) -> &mut ShapeConstraints {
        &mut self.constraints
    }

    pub fn set_brush(&mut self, brush: Brush) {
        self.brush = brush;
    }

    pub fn params(&self) -> &BrushParams {
        &self.params
    }

    pub fn update_params(&mut self, params: BrushParams) {
        self.params = params;
    }

    /// Drops an unfinished gesture without drawing it.
    pub fn clear(&mut self) {
        self.state = ShapeToolState::Idle;
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, ShapeToolState::Drawing { .. })
    }

    pub fn preview(&self) -> Option<&ShapePath> {
        match &self.state {
            ShapeToolState::Drawing { preview, .. } => Some(preview),
            ShapeToolState::Idle => None,
        }
    }

    fn padded_bounds(&self, path: &ShapePath) -> DirtyRect {
        path.bounds().map(|bounds| bounds.expand(self.params.size))
    }

    pub fn handle_start(&mut self, event: &GestureEvent) -> DirtyRect {
        let start = event.position;
        let preview = self.shape.create_path(start, start, &self.constraints);
        let mut dirty = self.padded_bounds(&preview);
        if let Some(stale) = self.preview() {
            tracing::warn!("shape gesture restarted before it ended");
            dirty = merge_dirty(dirty, self.padded_bounds(stale));
        }
        self.state = ShapeToolState::Drawing { start, preview };
        dirty
    }

    /// Rebuilds the preview; the result covers both the old and the new frame.
    pub fn handle_move(&mut self, event: &GestureEvent) -> DirtyRect {
        let ShapeToolState::Drawing { start, preview } = &self.state else {
            tracing::warn!("shape move without a started gesture");
            return None;
        };
        let next = self
            .shape
            .create_path(*start, event.position, &self.constraints);
        let dirty = merge_dirty(self.padded_bounds(preview), self.padded_bounds(&next));
        let start = *start;
        self.state = ShapeToolState::Drawing {
            start,
            preview: next,
        };
        dirty
    }

    /// Strokes the final shape by walking each contour at even arc-length steps
    /// through a brush session, then returns to idle.
    pub fn handle_end<S, R>(
        &mut self,
        surface: &mut S,
        event: &GestureEvent,
        rng: &mut R,
    ) -> DirtyRect
    where
        S: RasterSurface + ?Sized,
        R: Rng + ?Sized,
    {
        let ShapeToolState::Drawing { start, preview } = std::mem::take(&mut self.state) else {
            tracing::warn!("shape end without a started gesture");
            return None;
        };
        let path = self
            .shape
            .create_path(start, event.position, &self.constraints);
        let step = self.params.size * COMMIT_STEP_RATIO;

        let mut dirty = merge_dirty(self.padded_bounds(&preview), self.padded_bounds(&path));
        for contour in path.contours() {
            dirty = merge_dirty(dirty, self.stroke_contour(surface, contour, step, event, rng));
        }
        tracing::debug!(shape = ?self.shape, contours = path.contours().len(), "shape committed");
        dirty
    }

    fn stroke_contour<S, R>(
        &self,
        surface: &mut S,
        contour: &Contour,
        step: f32,
        template: &GestureEvent,
        rng: &mut R,
    ) -> DirtyRect
    where
        S: RasterSurface + ?Sized,
        R: Rng + ?Sized,
    {
        let samples = contour.sample_by_arc_length(step);
        let Some((&last, rest)) = samples.split_last() else {
            return None;
        };
        let (first, middle) = match rest.split_first() {
            Some((&first, middle)) => (first, middle),
            None => (last, &[][..]),
        };

        let mut session = self.brush.start_session(surface, self.params, rng);
        session.start(&template.moved_to(first));
        for &sample in middle {
            session.move_to(&template.moved_to(sample));
        }
        session.end(&template.moved_to(last))
    }

    /// Draws the current preview as plain polylines in the tool's color and width.
    pub fn draw_preview<S: RasterSurface + ?Sized>(&self, surface: &mut S) -> DirtyRect {
        let preview = self.preview()?;
        let style = StrokeStyle::new(self.params.color, self.params.size);
        for contour in preview.contours() {
            surface.stroke_polyline(&contour.polyline(), &style);
        }
        self.padded_bounds(preview)
    }
}
