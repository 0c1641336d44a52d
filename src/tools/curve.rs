use rand::Rng;

use crate::brush::{Brush, BrushParams};
use crate::geometry::{merge_dirty, DirtyRect, Point, Rect};
use crate::gesture::{GestureEvent, GestureSession};
use crate::surface::{RasterSurface, StrokeStyle};

pub const MIN_CURVE_STEPS: usize = 2;
pub const DEFAULT_CURVE_STEPS: usize = 2;
pub const CURVE_SAMPLES: u32 = 100;
const PREVIEW_MARKER_MIN: f32 = 6.0;

/// `(1-t)^2 p0 + 2(1-t)t p1 + t^2 p2`
pub fn quadratic_point(p0: Point, p1: Point, p2: Point, t: f32) -> Point {
    let u = 1.0 - t;
    Point::new(
        u * u * p0.x + 2.0 * u * t * p1.x + t * t * p2.x,
        u * u * p0.y + 2.0 * u * t * p1.y + t * t * p2.y,
    )
}

/// `steps + 1` points at `t = i / steps`, both ends included.
pub fn sample_quadratic(p0: Point, p1: Point, p2: Point, steps: u32) -> Vec<Point> {
    let steps = steps.max(1);
    (0..=steps)
        .map(|index| quadratic_point(p0, p1, p2, index as f32 / steps as f32))
        .collect()
}

/// Tap-to-place quadratic curve tool.
///
/// Taps append anchors; drags move the pending control point and only touch
/// the preview surface. The tap that completes the anchor set strokes the
/// curve onto the target surface and resets the tool.
#[derive(Debug, Clone)]
pub struct CurveTool {
    curve_steps: usize,
    anchors: Vec<Point>,
    control: Option<Point>,
    brush: Brush,
    params: BrushParams,
}

impl CurveTool {
    pub fn new(brush: Brush, params: BrushParams) -> Self {
        Self {
            curve_steps: DEFAULT_CURVE_STEPS,
            anchors: Vec::new(),
            control: None,
            brush,
            params,
        }
    }

    pub fn curve_steps(&self) -> usize {
        self.curve_steps
    }

    pub fn set_curve_steps(&mut self, steps: usize) {
        self.curve_steps = steps.max(MIN_CURVE_STEPS);
    }

    pub fn anchors(&self) -> &[Point] {
        &self.anchors
    }

    pub fn control(&self) -> Option<Point> {
        self.control
    }

    pub fn set_brush(&mut self, brush: Brush) {
        self.brush = brush;
    }

    pub fn update_params(&mut self, params: BrushParams) {
        self.params = params;
    }

    pub fn clear(&mut self) {
        self.anchors.clear();
        self.control = None;
    }

    /// Curve control points once enough anchors exist: first and last anchor
    /// as endpoints, the pending drag position as control, else the second
    /// anchor, else the chord midpoint.
    pub fn control_points(&self) -> Option<(Point, Point, Point)> {
        let (&p0, &p2) = (self.anchors.first()?, self.anchors.last()?);
        if self.anchors.len() < 2 {
            return None;
        }
        let p1 = self
            .control
            .or_else(|| (self.anchors.len() > 2).then(|| self.anchors[1]))
            .unwrap_or_else(|| p0.midpoint(p2));
        Some((p0, p1, p2))
    }

    pub fn handle_tap<S, P, R>(
        &mut self,
        surface: &mut S,
        preview: &mut P,
        event: &GestureEvent,
        rng: &mut R,
    ) -> DirtyRect
    where
        S: RasterSurface + ?Sized,
        P: RasterSurface + ?Sized,
        R: Rng + ?Sized,
    {
        self.anchors.push(event.position);
        if self.anchors.len() < self.curve_steps {
            return self.redraw_preview(preview);
        }

        preview.clear();
        let dirty = self.commit(surface, event, rng);
        self.clear();
        dirty
    }

    pub fn handle_drag<P: RasterSurface + ?Sized>(
        &mut self,
        preview: &mut P,
        event: &GestureEvent,
    ) -> DirtyRect {
        if self.anchors.is_empty() {
            return None;
        }
        self.control = Some(event.position);
        self.redraw_preview(preview)
    }

    fn commit<S, R>(&self, surface: &mut S, event: &GestureEvent, rng: &mut R) -> DirtyRect
    where
        S: RasterSurface + ?Sized,
        R: Rng + ?Sized,
    {
        let (p0, p1, p2) = self.control_points()?;
        let samples = sample_quadratic(p0, p1, p2, CURVE_SAMPLES);
        let interior = &samples[1..samples.len() - 1];

        let mut session = self.brush.start_session(surface, self.params, rng);
        session.start(&event.moved_to(p0));
        for &sample in interior {
            session.move_to(&event.moved_to(sample));
        }
        let dirty = session.end(&event.moved_to(p2));
        tracing::debug!(anchors = self.anchors.len(), "curve committed");
        dirty
    }

    fn redraw_preview<P: RasterSurface + ?Sized>(&self, preview: &mut P) -> DirtyRect {
        preview.clear();
        let marker = StrokeStyle::new(
            self.params.color,
            self.params.size.max(PREVIEW_MARKER_MIN),
        );
        let mut dirty = None;
        for &anchor in &self.anchors {
            preview.stroke_polyline(&[anchor], &marker);
            dirty = merge_dirty(dirty, Some(Rect::around(anchor, marker.width / 2.0)));
        }

        if let (Some(&p0), Some(control)) = (self.anchors.first(), self.control) {
            let p2 = if self.anchors.len() > 1 {
                self.anchors[self.anchors.len() - 1]
            } else {
                control
            };
            let curve = sample_quadratic(p0, control, p2, CURVE_SAMPLES);
            let style = StrokeStyle::new(self.params.color, self.params.size);
            preview.stroke_polyline(&curve, &style);
            dirty = merge_dirty(
                dirty,
                Rect::bounding(&curve).map(|bounds| bounds.expand(self.params.size / 2.0)),
            );
        }
        dirty
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::geometry::Argb;
    use crate::surface::recording::{DrawCall, RecordingSurface};

    fn tap(x: f32, y: f32) -> GestureEvent {
        GestureEvent::at(Point::new(x, y), 0)
    }

    fn tool() -> CurveTool {
        CurveTool::new(
            Brush::pencil().with_smoothing(false),
            BrushParams::new(Argb::BLACK, 4.0),
        )
    }

    #[test]
    fn quadratic_sampling_hits_both_endpoints() {
        let (p0, p1, p2) = (
            Point::new(3.0, 7.0),
            Point::new(50.0, -20.0),
            Point::new(91.0, 12.0),
        );
        let samples = sample_quadratic(p0, p1, p2, CURVE_SAMPLES);
        assert_eq!(samples.len(), 101);
        assert_eq!(samples[0], p0);
        assert!((samples[100].x - p2.x).abs() < 1e-4);
        assert!((samples[100].y - p2.y).abs() < 1e-4);
        assert_eq!(quadratic_point(p0, p1, p2, 0.5), Point::new(48.5, -5.25));
    }

    #[test]
    fn curve_tool_commits_on_the_completing_tap() {
        let mut tool = tool();
        let mut surface = RecordingSurface::new(128, 128);
        let mut preview = RecordingSurface::new(128, 128);
        let mut rng = StdRng::seed_from_u64(5);

        assert!(tool
            .handle_tap(&mut surface, &mut preview, &tap(10.0, 10.0), &mut rng)
            .is_some());
        assert!(surface.calls.is_empty());

        tool.handle_drag(&mut preview, &tap(50.0, 90.0));
        assert!(surface.calls.is_empty());

        let dirty = tool.handle_tap(&mut surface, &mut preview, &tap(90.0, 10.0), &mut rng);
        assert!(dirty.is_some());
        assert!(tool.anchors().is_empty());
        assert_eq!(tool.control(), None);
        assert_eq!(preview.calls.last(), Some(&DrawCall::Clear));

        let polylines = surface.polylines();
        assert_eq!(polylines.len(), 1);
        let points = polylines[0].0;
        assert_eq!(points.len(), 101);
        assert_eq!(points[0], Point::new(10.0, 10.0));
        assert_eq!(points[100], Point::new(90.0, 10.0));
        assert!(points[50].y > 40.0);
    }

    #[test]
    fn curve_without_drag_uses_chord_midpoint() {
        let mut tool = tool();
        tool.anchors = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        assert_eq!(
            tool.control_points(),
            Some((
                Point::new(0.0, 0.0),
                Point::new(5.0, 0.0),
                Point::new(10.0, 0.0)
            ))
        );
    }

    #[test]
    fn three_step_curve_waits_for_its_last_anchor() {
        let mut tool = tool();
        tool.set_curve_steps(3);
        let mut surface = RecordingSurface::new(64, 64);
        let mut preview = RecordingSurface::new(64, 64);
        let mut rng = StdRng::seed_from_u64(5);

        tool.handle_tap(&mut surface, &mut preview, &tap(0.0, 0.0), &mut rng);
        tool.handle_tap(&mut surface, &mut preview, &tap(20.0, 40.0), &mut rng);
        assert_eq!(
            tool.control_points(),
            Some((
                Point::new(0.0, 0.0),
                Point::new(10.0, 20.0),
                Point::new(20.0, 40.0)
            ))
        );
        assert!(surface.calls.is_empty());

        tool.handle_tap(&mut surface, &mut preview, &tap(40.0, 0.0), &mut rng);
        assert_eq!(surface.polylines().len(), 1);
    }

    #[test]
    fn drag_before_first_anchor_is_ignored() {
        let mut tool = tool();
        let mut preview = RecordingSurface::new(16, 16);
        assert_eq!(tool.handle_drag(&mut preview, &tap(4.0, 4.0)), None);
        assert_eq!(tool.control(), None);
        assert!(preview.calls.is_empty());
    }

    #[test]
    fn curve_steps_never_drop_below_two() {
        let mut tool = tool();
        tool.set_curve_steps(0);
        assert_eq!(tool.curve_steps(), 2);
    }
}
