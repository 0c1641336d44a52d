use rand::Rng;

use super::{render_stroke, Brush, BrushParams};
use crate::geometry::{DirtyRect, Point, Rect};
use crate::gesture::{GestureEvent, GesturePhase, GestureSession, GestureStep, SessionCore};
use crate::path::DrawingPath;
use crate::surface::RasterSurface;

/// Gesture session that records a stroke and renders it when the gesture ends.
///
/// `start` and `move_to` report the area the stroke is about to cover; `end`
/// renders the whole path in one pass and reports what was drawn.
///
/// The stroke is drawn at one width. Its pressure is the highest pressure
/// reported by `start` and `move_to`; the `end` sample is a lift-off and its
/// pressure is ignored. Without any reported pressure the params' own
/// pressure applies.
pub struct StrokeSession<'a, S: RasterSurface + ?Sized, R: Rng + ?Sized> {
    core: SessionCore<BrushParams>,
    brush: &'a Brush,
    surface: &'a mut S,
    rng: &'a mut R,
    path: DrawingPath,
    peak_pressure: Option<f32>,
}

impl<'a, S, R> StrokeSession<'a, S, R>
where
    S: RasterSurface + ?Sized,
    R: Rng + ?Sized,
{
    pub(super) fn new(
        brush: &'a Brush,
        surface: &'a mut S,
        params: BrushParams,
        rng: &'a mut R,
    ) -> Self {
        Self {
            core: SessionCore::new(params),
            brush,
            surface,
            rng,
            path: DrawingPath::new(params.color, params.size, brush.id),
            peak_pressure: None,
        }
    }

    pub fn path(&self) -> &DrawingPath {
        &self.path
    }

    /// Recorded stroke, for hosts that persist paths.
    pub fn into_path(self) -> DrawingPath {
        self.path
    }

    pub fn accumulated_dirty(&self) -> DirtyRect {
        self.core.accumulated_dirty()
    }

    fn absorb(&mut self, event: &GestureEvent) {
        if let Some(pressure) = event.pressure {
            let peak = self.peak_pressure.map_or(pressure, |peak| peak.max(pressure));
            self.peak_pressure = Some(peak);
            self.core.params_mut().set_pressure(peak);
        }
        self.absorb_velocity(event);
    }

    fn absorb_velocity(&mut self, event: &GestureEvent) {
        if let Some(velocity) = event.velocity {
            self.core.params_mut().set_velocity(velocity);
        }
    }

    fn reach(&self) -> f32 {
        self.core.params().width() / 2.0
    }
}

impl<S, R> GestureSession for StrokeSession<'_, S, R>
where
    S: RasterSurface + ?Sized,
    R: Rng + ?Sized,
{
    type Params = BrushParams;

    fn params(&self) -> &BrushParams {
        self.core.params()
    }

    fn phase(&self) -> GesturePhase {
        self.core.phase()
    }

    fn start(&mut self, event: &GestureEvent) -> DirtyRect {
        if !self.core.advance(GestureStep::Start, event.position) {
            return None;
        }
        self.absorb(event);
        self.path.push(event.position);
        tracing::debug!(brush = %self.brush.name, "stroke session started");
        let dirty = Rect::around(event.position, self.reach());
        self.core.record_dirty(Some(dirty))
    }

    fn move_to(&mut self, event: &GestureEvent) -> DirtyRect {
        let previous = self.core.last_point();
        if !self.core.advance(GestureStep::Move, event.position) {
            return None;
        }
        self.absorb(event);
        self.path.push(event.position);
        let anchor = previous.unwrap_or(event.position);
        let dirty = Rect::from_points(anchor, event.position).expand(self.reach());
        self.core.record_dirty(Some(dirty))
    }

    fn end(&mut self, event: &GestureEvent) -> DirtyRect {
        let previous = self.core.last_point();
        if !self.core.advance(GestureStep::End, event.position) {
            return None;
        }
        self.absorb_velocity(event);
        if previous != Some(event.position) {
            self.path.push(event.position);
        }

        let params = *self.core.params();
        let drawn = render_stroke(
            &mut *self.surface,
            self.brush,
            &params,
            self.path.points(),
            &mut *self.rng,
        );
        self.core.record_dirty(drawn);
        tracing::debug!(
            brush = %self.brush.name,
            points = self.path.len(),
            "stroke session ended"
        );
        self.core.accumulated_dirty()
    }
}
