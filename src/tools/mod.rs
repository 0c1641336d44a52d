//! Interactive tools and the pointer dispatcher that drives them.

mod curve;
mod fill;
mod shape;

use rand::Rng;

use crate::brush::{Brush, BrushParams};
use crate::config::EngineConfig;
use crate::geometry::{merge_dirty, Argb, DirtyRect, Rect};
use crate::gesture::{GestureEvent, GestureSession};
use crate::surface::RasterSurface;

pub use curve::{
    quadratic_point, sample_quadratic, CurveTool, CURVE_SAMPLES, DEFAULT_CURVE_STEPS,
    MIN_CURVE_STEPS,
};
pub use fill::FillTool;
pub use shape::{
    snap_to_angle, ShapeConstraints, ShapeTool, ShapeType, DEFAULT_POLYGON_SIDES,
    MIN_POLYGON_SIDES,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    #[default]
    Brush,
    Shape,
    Curve,
    Fill,
}

/// Freehand brush tool. Samples are collected while the pointer is down and
/// replayed through one stroke session on release.
#[derive(Debug, Clone)]
pub struct FreehandTool {
    brush: Brush,
    params: BrushParams,
    samples: Vec<GestureEvent>,
}

impl FreehandTool {
    pub fn new(brush: Brush, params: BrushParams) -> Self {
        Self {
            brush,
            params,
            samples: Vec::new(),
        }
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn set_brush(&mut self, brush: Brush) {
        self.brush = brush;
    }

    pub fn update_params(&mut self, params: BrushParams) {
        self.params = params;
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn handle_start(&mut self, event: &GestureEvent) -> DirtyRect {
        self.samples.clear();
        self.samples.push(*event);
        Some(Rect::around(event.position, self.params.width() / 2.0))
    }

    pub fn handle_move(&mut self, event: &GestureEvent) -> DirtyRect {
        let previous = self.samples.last()?.position;
        self.samples.push(*event);
        Some(Rect::from_points(previous, event.position).expand(self.params.width() / 2.0))
    }

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
        let samples = std::mem::take(&mut self.samples);
        let (first, moves) = samples.split_first()?;

        let mut session = self.brush.start_session(surface, self.params, rng);
        session.start(first);
        for sample in moves {
            session.move_to(sample);
        }
        session.end(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum PointerState {
    #[default]
    Up,
    Pressed {
        moved: bool,
    },
}

/// Routes pointer down/move/up to the active tool.
///
/// A press released without movement is a tap; a press that moves is a drag.
/// Curve anchors are placed by taps and bent by drags; fills happen on press.
#[derive(Debug, Clone)]
pub struct Toolbox {
    active: ToolKind,
    pointer: PointerState,
    params: BrushParams,
    freehand: FreehandTool,
    shape: ShapeTool,
    curve: CurveTool,
    fill: FillTool,
}

impl Default for Toolbox {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl Toolbox {
    pub fn from_config(config: &EngineConfig) -> Self {
        let brush = Brush::pencil().with_smoothing(config.smoothing);
        let params = BrushParams::new(Argb::BLACK, config.default_brush_size);
        let mut shape = ShapeTool::new(ShapeType::default(), brush.clone(), params);
        shape.constraints_mut().set_polygon_sides(config.polygon_sides);
        let mut curve = CurveTool::new(brush.clone(), params);
        curve.set_curve_steps(config.curve_steps);
        Self {
            active: ToolKind::default(),
            pointer: PointerState::Up,
            params,
            freehand: FreehandTool::new(brush, params),
            shape,
            curve,
            fill: FillTool::new(params.color),
        }
    }

    pub fn active(&self) -> ToolKind {
        self.active
    }

    /// Switching tools abandons any gesture in progress.
    pub fn set_active(&mut self, kind: ToolKind) {
        if kind == self.active {
            return;
        }
        tracing::debug!(from = ?self.active, to = ?kind, "tool switched");
        self.reset_gestures();
        self.active = kind;
    }

    pub fn params(&self) -> &BrushParams {
        &self.params
    }

    /// New parameters apply from the next gesture on.
    pub fn update_params(&mut self, params: BrushParams) {
        self.params = params;
        self.freehand.update_params(params);
        self.shape.update_params(params);
        self.curve.update_params(params);
        self.fill.set_color(params.color);
    }

    pub fn set_brush(&mut self, brush: Brush) {
        self.freehand.set_brush(brush.clone());
        self.shape.set_brush(brush.clone());
        self.curve.set_brush(brush);
    }

    pub fn freehand(&self) -> &FreehandTool {
        &self.freehand
    }

    pub fn shape_tool(&self) -> &ShapeTool {
        &self.shape
    }

    pub fn shape_tool_mut(&mut self) -> &mut ShapeTool {
        &mut self.shape
    }

    pub fn curve_tool(&self) -> &CurveTool {
        &self.curve
    }

    pub fn curve_tool_mut(&mut self) -> &mut CurveTool {
        &mut self.curve
    }

    pub fn fill_tool(&self) -> &FillTool {
        &self.fill
    }

    fn reset_gestures(&mut self) {
        self.pointer = PointerState::Up;
        self.freehand.clear();
        self.shape.clear();
        self.curve.clear();
    }

    pub fn pointer_down<S: RasterSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        event: &GestureEvent,
    ) -> DirtyRect {
        self.pointer = PointerState::Pressed { moved: false };
        match self.active {
            ToolKind::Brush => self.freehand.handle_start(event),
            ToolKind::Shape => self.shape.handle_start(event),
            ToolKind::Curve => None,
            ToolKind::Fill => self.fill.handle_tap(surface, event),
        }
    }

    pub fn pointer_move<P: RasterSurface + ?Sized>(
        &mut self,
        preview: &mut P,
        event: &GestureEvent,
    ) -> DirtyRect {
        let PointerState::Pressed { .. } = self.pointer else {
            return None;
        };
        self.pointer = PointerState::Pressed { moved: true };
        match self.active {
            ToolKind::Brush => self.freehand.handle_move(event),
            ToolKind::Shape => {
                let dirty = self.shape.handle_move(event);
                preview.clear();
                merge_dirty(dirty, self.shape.draw_preview(preview))
            }
            ToolKind::Curve => self.curve.handle_drag(preview, event),
            ToolKind::Fill => None,
        }
    }

    pub fn pointer_up<S, P, R>(
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
        let PointerState::Pressed { moved } = std::mem::take(&mut self.pointer) else {
            tracing::warn!("pointer up without a matching press");
            return None;
        };
        match self.active {
            ToolKind::Brush => self.freehand.handle_end(surface, event, rng),
            ToolKind::Shape => {
                preview.clear();
                self.shape.handle_end(surface, event, rng)
            }
            ToolKind::Curve if !moved => self.curve.handle_tap(surface, preview, event, rng),
            ToolKind::Curve | ToolKind::Fill => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::geometry::Point;
    use crate::surface::recording::RecordingSurface;

    fn at(x: f32, y: f32) -> GestureEvent {
        GestureEvent::at(Point::new(x, y), 0)
    }

    struct Rig {
        surface: RecordingSurface,
        preview: RecordingSurface,
        rng: StdRng,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                surface: RecordingSurface::filled(64, 64, Argb::WHITE),
                preview: RecordingSurface::new(64, 64),
                rng: StdRng::seed_from_u64(11),
            }
        }

        fn drag(&mut self, toolbox: &mut Toolbox, points: &[(f32, f32)]) -> DirtyRect {
            let (first, rest) = points.split_first().expect("drag needs points");
            toolbox.pointer_down(&mut self.surface, &at(first.0, first.1));
            for &(x, y) in rest {
                toolbox.pointer_move(&mut self.preview, &at(x, y));
            }
            let &(x, y) = points.last().expect("drag needs points");
            toolbox.pointer_up(&mut self.surface, &mut self.preview, &at(x, y), &mut self.rng)
        }

        fn tap(&mut self, toolbox: &mut Toolbox, x: f32, y: f32) -> DirtyRect {
            toolbox.pointer_down(&mut self.surface, &at(x, y));
            toolbox.pointer_up(&mut self.surface, &mut self.preview, &at(x, y), &mut self.rng)
        }
    }

    #[test]
    fn brush_drag_renders_one_stroke_on_release() {
        let mut toolbox = Toolbox::default();
        let mut rig = Rig::new();
        let dirty = rig.drag(&mut toolbox, &[(5.0, 5.0), (20.0, 5.0), (20.0, 30.0)]);

        assert_eq!(dirty, Some(Rect::new(1.0, 1.0, 24.0, 34.0)));
        let polylines = rig.surface.polylines();
        assert_eq!(polylines.len(), 2);
        assert_eq!(polylines[0].0.len(), 3);
    }

    #[test]
    fn shape_drag_previews_then_commits() {
        let mut toolbox = Toolbox::default();
        toolbox.set_active(ToolKind::Shape);
        let mut rig = Rig::new();
        rig.drag(&mut toolbox, &[(10.0, 10.0), (30.0, 30.0)]);

        assert!(!rig.preview.polylines().is_empty());
        assert!(!rig.surface.polylines().is_empty());
        assert!(!toolbox.shape_tool().is_drawing());
    }

    #[test]
    fn curve_taps_place_anchors_and_drags_bend() {
        let mut toolbox = Toolbox::default();
        toolbox.set_active(ToolKind::Curve);
        let mut rig = Rig::new();

        rig.tap(&mut toolbox, 5.0, 50.0);
        assert_eq!(toolbox.curve_tool().anchors().len(), 1);

        rig.drag(&mut toolbox, &[(30.0, 5.0), (32.0, 4.0)]);
        assert_eq!(toolbox.curve_tool().anchors().len(), 1);
        assert_eq!(toolbox.curve_tool().control(), Some(Point::new(32.0, 4.0)));
        assert!(rig.surface.calls.is_empty());

        assert!(rig.tap(&mut toolbox, 60.0, 50.0).is_some());
        assert!(toolbox.curve_tool().anchors().is_empty());
        assert!(!rig.surface.polylines().is_empty());
    }

    #[test]
    fn fill_happens_on_press() {
        let mut toolbox = Toolbox::default();
        toolbox.set_active(ToolKind::Fill);
        let mut rig = Rig::new();
        let dirty = toolbox.pointer_down(&mut rig.surface, &at(3.0, 3.0));
        assert_eq!(dirty, Some(Rect::new(0.0, 0.0, 64.0, 64.0)));
        assert_eq!(rig.surface.pixel(63, 63), Argb::BLACK);
    }

    #[test]
    fn updated_params_reach_the_next_gesture() {
        let mut toolbox = Toolbox::default();
        let mut rig = Rig::new();
        let mut params = *toolbox.params();
        params.set_size(20.0);
        toolbox.update_params(params);

        rig.drag(&mut toolbox, &[(10.0, 10.0), (40.0, 10.0)]);
        assert_eq!(rig.surface.polylines()[0].1.width, 20.0);
    }

    #[test]
    fn switching_tools_abandons_the_gesture() {
        let mut toolbox = Toolbox::default();
        toolbox.set_active(ToolKind::Curve);
        let mut rig = Rig::new();
        rig.tap(&mut toolbox, 5.0, 5.0);
        toolbox.set_active(ToolKind::Brush);
        toolbox.set_active(ToolKind::Curve);
        assert!(toolbox.curve_tool().anchors().is_empty());

        assert_eq!(
            toolbox.pointer_up(&mut rig.surface, &mut rig.preview, &at(1.0, 1.0), &mut rig.rng),
            None
        );
    }
}
