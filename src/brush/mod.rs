//! Brush taxonomy, per-stroke parameters and the stroke renderer.

mod render;
mod session;

use std::f32::consts::FRAC_PI_4;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geometry::Argb;
use crate::surface::{BlendMode, LineCap, LineJoin, RasterSurface, SharedStamp};

pub use render::{render_stroke, stamp_between, stamp_opacity, stamp_spacing};
pub use session::StrokeSession;

/// Second smoothing pass alpha factor.
pub const SMOOTHING_ALPHA: f32 = 0.28;
/// Second smoothing pass width factor.
pub const SMOOTHING_WIDTH: f32 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BrushId(pub u32);

/// Per-stroke parameters, copied into each session when it starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushParams {
    pub color: Argb,
    /// Must be positive.
    pub size: f32,
    pub pressure: f32,
    pub velocity: f32,
    pub blend: BlendMode,
}

impl Default for BrushParams {
    fn default() -> Self {
        Self {
            color: Argb::BLACK,
            size: 8.0,
            pressure: 1.0,
            velocity: 0.0,
            blend: BlendMode::SourceOver,
        }
    }
}

impl BrushParams {
    pub fn new(color: Argb, size: f32) -> Self {
        Self {
            color,
            size,
            ..Self::default()
        }
    }

    pub fn set_color(&mut self, color: Argb) {
        self.color = color;
    }

    pub fn set_size(&mut self, size: f32) {
        self.size = size;
    }

    pub fn set_pressure(&mut self, pressure: f32) {
        self.pressure = pressure.clamp(0.0, 1.0);
    }

    pub fn set_velocity(&mut self, velocity: f32) {
        self.velocity = velocity.max(0.0);
    }

    pub fn set_blend(&mut self, blend: BlendMode) {
        self.blend = blend;
    }

    /// Stroke width after pressure scaling.
    pub fn width(&self) -> f32 {
        self.size * self.pressure
    }
}

/// Algorithmic stamp patterns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProceduralPattern {
    /// Random dots scattered within the nib radius; `density` dots per pixel of width.
    Spray { density: f32 },
    /// One dot per stamp position.
    Dots,
}

/// Fixed pen nib used by shape brushes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NibShape {
    Round,
    Square,
    /// Flat nib held at `angle` radians, swept along the path.
    Chisel { angle: f32 },
}

impl NibShape {
    pub const fn cap_and_join(self) -> (LineCap, LineJoin) {
        match self {
            Self::Round => (LineCap::Round, LineJoin::Round),
            Self::Square => (LineCap::Square, LineJoin::Miter),
            Self::Chisel { .. } => (LineCap::Butt, LineJoin::Bevel),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BrushKind {
    /// Plain stroked path.
    Vector,
    /// Stamps `image` along the path. Without an image it renders as a vector stroke.
    Texture {
        image: Option<SharedStamp>,
        rotation_randomness: f32,
        opacity_diff: f32,
    },
    Procedural(ProceduralPattern),
    Shape(NibShape),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    pub id: BrushId,
    pub name: String,
    pub kind: BrushKind,
    pub smoothing: bool,
    pub cap: LineCap,
    pub join: LineJoin,
    /// Replaces the session's blend mode when set.
    pub blend_override: Option<BlendMode>,
}

impl Brush {
    pub fn new(id: BrushId, name: impl Into<String>, kind: BrushKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            smoothing: true,
            cap: LineCap::Round,
            join: LineJoin::Round,
            blend_override: None,
        }
    }

    pub fn pencil() -> Self {
        Self::new(BrushId(1), "Pencil", BrushKind::Vector)
    }

    pub fn marker() -> Self {
        Self::new(BrushId(2), "Marker", BrushKind::Shape(NibShape::Square))
    }

    pub fn airbrush() -> Self {
        Self::new(
            BrushId(3),
            "Airbrush",
            BrushKind::Procedural(ProceduralPattern::Spray { density: 0.6 }),
        )
    }

    pub fn calligraphy() -> Self {
        Self::new(
            BrushId(4),
            "Calligraphy",
            BrushKind::Shape(NibShape::Chisel { angle: -FRAC_PI_4 }),
        )
    }

    pub fn eraser() -> Self {
        Self {
            smoothing: false,
            blend_override: Some(BlendMode::Clear),
            ..Self::new(BrushId(5), "Eraser", BrushKind::Vector)
        }
    }

    pub fn stamp(image: Option<SharedStamp>) -> Self {
        Self::new(
            BrushId(6),
            "Stamp",
            BrushKind::Texture {
                image,
                rotation_randomness: 0.3,
                opacity_diff: 0.0,
            },
        )
    }

    pub fn dots() -> Self {
        Self::new(
            BrushId(7),
            "Dots",
            BrushKind::Procedural(ProceduralPattern::Dots),
        )
    }

    pub fn presets() -> Vec<Brush> {
        vec![
            Self::pencil(),
            Self::marker(),
            Self::airbrush(),
            Self::calligraphy(),
            Self::eraser(),
            Self::stamp(None),
            Self::dots(),
        ]
    }

    pub fn with_smoothing(mut self, smoothing: bool) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub const fn is_shape(&self) -> bool {
        matches!(self.kind, BrushKind::Shape(_))
    }

    /// Caps and joins used for vector rendering; shape brushes take them from their nib.
    pub fn cap_and_join(&self) -> (LineCap, LineJoin) {
        match self.kind {
            BrushKind::Shape(nib) => nib.cap_and_join(),
            _ => (self.cap, self.join),
        }
    }

    pub fn blend_for(&self, params: &BrushParams) -> BlendMode {
        self.blend_override.unwrap_or(params.blend)
    }

    /// Opens a stroke session drawing onto `surface`. `params` are copied; later
    /// changes to the caller's params do not reach this session.
    pub fn start_session<'a, S, R>(
        &'a self,
        surface: &'a mut S,
        params: BrushParams,
        rng: &'a mut R,
    ) -> StrokeSession<'a, S, R>
    where
        S: RasterSurface + ?Sized,
        R: Rng + ?Sized,
    {
        StrokeSession::new(self, surface, params, rng)
    }
}
