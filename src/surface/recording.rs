use super::{BlendMode, RasterSurface, StampImage, StampPlacement, StrokeStyle};
use crate::geometry::{Argb, Point};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DrawCall {
    Polyline {
        points: Vec<Point>,
        style: StrokeStyle,
    },
    Polygon {
        points: Vec<Point>,
        color: Argb,
        blend: BlendMode,
    },
    Stamp(StampPlacement),
    Clear,
}

/// Surface double that records draw calls and keeps a plain pixel store.
#[derive(Debug, Clone)]
pub(crate) struct RecordingSurface {
    width: u32,
    height: u32,
    pub(crate) pixels: Vec<Argb>,
    pub(crate) calls: Vec<DrawCall>,
    pub(crate) pixel_writes: usize,
}

impl RecordingSurface {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Argb::TRANSPARENT)
    }

    pub(crate) fn filled(width: u32, height: u32, color: Argb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
            calls: Vec::new(),
            pixel_writes: 0,
        }
    }

    pub(crate) fn pixel(&self, x: u32, y: u32) -> Argb {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    pub(crate) fn polylines(&self) -> Vec<(&[Point], &StrokeStyle)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Polyline { points, style } => Some((points.as_slice(), style)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn stamps(&self) -> Vec<&StampPlacement> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Stamp(placement) => Some(placement),
                _ => None,
            })
            .collect()
    }
}

impl RasterSurface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn stroke_polyline(&mut self, points: &[Point], style: &StrokeStyle) {
        self.calls.push(DrawCall::Polyline {
            points: points.to_vec(),
            style: *style,
        });
    }

    fn fill_polygon(&mut self, points: &[Point], color: Argb, blend: BlendMode) {
        self.calls.push(DrawCall::Polygon {
            points: points.to_vec(),
            color,
            blend,
        });
    }

    fn draw_stamp(&mut self, _stamp: &StampImage, placement: &StampPlacement) {
        self.calls.push(DrawCall::Stamp(*placement));
    }

    fn clear(&mut self) {
        self.calls.push(DrawCall::Clear);
    }

    fn read_pixels(&self) -> Vec<Argb> {
        self.pixels.clone()
    }

    fn write_pixels(&mut self, pixels: &[Argb]) {
        self.pixels.copy_from_slice(pixels);
        self.pixel_writes += 1;
    }
}
