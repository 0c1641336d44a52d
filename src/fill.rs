//! Scanline flood fill over a surface's pixel buffer.

use crate::geometry::{Argb, DirtyRect, Rect};
use crate::surface::{PixelBuffer, RasterSurface};

/// Outcome of a fill that changed at least one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillSummary {
    pub pixels_filled: u64,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    /// Deepest the seed stack grew while filling.
    pub max_stack: usize,
}

impl FillSummary {
    fn new(x: u32, y: u32) -> Self {
        Self {
            pixels_filled: 0,
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            max_stack: 1,
        }
    }

    fn include_run(&mut self, y: u32, x_start: u32, x_end: u32) {
        self.pixels_filled += u64::from(x_end - x_start + 1);
        self.min_x = self.min_x.min(x_start);
        self.max_x = self.max_x.max(x_end);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    /// Pixel-aligned bounds covering every filled pixel.
    pub fn dirty_rect(&self) -> Rect {
        Rect::new(
            self.min_x as f32,
            self.min_y as f32,
            (self.max_x + 1) as f32,
            (self.max_y + 1) as f32,
        )
    }
}

/// Fills the 4-connected region of the seed's color with `replacement`.
///
/// A seed outside the surface, or a seed already equal to `replacement`, is a
/// no-op. Otherwise the surface receives exactly one pixel write-back.
pub fn flood_fill<S: RasterSurface + ?Sized>(
    surface: &mut S,
    seed_x: i64,
    seed_y: i64,
    replacement: Argb,
) -> DirtyRect {
    let mut buffer = PixelBuffer::materialize(surface);
    let summary = flood_fill_buffer(&mut buffer, seed_x, seed_y, replacement)?;
    buffer.flush();
    tracing::debug!(
        seed_x,
        seed_y,
        pixels = summary.pixels_filled,
        "flood fill applied"
    );
    Some(summary.dirty_rect())
}

/// Fills within an already materialized buffer without flushing it.
///
/// The stack holds one seed per contiguous run on neighbouring rows, not one
/// per pixel.
pub fn flood_fill_buffer<S: RasterSurface + ?Sized>(
    buffer: &mut PixelBuffer<'_, S>,
    seed_x: i64,
    seed_y: i64,
    replacement: Argb,
) -> Option<FillSummary> {
    if !buffer.contains(seed_x, seed_y) {
        return None;
    }
    let (seed_x, seed_y) = (seed_x as u32, seed_y as u32);
    let target = buffer.get(seed_x, seed_y)?;
    if target == replacement {
        return None;
    }

    let width = buffer.width();
    let height = buffer.height();
    let mut summary = FillSummary::new(seed_x, seed_y);
    let mut stack = vec![(seed_x, seed_y)];

    while let Some((x, y)) = stack.pop() {
        if buffer.get(x, y) != Some(target) {
            continue;
        }

        let mut left = x;
        while left > 0 && buffer.get(left - 1, y) == Some(target) {
            left -= 1;
        }
        let mut right = x;
        while right + 1 < width && buffer.get(right + 1, y) == Some(target) {
            right += 1;
        }

        buffer.fill_run(y, left, right, replacement);
        summary.include_run(y, left, right);

        if y > 0 {
            push_run_seeds(buffer, &mut stack, y - 1, left, right, target);
        }
        if y + 1 < height {
            push_run_seeds(buffer, &mut stack, y + 1, left, right, target);
        }
        summary.max_stack = summary.max_stack.max(stack.len());
    }

    Some(summary)
}

fn push_run_seeds<S: RasterSurface + ?Sized>(
    buffer: &PixelBuffer<'_, S>,
    stack: &mut Vec<(u32, u32)>,
    y: u32,
    left: u32,
    right: u32,
    target: Argb,
) {
    let mut in_run = false;
    for x in left..=right {
        let matches = buffer.get(x, y) == Some(target);
        if matches && !in_run {
            stack.push((x, y));
        }
        in_run = matches;
    }
}
