use super::RasterSurface;
use crate::geometry::Argb;

/// Read/write view over a surface's pixels, scoped to one operation.
///
/// Pixels are copied out on `materialize` and written back by `flush`, which
/// consumes the buffer so a view is flushed at most once.
pub struct PixelBuffer<'a, S: RasterSurface + ?Sized> {
    surface: &'a mut S,
    width: u32,
    height: u32,
    pixels: Vec<Argb>,
    modified: bool,
}

impl<'a, S: RasterSurface + ?Sized> PixelBuffer<'a, S> {
    pub fn materialize(surface: &'a mut S) -> Self {
        let width = surface.width();
        let height = surface.height();
        let mut pixels = surface.read_pixels();
        pixels.resize(width as usize * height as usize, Argb::TRANSPARENT);
        Self {
            surface,
            width,
            height,
            pixels,
            modified: false,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Argb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[self.index(x, y)])
    }

    /// Out-of-range writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, color: Argb) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = self.index(x, y);
        self.pixels[index] = color;
        self.modified = true;
    }

    /// Fills `x_start..=x_end` on row `y` in one pass.
    pub fn fill_run(&mut self, y: u32, x_start: u32, x_end: u32, color: Argb) {
        if y >= self.height || x_start > x_end || x_start >= self.width {
            return;
        }
        let x_end = x_end.min(self.width - 1);
        let start = self.index(x_start, y);
        let end = self.index(x_end, y);
        self.pixels[start..=end].fill(color);
        self.modified = true;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Writes the pixels back to the surface if anything changed.
    ///
    /// Returns whether a write happened.
    pub fn flush(self) -> bool {
        if !self.modified {
            return false;
        }
        self.surface.write_pixels(&self.pixels);
        true
    }
}
