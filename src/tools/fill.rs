use crate::fill::flood_fill;
use crate::geometry::{Argb, DirtyRect};
use crate::gesture::GestureEvent;
use crate::surface::RasterSurface;

/// Bucket tool: a tap floods the region under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillTool {
    color: Argb,
}

impl FillTool {
    pub const fn new(color: Argb) -> Self {
        Self { color }
    }

    pub const fn color(&self) -> Argb {
        self.color
    }

    pub fn set_color(&mut self, color: Argb) {
        self.color = color;
    }

    pub fn handle_tap<S: RasterSurface + ?Sized>(
        &self,
        surface: &mut S,
        event: &GestureEvent,
    ) -> DirtyRect {
        let x = event.position.x.floor() as i64;
        let y = event.position.y.floor() as i64;
        flood_fill(surface, x, y, self.color)
    }
}
