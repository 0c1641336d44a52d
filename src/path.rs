//! Recorded drawing paths and polyline shape geometry.

use serde::{Deserialize, Serialize};

use crate::brush::BrushId;
use crate::geometry::{Argb, DirtyRect, Point, Rect};

/// Point as persisted by hosts, identified by its insertion index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredPoint {
    pub id: u64,
    pub x: f32,
    pub y: f32,
}

/// Points of one stroke in insertion order, with the color, size and brush
/// that produced them. An empty path renders as a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingPath {
    points: Vec<Point>,
    color: Argb,
    size: f32,
    brush_id: BrushId,
}

impl DrawingPath {
    pub fn new(color: Argb, size: f32, brush_id: BrushId) -> Self {
        Self {
            points: Vec::new(),
            color,
            size,
            brush_id,
        }
    }

    /// Rebuilds a path from storage; points are ordered by their ids.
    pub fn from_stored(
        color: Argb,
        size: f32,
        brush_id: BrushId,
        stored: impl IntoIterator<Item = StoredPoint>,
    ) -> Self {
        let mut stored = stored.into_iter().collect::<Vec<_>>();
        stored.sort_by_key(|point| point.id);
        Self {
            points: stored
                .into_iter()
                .map(|point| Point::new(point.x, point.y))
                .collect(),
            color,
            size,
            brush_id,
        }
    }

    pub fn to_stored(&self) -> Vec<StoredPoint> {
        self.points
            .iter()
            .enumerate()
            .map(|(index, point)| StoredPoint {
                id: index as u64,
                x: point.x,
                y: point.y,
            })
            .collect()
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn first(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<Point> {
        self.points.last().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn color(&self) -> Argb {
        self.color
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn brush_id(&self) -> BrushId {
        self.brush_id
    }

    /// Bounds of the points grown by half the stroke size to cover anti-aliased edges.
    pub fn dirty_rect(&self) -> DirtyRect {
        Rect::bounding(&self.points).map(|bounds| bounds.expand(self.size / 2.0))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    points: Vec<Point>,
    closed: bool,
}

impl Contour {
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Vertices in drawing order, repeating the first point when closed.
    pub fn polyline(&self) -> Vec<Point> {
        let mut points = self.points.clone();
        if self.closed && points.len() > 1 {
            points.push(points[0]);
        }
        points
    }

    pub fn length(&self) -> f32 {
        self.polyline()
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum()
    }

    /// Positions every `step` along the contour, starting at arc length 0 and
    /// always ending exactly at the total length.
    pub fn sample_by_arc_length(&self, step: f32) -> Vec<Point> {
        let polyline = self.polyline();
        let Some(&first) = polyline.first() else {
            return Vec::new();
        };
        let mut samples = vec![first];
        let total = self.length();
        if total <= f32::EPSILON || step <= 0.0 {
            if polyline.len() > 1 {
                samples.push(polyline[polyline.len() - 1]);
            }
            return samples;
        }

        let mut next_distance = step;
        let mut walked = 0.0_f32;
        for pair in polyline.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let segment = a.distance(b);
            if segment <= f32::EPSILON {
                continue;
            }
            while next_distance < total && next_distance <= walked + segment {
                samples.push(a.lerp(b, (next_distance - walked) / segment));
                next_distance += step;
            }
            walked += segment;
        }
        samples.push(polyline[polyline.len() - 1]);
        samples
    }
}

/// Polyline geometry made of one or more contours.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapePath {
    contours: Vec<Contour>,
}

impl ShapePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn polygon(points: Vec<Point>) -> Self {
        Self {
            contours: vec![Contour {
                points,
                closed: true,
            }],
        }
    }

    pub fn polyline(points: Vec<Point>) -> Self {
        Self {
            contours: vec![Contour {
                points,
                closed: false,
            }],
        }
    }

    pub fn move_to(&mut self, point: Point) -> &mut Self {
        self.contours.push(Contour {
            points: vec![point],
            closed: false,
        });
        self
    }

    /// Starts a contour at `point` when none is open.
    pub fn line_to(&mut self, point: Point) -> &mut Self {
        match self.contours.last_mut() {
            Some(contour) if !contour.closed => contour.points.push(point),
            _ => {
                self.move_to(point);
            }
        }
        self
    }

    pub fn close(&mut self) -> &mut Self {
        if let Some(contour) = self.contours.last_mut() {
            contour.closed = true;
        }
        self
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    pub fn is_empty(&self) -> bool {
        self.contours.iter().all(|contour| contour.points.is_empty())
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.contours
            .iter()
            .filter_map(|contour| Rect::bounding(&contour.points))
            .reduce(Rect::union)
    }

    pub fn length(&self) -> f32 {
        self.contours.iter().map(Contour::length).sum()
    }
}
