//! Shared geometric and color primitives used by the viewport, tools and renderer.
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn lerp(self, other: Point, t: f32) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn midpoint(self, other: Point) -> Point {
        self.lerp(other, 0.5)
    }

    /// Direction of the segment `self -> other` in radians, `atan2` convention.
    pub fn angle_to(self, other: Point) -> f32 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Point at `distance` from `self` along `angle` radians.
    pub fn polar(self, angle: f32, distance: f32) -> Point {
        Point::new(
            self.x + angle.cos() * distance,
            self.y + angle.sin() * distance,
        )
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;

    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle in image space. `left <= right` and `top <= bottom`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_points(a: Point, b: Point) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }

    pub fn around(center: Point, radius: f32) -> Self {
        Self::new(
            center.x - radius,
            center.y - radius,
            center.x + radius,
            center.y + radius,
        )
    }

    pub fn bounding(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut rect = Self::new(first.x, first.y, first.x, first.y);
        for point in rest {
            rect.left = rect.left.min(point.x);
            rect.top = rect.top.min(point.y);
            rect.right = rect.right.max(point.x);
            rect.bottom = rect.bottom.max(point.y);
        }
        Some(rect)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    pub fn expand(self, amount: f32) -> Self {
        Self::new(
            self.left - amount,
            self.top - amount,
            self.right + amount,
            self.bottom + amount,
        )
    }

    pub fn union(self, other: Rect) -> Self {
        Self::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    pub fn contains(&self, other: &Rect) -> bool {
        self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }

    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.right
            && point.y >= self.top
            && point.y <= self.bottom
    }
}

/// Region that must be repainted after an operation; `None` means no visible change.
pub type DirtyRect = Option<Rect>;

/// Union of two dirty regions from the same gesture. The result never shrinks.
pub fn merge_dirty(a: DirtyRect, b: DirtyRect) -> DirtyRect {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("color must be #RRGGBB or #AARRGGBB, got {0:?}")]
    InvalidFormat(String),
    #[error("invalid hex digits in color {0:?}")]
    InvalidDigits(String),
}

/// Packed `0xAARRGGBB` color, alpha included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Argb(pub u32);

impl Argb {
    pub const TRANSPARENT: Argb = Argb(0x0000_0000);
    pub const BLACK: Argb = Argb(0xFF00_0000);
    pub const WHITE: Argb = Argb(0xFFFF_FFFF);

    pub const fn from_argb(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Self((alpha as u32) << 24 | (red as u32) << 16 | (green as u32) << 8 | blue as u32)
    }

    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self::from_argb(0xFF, red, green, blue)
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    pub const fn with_alpha(self, alpha: u8) -> Self {
        Self((self.0 & 0x00FF_FFFF) | (alpha as u32) << 24)
    }

    pub fn alpha_f32(self) -> f32 {
        f32::from(self.alpha()) / 255.0
    }

    pub const fn to_rgba_bytes(self) -> [u8; 4] {
        [self.red(), self.green(), self.blue(), self.alpha()]
    }

    pub const fn from_rgba_bytes(bytes: [u8; 4]) -> Self {
        Self::from_argb(bytes[3], bytes[0], bytes[1], bytes[2])
    }
}

impl fmt::Display for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alpha() == 0xFF {
            write!(f, "#{:06X}", self.0 & 0x00FF_FFFF)
        } else {
            write!(f, "#{:08X}", self.0)
        }
    }
}

impl FromStr for Argb {
    type Err = ColorParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let digits = trimmed
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::InvalidFormat(value.to_string()))?;
        if !matches!(digits.len(), 6 | 8) {
            return Err(ColorParseError::InvalidFormat(value.to_string()));
        }
        let packed = u32::from_str_radix(digits, 16)
            .map_err(|_| ColorParseError::InvalidDigits(value.to_string()))?;
        Ok(if digits.len() == 6 {
            Argb(0xFF00_0000 | packed)
        } else {
            Argb(packed)
        })
    }
}

impl TryFrom<String> for Argb {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Argb> for String {
    fn from(color: Argb) -> Self {
        color.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argb_channels_unpack_in_alpha_red_green_blue_order() {
        let color = Argb(0x80_12_34_56);
        assert_eq!(color.alpha(), 0x80);
        assert_eq!(color.red(), 0x12);
        assert_eq!(color.green(), 0x34);
        assert_eq!(color.blue(), 0x56);
        assert_eq!(Argb::from_argb(0x80, 0x12, 0x34, 0x56), color);
    }

    #[test]
    fn argb_parses_six_and_eight_digit_hex() {
        assert_eq!("#12ab34".parse::<Argb>(), Ok(Argb(0xFF12_AB34)));
        assert_eq!("#8012ab34".parse::<Argb>(), Ok(Argb(0x8012_AB34)));
        assert!("12ab34".parse::<Argb>().is_err());
        assert!("#fff".parse::<Argb>().is_err());
        assert!("#zzzzzz".parse::<Argb>().is_err());
    }

    #[test]
    fn argb_display_omits_alpha_when_opaque() {
        assert_eq!(Argb::from_rgb(0x12, 0xAB, 0x34).to_string(), "#12AB34");
        assert_eq!(Argb(0x4012_AB34).to_string(), "#4012AB34");
    }

    #[test]
    fn argb_serializes_as_hex_string() {
        let json = serde_json::to_string(&Argb(0xFF00_FF00)).expect("serialize");
        assert_eq!(json, "\"#00FF00\"");
        let parsed: Argb = serde_json::from_str("\"#8000FF00\"").expect("deserialize");
        assert_eq!(parsed, Argb(0x8000_FF00));
    }

    #[test]
    fn merge_dirty_never_shrinks() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 20.0, 8.0);
        let merged = merge_dirty(Some(a), Some(b)).expect("merged rect");
        assert!(merged.contains(&a));
        assert!(merged.contains(&b));
        assert_eq!(merge_dirty(Some(a), None), Some(a));
        assert_eq!(merge_dirty(None, Some(b)), Some(b));
        assert_eq!(merge_dirty(None, None), None);
    }

    #[test]
    fn rect_bounding_covers_all_points() {
        let points = [
            Point::new(3.0, 4.0),
            Point::new(-1.0, 10.0),
            Point::new(7.0, 2.0),
        ];
        assert_eq!(
            Rect::bounding(&points),
            Some(Rect::new(-1.0, 2.0, 7.0, 10.0))
        );
        assert_eq!(Rect::bounding(&[]), None);
    }
}
