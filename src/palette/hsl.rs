use crate::geometry::Argb;

/// Hue in degrees `[0, 360)`, saturation and lightness in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub fn new(h: f32, s: f32, l: f32) -> Self {
        Self {
            h: h.rem_euclid(360.0),
            s: s.clamp(0.0, 1.0),
            l: l.clamp(0.0, 1.0),
        }
    }

    pub fn from_argb(color: Argb) -> Self {
        let r = f32::from(color.red()) / 255.0;
        let g = f32::from(color.green()) / 255.0;
        let b = f32::from(color.blue()) / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        let d = max - min;
        if d.abs() < 1e-6 {
            return Self::new(0.0, 0.0, l);
        }
        let s = d / (1.0 - (2.0 * l - 1.0).abs());

        let sector = if max == r {
            ((g - b) / d).rem_euclid(6.0)
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };
        Self::new(sector * 60.0, s, l)
    }

    /// Six 60 degree sectors with chroma `c`, intermediate `x` and match `m`.
    pub fn to_argb(self, alpha: u8) -> Argb {
        let c = (1.0 - (2.0 * self.l - 1.0).abs()) * self.s;
        let h_prime = self.h.rem_euclid(360.0) / 60.0;
        let x = c * (1.0 - (h_prime.rem_euclid(2.0) - 1.0).abs());
        let m = self.l - c / 2.0;

        let (r, g, b) = match h_prime as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        Argb::from_argb(alpha, channel(r + m), channel(g + m), channel(b + m))
    }

    pub fn rotated(self, degrees: f32) -> Self {
        Self::new(self.h + degrees, self.s, self.l)
    }
}

fn channel(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Same color with its hue turned by `degrees`, alpha kept.
pub fn rotate_hue(color: Argb, degrees: f32) -> Argb {
    Hsl::from_argb(color).rotated(degrees).to_argb(color.alpha())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_colors_land_on_sector_boundaries() {
        let red = Hsl::from_argb(Argb::from_rgb(255, 0, 0));
        assert_eq!((red.h, red.s, red.l), (0.0, 1.0, 0.5));
        let green = Hsl::from_argb(Argb::from_rgb(0, 255, 0));
        assert_eq!(green.h, 120.0);
        let blue = Hsl::from_argb(Argb::from_rgb(0, 0, 255));
        assert_eq!(blue.h, 240.0);
    }

    #[test]
    fn conversion_round_trips_common_colors() {
        for color in [
            Argb::from_rgb(255, 51, 102),
            Argb::from_rgb(18, 140, 77),
            Argb::from_rgb(128, 128, 128),
            Argb::from_rgb(250, 240, 10),
            Argb::BLACK,
            Argb::WHITE,
        ] {
            assert_eq!(Hsl::from_argb(color).to_argb(255), color);
        }
    }

    #[test]
    fn rotating_red_by_180_gives_cyan() {
        assert_eq!(
            rotate_hue(Argb::from_rgb(255, 0, 0), 180.0),
            Argb::from_rgb(0, 255, 255)
        );
        assert_eq!(
            rotate_hue(Argb::from_rgb(255, 0, 0).with_alpha(80), 120.0),
            Argb::from_argb(80, 0, 255, 0)
        );
    }

    #[test]
    fn grays_have_no_saturation() {
        let gray = Hsl::from_argb(Argb::from_rgb(90, 90, 90));
        assert_eq!(gray.s, 0.0);
        assert_eq!(gray.h, 0.0);
    }
}
