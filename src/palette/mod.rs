//! Color palettes: color-theory rules from a base color, and k-means
//! extraction from images.

mod hsl;
mod kmeans;
mod worker;

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::geometry::Argb;

pub use hsl::{rotate_hue, Hsl};
pub use kmeans::{
    extract_palette_from_image, extract_palette_with, kmeans, sample_pixels, KMeansOutcome,
    DEFAULT_SAMPLE_BUDGET, KMEANS_ITERATIONS,
};
pub use worker::PaletteJob;

pub type PaletteResult<T> = std::result::Result<T, PaletteError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaletteError {
    #[error("palette needs at least one color")]
    InvalidCount,
    #[error("image has no pixels to sample")]
    EmptyImage,
    #[error("palette job was cancelled")]
    Cancelled,
    #[error("palette worker exited without a result")]
    WorkerDisconnected,
    #[error("unknown palette type {0:?}")]
    UnknownType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteType {
    Complementary,
    Analogous,
    Triadic,
    Tetradic,
    SplitComplementary,
    Monochromatic,
}

impl PaletteType {
    pub const ALL: [PaletteType; 6] = [
        Self::Complementary,
        Self::Analogous,
        Self::Triadic,
        Self::Tetradic,
        Self::SplitComplementary,
        Self::Monochromatic,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Complementary => "Complementary",
            Self::Analogous => "Analogous",
            Self::Triadic => "Triadic",
            Self::Tetradic => "Tetradic",
            Self::SplitComplementary => "Split Complementary",
            Self::Monochromatic => "Monochromatic",
        }
    }

    /// Hue offsets in degrees, base hue first.
    pub const fn hue_offsets(self) -> &'static [f32] {
        match self {
            Self::Complementary => &[0.0, 180.0],
            Self::Analogous => &[0.0, -30.0, 30.0],
            Self::Triadic => &[0.0, 120.0, 240.0],
            Self::Tetradic => &[0.0, 90.0, 180.0, 270.0],
            Self::SplitComplementary => &[0.0, 150.0, 210.0],
            Self::Monochromatic => &[0.0],
        }
    }

    /// Lower bound of the saturation and lightness scale applied to slots
    /// beyond the fixed hue set.
    pub const fn perturbation_floor(self) -> f32 {
        match self {
            Self::Triadic | Self::Tetradic => 0.5,
            Self::Complementary
            | Self::Analogous
            | Self::SplitComplementary
            | Self::Monochromatic => 0.7,
        }
    }
}

impl fmt::Display for PaletteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaletteType {
    type Err = PaletteError;

    fn from_str(value: &str) -> PaletteResult<Self> {
        let normalized = value
            .trim()
            .to_ascii_lowercase()
            .replace(|c: char| c == '-' || c == ' ', "_");
        match normalized.as_str() {
            "complementary" => Ok(Self::Complementary),
            "analogous" => Ok(Self::Analogous),
            "triadic" => Ok(Self::Triadic),
            "tetradic" => Ok(Self::Tetradic),
            "split_complementary" => Ok(Self::SplitComplementary),
            "monochromatic" => Ok(Self::Monochromatic),
            _ => Err(PaletteError::UnknownType(value.to_string())),
        }
    }
}

/// Generated or extracted palette. `palette_type` is `None` for extracted palettes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub id: Uuid,
    pub name: String,
    pub colors: Vec<Argb>,
    pub palette_type: Option<PaletteType>,
}

impl Palette {
    fn new(name: String, colors: Vec<Argb>, palette_type: Option<PaletteType>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            colors,
            palette_type,
        }
    }
}

/// Exactly `count` colors from `base` following `palette_type`.
///
/// Slot 0 is `base` itself. Slots past the type's fixed hue set cycle those
/// hues with saturation and lightness scaled by a random factor.
pub fn generate_palette<R: Rng + ?Sized>(
    base: Argb,
    palette_type: PaletteType,
    count: usize,
    rng: &mut R,
) -> PaletteResult<Palette> {
    if count == 0 {
        return Err(PaletteError::InvalidCount);
    }
    let colors = match palette_type {
        PaletteType::Monochromatic => monochromatic(base, count),
        _ => rule_colors(base, palette_type, count, rng),
    };
    tracing::debug!(%base, ?palette_type, count, "palette generated");
    Ok(Palette::new(
        format!("{} {}", palette_type.label(), base),
        colors,
        Some(palette_type),
    ))
}

fn rule_colors<R: Rng + ?Sized>(
    base: Argb,
    palette_type: PaletteType,
    count: usize,
    rng: &mut R,
) -> Vec<Argb> {
    let hsl = Hsl::from_argb(base);
    let offsets = palette_type.hue_offsets();
    let floor = palette_type.perturbation_floor();
    (0..count)
        .map(|slot| {
            if slot == 0 {
                return base;
            }
            let rotated = hsl.rotated(offsets[slot % offsets.len()]);
            if slot < offsets.len() {
                return rotated.to_argb(base.alpha());
            }
            Hsl::new(
                rotated.h,
                rotated.s * rng.gen_range(floor..=1.0),
                rotated.l * rng.gen_range(floor..=1.0),
            )
            .to_argb(base.alpha())
        })
        .collect()
}

/// Lightness swept from 0.2 to 0.8, saturation tapered by up to 30%.
fn monochromatic(base: Argb, count: usize) -> Vec<Argb> {
    if count == 1 {
        return vec![base];
    }
    let hsl = Hsl::from_argb(base);
    let last = (count - 1) as f32;
    (0..count)
        .map(|stop| {
            let t = stop as f32 / last;
            Hsl::new(hsl.h, hsl.s * (1.0 - 0.3 * t), 0.2 + 0.6 * t).to_argb(base.alpha())
        })
        .collect()
}
