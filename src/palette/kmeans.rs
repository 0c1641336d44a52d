use std::sync::atomic::{AtomicBool, Ordering};

use image::RgbaImage;
use rand::seq::index;
use rand::Rng;

use super::{Palette, PaletteError, PaletteResult};
use crate::geometry::Argb;

/// Upper bound on samples taken from an image before clustering.
pub const DEFAULT_SAMPLE_BUDGET: usize = 10_000;
/// Fixed number of assign/update rounds; there is no convergence check.
pub const KMEANS_ITERATIONS: usize = 10;

type Rgb = [f32; 3];

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansOutcome {
    pub centroids: Vec<Rgb>,
    pub iterations: usize,
}

/// Every `max(1, pixel_count / budget)`-th pixel in row-major order, as RGB.
pub fn sample_pixels(image: &RgbaImage, budget: usize) -> Vec<Rgb> {
    let pixel_count = image.width() as usize * image.height() as usize;
    let stride = (pixel_count / budget.max(1)).max(1);
    image
        .pixels()
        .step_by(stride)
        .map(|pixel| {
            let [r, g, b, _] = pixel.0;
            [f32::from(r), f32::from(g), f32::from(b)]
        })
        .collect()
}

/// Clusters `samples` into `k` centroids.
///
/// Centroids start at `k` distinct random samples (repeating them when there
/// are fewer samples than `k`). Each round assigns samples to the nearest
/// centroid by squared distance and moves every non-empty cluster's centroid
/// to its mean; empty clusters keep their centroid. `cancel` is polled before
/// each round.
pub fn kmeans<R: Rng + ?Sized>(
    samples: &[Rgb],
    k: usize,
    rng: &mut R,
    cancel: Option<&AtomicBool>,
) -> PaletteResult<KMeansOutcome> {
    if k == 0 {
        return Err(PaletteError::InvalidCount);
    }
    if samples.is_empty() {
        return Err(PaletteError::EmptyImage);
    }

    let chosen = index::sample(rng, samples.len(), k.min(samples.len())).into_vec();
    let mut centroids = (0..k)
        .map(|slot| samples[chosen[slot % chosen.len()]])
        .collect::<Vec<_>>();

    let mut assignments = vec![0usize; samples.len()];
    let mut iterations = 0;
    for _ in 0..KMEANS_ITERATIONS {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return Err(PaletteError::Cancelled);
        }

        for (sample, assignment) in samples.iter().zip(assignments.iter_mut()) {
            *assignment = nearest(&centroids, sample);
        }

        let mut sums = vec![[0.0_f64; 3]; k];
        let mut counts = vec![0usize; k];
        for (sample, &cluster) in samples.iter().zip(&assignments) {
            for channel in 0..3 {
                sums[cluster][channel] += f64::from(sample[channel]);
            }
            counts[cluster] += 1;
        }
        for ((centroid, sum), &count) in centroids.iter_mut().zip(&sums).zip(&counts) {
            if count > 0 {
                for channel in 0..3 {
                    centroid[channel] = (sum[channel] / count as f64) as f32;
                }
            }
        }
        iterations += 1;
    }

    Ok(KMeansOutcome {
        centroids,
        iterations,
    })
}

fn nearest(centroids: &[Rgb], sample: &Rgb) -> usize {
    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    for (index, centroid) in centroids.iter().enumerate() {
        let distance = (0..3)
            .map(|channel| (centroid[channel] - sample[channel]).powi(2))
            .sum::<f32>();
        if distance < best_distance {
            best = index;
            best_distance = distance;
        }
    }
    best
}

fn centroid_color(centroid: &Rgb) -> Argb {
    let channel = |value: f32| value.round().clamp(0.0, 255.0) as u8;
    Argb::from_rgb(
        channel(centroid[0]),
        channel(centroid[1]),
        channel(centroid[2]),
    )
}

/// `count` dominant colors of `image`, sampled within the default budget.
pub fn extract_palette_from_image<R: Rng + ?Sized>(
    image: &RgbaImage,
    count: usize,
    rng: &mut R,
) -> PaletteResult<Palette> {
    extract_palette_with(image, count, DEFAULT_SAMPLE_BUDGET, rng, None)
}

pub fn extract_palette_with<R: Rng + ?Sized>(
    image: &RgbaImage,
    count: usize,
    sample_budget: usize,
    rng: &mut R,
    cancel: Option<&AtomicBool>,
) -> PaletteResult<Palette> {
    if count == 0 {
        return Err(PaletteError::InvalidCount);
    }
    let samples = sample_pixels(image, sample_budget);
    let outcome = kmeans(&samples, count, rng, cancel)?;
    tracing::debug!(
        samples = samples.len(),
        count,
        iterations = outcome.iterations,
        "palette extracted"
    );
    Ok(Palette::new(
        "Extracted".to_string(),
        outcome.centroids.iter().map(centroid_color).collect(),
        None,
    ))
}
