//! Edge-preserving noise reduction.
//!
//! A bilateral filter on perceptual luma: neighbours are weighted by
//! distance and by how close their luma is, so flat areas are smoothed
//! while edges keep their step. The range sigma grows with strength and the
//! result is blended back by strength.

use super::buffer::LinearFrame;
use super::transfer::{from_perceptual, perceptual};

const RADIUS: isize = 2;
const SPATIAL_SIGMA: f32 = 1.0;
/// Range sigma at full strength, in perceptual luma.
const MAX_RANGE_SIGMA: f32 = 0.1;

fn bilateral(luma: &[f32], width: usize, height: usize, range_sigma: f32) -> Vec<f32> {
    let spatial_denom = 2.0 * SPATIAL_SIGMA * SPATIAL_SIGMA;
    let range_denom = 2.0 * range_sigma * range_sigma;
    let sample = |i: isize, len: usize| i.clamp(0, len as isize - 1) as usize;

    let mut out = vec![0f32; luma.len()];
    for y in 0..height {
        for x in 0..width {
            let center = luma[y * width + x];
            let mut sum = 0.0;
            let mut norm = 0.0;
            for dy in -RADIUS..=RADIUS {
                let sy = sample(y as isize + dy, height);
                for dx in -RADIUS..=RADIUS {
                    let sx = sample(x as isize + dx, width);
                    let v = luma[sy * width + sx];
                    let d = v - center;
                    let w = (-((dx * dx + dy * dy) as f32) / spatial_denom - d * d / range_denom)
                        .exp();
                    sum += w * v;
                    norm += w;
                }
            }
            out[y * width + x] = sum / norm;
        }
    }
    out
}

pub(crate) fn apply(img: &mut LinearFrame, strength: f32) {
    let strength = strength.clamp(0.0, 1.0);
    if strength == 0.0 {
        return;
    }
    let luminance = img.luminance();
    let luma: Vec<f32> = luminance.iter().map(|&y| perceptual(y)).collect();
    let filtered = bilateral(&luma, img.width, img.height, MAX_RANGE_SIGMA * strength);

    let denoised: Vec<f32> = luma
        .iter()
        .zip(&filtered)
        .map(|(&l, &f)| from_perceptual((l + strength * (f - l)).clamp(0.0, 1.0)))
        .collect();
    img.apply_luminance(&luminance, &denoised);
}
