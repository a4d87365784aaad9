//! Global tone shaping on perceptual luma.
//!
//! Contrast pivots around mid-gray:
//!
//! ```text
//! l' = 0.5 + (l - 0.5) * contrast
//! ```
//!
//! The preset tone curve is blended in by strength: `s_curve` is a logistic
//! normalized to pass through 0, 0.5 and 1, and `adaptive` equalizes the
//! frame's own luma histogram.

use lumen_models::ToneCurve;

use super::buffer::LinearFrame;
use super::transfer::{from_perceptual, perceptual};

const BINS: usize = 256;
const S_CURVE_STEEPNESS: f32 = 12.0;

fn logistic(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Logistic S-curve with fixed endpoints.
pub(crate) fn s_curve(l: f32) -> f32 {
    let low = logistic(-0.5 * S_CURVE_STEEPNESS);
    let high = logistic(0.5 * S_CURVE_STEEPNESS);
    let y = logistic(S_CURVE_STEEPNESS * (l.clamp(0.0, 1.0) - 0.5));
    ((y - low) / (high - low)).clamp(0.0, 1.0)
}

fn bin_of(v: f32) -> usize {
    ((v.clamp(0.0, 1.0) * (BINS - 1) as f32).round() as usize).min(BINS - 1)
}

/// Cumulative luma distribution, `lut[bin]` in [0,1].
fn equalization_lut(luma: &[f32]) -> [f32; BINS] {
    let mut hist = [0u32; BINS];
    for &l in luma {
        hist[bin_of(l)] += 1;
    }
    let total = luma.len().max(1) as f32;
    let mut lut = [0f32; BINS];
    let mut cdf = 0u32;
    for (slot, &count) in lut.iter_mut().zip(&hist) {
        cdf += count;
        *slot = cdf as f32 / total;
    }
    lut
}

pub(crate) fn apply_contrast(img: &mut LinearFrame, contrast: f32) {
    let luminance = img.luminance();
    let mapped: Vec<f32> = luminance
        .iter()
        .map(|&y| from_perceptual((0.5 + (perceptual(y) - 0.5) * contrast).clamp(0.0, 1.0)))
        .collect();
    img.apply_luminance(&luminance, &mapped);
}

pub(crate) fn apply_curve(img: &mut LinearFrame, curve: ToneCurve, strength: f32) {
    let strength = strength.clamp(0.0, 1.0);
    if curve == ToneCurve::Linear || strength == 0.0 {
        return;
    }

    let luminance = img.luminance();
    let luma: Vec<f32> = luminance.iter().map(|&y| perceptual(y)).collect();
    let lut = match curve {
        ToneCurve::Adaptive => Some(equalization_lut(&luma)),
        _ => None,
    };

    let mapped: Vec<f32> = luma
        .iter()
        .map(|&l| {
            let target = match &lut {
                Some(lut) => lut[bin_of(l)],
                None => s_curve(l),
            };
            from_perceptual((l + strength * (target - l)).clamp(0.0, 1.0))
        })
        .collect();
    img.apply_luminance(&luminance, &mapped);
}
