//! Edge-aware unsharp masking on luma.

use super::buffer::LinearFrame;
use super::transfer::{from_perceptual, perceptual};

/// Normalized 1-D Gaussian kernel covering three sigmas.
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (3.0 * sigma).ceil().max(1.0) as usize;
    let denom = 2.0 * sigma * sigma;
    let weights: Vec<f32> = (0..=2 * radius)
        .map(|i| {
            let d = i as f32 - radius as f32;
            (-d * d / denom).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Separable blur with clamp-to-edge borders.
fn blur(src: &[f32], width: usize, height: usize, sigma: f32) -> Vec<f32> {
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;
    let sample = |i: isize, len: usize| i.clamp(0, len as isize - 1) as usize;

    let mut horizontal = vec![0f32; src.len()];
    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        for x in 0..width {
            horizontal[y * width + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| w * row[sample(x as isize + k as isize - radius, width)])
                .sum();
        }
    }

    let mut out = vec![0f32; src.len()];
    for y in 0..height {
        for x in 0..width {
            out[y * width + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let sy = sample(y as isize + k as isize - radius, height);
                    w * horizontal[sy * width + x]
                })
                .sum();
        }
    }
    out
}

/// Gate that is 0 in flat regions and reaches 1 at twice the threshold.
fn edge_gate(contrast: f32, threshold: f32) -> f32 {
    if threshold <= 0.0 {
        return 1.0;
    }
    ((contrast - threshold) / threshold).clamp(0.0, 1.0)
}

pub(crate) fn apply(img: &mut LinearFrame, strength: f32, sigma: f32, edge_threshold: f32) {
    let luminance = img.luminance();
    let luma: Vec<f32> = luminance.iter().map(|&y| perceptual(y)).collect();
    let blurred = blur(&luma, img.width, img.height, sigma);

    let sharpened: Vec<f32> = luma
        .iter()
        .zip(&blurred)
        .map(|(&l, &b)| {
            let detail = l - b;
            let gate = edge_gate(detail.abs(), edge_threshold);
            from_perceptual((l + strength * gate * detail).clamp(0.0, 1.0))
        })
        .collect();

    img.apply_luminance(&luminance, &sharpened);
}
