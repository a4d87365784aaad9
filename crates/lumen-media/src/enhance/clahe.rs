//! Shadow lift through contrast-limited adaptive histogram equalization.
//!
//! CLAHE runs on perceptual luma: per-tile histograms are clipped at
//! `clip_limit` times the uniform bin height, the excess is spread over all
//! bins, and the resulting CDFs are bilinearly interpolated between tile
//! centers. The equalized luma only ever raises a pixel, and its weight
//! fades linearly to zero at the shadow ceiling so midtones and highlights
//! keep their original tone.

use super::buffer::LinearFrame;
use super::transfer::{from_perceptual, perceptual};

const BINS: usize = 256;

/// Tunables of the shadow-lift stage.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ClaheParams {
    pub clip_limit: f32,
    pub tile_grid: u32,
    pub shadow_ceiling: f32,
}

pub(crate) fn apply(img: &mut LinearFrame, strength: f32, params: ClaheParams) {
    let luminance = img.luminance();
    let luma: Vec<f32> = luminance.iter().map(|&y| perceptual(y)).collect();
    let equalized = equalize(&luma, img.width, img.height, params.clip_limit, params.tile_grid);

    let lifted: Vec<f32> = luma
        .iter()
        .zip(&equalized)
        .map(|(&l, &eq)| {
            let weight = strength * shadow_weight(l, params.shadow_ceiling);
            from_perceptual(l + weight * (eq - l).max(0.0))
        })
        .collect();

    img.apply_luminance(&luminance, &lifted);
}

/// 1 at black, falling linearly to 0 at `ceiling`.
fn shadow_weight(luma: f32, ceiling: f32) -> f32 {
    (1.0 - luma / ceiling).clamp(0.0, 1.0)
}

fn bin_of(v: f32) -> usize {
    ((v.clamp(0.0, 1.0) * (BINS - 1) as f32).round() as usize).min(BINS - 1)
}

/// Tile mapping functions, `lut[bin]` in [0,1].
fn tile_lut(
    luma: &[f32],
    width: usize,
    x0: usize,
    x1: usize,
    y0: usize,
    y1: usize,
    clip_limit: f32,
) -> [f32; BINS] {
    let mut hist = [0u32; BINS];
    for y in y0..y1 {
        for &l in &luma[y * width + x0..y * width + x1] {
            hist[bin_of(l)] += 1;
        }
    }
    let total = ((x1 - x0) * (y1 - y0)) as u32;

    let limit = ((clip_limit * total as f32 / BINS as f32).ceil() as u32).max(1);
    let mut excess = 0u32;
    for count in hist.iter_mut() {
        if *count > limit {
            excess += *count - limit;
            *count = limit;
        }
    }
    let share = excess / BINS as u32;
    let remainder = (excess % BINS as u32) as usize;
    for (i, count) in hist.iter_mut().enumerate() {
        *count += share + u32::from(i < remainder);
    }

    let mut lut = [0f32; BINS];
    let mut cdf = 0u32;
    for (slot, &count) in lut.iter_mut().zip(&hist) {
        cdf += count;
        *slot = cdf as f32 / total as f32;
    }
    lut
}

/// CLAHE-equalized luma for every pixel.
fn equalize(luma: &[f32], width: usize, height: usize, clip_limit: f32, grid: u32) -> Vec<f32> {
    let tiles_x = (grid as usize).clamp(1, width);
    let tiles_y = (grid as usize).clamp(1, height);
    let bounds =
        |tile: usize, tiles: usize, len: usize| (tile * len / tiles, (tile + 1) * len / tiles);

    let mut luts = Vec::with_capacity(tiles_x * tiles_y);
    for ty in 0..tiles_y {
        let (y0, y1) = bounds(ty, tiles_y, height);
        for tx in 0..tiles_x {
            let (x0, x1) = bounds(tx, tiles_x, width);
            luts.push(tile_lut(luma, width, x0, x1, y0, y1, clip_limit));
        }
    }

    // Position of a pixel in tile-center coordinates, split into the lower
    // neighbouring tile and the interpolation weight toward the upper one.
    let locate = |p: usize, len: usize, tiles: usize| -> (usize, usize, f32) {
        let pos = (p as f32 + 0.5) * tiles as f32 / len as f32 - 0.5;
        if pos <= 0.0 {
            return (0, 0, 0.0);
        }
        let lo = pos.floor() as usize;
        if lo >= tiles - 1 {
            return (tiles - 1, tiles - 1, 0.0);
        }
        (lo, lo + 1, pos - lo as f32)
    };

    let mut out = Vec::with_capacity(luma.len());
    for y in 0..height {
        let (ty0, ty1, wy) = locate(y, height, tiles_y);
        for x in 0..width {
            let (tx0, tx1, wx) = locate(x, width, tiles_x);
            let bin = bin_of(luma[y * width + x]);
            let at = |tx: usize, ty: usize| luts[ty * tiles_x + tx][bin];
            let top = at(tx0, ty0) * (1.0 - wx) + at(tx1, ty0) * wx;
            let bottom = at(tx0, ty1) * (1.0 - wx) + at(tx1, ty1) * wx;
            out.push(top * (1.0 - wy) + bottom * wy);
        }
    }
    out
}
