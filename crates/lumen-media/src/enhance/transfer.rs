//! Transfer functions and luminance helpers.

use lumen_models::ColorSpace;

/// Rec. 709 luminance weights of linear sRGB primaries.
const LUMA_WEIGHTS: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Below this linear luminance a pixel is treated as black.
pub(crate) const BLACK_EPSILON: f32 = 1e-6;

/// Encoding curve of stored samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    Srgb,
    Bt709,
    Linear,
}

impl Transfer {
    pub fn for_color_space(color_space: ColorSpace) -> Self {
        match color_space {
            ColorSpace::Srgb => Transfer::Srgb,
            ColorSpace::Rec709 => Transfer::Bt709,
            ColorSpace::Linear => Transfer::Linear,
        }
    }

    /// Encoded [0,1] value to linear light.
    pub fn to_linear(self, v: f32) -> f32 {
        match self {
            Transfer::Srgb => srgb_to_linear(v),
            Transfer::Bt709 => bt709_to_linear(v),
            Transfer::Linear => v,
        }
    }

    /// Linear light to encoded [0,1] value.
    pub fn from_linear(self, v: f32) -> f32 {
        match self {
            Transfer::Srgb => linear_to_srgb(v),
            Transfer::Bt709 => linear_to_bt709(v),
            Transfer::Linear => v,
        }
    }
}

pub fn srgb_to_linear(v: f32) -> f32 {
    let v = v.clamp(0.0, 1.0);
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

pub fn linear_to_srgb(v: f32) -> f32 {
    let v = v.clamp(0.0, 1.0);
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

pub fn bt709_to_linear(v: f32) -> f32 {
    let v = v.clamp(0.0, 1.0);
    if v < 0.081 {
        v / 4.5
    } else {
        ((v + 0.099) / 1.099).powf(1.0 / 0.45)
    }
}

pub fn linear_to_bt709(v: f32) -> f32 {
    let v = v.clamp(0.0, 1.0);
    if v < 0.018 {
        v * 4.5
    } else {
        1.099 * v.powf(0.45) - 0.099
    }
}

/// Relative luminance of a linear RGB triple.
#[inline]
pub fn luminance(rgb: [f32; 3]) -> f32 {
    LUMA_WEIGHTS[0] * rgb[0] + LUMA_WEIGHTS[1] * rgb[1] + LUMA_WEIGHTS[2] * rgb[2]
}

/// Perceptual (sRGB-encoded) luma of a linear luminance.
#[inline]
pub fn perceptual(y: f32) -> f32 {
    linear_to_srgb(y)
}

/// Linear luminance of a perceptual luma.
#[inline]
pub fn from_perceptual(l: f32) -> f32 {
    srgb_to_linear(l)
}
