//! Working representation of a frame during enhancement.

use lumen_models::{Frame, PixelBuffer};

use super::transfer::{luminance, Transfer, BLACK_EPSILON};
use crate::error::{MediaError, MediaResult};

/// Linear-light RGB in [0,1], alpha kept as untouched code values.
#[derive(Debug, Clone)]
pub(crate) struct LinearFrame {
    pub width: usize,
    pub height: usize,
    pub rgb: Vec<[f32; 3]>,
    alpha: Option<Vec<u32>>,
}

impl LinearFrame {
    /// Validate and decode a frame.
    pub fn decode(frame: &Frame) -> MediaResult<Self> {
        frame.validate().map_err(MediaError::invalid_frame)?;

        let transfer = Transfer::for_color_space(frame.color_space);
        let max = frame.max_code();
        let scale = max as f32;
        let lut: Vec<f32> = (0..=max)
            .map(|code| transfer.to_linear(code as f32 / scale))
            .collect();

        let channels = frame.layout.channels();
        let pixels = frame.pixel_count();
        let mut rgb = Vec::with_capacity(pixels);
        let mut alpha = frame.layout.has_alpha().then(|| Vec::with_capacity(pixels));

        for i in 0..pixels {
            let base = i * channels;
            rgb.push([
                lut[frame.data.code(base) as usize],
                lut[frame.data.code(base + 1) as usize],
                lut[frame.data.code(base + 2) as usize],
            ]);
            if let Some(alpha) = alpha.as_mut() {
                alpha.push(frame.data.code(base + 3));
            }
        }

        Ok(Self {
            width: frame.width as usize,
            height: frame.height as usize,
            rgb,
            alpha,
        })
    }

    /// Encode into a frame with the same format as `template`.
    ///
    /// Values are re-encoded with the template's transfer, rounded to the
    /// nearest code and clamped to the legal range.
    pub fn encode(&self, template: &Frame) -> Frame {
        let transfer = Transfer::for_color_space(template.color_space);
        let max = template.max_code();
        let scale = max as f32;
        let channels = template.layout.channels();
        let quantize = |v: f32| -> u32 {
            let code = (transfer.from_linear(v) * scale).round();
            if code.is_nan() {
                0
            } else {
                code.clamp(0.0, scale) as u32
            }
        };

        let mut codes = Vec::with_capacity(self.rgb.len() * channels);
        for (i, px) in self.rgb.iter().enumerate() {
            codes.extend(px.iter().map(|&v| quantize(v)));
            if let Some(alpha) = &self.alpha {
                codes.push(alpha[i].min(max));
            }
        }

        let data = match template.data {
            PixelBuffer::U8(_) => PixelBuffer::U8(codes.into_iter().map(|c| c as u8).collect()),
            PixelBuffer::U16(_) => PixelBuffer::U16(codes.into_iter().map(|c| c as u16).collect()),
        };

        Frame {
            width: template.width,
            height: template.height,
            layout: template.layout,
            bit_depth: template.bit_depth,
            color_space: template.color_space,
            timestamp: template.timestamp,
            data,
        }
    }

    /// Linear luminance per pixel.
    pub fn luminance(&self) -> Vec<f32> {
        self.rgb.iter().map(|&px| luminance(px)).collect()
    }

    /// Rescale each pixel so its luminance moves from `old` to `new`.
    ///
    /// Scaling keeps hue. Black pixels have no hue and are raised as gray.
    pub fn apply_luminance(&mut self, old: &[f32], new: &[f32]) {
        for ((px, &y0), &y1) in self.rgb.iter_mut().zip(old).zip(new) {
            if y0 > BLACK_EPSILON {
                let ratio = y1 / y0;
                for c in px.iter_mut() {
                    *c = (*c * ratio).clamp(0.0, 1.0);
                }
            } else {
                let lift = (y1 - y0).max(0.0);
                for c in px.iter_mut() {
                    *c = (*c + lift).clamp(0.0, 1.0);
                }
            }
        }
    }
}
