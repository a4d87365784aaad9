//! Decoded frame exchanged with external decoders and encoders.
//!
//! The pipeline never touches containers or codecs: a decoder hands over a
//! pixel buffer with its timestamp, bit depth and color space, and receives
//! an enhanced buffer in exactly the same format.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Channel layout of the interleaved pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PixelLayout {
    Rgb,
    Rgba,
}

impl PixelLayout {
    /// Samples per pixel.
    pub fn channels(&self) -> usize {
        match self {
            PixelLayout::Rgb => 3,
            PixelLayout::Rgba => 4,
        }
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, PixelLayout::Rgba)
    }
}

/// Transfer characteristics of the stored samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    /// sRGB primaries with the sRGB transfer curve
    #[default]
    Srgb,
    /// BT.709 primaries with the BT.709 camera transfer curve
    Rec709,
    /// Linear-light sRGB primaries
    Linear,
}

/// Interleaved sample storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PixelBuffer {
    /// 8-bit samples
    U8(Vec<u8>),
    /// 9 to 16-bit samples, stored low-aligned in 16-bit words
    U16(Vec<u16>),
}

impl PixelBuffer {
    pub fn len(&self) -> usize {
        match self {
            PixelBuffer::U8(data) => data.len(),
            PixelBuffer::U16(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample at `index` as an integer code value.
    pub fn code(&self, index: usize) -> u32 {
        match self {
            PixelBuffer::U8(data) => data[index] as u32,
            PixelBuffer::U16(data) => data[index] as u32,
        }
    }
}

/// A decoded video frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Frame width (pixels)
    pub width: u32,
    /// Frame height (pixels)
    pub height: u32,
    /// Channel layout of `data`
    pub layout: PixelLayout,
    /// Significant bits per sample (8..=16)
    pub bit_depth: u8,
    /// Transfer characteristics of `data`
    pub color_space: ColorSpace,
    /// Presentation time in session seconds
    pub timestamp: f64,
    /// Interleaved samples, row-major
    pub data: PixelBuffer,
}

impl Frame {
    /// Create an 8-bit frame.
    pub fn from_rgb8(
        width: u32,
        height: u32,
        layout: PixelLayout,
        timestamp: f64,
        data: Vec<u8>,
    ) -> Self {
        Self {
            width,
            height,
            layout,
            bit_depth: 8,
            color_space: ColorSpace::Srgb,
            timestamp,
            data: PixelBuffer::U8(data),
        }
    }

    /// Create a high bit depth frame.
    pub fn from_rgb16(
        width: u32,
        height: u32,
        layout: PixelLayout,
        bit_depth: u8,
        timestamp: f64,
        data: Vec<u16>,
    ) -> Self {
        Self {
            width,
            height,
            layout,
            bit_depth,
            color_space: ColorSpace::Srgb,
            timestamp,
            data: PixelBuffer::U16(data),
        }
    }

    /// Builder-style color space override.
    pub fn with_color_space(mut self, color_space: ColorSpace) -> Self {
        self.color_space = color_space;
        self
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Expected number of samples in `data`.
    pub fn expected_len(&self) -> usize {
        self.pixel_count() * self.layout.channels()
    }

    /// Largest legal code value for the bit depth.
    pub fn max_code(&self) -> u32 {
        (1u32 << self.bit_depth.min(16)) - 1
    }

    /// Check the buffer is well formed.
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("empty frame {}x{}", self.width, self.height));
        }
        if !self.timestamp.is_finite() {
            return Err("non-finite timestamp".to_string());
        }
        match (&self.data, self.bit_depth) {
            (PixelBuffer::U8(_), 8) => {}
            (PixelBuffer::U16(_), 9..=16) => {}
            (PixelBuffer::U8(_), depth) => {
                return Err(format!("8-bit buffer declared with bit depth {}", depth));
            }
            (PixelBuffer::U16(_), depth) => {
                return Err(format!("16-bit buffer declared with bit depth {}", depth));
            }
        }
        if self.data.len() != self.expected_len() {
            return Err(format!(
                "buffer holds {} samples, expected {} for {}x{} {:?}",
                self.data.len(),
                self.expected_len(),
                self.width,
                self.height,
                self.layout
            ));
        }
        if let PixelBuffer::U16(data) = &self.data {
            let max = self.max_code();
            if let Some(pos) = data.iter().position(|&v| v as u32 > max) {
                return Err(format!(
                    "sample {} exceeds {}-bit range at index {}",
                    data[pos], self.bit_depth, pos
                ));
            }
        }
        Ok(())
    }
}
