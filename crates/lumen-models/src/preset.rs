//! Enhancement quality presets.
//!
//! Presets fix the parts of the enhancement that do not follow telemetry:
//! CLAHE clip limit and tile grid, saturation boost, global tone curve and
//! denoising.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Shape of the global tone curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToneCurve {
    /// No global curve
    #[default]
    Linear,
    /// Fixed logistic curve centered on mid-gray
    SCurve,
    /// Per-frame histogram equalization curve
    Adaptive,
}

impl ToneCurve {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToneCurve::Linear => "linear",
            ToneCurve::SCurve => "s_curve",
            ToneCurve::Adaptive => "adaptive",
        }
    }
}

impl fmt::Display for ToneCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Enhancement preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementPreset {
    /// Coarse tiles, low clip limit. Fastest.
    Performance,
    /// Default trade-off.
    #[default]
    Balanced,
    /// Fine tiles, highest clip limit.
    Quality,
}

impl EnhancementPreset {
    pub const ALL: &'static [EnhancementPreset] = &[
        EnhancementPreset::Performance,
        EnhancementPreset::Balanced,
        EnhancementPreset::Quality,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnhancementPreset::Performance => "performance",
            EnhancementPreset::Balanced => "balanced",
            EnhancementPreset::Quality => "quality",
        }
    }

    /// CLAHE clip limit as a multiple of the uniform bin height.
    pub fn clahe_clip_limit(&self) -> f32 {
        match self {
            EnhancementPreset::Performance => 2.0,
            EnhancementPreset::Balanced => 3.0,
            EnhancementPreset::Quality => 4.0,
        }
    }

    /// CLAHE tiles per image side.
    pub fn clahe_tile_grid(&self) -> u32 {
        match self {
            EnhancementPreset::Performance => 4,
            EnhancementPreset::Balanced => 8,
            EnhancementPreset::Quality => 16,
        }
    }

    /// Saturation multiplier applied in the color stage.
    pub fn saturation_boost(&self) -> f32 {
        match self {
            EnhancementPreset::Performance => 1.05,
            EnhancementPreset::Balanced => 1.10,
            EnhancementPreset::Quality => 1.15,
        }
    }

    pub fn tone_curve(&self) -> ToneCurve {
        match self {
            EnhancementPreset::Performance => ToneCurve::Linear,
            EnhancementPreset::Balanced => ToneCurve::SCurve,
            EnhancementPreset::Quality => ToneCurve::Adaptive,
        }
    }

    /// Blend toward the tone curve, 0..1.
    pub fn tone_curve_strength(&self) -> f32 {
        match self {
            EnhancementPreset::Performance => 0.0,
            EnhancementPreset::Balanced => 0.25,
            EnhancementPreset::Quality => 0.35,
        }
    }

    /// Edge-preserving denoise strength, 0..1. Off for performance.
    pub fn denoise_strength(&self) -> f32 {
        match self {
            EnhancementPreset::Performance => 0.0,
            EnhancementPreset::Balanced => 0.25,
            EnhancementPreset::Quality => 0.5,
        }
    }
}

impl fmt::Display for EnhancementPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EnhancementPreset {
    type Err = PresetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "performance" | "fast" => Ok(EnhancementPreset::Performance),
            "balanced" => Ok(EnhancementPreset::Balanced),
            "quality" => Ok(EnhancementPreset::Quality),
            _ => Err(PresetParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown enhancement preset: {0}")]
pub struct PresetParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parse() {
        assert_eq!(
            "Quality".parse::<EnhancementPreset>().unwrap(),
            EnhancementPreset::Quality
        );
        assert_eq!(
            "fast".parse::<EnhancementPreset>().unwrap(),
            EnhancementPreset::Performance
        );
        assert!("ultra".parse::<EnhancementPreset>().is_err());
    }

    #[test]
    fn test_presets_scale_with_quality() {
        let grids: Vec<u32> = EnhancementPreset::ALL
            .iter()
            .map(|p| p.clahe_tile_grid())
            .collect();
        assert_eq!(grids, vec![4, 8, 16]);
        assert_eq!(EnhancementPreset::default(), EnhancementPreset::Balanced);
    }

    #[test]
    fn test_tone_curve_and_denoise_per_preset() {
        let curves: Vec<ToneCurve> = EnhancementPreset::ALL
            .iter()
            .map(|p| p.tone_curve())
            .collect();
        assert_eq!(
            curves,
            vec![ToneCurve::Linear, ToneCurve::SCurve, ToneCurve::Adaptive]
        );
        assert_eq!(EnhancementPreset::Performance.denoise_strength(), 0.0);
        assert!(EnhancementPreset::Quality.denoise_strength() > 0.0);
        assert_eq!(ToneCurve::SCurve.to_string(), "s_curve");
    }
}
