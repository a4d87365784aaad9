//! Adaptive HDR configuration.
//!
//! Every tunable of the telemetry, parameter and enhancement stages lives in
//! [`AdaptiveHdrConfig`]. Defaults are documented on each field; a config is
//! validated once at startup and treated as immutable afterwards.

use std::path::Path;

use serde::{Deserialize, Serialize};

use lumen_models::{EnhancementPreset, TelemetryChannel, ToneCurve};

use crate::error::{MediaError, MediaResult};
use crate::params::PiecewiseLinear;

/// Largest accepted difference between the two configured white points.
const WHITE_POINT_TOLERANCE_K: f64 = 0.5;

/// Complete configuration for one pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveHdrConfig {
    pub telemetry: TelemetryConfig,
    pub generator: GeneratorConfig,
    pub smoother: SmootherConfig,
    pub enhancement: EnhancementConfig,
}

impl AdaptiveHdrConfig {
    /// Defaults with the enhancement tunables of `preset`.
    pub fn for_preset(preset: EnhancementPreset) -> Self {
        Self {
            enhancement: EnhancementConfig::from_preset(preset),
            ..Self::default()
        }
    }

    pub fn performance() -> Self {
        Self::for_preset(EnhancementPreset::Performance)
    }

    pub fn balanced() -> Self {
        Self::for_preset(EnhancementPreset::Balanced)
    }

    pub fn quality() -> Self {
        Self::for_preset(EnhancementPreset::Quality)
    }

    /// Parse a JSON config. Missing sections and fields take their defaults.
    pub fn from_json_str(json: &str) -> MediaResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> MediaResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Validate every section.
    ///
    /// The engine recovers the scene illuminant as `target_white_k` minus the
    /// generated correction, so both white points must agree.
    pub fn validate(&self) -> MediaResult<()> {
        self.telemetry.validate()?;
        self.generator.validate()?;
        self.smoother.validate()?;
        self.enhancement.validate()?;

        let generator_white = self.generator.color_temp_target_k;
        let engine_white = self.enhancement.target_white_k as f64;
        if (generator_white - engine_white).abs() > WHITE_POINT_TOLERANCE_K {
            return Err(MediaError::configuration(format!(
                "generator target white {} K does not match enhancement target white {} K",
                generator_white, engine_white
            )));
        }
        Ok(())
    }

    /// Set both white points to `kelvin`.
    pub fn with_target_white(mut self, kelvin: f64) -> Self {
        self.generator.color_temp_target_k = kelvin;
        self.enhancement.target_white_k = kelvin as f32;
        self
    }
}

/// EMA half-lives of the telemetry channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Ambient light half-life in seconds (default: 2.0)
    pub light_half_life_secs: f64,
    /// Color temperature half-life in seconds (default: 5.0)
    pub color_temp_half_life_secs: f64,
    /// Motion half-life in seconds (default: 0.5)
    pub motion_half_life_secs: f64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            light_half_life_secs: 2.0,
            color_temp_half_life_secs: 5.0,
            motion_half_life_secs: 0.5,
        }
    }
}

impl TelemetryConfig {
    pub fn half_life(&self, channel: TelemetryChannel) -> f64 {
        match channel {
            TelemetryChannel::Light => self.light_half_life_secs,
            TelemetryChannel::ColorTemp => self.color_temp_half_life_secs,
            TelemetryChannel::Motion => self.motion_half_life_secs,
        }
    }

    /// Longest half-life across channels.
    pub fn longest_half_life(&self) -> f64 {
        TelemetryChannel::ALL
            .iter()
            .map(|c| self.half_life(*c))
            .fold(0.0, f64::max)
    }

    pub fn validate(&self) -> MediaResult<()> {
        for channel in TelemetryChannel::ALL {
            let h = self.half_life(channel);
            if !h.is_finite() || h <= 0.0 {
                return Err(MediaError::configuration(format!(
                    "{} half-life must be positive, got {}",
                    channel, h
                )));
            }
        }
        Ok(())
    }
}

/// Upper bound for contrast curve outputs.
const MAX_CONTRAST: f64 = 2.0;

/// Telemetry to parameter mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Exposure gain vs lux (default: 100→1.8, 500→1.0, 2000→0.8)
    pub exposure_curve: PiecewiseLinear,
    /// Shadow lift vs lux (default: 100→0.9, 500→0.5, 2000→0.2)
    pub shadow_curve: PiecewiseLinear,
    /// Highlight rolloff vs lux (default: 100→0.2, 500→0.4, 2000→0.8)
    pub rolloff_curve: PiecewiseLinear,
    /// Contrast vs lux (default: 0→1.2, 100→1.1, 500→1.0, 1000→0.95, 10000→0.9)
    pub contrast_curve: PiecewiseLinear,
    /// Detail strength vs motion (default: 0.1→0.9, 0.7→0.2, 1.0→0.1)
    pub detail_curve: PiecewiseLinear,
    /// White point the color correction aims for (default: 6500 K)
    pub color_temp_target_k: f64,
    /// Correction per kelvin of deviation (default: 1.0)
    pub color_temp_gain: f64,
    /// Largest correction magnitude (default: 1500 K)
    pub color_temp_cap_k: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            exposure_curve: PiecewiseLinear::from_pairs(&[
                (100.0, 1.8),
                (500.0, 1.0),
                (2000.0, 0.8),
            ]),
            shadow_curve: PiecewiseLinear::from_pairs(&[
                (100.0, 0.9),
                (500.0, 0.5),
                (2000.0, 0.2),
            ]),
            rolloff_curve: PiecewiseLinear::from_pairs(&[
                (100.0, 0.2),
                (500.0, 0.4),
                (2000.0, 0.8),
            ]),
            contrast_curve: PiecewiseLinear::from_pairs(&[
                (0.0, 1.2),
                (100.0, 1.1),
                (500.0, 1.0),
                (1000.0, 0.95),
                (10000.0, 0.9),
            ]),
            detail_curve: PiecewiseLinear::from_pairs(&[(0.1, 0.9), (0.7, 0.2), (1.0, 0.1)]),
            color_temp_target_k: 6500.0,
            color_temp_gain: 1.0,
            color_temp_cap_k: 1500.0,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> MediaResult<()> {
        self.exposure_curve.validate("exposure")?;
        self.shadow_curve.validate("shadow")?;
        self.rolloff_curve.validate("rolloff")?;
        self.contrast_curve.validate("contrast")?;
        self.detail_curve.validate("detail")?;

        if self.exposure_curve.output_range().0 <= 0.0 {
            return Err(MediaError::configuration(
                "exposure curve outputs must be positive",
            ));
        }
        if !self.exposure_curve.is_non_increasing() {
            return Err(MediaError::configuration(
                "exposure curve must not increase with light",
            ));
        }
        if !self.shadow_curve.is_non_increasing() {
            return Err(MediaError::configuration(
                "shadow curve must not increase with light",
            ));
        }
        let (lo, hi) = self.contrast_curve.output_range();
        if lo <= 0.0 || hi > MAX_CONTRAST {
            return Err(MediaError::configuration(format!(
                "contrast curve outputs must lie in (0, {}], got [{}, {}]",
                MAX_CONTRAST, lo, hi
            )));
        }
        if !self.detail_curve.is_non_increasing() {
            return Err(MediaError::configuration(
                "detail curve must not increase with motion",
            ));
        }
        for (name, curve) in [
            ("shadow", &self.shadow_curve),
            ("rolloff", &self.rolloff_curve),
            ("detail", &self.detail_curve),
        ] {
            let (lo, hi) = curve.output_range();
            if lo < 0.0 || hi > 1.0 {
                return Err(MediaError::configuration(format!(
                    "{} curve outputs must lie in [0, 1], got [{}, {}]",
                    name, lo, hi
                )));
            }
        }

        let (min_k, max_k) = TelemetryChannel::ColorTemp.bounds();
        if !(min_k..=max_k).contains(&self.color_temp_target_k) {
            return Err(MediaError::configuration(format!(
                "color temperature target {} K outside [{}, {}]",
                self.color_temp_target_k, min_k, max_k
            )));
        }
        if !self.color_temp_gain.is_finite() {
            return Err(MediaError::configuration("color temperature gain must be finite"));
        }
        if !self.color_temp_cap_k.is_finite() || self.color_temp_cap_k < 0.0 {
            return Err(MediaError::configuration(format!(
                "color temperature cap must be non-negative, got {}",
                self.color_temp_cap_k
            )));
        }
        Ok(())
    }
}

/// Per-field rate limits of the temporal smoother.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmootherConfig {
    /// Exposure gain change per second (default: 0.3)
    pub max_exposure_rate: f64,
    /// Shadow lift change per second (default: 0.2)
    pub max_shadow_rate: f64,
    /// Highlight rolloff change per second (default: 0.2)
    pub max_rolloff_rate: f64,
    /// Color temperature correction change in kelvin per second (default: 500)
    pub max_color_temp_rate: f64,
    /// Contrast change per second (default: 0.1)
    pub max_contrast_rate: f64,
    /// Detail strength change per second (default: 0.3)
    pub max_detail_rate: f64,
    /// Idle gap after which a resumed stream may jump (default: 5.0 s)
    pub resume_gap_secs: f64,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            max_exposure_rate: 0.3,
            max_shadow_rate: 0.2,
            max_rolloff_rate: 0.2,
            max_color_temp_rate: 500.0,
            max_contrast_rate: 0.1,
            max_detail_rate: 0.3,
            resume_gap_secs: 5.0,
        }
    }
}

impl SmootherConfig {
    pub fn validate(&self) -> MediaResult<()> {
        for (name, rate) in [
            ("exposure", self.max_exposure_rate),
            ("shadow", self.max_shadow_rate),
            ("rolloff", self.max_rolloff_rate),
            ("color temperature", self.max_color_temp_rate),
            ("contrast", self.max_contrast_rate),
            ("detail", self.max_detail_rate),
        ] {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(MediaError::configuration(format!(
                    "{} rate limit must be positive, got {}",
                    name, rate
                )));
            }
        }
        if !self.resume_gap_secs.is_finite() || self.resume_gap_secs <= 0.0 {
            return Err(MediaError::configuration(format!(
                "resume gap must be positive, got {}",
                self.resume_gap_secs
            )));
        }
        Ok(())
    }
}

/// Fixed enhancement tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementConfig {
    /// CLAHE clip limit, multiple of the uniform bin height (default: 3.0)
    pub clahe_clip_limit: f32,
    /// CLAHE tiles per image side (default: 8)
    pub clahe_tile_grid: u32,
    /// Luma above which shadow lift no longer applies (default: 0.5)
    pub shadow_ceiling: f32,
    /// Knee position at full highlight rolloff (default: 0.5)
    pub min_knee: f32,
    /// Gaussian sigma of the detail blur in pixels (default: 1.0)
    pub detail_sigma: f32,
    /// Local contrast under which detail is not boosted (default: 0.01)
    pub edge_threshold: f32,
    /// Saturation multiplier in the color stage (default: 1.0)
    pub saturation_boost: f32,
    /// Global tone curve shape (default: linear)
    pub tone_curve: ToneCurve,
    /// Blend toward the tone curve in [0, 1] (default: 0.0)
    pub tone_curve_strength: f32,
    /// Edge-preserving denoise strength in [0, 1] (default: 0.0)
    pub denoise_strength: f32,
    /// Output white point in kelvin (default: 6500)
    pub target_white_k: f32,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            clahe_clip_limit: 3.0,
            clahe_tile_grid: 8,
            shadow_ceiling: 0.5,
            min_knee: 0.5,
            detail_sigma: 1.0,
            edge_threshold: 0.01,
            saturation_boost: 1.0,
            tone_curve: ToneCurve::Linear,
            tone_curve_strength: 0.0,
            denoise_strength: 0.0,
            target_white_k: 6500.0,
        }
    }
}

impl EnhancementConfig {
    pub fn from_preset(preset: EnhancementPreset) -> Self {
        Self {
            clahe_clip_limit: preset.clahe_clip_limit(),
            clahe_tile_grid: preset.clahe_tile_grid(),
            saturation_boost: preset.saturation_boost(),
            tone_curve: preset.tone_curve(),
            tone_curve_strength: preset.tone_curve_strength(),
            denoise_strength: preset.denoise_strength(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> MediaResult<()> {
        if !self.clahe_clip_limit.is_finite() || self.clahe_clip_limit < 1.0 {
            return Err(MediaError::configuration(format!(
                "CLAHE clip limit must be at least 1.0, got {}",
                self.clahe_clip_limit
            )));
        }
        if !(1..=64).contains(&self.clahe_tile_grid) {
            return Err(MediaError::configuration(format!(
                "CLAHE tile grid must be in 1..=64, got {}",
                self.clahe_tile_grid
            )));
        }
        for (name, value) in [
            ("shadow ceiling", self.shadow_ceiling),
            ("minimum knee", self.min_knee),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(MediaError::configuration(format!(
                    "{} must be in (0, 1], got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [
            ("tone curve strength", self.tone_curve_strength),
            ("denoise strength", self.denoise_strength),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(MediaError::configuration(format!(
                    "{} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }
        if !self.detail_sigma.is_finite() || self.detail_sigma <= 0.0 {
            return Err(MediaError::configuration(format!(
                "detail sigma must be positive, got {}",
                self.detail_sigma
            )));
        }
        if !self.edge_threshold.is_finite() || self.edge_threshold < 0.0 {
            return Err(MediaError::configuration("edge threshold must be non-negative"));
        }
        if !self.saturation_boost.is_finite() || self.saturation_boost < 0.0 {
            return Err(MediaError::configuration("saturation boost must be non-negative"));
        }
        let (min_k, max_k) = TelemetryChannel::ColorTemp.bounds();
        if !(min_k..=max_k).contains(&(self.target_white_k as f64)) {
            return Err(MediaError::configuration(format!(
                "target white {} K outside [{}, {}]",
                self.target_white_k, min_k, max_k
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AdaptiveHdrConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.telemetry.half_life(TelemetryChannel::Motion), 0.5);
        assert_eq!(config.telemetry.longest_half_life(), 5.0);
        assert_eq!(config.smoother.resume_gap_secs, 5.0);
        assert_eq!(config.enhancement.saturation_boost, 1.0);
    }

    #[test]
    fn test_presets() {
        for config in [
            AdaptiveHdrConfig::performance(),
            AdaptiveHdrConfig::balanced(),
            AdaptiveHdrConfig::quality(),
        ] {
            assert!(config.validate().is_ok());
        }
        assert_eq!(AdaptiveHdrConfig::quality().enhancement.clahe_tile_grid, 16);
        assert_eq!(AdaptiveHdrConfig::performance().enhancement.clahe_clip_limit, 2.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = AdaptiveHdrConfig::default();
        config.telemetry.light_half_life_secs = 0.0;
        assert!(matches!(
            config.validate(),
            Err(MediaError::Configuration(_))
        ));

        let mut config = AdaptiveHdrConfig::default();
        config.generator.exposure_curve =
            PiecewiseLinear::from_pairs(&[(100.0, 0.5), (2000.0, 1.5)]);
        assert!(config.validate().is_err());

        let mut config = AdaptiveHdrConfig::default();
        config.generator.shadow_curve = PiecewiseLinear::from_pairs(&[(100.0, 1.2), (500.0, 0.5)]);
        assert!(config.validate().is_err());

        let mut config = AdaptiveHdrConfig::default();
        config.smoother.max_color_temp_rate = -1.0;
        assert!(config.validate().is_err());

        let mut config = AdaptiveHdrConfig::default();
        config.enhancement.clahe_tile_grid = 0;
        assert!(config.validate().is_err());

        let mut config = AdaptiveHdrConfig::default();
        config.enhancement.denoise_strength = 1.5;
        assert!(config.validate().is_err());

        let mut config = AdaptiveHdrConfig::default();
        config.generator.contrast_curve =
            PiecewiseLinear::from_pairs(&[(0.0, 0.0), (500.0, 1.0)]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rising_shadow_curve_rejected() {
        let mut config = AdaptiveHdrConfig::default();
        config.generator.shadow_curve =
            PiecewiseLinear::from_pairs(&[(100.0, 0.2), (500.0, 0.5), (2000.0, 0.9)]);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, MediaError::Configuration(_)));
        assert!(err.to_string().contains("shadow curve"));
    }

    #[test]
    fn test_white_points_must_agree() {
        let mut config = AdaptiveHdrConfig::default();
        config.generator.color_temp_target_k = 5000.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, MediaError::Configuration(_)));
        assert!(err.to_string().contains("target white"));

        let config = AdaptiveHdrConfig::default().with_target_white(5000.0);
        assert!(config.validate().is_ok());
        assert_eq!(config.enhancement.target_white_k, 5000.0);
    }

    #[test]
    fn test_presets_select_tone_curve_and_denoise() {
        assert_eq!(AdaptiveHdrConfig::default().enhancement.tone_curve, ToneCurve::Linear);
        assert_eq!(AdaptiveHdrConfig::default().enhancement.denoise_strength, 0.0);
        let quality = AdaptiveHdrConfig::quality();
        assert_eq!(quality.enhancement.tone_curve, ToneCurve::Adaptive);
        assert_eq!(quality.enhancement.denoise_strength, 0.5);
        assert_eq!(AdaptiveHdrConfig::balanced().enhancement.tone_curve, ToneCurve::SCurve);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            AdaptiveHdrConfig::from_json_str(r#"{"smoother": {"max_exposure_rate": 0.5}}"#)
                .unwrap();
        assert_eq!(config.smoother.max_exposure_rate, 0.5);
        assert_eq!(config.smoother.max_shadow_rate, 0.2);
        assert_eq!(config.generator, GeneratorConfig::default());
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"enhancement": {{"clahe_tile_grid": 4}}}}"#).unwrap();
        let config = AdaptiveHdrConfig::from_path(file.path()).unwrap();
        assert_eq!(config.enhancement.clahe_tile_grid, 4);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, r#"{{"telemetry": {{"motion_half_life_secs": -1}}}}"#).unwrap();
        assert!(AdaptiveHdrConfig::from_path(bad.path()).is_err());
    }
}
