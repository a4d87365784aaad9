//! Frame enhancement.
//!
//! [`EnhancementEngine::enhance`] is a pure transform: it reads the input
//! frame, never mutates it, and returns a new frame in the same format.
//! Stages run in a fixed order and each one is skipped at its disabling
//! value:
//!
//! | stage             | parameter                 | identity at |
//! |-------------------|---------------------------|-------------|
//! | exposure          | `exposure_gain`           | 1.0         |
//! | shadow lift       | `shadow_lift`             | 0.0         |
//! | highlight rolloff | `highlight_rolloff`       | 0.0         |
//! | contrast          | `contrast`                | 1.0         |
//! | tone curve        | config `tone_curve_strength` | 0.0 or `linear` |
//! | color temperature | `color_temp_correction_k` | 0.0         |
//! | saturation        | config `saturation_boost` | 1.0         |
//! | denoise           | config `denoise_strength` | 0.0         |
//! | detail            | `detail_strength`         | 0.0         |

mod buffer;
mod chroma;
mod clahe;
mod denoise;
mod detail;
mod exposure;
mod tone_curve;
mod tone_map;
pub mod transfer;

use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::trace;

use lumen_models::{Frame, HdrParameterSet, ToneCurve};

use crate::config::EnhancementConfig;
use crate::error::MediaResult;
use crate::metrics;

use buffer::LinearFrame;
use clahe::ClaheParams;

/// Enhancement stages in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Exposure,
    ShadowLift,
    HighlightRolloff,
    Contrast,
    ToneCurve,
    ColorTemperature,
    Saturation,
    Denoise,
    Detail,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Exposure => "exposure",
            Stage::ShadowLift => "shadow_lift",
            Stage::HighlightRolloff => "highlight_rolloff",
            Stage::Contrast => "contrast",
            Stage::ToneCurve => "tone_curve",
            Stage::ColorTemperature => "color_temperature",
            Stage::Saturation => "saturation",
            Stage::Denoise => "denoise",
            Stage::Detail => "detail",
        }
    }
}

/// Per-frame processing statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnhanceStats {
    pub process_time_ms: f64,
    pub stages_applied: Vec<Stage>,
}

/// Applies [`HdrParameterSet`]s to frames.
#[derive(Debug, Clone, Default)]
pub struct EnhancementEngine {
    config: EnhancementConfig,
}

impl EnhancementEngine {
    pub fn new(config: EnhancementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EnhancementConfig {
        &self.config
    }

    /// Stages that `params` enables, in processing order.
    pub fn active_stages(&self, params: &HdrParameterSet) -> Vec<Stage> {
        let c = &self.config;
        let mut stages = Vec::with_capacity(9);
        if params.exposure_gain != 1.0 {
            stages.push(Stage::Exposure);
        }
        if params.shadow_lift != 0.0 {
            stages.push(Stage::ShadowLift);
        }
        if params.highlight_rolloff != 0.0 {
            stages.push(Stage::HighlightRolloff);
        }
        if params.contrast != 1.0 {
            stages.push(Stage::Contrast);
        }
        if c.tone_curve != ToneCurve::Linear && c.tone_curve_strength > 0.0 {
            stages.push(Stage::ToneCurve);
        }
        if params.color_temp_correction_k != 0.0 {
            stages.push(Stage::ColorTemperature);
        }
        if c.saturation_boost != 1.0 {
            stages.push(Stage::Saturation);
        }
        if c.denoise_strength > 0.0 {
            stages.push(Stage::Denoise);
        }
        if params.detail_strength != 0.0 {
            stages.push(Stage::Detail);
        }
        stages
    }

    /// Enhance one frame.
    pub fn enhance(&self, frame: &Frame, params: &HdrParameterSet) -> MediaResult<Frame> {
        self.enhance_with_stats(frame, params).map(|(frame, _)| frame)
    }

    /// Enhance one frame and report what was done.
    pub fn enhance_with_stats(
        &self,
        frame: &Frame,
        params: &HdrParameterSet,
    ) -> MediaResult<(Frame, EnhanceStats)> {
        let start = Instant::now();
        let mut img = LinearFrame::decode(frame)?;
        let stages = self.active_stages(params);
        let c = &self.config;

        for stage in &stages {
            match stage {
                Stage::Exposure => exposure::apply(&mut img, params.exposure_gain as f32),
                Stage::ShadowLift => clahe::apply(
                    &mut img,
                    params.shadow_lift.clamp(0.0, 1.0) as f32,
                    ClaheParams {
                        clip_limit: c.clahe_clip_limit,
                        tile_grid: c.clahe_tile_grid,
                        shadow_ceiling: c.shadow_ceiling,
                    },
                ),
                Stage::HighlightRolloff => {
                    tone_map::apply(&mut img, params.highlight_rolloff as f32, c.min_knee)
                }
                Stage::Contrast => tone_curve::apply_contrast(&mut img, params.contrast as f32),
                Stage::ToneCurve => {
                    tone_curve::apply_curve(&mut img, c.tone_curve, c.tone_curve_strength)
                }
                Stage::ColorTemperature => chroma::apply_correction(
                    &mut img,
                    params.color_temp_correction_k,
                    c.target_white_k as f64,
                ),
                Stage::Saturation => chroma::apply_saturation(&mut img, c.saturation_boost),
                Stage::Denoise => denoise::apply(&mut img, c.denoise_strength),
                Stage::Detail => detail::apply(
                    &mut img,
                    params.detail_strength.clamp(0.0, 1.0) as f32,
                    c.detail_sigma,
                    c.edge_threshold,
                ),
            }
        }

        let output = img.encode(frame);
        let elapsed = start.elapsed().as_secs_f64();
        metrics::record_frame_enhanced(elapsed);
        trace!(
            timestamp = frame.timestamp,
            stages = stages.len(),
            elapsed_ms = elapsed * 1000.0,
            "Enhanced frame"
        );

        Ok((
            output,
            EnhanceStats {
                process_time_ms: elapsed * 1000.0,
                stages_applied: stages,
            },
        ))
    }

    /// Enhance frames in parallel on the current rayon pool.
    ///
    /// Results keep the order of `jobs`; a failed frame does not affect the
    /// others.
    pub fn enhance_batch(
        &self,
        jobs: &[(Frame, HdrParameterSet)],
    ) -> Vec<MediaResult<(Frame, EnhanceStats)>> {
        jobs.par_iter()
            .map(|(frame, params)| self.enhance_with_stats(frame, params))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;
    use lumen_models::{PixelBuffer, PixelLayout};

    fn test_frame() -> Frame {
        let data: Vec<u8> = (0..32 * 32)
            .flat_map(|i: u32| {
                let v = (i % 256) as u8;
                [v, v.wrapping_mul(3), 255 - v]
            })
            .collect();
        Frame::from_rgb8(32, 32, PixelLayout::Rgb, 0.5, data)
    }

    #[test]
    fn test_neutral_params_are_identity() {
        let engine = EnhancementEngine::default();
        let frame = test_frame();
        let (out, stats) = engine
            .enhance_with_stats(&frame, &HdrParameterSet::neutral(0.0))
            .unwrap();
        assert_eq!(out, frame);
        assert!(stats.stages_applied.is_empty());
    }

    #[test]
    fn test_stage_selection() {
        let engine = EnhancementEngine::new(EnhancementConfig {
            saturation_boost: 1.1,
            ..EnhancementConfig::default()
        });
        let params = HdrParameterSet {
            exposure_gain: 1.2,
            detail_strength: 0.5,
            ..HdrParameterSet::neutral(0.0)
        };
        assert_eq!(
            engine.active_stages(&params),
            vec![Stage::Exposure, Stage::Saturation, Stage::Detail]
        );
    }

    #[test]
    fn test_full_params_keep_format() {
        let engine = EnhancementEngine::default();
        let frame = test_frame();
        let params = HdrParameterSet {
            exposure_gain: 1.5,
            shadow_lift: 0.8,
            highlight_rolloff: 0.6,
            contrast: 1.1,
            color_temp_correction_k: 1200.0,
            detail_strength: 0.7,
            generated_at: 0.0,
        };
        let (out, stats) = engine.enhance_with_stats(&frame, &params).unwrap();
        assert_eq!(stats.stages_applied.len(), 6);
        assert_eq!(out.width, frame.width);
        assert_eq!(out.timestamp, frame.timestamp);
        assert!(out.validate().is_ok());
        assert_ne!(out, frame);
    }

    #[test]
    fn test_quality_preset_runs_every_stage_in_order() {
        let engine = EnhancementEngine::new(EnhancementConfig::from_preset(
            lumen_models::EnhancementPreset::Quality,
        ));
        let params = HdrParameterSet {
            exposure_gain: 1.3,
            shadow_lift: 0.5,
            highlight_rolloff: 0.4,
            contrast: 1.1,
            color_temp_correction_k: -300.0,
            detail_strength: 0.3,
            generated_at: 0.0,
        };
        assert_eq!(
            engine.active_stages(&params),
            vec![
                Stage::Exposure,
                Stage::ShadowLift,
                Stage::HighlightRolloff,
                Stage::Contrast,
                Stage::ToneCurve,
                Stage::ColorTemperature,
                Stage::Saturation,
                Stage::Denoise,
                Stage::Detail,
            ]
        );
        let out = engine.enhance(&test_frame(), &params).unwrap();
        assert!(out.validate().is_ok());
    }

    #[test]
    fn test_invalid_frame_rejected() {
        let engine = EnhancementEngine::default();
        let frame = Frame::from_rgb8(4, 4, PixelLayout::Rgb, 0.0, vec![0; 10]);
        let err = engine
            .enhance(&frame, &HdrParameterSet::neutral(0.0))
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidFrame(_)));
    }

    #[test]
    fn test_sixteen_bit_output_clamped() {
        let engine = EnhancementEngine::default();
        let data = vec![4095, 2048, 10, 77, 0, 0, 0, 4095];
        let frame = Frame::from_rgb16(2, 1, PixelLayout::Rgba, 12, 0.0, data);
        let params = HdrParameterSet {
            exposure_gain: 4.0,
            ..HdrParameterSet::neutral(0.0)
        };
        let out = engine.enhance(&frame, &params).unwrap();
        let PixelBuffer::U16(data) = &out.data else {
            panic!("expected 16-bit output");
        };
        assert!(data.iter().all(|&v| v <= 4095));
        assert_eq!(data[0], 4095);
        // alpha passes through
        assert_eq!(data[3], 77);
        assert_eq!(data[7], 4095);
    }

    #[test]
    fn test_batch_keeps_order() {
        let engine = EnhancementEngine::default();
        let jobs: Vec<_> = (0..6)
            .map(|i| {
                let mut frame = test_frame();
                frame.timestamp = i as f64;
                (frame, HdrParameterSet::neutral(0.0))
            })
            .collect();
        let results = engine.enhance_batch(&jobs);
        for (i, result) in results.into_iter().enumerate() {
            assert_eq!(result.unwrap().0.timestamp, i as f64);
        }
    }
}
