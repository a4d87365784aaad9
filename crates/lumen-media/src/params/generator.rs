//! Telemetry to HDR parameter mapping.
//!
//! The generator has no state: identical channel values always produce a
//! bit-identical [`HdrParameterSet`], which keeps recorded sessions
//! replayable.

use lumen_models::{ChannelValues, HdrParameterSet};

use crate::config::GeneratorConfig;

/// Maps smoothed telemetry onto processing parameters.
#[derive(Debug, Clone, Default)]
pub struct ParameterGenerator {
    config: GeneratorConfig,
}

impl ParameterGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Parameters for the given light (lux), color temperature (K) and
    /// motion (0..1), stamped with `at`.
    pub fn generate(&self, light: f64, color_temp: f64, motion: f64, at: f64) -> HdrParameterSet {
        let c = &self.config;
        HdrParameterSet {
            exposure_gain: c.exposure_curve.eval(light).max(f64::MIN_POSITIVE),
            shadow_lift: c.shadow_curve.eval(light).clamp(0.0, 1.0),
            highlight_rolloff: c.rolloff_curve.eval(light).clamp(0.0, 1.0),
            contrast: c.contrast_curve.eval(light).max(f64::MIN_POSITIVE),
            color_temp_correction_k: self.color_temp_correction(color_temp),
            detail_strength: c.detail_curve.eval(motion).clamp(0.0, 1.0),
            generated_at: at,
        }
    }

    pub fn generate_from(&self, values: &ChannelValues, at: f64) -> HdrParameterSet {
        self.generate(values.light, values.color_temp, values.motion, at)
    }

    /// Kelvin shift toward the target white, capped in magnitude.
    ///
    /// Positive when the scene is warmer (lower K) than the target.
    pub fn color_temp_correction(&self, color_temp: f64) -> f64 {
        let c = &self.config;
        if !color_temp.is_finite() {
            return 0.0;
        }
        let correction = (c.color_temp_target_k - color_temp) * c.color_temp_gain;
        correction.clamp(-c.color_temp_cap_k, c.color_temp_cap_k)
    }
}
