//! HDR parameter set produced from telemetry.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Processing parameters for one evaluation tick.
///
/// Created by the parameter generator, rate-limited by the temporal smoother
/// and consumed by the enhancement engine. Superseded by the next tick's
/// output, never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HdrParameterSet {
    /// Linear-light exposure multiplier (> 0, 1.0 = unchanged)
    pub exposure_gain: f64,
    /// Shadow-lift strength in [0, 1] (0 = disabled)
    pub shadow_lift: f64,
    /// Highlight rolloff strength in [0, 1] (0 = disabled)
    pub highlight_rolloff: f64,
    /// Mid-gray contrast multiplier (> 0, 1.0 = unchanged)
    #[serde(default = "unit_contrast")]
    pub contrast: f64,
    /// Color temperature correction in kelvin (0 = disabled)
    pub color_temp_correction_k: f64,
    /// Detail/sharpening strength in [0, 1] (0 = disabled)
    pub detail_strength: f64,
    /// Session time (seconds) at which the set was generated
    pub generated_at: f64,
}

impl HdrParameterSet {
    /// Parameter set with every stage at its disabling value.
    pub fn neutral(generated_at: f64) -> Self {
        Self {
            exposure_gain: 1.0,
            shadow_lift: 0.0,
            highlight_rolloff: 0.0,
            contrast: 1.0,
            color_temp_correction_k: 0.0,
            detail_strength: 0.0,
            generated_at,
        }
    }

    /// Returns true if every field lies within its documented range.
    pub fn is_within_bounds(&self) -> bool {
        let unit = |v: f64| (0.0..=1.0).contains(&v);
        self.exposure_gain.is_finite()
            && self.exposure_gain > 0.0
            && unit(self.shadow_lift)
            && unit(self.highlight_rolloff)
            && self.contrast.is_finite()
            && self.contrast > 0.0
            && self.color_temp_correction_k.is_finite()
            && unit(self.detail_strength)
    }

    /// Returns true if applying this set leaves a frame unchanged.
    pub fn is_neutral(&self) -> bool {
        self.exposure_gain == 1.0
            && self.shadow_lift == 0.0
            && self.highlight_rolloff == 0.0
            && self.contrast == 1.0
            && self.color_temp_correction_k == 0.0
            && self.detail_strength == 0.0
    }

    /// Same values, restamped.
    pub fn at(mut self, generated_at: f64) -> Self {
        self.generated_at = generated_at;
        self
    }
}

fn unit_contrast() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_is_neutral() {
        let params = HdrParameterSet::neutral(2.0);
        assert!(params.is_neutral());
        assert!(params.is_within_bounds());
        assert_eq!(params.generated_at, 2.0);
    }

    #[test]
    fn test_bounds_detect_bad_fields() {
        let mut params = HdrParameterSet::neutral(0.0);
        params.exposure_gain = 0.0;
        assert!(!params.is_within_bounds());

        let mut params = HdrParameterSet::neutral(0.0);
        params.detail_strength = 1.5;
        assert!(!params.is_within_bounds());

        let mut params = HdrParameterSet::neutral(0.0);
        params.contrast = 0.0;
        assert!(!params.is_within_bounds());
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let json = serde_json::to_value(HdrParameterSet::neutral(1.0)).unwrap();
        assert!(json.get("exposureGain").is_some());
        assert!(json.get("colorTempCorrectionK").is_some());
    }

    #[test]
    fn test_missing_contrast_defaults_to_unity() {
        let json = r#"{"exposureGain": 1.2, "shadowLift": 0.1, "highlightRolloff": 0.3,
            "colorTempCorrectionK": 0.0, "detailStrength": 0.5, "generatedAt": 4.0}"#;
        let params: HdrParameterSet = serde_json::from_str(json).unwrap();
        assert_eq!(params.contrast, 1.0);
        assert_eq!(params.generated_at, 4.0);
    }
}
