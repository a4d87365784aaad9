//! Recorded telemetry sequences.
//!
//! External collectors deliver telemetry as JSON grouped per named sequence:
//!
//! ```json
//! {
//!   "ambient_light_sequence": [{"time": 0.0, "value": 50.0, "unit": "lux"}],
//!   "color_temperature_sequence": [{"time": 0.0, "value": 5000.0, "unit": "kelvin"}],
//!   "motion_sequence": [{"time": 0.0, "value": 0.3, "unit": "normalized"}]
//! }
//! ```
//!
//! Sequences may arrive in any order relative to each other, but each one is
//! replayed by ascending `time`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::telemetry::{TelemetryChannel, TelemetrySample};

/// One recorded reading inside a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TelemetryPoint {
    /// Seconds, monotonic within a session
    pub time: f64,
    pub value: f64,
    #[serde(default)]
    pub unit: String,
}

impl TelemetryPoint {
    pub fn new(time: f64, value: f64, unit: impl Into<String>) -> Self {
        Self {
            time,
            value,
            unit: unit.into(),
        }
    }
}

/// Telemetry recording in the collector schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TelemetryRecording {
    #[serde(default)]
    pub ambient_light_sequence: Vec<TelemetryPoint>,
    #[serde(default)]
    pub color_temperature_sequence: Vec<TelemetryPoint>,
    #[serde(default)]
    pub motion_sequence: Vec<TelemetryPoint>,
}

impl TelemetryRecording {
    /// Parse the collector JSON schema.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize back to the collector JSON schema.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// The sequence carrying `channel`.
    pub fn sequence(&self, channel: TelemetryChannel) -> &[TelemetryPoint] {
        match channel {
            TelemetryChannel::Light => &self.ambient_light_sequence,
            TelemetryChannel::ColorTemp => &self.color_temperature_sequence,
            TelemetryChannel::Motion => &self.motion_sequence,
        }
    }

    /// Mutable access to the sequence carrying `channel`.
    pub fn sequence_mut(&mut self, channel: TelemetryChannel) -> &mut Vec<TelemetryPoint> {
        match channel {
            TelemetryChannel::Light => &mut self.ambient_light_sequence,
            TelemetryChannel::ColorTemp => &mut self.color_temperature_sequence,
            TelemetryChannel::Motion => &mut self.motion_sequence,
        }
    }

    /// Append a reading with the channel's canonical unit.
    pub fn push(&mut self, channel: TelemetryChannel, time: f64, value: f64) {
        self.sequence_mut(channel)
            .push(TelemetryPoint::new(time, value, channel.unit()));
    }

    /// Total number of points across all sequences.
    pub fn len(&self) -> usize {
        TelemetryChannel::ALL
            .iter()
            .map(|c| self.sequence(*c).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Latest `time` across all sequences.
    pub fn end_time(&self) -> Option<f64> {
        TelemetryChannel::ALL
            .iter()
            .flat_map(|c| self.sequence(*c).iter().map(|p| p.time))
            .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |a| a.max(t))))
    }

    /// Points of one channel as samples, ordered by ascending time.
    ///
    /// Samples are not bounds-checked here; the aggregator rejects and
    /// counts faulty readings on ingestion.
    pub fn channel_samples(&self, channel: TelemetryChannel) -> Vec<TelemetrySample> {
        let mut points: Vec<&TelemetryPoint> = self.sequence(channel).iter().collect();
        points.sort_by(|a, b| a.time.total_cmp(&b.time));
        points
            .into_iter()
            .map(|p| {
                let unit = if p.unit.is_empty() {
                    channel.unit().to_string()
                } else {
                    p.unit.clone()
                };
                TelemetrySample::unchecked(channel, p.time, p.value, unit)
            })
            .collect()
    }

    /// All samples, each sequence in ascending time order.
    pub fn all_samples(&self) -> Vec<TelemetrySample> {
        TelemetryChannel::ALL
            .iter()
            .flat_map(|c| self.channel_samples(*c))
            .collect()
    }
}

/// A named recording used for demos and replay tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TelemetryProfile {
    pub name: String,
    pub description: String,
    pub recording: TelemetryRecording,
}

impl TelemetryProfile {
    /// Names accepted by [`TelemetryProfile::builtin`].
    pub const BUILTIN: &'static [&'static str] =
        &["standard", "light", "color", "motion", "daylight_ramp"];

    /// Build a profile from keyframes of `(time, light, color_temp, motion)`.
    pub fn from_keyframes(
        name: impl Into<String>,
        description: impl Into<String>,
        keyframes: &[(f64, f64, f64, f64)],
    ) -> Self {
        let mut recording = TelemetryRecording::default();
        for &(time, light, color_temp, motion) in keyframes {
            recording.push(TelemetryChannel::Light, time, light);
            recording.push(TelemetryChannel::ColorTemp, time, color_temp);
            recording.push(TelemetryChannel::Motion, time, motion);
        }
        Self {
            name: name.into(),
            description: description.into(),
            recording,
        }
    }

    /// Built-in demo profiles.
    pub fn builtin(name: &str) -> Option<Self> {
        let profile = match name {
            "standard" => Self::from_keyframes(
                "standard",
                "Fixed mid-range conditions",
                &[(0.0, 1000.0, 5000.0, 0.3), (5.0, 1000.0, 5000.0, 0.3)],
            ),
            "light" => Self::from_keyframes(
                "light",
                "Dark room to normal to bright",
                &[
                    (0.0, 50.0, 5000.0, 0.3),
                    (1.5, 50.0, 5000.0, 0.3),
                    (2.0, 500.0, 5000.0, 0.3),
                    (3.5, 500.0, 5000.0, 0.3),
                    (4.0, 2000.0, 5000.0, 0.3),
                    (5.0, 2000.0, 5000.0, 0.3),
                ],
            ),
            "color" => Self::from_keyframes(
                "color",
                "Firelight to mixed to daylight",
                &[
                    (0.0, 500.0, 2700.0, 0.3),
                    (1.5, 500.0, 2700.0, 0.3),
                    (2.0, 500.0, 4000.0, 0.3),
                    (3.5, 500.0, 4000.0, 0.3),
                    (4.0, 500.0, 6500.0, 0.3),
                    (5.0, 500.0, 6500.0, 0.3),
                ],
            ),
            "motion" => Self::from_keyframes(
                "motion",
                "Low motion to high motion to medium",
                &[
                    (0.0, 500.0, 5000.0, 0.2),
                    (1.5, 500.0, 5000.0, 0.2),
                    (2.0, 500.0, 5000.0, 0.8),
                    (3.5, 500.0, 5000.0, 0.8),
                    (4.0, 500.0, 5000.0, 0.4),
                    (5.0, 500.0, 5000.0, 0.4),
                ],
            ),
            "daylight_ramp" => Self::from_keyframes(
                "daylight_ramp",
                "Night to full daylight over twenty seconds",
                &[
                    (0.0, 50.0, 5500.0, 0.0),
                    (5.0, 200.0, 5500.0, 0.0),
                    (10.0, 1000.0, 5500.0, 0.0),
                    (15.0, 5000.0, 5500.0, 0.0),
                    (20.0, 10000.0, 5500.0, 0.0),
                ],
            ),
            _ => return None,
        };
        Some(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collector_schema() {
        let json = r#"{
            "motion_sequence": [{"time": 1.0, "value": 0.5, "unit": "normalized"}],
            "ambient_light_sequence": [
                {"time": 5.0, "value": 200.0, "unit": "lux"},
                {"time": 0.0, "value": 50.0, "unit": "lux"}
            ]
        }"#;
        let recording = TelemetryRecording::from_json_str(json).unwrap();
        assert_eq!(recording.len(), 3);
        assert!(recording.color_temperature_sequence.is_empty());

        let light = recording.channel_samples(TelemetryChannel::Light);
        assert_eq!(light[0].timestamp(), 0.0);
        assert_eq!(light[1].value(), 200.0);
        assert_eq!(recording.end_time(), Some(5.0));
    }

    #[test]
    fn test_missing_unit_uses_canonical() {
        let json = r#"{"color_temperature_sequence": [{"time": 0.0, "value": 4000.0}]}"#;
        let recording = TelemetryRecording::from_json_str(json).unwrap();
        let samples = recording.all_samples();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].unit(), "kelvin");
    }

    #[test]
    fn test_builtin_profiles() {
        for name in TelemetryProfile::BUILTIN {
            let profile = TelemetryProfile::builtin(name).unwrap();
            assert_eq!(&profile.name, name);
            assert!(!profile.recording.is_empty());
        }
        assert!(TelemetryProfile::builtin("unknown").is_none());
    }
}
