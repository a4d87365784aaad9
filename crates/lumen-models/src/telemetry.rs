//! Telemetry channel and sample definitions.
//!
//! Three environmental channels drive the adaptive pipeline:
//!
//! - `Light`: ambient illuminance in lux
//! - `ColorTemp`: correlated color temperature in kelvin
//! - `Motion`: normalized motion intensity

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One named stream of environmental measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryChannel {
    /// Ambient light (lux)
    Light,
    /// Color temperature (kelvin)
    ColorTemp,
    /// Motion intensity (normalized 0..1)
    Motion,
}

impl TelemetryChannel {
    /// All channels, in index order.
    pub const ALL: [TelemetryChannel; 3] = [
        TelemetryChannel::Light,
        TelemetryChannel::ColorTemp,
        TelemetryChannel::Motion,
    ];

    /// Returns the channel name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryChannel::Light => "light",
            TelemetryChannel::ColorTemp => "color_temp",
            TelemetryChannel::Motion => "motion",
        }
    }

    /// Stable index for per-channel arrays.
    pub fn index(&self) -> usize {
        match self {
            TelemetryChannel::Light => 0,
            TelemetryChannel::ColorTemp => 1,
            TelemetryChannel::Motion => 2,
        }
    }

    /// Canonical unit of the channel.
    pub fn unit(&self) -> &'static str {
        match self {
            TelemetryChannel::Light => "lux",
            TelemetryChannel::ColorTemp => "kelvin",
            TelemetryChannel::Motion => "normalized",
        }
    }

    /// Name of the sequence carrying this channel in recorded telemetry.
    pub fn sequence_name(&self) -> &'static str {
        match self {
            TelemetryChannel::Light => "ambient_light_sequence",
            TelemetryChannel::ColorTemp => "color_temperature_sequence",
            TelemetryChannel::Motion => "motion_sequence",
        }
    }

    /// Inclusive physical bounds `(min, max)` for sample values.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            TelemetryChannel::Light => (0.0, f64::INFINITY),
            TelemetryChannel::ColorTemp => (1000.0, 12000.0),
            TelemetryChannel::Motion => (0.0, 1.0),
        }
    }

    /// Value reported before any sample has arrived.
    pub fn default_value(&self) -> f64 {
        match self {
            TelemetryChannel::Light => 500.0,
            TelemetryChannel::ColorTemp => 5500.0,
            TelemetryChannel::Motion => 0.0,
        }
    }

    /// Returns true if `value` is finite and within the channel bounds.
    pub fn accepts(&self, value: f64) -> bool {
        let (min, max) = self.bounds();
        value.is_finite() && value >= min && value <= max
    }
}

impl fmt::Display for TelemetryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TelemetryChannel {
    type Err = ChannelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" | "ambient_light" => Ok(TelemetryChannel::Light),
            "color_temp" | "color_temperature" => Ok(TelemetryChannel::ColorTemp),
            "motion" => Ok(TelemetryChannel::Motion),
            _ => Err(ChannelParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown telemetry channel: {0}")]
pub struct ChannelParseError(String);

/// A sample value outside its channel's physical bounds.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{channel} sample {value} outside [{min}, {max}]")]
pub struct SampleRangeError {
    pub channel: TelemetryChannel,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

/// An immutable timestamped telemetry reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TelemetrySample {
    channel: TelemetryChannel,
    /// Seconds on the session's monotonic clock
    timestamp: f64,
    value: f64,
    unit: String,
}

impl TelemetrySample {
    /// Create a sample, rejecting values outside the channel bounds.
    pub fn new(
        channel: TelemetryChannel,
        timestamp: f64,
        value: f64,
        unit: impl Into<String>,
    ) -> Result<Self, SampleRangeError> {
        let sample = Self::unchecked(channel, timestamp, value, unit);
        sample.check_bounds()?;
        Ok(sample)
    }

    /// Create a sample with the channel's canonical unit.
    pub fn reading(
        channel: TelemetryChannel,
        timestamp: f64,
        value: f64,
    ) -> Result<Self, SampleRangeError> {
        Self::new(channel, timestamp, value, channel.unit())
    }

    /// Create a sample without bounds checking.
    ///
    /// The aggregator still rejects it on ingestion, which keeps sensor faults
    /// observable in its rejection counters.
    pub fn unchecked(
        channel: TelemetryChannel,
        timestamp: f64,
        value: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            timestamp,
            value,
            unit: unit.into(),
        }
    }

    /// Verify the value (and timestamp) are usable.
    pub fn check_bounds(&self) -> Result<(), SampleRangeError> {
        if self.channel.accepts(self.value) && self.timestamp.is_finite() {
            return Ok(());
        }
        let (min, max) = self.channel.bounds();
        Err(SampleRangeError {
            channel: self.channel,
            value: self.value,
            min,
            max,
        })
    }

    pub fn channel(&self) -> TelemetryChannel {
        self.channel
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }
}

/// Smoothed values of all three channels at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChannelValues {
    /// Ambient light (lux)
    pub light: f64,
    /// Color temperature (kelvin)
    pub color_temp: f64,
    /// Motion intensity (0..1)
    pub motion: f64,
}

impl ChannelValues {
    /// Value of a single channel.
    pub fn get(&self, channel: TelemetryChannel) -> f64 {
        match channel {
            TelemetryChannel::Light => self.light,
            TelemetryChannel::ColorTemp => self.color_temp,
            TelemetryChannel::Motion => self.motion,
        }
    }
}

impl Default for ChannelValues {
    fn default() -> Self {
        Self {
            light: TelemetryChannel::Light.default_value(),
            color_temp: TelemetryChannel::ColorTemp.default_value(),
            motion: TelemetryChannel::Motion.default_value(),
        }
    }
}
