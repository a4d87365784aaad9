//! Error types for the adaptive HDR core.

use lumen_models::{SampleRangeError, TelemetryChannel};
use thiserror::Error;

/// Result type for core operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur in telemetry ingestion, configuration and enhancement.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Telemetry out of range: {channel} value {value} not in [{min}, {max}]")]
    OutOfRange {
        channel: TelemetryChannel,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Stale telemetry: {channel} sample at {timestamp}s is older than last applied {last_applied}s")]
    StaleSample {
        channel: TelemetryChannel,
        timestamp: f64,
        last_applied: f64,
    },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create an invalid frame error.
    pub fn invalid_frame(message: impl Into<String>) -> Self {
        Self::InvalidFrame(message.into())
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a stale sample error.
    pub fn stale_sample(channel: TelemetryChannel, timestamp: f64, last_applied: f64) -> Self {
        Self::StaleSample {
            channel,
            timestamp,
            last_applied,
        }
    }

    /// Telemetry rejections are reported but never stop the frame pipeline.
    pub fn is_telemetry_rejection(&self) -> bool {
        matches!(self, Self::OutOfRange { .. } | Self::StaleSample { .. })
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OutOfRange { .. } => "out_of_range",
            Self::StaleSample { .. } => "stale_sample",
            Self::InvalidFrame(_) => "invalid_frame",
            Self::Configuration(_) => "configuration",
            Self::Io(_) => "io",
            Self::JsonParse(_) => "json",
        }
    }
}

impl From<SampleRangeError> for MediaError {
    fn from(err: SampleRangeError) -> Self {
        Self::OutOfRange {
            channel: err.channel,
            value: err.value,
            min: err.min,
            max: err.max,
        }
    }
}
