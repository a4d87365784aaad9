//! Shared data models for the Lumen adaptive HDR pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Telemetry channels, samples and recorded sequences
//! - HDR parameter sets produced from telemetry
//! - Decoded frames exchanged with external decoders/encoders
//! - Enhancement presets and stream identifiers

pub mod frame;
pub mod params;
pub mod preset;
pub mod recording;
pub mod stream;
pub mod telemetry;

// Re-export common types
pub use frame::{ColorSpace, Frame, PixelBuffer, PixelLayout};
pub use params::HdrParameterSet;
pub use preset::{EnhancementPreset, PresetParseError, ToneCurve};
pub use recording::{TelemetryPoint, TelemetryProfile, TelemetryRecording};
pub use stream::StreamId;
pub use telemetry::{
    ChannelParseError, ChannelValues, SampleRangeError, TelemetryChannel, TelemetrySample,
};
