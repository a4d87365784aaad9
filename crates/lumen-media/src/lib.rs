#![deny(unreachable_patterns)]
//! Telemetry-driven adaptive HDR enhancement.
//!
//! This crate provides:
//! - Per-session telemetry aggregation with per-channel EMA smoothing
//! - A pure telemetry to parameter mapping over configurable curves
//! - Rate limiting of parameter changes with explicit per-stream state
//! - A stateless frame enhancement engine (exposure, CLAHE shadow lift,
//!   highlight rolloff, chromatic adaptation, edge-aware sharpening)
//! - Validated configuration, errors and metrics for all of the above

pub mod config;
pub mod enhance;
pub mod error;
pub mod metrics;
pub mod params;
pub mod telemetry;

pub use config::{
    AdaptiveHdrConfig, EnhancementConfig, GeneratorConfig, SmootherConfig, TelemetryConfig,
};
pub use enhance::{EnhanceStats, EnhancementEngine, Stage};
pub use error::{MediaError, MediaResult};
pub use params::{
    ControlPoint, ParameterGenerator, PiecewiseLinear, SmootherState, TemporalSmoother,
};
pub use telemetry::{IngestReport, SimulatedSensors, TelemetryAggregator};
