//! Adaptive HDR pipeline worker.
//!
//! This crate provides:
//! - The per-stream pipeline driver with configurable evaluation cadence
//! - Frame source and sink traits with image sequence implementations
//! - Telemetry replay in step with frame time
//! - Environment-driven worker configuration and stream logging

pub mod cadence;
pub mod config;
pub mod driver;
pub mod error;
pub mod io;
pub mod logging;
pub mod replay;

pub use cadence::EvaluationCadence;
pub use config::WorkerConfig;
pub use driver::{PipelineDriver, RunReport};
pub use error::{WorkerError, WorkerResult};
pub use io::{
    FrameSink, FrameSource, ImageSequenceSink, ImageSequenceSource, MemorySink, MemorySource,
};
pub use logging::{SkipReason, StreamLogger};
pub use replay::TelemetryReplay;
