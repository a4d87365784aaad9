//! Telemetry ingestion.

mod aggregator;
mod recording;
pub mod simulated;

pub use aggregator::{ema_alpha, IngestReport, TelemetryAggregator};
pub use recording::{builtin_profile, load_recording};
pub use simulated::SimulatedSensors;
