//! Metrics for telemetry ingestion, parameter evaluation and enhancement.
//!
//! Recorded through the `metrics` facade. Without an installed recorder every
//! call is a no-op, so library users pay nothing unless the binary installs
//! an exporter.

use metrics::{counter, gauge, histogram};

use lumen_models::TelemetryChannel;

/// Metric names as constants for consistency.
pub mod names {
    // Telemetry metrics
    pub const TELEMETRY_SAMPLES_TOTAL: &str = "lumen_telemetry_samples_total";
    pub const TELEMETRY_REJECTED_TOTAL: &str = "lumen_telemetry_rejected_total";

    // Parameter metrics
    pub const PARAMETER_EVALUATIONS_TOTAL: &str = "lumen_parameter_evaluations_total";
    pub const EXPOSURE_GAIN: &str = "lumen_exposure_gain";

    // Frame metrics
    pub const FRAMES_ENHANCED_TOTAL: &str = "lumen_frames_enhanced_total";
    pub const FRAMES_SKIPPED_TOTAL: &str = "lumen_frames_skipped_total";
    pub const ENHANCE_DURATION_SECONDS: &str = "lumen_enhance_duration_seconds";
}

/// Record an accepted telemetry sample.
pub fn record_sample_accepted(channel: TelemetryChannel) {
    let labels = [("channel", channel.as_str().to_string())];
    counter!(names::TELEMETRY_SAMPLES_TOTAL, &labels).increment(1);
}

/// Record a rejected telemetry sample.
pub fn record_sample_rejected(channel: TelemetryChannel, reason: &str) {
    let labels = [
        ("channel", channel.as_str().to_string()),
        ("reason", reason.to_string()),
    ];
    counter!(names::TELEMETRY_REJECTED_TOTAL, &labels).increment(1);
}

/// Record one parameter evaluation and publish the resulting exposure gain.
pub fn record_parameter_evaluation(exposure_gain: f64) {
    counter!(names::PARAMETER_EVALUATIONS_TOTAL).increment(1);
    gauge!(names::EXPOSURE_GAIN).set(exposure_gain);
}

/// Record an enhanced frame.
pub fn record_frame_enhanced(duration_secs: f64) {
    counter!(names::FRAMES_ENHANCED_TOTAL).increment(1);
    histogram!(names::ENHANCE_DURATION_SECONDS).record(duration_secs);
}

/// Record a frame skipped by the pipeline.
pub fn record_frame_skipped(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::FRAMES_SKIPPED_TOTAL, &labels).increment(1);
}
