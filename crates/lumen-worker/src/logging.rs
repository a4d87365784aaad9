//! Stream lifecycle events.
//!
//! Every event is a structured tracing record carrying the stream ID, so a
//! JSON log can be filtered per camera. Skips are also counted in metrics
//! under the same reason label.

use tracing::{error, info, warn, Span};

use lumen_media::{metrics, IngestReport};
use lumen_models::{HdrParameterSet, StreamId};

use crate::cadence::EvaluationCadence;
use crate::driver::RunReport;

/// Why a frame never reached the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The source could not decode the frame
    DecodeFailed,
    /// The decoded frame failed validation
    InvalidFrame,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::DecodeFailed => "decode_failed",
            SkipReason::InvalidFrame => "invalid_frame",
        }
    }
}

/// Emits lifecycle events for one stream.
#[derive(Debug, Clone)]
pub struct StreamLogger {
    stream_id: String,
}

impl StreamLogger {
    pub fn new(stream_id: &StreamId) -> Self {
        Self {
            stream_id: stream_id.to_string(),
        }
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn run_started(
        &self,
        cadence: &EvaluationCadence,
        batch_size: usize,
        frames_hint: Option<usize>,
    ) {
        info!(
            stream_id = %self.stream_id,
            cadence = %cadence,
            batch_size,
            frames_hint,
            "Stream started"
        );
    }

    pub fn progress(&self, frames_out: u64, params: Option<&HdrParameterSet>) {
        let params = params.copied().unwrap_or_else(|| HdrParameterSet::neutral(0.0));
        info!(
            stream_id = %self.stream_id,
            frames_out,
            exposure_gain = params.exposure_gain,
            shadow_lift = params.shadow_lift,
            contrast = params.contrast,
            "Stream progress"
        );
    }

    /// Log and count a dropped frame.
    pub fn frame_skipped(&self, reason: SkipReason, position: u64, detail: &str) {
        metrics::record_frame_skipped(reason.as_str());
        warn!(
            stream_id = %self.stream_id,
            reason = reason.as_str(),
            position,
            detail,
            "Frame skipped"
        );
    }

    pub fn replay_rejected(&self, timestamp: f64, report: &IngestReport) {
        warn!(
            stream_id = %self.stream_id,
            timestamp,
            out_of_range = report.out_of_range,
            stale = report.stale,
            "Replayed telemetry rejected"
        );
    }

    pub fn sink_failed(&self, frames_out: u64, err: &dyn std::error::Error) {
        error!(
            stream_id = %self.stream_id,
            frames_out,
            error = %err,
            "Frame sink failed"
        );
    }

    pub fn run_finished(&self, report: &RunReport) {
        let outcome = if report.cancelled {
            "cancelled"
        } else {
            "completed"
        };
        info!(
            stream_id = %self.stream_id,
            outcome,
            frames_in = report.frames_in,
            frames_out = report.frames_out,
            frames_skipped = report.frames_skipped,
            evaluations = report.evaluations,
            avg_process_ms = report.avg_process_ms,
            "Stream finished"
        );
    }

    /// Span entered by enhancement threads working for this stream.
    pub fn span(&self) -> Span {
        tracing::info_span!("stream", stream_id = %self.stream_id)
    }
}
