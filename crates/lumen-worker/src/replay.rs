//! Feeding recorded telemetry in step with frame time.

use lumen_media::{IngestReport, MediaError, TelemetryAggregator};
use lumen_models::{TelemetryRecording, TelemetrySample};

/// Cursor over a recording that releases samples as frame time advances.
#[derive(Debug, Clone)]
pub struct TelemetryReplay {
    samples: Vec<TelemetrySample>,
    cursor: usize,
}

impl TelemetryReplay {
    /// Samples are merged across sequences by time; within a sequence the
    /// recorded order of equal times is kept.
    pub fn new(recording: &TelemetryRecording) -> Self {
        let mut samples = recording.all_samples();
        samples.sort_by(|a, b| a.timestamp().total_cmp(&b.timestamp()));
        Self { samples, cursor: 0 }
    }

    /// Ingest every pending sample with a timestamp up to `t`.
    pub fn advance_to(&mut self, aggregator: &TelemetryAggregator, t: f64) -> IngestReport {
        let mut report = IngestReport::default();
        while let Some(sample) = self.samples.get(self.cursor) {
            if sample.timestamp() > t {
                break;
            }
            match aggregator.ingest(sample) {
                Ok(()) => report.accepted += 1,
                Err(MediaError::StaleSample { .. }) => report.stale += 1,
                Err(_) => report.out_of_range += 1,
            }
            self.cursor += 1;
        }
        report
    }

    pub fn remaining(&self) -> usize {
        self.samples.len() - self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }
}
