//! Per-session telemetry aggregation.
//!
//! Each channel keeps an exponential moving average whose weight depends on
//! the time elapsed since the last *applied* sample:
//!
//! ```text
//! alpha = 1 - 0.5^(dt / half_life)
//! value = value + alpha * (sample - value)
//! ```
//!
//! Writers are serialized per channel by a mutex. Readers never lock: every
//! update publishes the new smoothed value as `f64` bits in an atomic.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, warn};

use lumen_models::{ChannelValues, TelemetryChannel, TelemetryRecording, TelemetrySample};

use crate::config::TelemetryConfig;
use crate::error::{MediaError, MediaResult};
use crate::metrics;

/// Running state of one channel.
#[derive(Debug, Clone, Copy, Default)]
struct ChannelState {
    value: f64,
    last_applied: Option<f64>,
    applied: u64,
}

#[derive(Debug)]
struct ChannelCell {
    state: Mutex<ChannelState>,
    published: AtomicU64,
    has_samples: AtomicBool,
    rejected: AtomicU64,
}

impl ChannelCell {
    fn new(channel: TelemetryChannel) -> Self {
        Self {
            state: Mutex::new(ChannelState {
                value: channel.default_value(),
                ..ChannelState::default()
            }),
            published: AtomicU64::new(channel.default_value().to_bits()),
            has_samples: AtomicBool::new(false),
            rejected: AtomicU64::new(0),
        }
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.published.load(Ordering::Acquire))
    }
}

/// Outcome of replaying a recording.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub accepted: usize,
    pub out_of_range: usize,
    pub stale: usize,
}

impl IngestReport {
    pub fn rejected(&self) -> usize {
        self.out_of_range + self.stale
    }
}

/// Smoothed telemetry for one pipeline session.
///
/// Share it with `Arc` between sensor feeds and the pipeline driver.
#[derive(Debug)]
pub struct TelemetryAggregator {
    config: TelemetryConfig,
    channels: [ChannelCell; 3],
}

impl TelemetryAggregator {
    pub fn new(config: TelemetryConfig) -> Self {
        Self {
            config,
            channels: TelemetryChannel::ALL.map(ChannelCell::new),
        }
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    fn cell(&self, channel: TelemetryChannel) -> &ChannelCell {
        &self.channels[channel.index()]
    }

    /// Apply one sample to its channel.
    ///
    /// Out-of-range and stale samples are rejected, counted and logged; the
    /// channel state is left untouched.
    pub fn ingest(&self, sample: &TelemetrySample) -> MediaResult<()> {
        let channel = sample.channel();
        let cell = self.cell(channel);

        if let Err(err) = sample.check_bounds() {
            return Err(self.reject(channel, sample, err.into()));
        }

        // Poisoning cannot leave ChannelState half-written: it is Copy and
        // replaced in a single assignment.
        let mut state = cell.state.lock().unwrap_or_else(|e| e.into_inner());

        let timestamp = sample.timestamp();
        let last_applied = state.last_applied;
        let next = match last_applied {
            None => ChannelState {
                value: sample.value(),
                last_applied: Some(timestamp),
                applied: state.applied + 1,
            },
            Some(last) if timestamp < last => {
                drop(state);
                let err = MediaError::stale_sample(channel, timestamp, last);
                return Err(self.reject(channel, sample, err));
            }
            Some(last) => {
                let alpha = ema_alpha(timestamp - last, self.config.half_life(channel));
                ChannelState {
                    value: state.value + alpha * (sample.value() - state.value),
                    last_applied: Some(timestamp),
                    applied: state.applied + 1,
                }
            }
        };
        *state = next;
        cell.published.store(next.value.to_bits(), Ordering::Release);
        cell.has_samples.store(true, Ordering::Release);
        drop(state);

        metrics::record_sample_accepted(channel);
        debug!(
            channel = %channel,
            timestamp,
            value = sample.value(),
            smoothed = next.value,
            "Applied telemetry sample"
        );
        Ok(())
    }

    fn reject(
        &self,
        channel: TelemetryChannel,
        sample: &TelemetrySample,
        err: MediaError,
    ) -> MediaError {
        self.cell(channel).rejected.fetch_add(1, Ordering::Relaxed);
        metrics::record_sample_rejected(channel, err.kind());
        warn!(
            channel = %channel,
            timestamp = sample.timestamp(),
            value = sample.value(),
            reason = err.kind(),
            "Rejected telemetry sample: {}",
            err
        );
        err
    }

    /// Replay a recording, each sequence by ascending time.
    pub fn ingest_recording(&self, recording: &TelemetryRecording) -> IngestReport {
        let mut report = IngestReport::default();
        for sample in recording.all_samples() {
            match self.ingest(&sample) {
                Ok(()) => report.accepted += 1,
                Err(MediaError::StaleSample { .. }) => report.stale += 1,
                Err(_) => report.out_of_range += 1,
            }
        }
        report
    }

    /// Latest smoothed value, or the channel default before any sample.
    pub fn current_value(&self, channel: TelemetryChannel) -> f64 {
        self.cell(channel).load()
    }

    /// Smoothed values of all channels.
    pub fn snapshot(&self) -> ChannelValues {
        ChannelValues {
            light: self.current_value(TelemetryChannel::Light),
            color_temp: self.current_value(TelemetryChannel::ColorTemp),
            motion: self.current_value(TelemetryChannel::Motion),
        }
    }

    pub fn has_samples(&self, channel: TelemetryChannel) -> bool {
        self.cell(channel).has_samples.load(Ordering::Acquire)
    }

    /// Timestamp of the last applied sample.
    pub fn last_applied(&self, channel: TelemetryChannel) -> Option<f64> {
        self.cell(channel)
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last_applied
    }

    /// Number of samples applied to `channel`.
    pub fn applied_count(&self, channel: TelemetryChannel) -> u64 {
        self.cell(channel)
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .applied
    }

    pub fn rejected_count(&self, channel: TelemetryChannel) -> u64 {
        self.cell(channel).rejected.load(Ordering::Relaxed)
    }

    pub fn rejected_total(&self) -> u64 {
        TelemetryChannel::ALL
            .iter()
            .map(|c| self.rejected_count(*c))
            .sum()
    }
}

impl Default for TelemetryAggregator {
    fn default() -> Self {
        Self::new(TelemetryConfig::default())
    }
}

/// EMA weight for a sample `dt` seconds after the previous one.
pub fn ema_alpha(dt: f64, half_life: f64) -> f64 {
    if dt <= 0.0 {
        return 0.0;
    }
    1.0 - 0.5f64.powf(dt / half_life)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn light(t: f64, v: f64) -> TelemetrySample {
        TelemetrySample::unchecked(TelemetryChannel::Light, t, v, "lux")
    }

    #[test]
    fn test_defaults_before_samples() {
        let agg = TelemetryAggregator::default();
        assert_eq!(agg.snapshot(), ChannelValues::default());
        assert!(!agg.has_samples(TelemetryChannel::Light));
        assert_eq!(agg.last_applied(TelemetryChannel::Light), None);
    }

    #[test]
    fn test_first_sample_initializes() {
        let agg = TelemetryAggregator::default();
        agg.ingest(&light(0.0, 50.0)).unwrap();
        assert_eq!(agg.current_value(TelemetryChannel::Light), 50.0);
        assert!(agg.has_samples(TelemetryChannel::Light));
        assert_eq!(agg.current_value(TelemetryChannel::Motion), 0.0);
    }

    #[test]
    fn test_half_life_weighting() {
        let agg = TelemetryAggregator::default();
        agg.ingest(&light(0.0, 0.0)).unwrap();
        agg.ingest(&light(2.0, 100.0)).unwrap();
        // one half-life moves halfway
        assert!((agg.current_value(TelemetryChannel::Light) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_timestamp_has_no_weight() {
        let agg = TelemetryAggregator::default();
        agg.ingest(&light(1.0, 100.0)).unwrap();
        agg.ingest(&light(1.0, 900.0)).unwrap();
        assert_eq!(agg.current_value(TelemetryChannel::Light), 100.0);
        assert_eq!(agg.applied_count(TelemetryChannel::Light), 2);
    }

    #[test]
    fn test_out_of_range_leaves_state() {
        let agg = TelemetryAggregator::default();
        agg.ingest(&light(0.0, 300.0)).unwrap();
        let err = agg.ingest(&light(1.0, -1.0)).unwrap_err();
        assert!(matches!(err, MediaError::OutOfRange { .. }));
        assert_eq!(agg.current_value(TelemetryChannel::Light), 300.0);
        assert_eq!(agg.last_applied(TelemetryChannel::Light), Some(0.0));
        assert_eq!(agg.rejected_count(TelemetryChannel::Light), 1);
    }

    #[test]
    fn test_stale_sample_rejected() {
        let agg = TelemetryAggregator::default();
        agg.ingest(&light(5.0, 300.0)).unwrap();
        let err = agg.ingest(&light(4.0, 1000.0)).unwrap_err();
        assert!(matches!(err, MediaError::StaleSample { last_applied, .. } if last_applied == 5.0));
        assert_eq!(agg.current_value(TelemetryChannel::Light), 300.0);
        assert_eq!(agg.rejected_total(), 1);
    }

    #[test]
    fn test_ingest_recording_report() {
        let json = r#"{
            "ambient_light_sequence": [
                {"time": 1.0, "value": 200.0, "unit": "lux"},
                {"time": 0.0, "value": 50.0, "unit": "lux"},
                {"time": 2.0, "value": -5.0, "unit": "lux"}
            ],
            "motion_sequence": [{"time": 0.0, "value": 0.4, "unit": "normalized"}]
        }"#;
        let recording = TelemetryRecording::from_json_str(json).unwrap();
        let agg = TelemetryAggregator::default();
        let report = agg.ingest_recording(&recording);
        assert_eq!(report.accepted, 3);
        assert_eq!(report.out_of_range, 1);

        // replay: earlier samples are stale, the last one carries no weight
        let before = agg.snapshot();
        let replay = agg.ingest_recording(&recording);
        assert_eq!(replay.stale, 1);
        assert_eq!(agg.snapshot(), before);
    }

    #[test]
    fn test_concurrent_writers_and_readers() {
        let agg = Arc::new(TelemetryAggregator::default());
        let writers: Vec<_> = TelemetryChannel::ALL
            .into_iter()
            .map(|channel| {
                let agg = Arc::clone(&agg);
                thread::spawn(move || {
                    let (min, _) = channel.bounds();
                    for i in 0..200 {
                        let sample = TelemetrySample::unchecked(channel, i as f64 * 0.01, min, "");
                        agg.ingest(&sample).unwrap();
                    }
                })
            })
            .collect();
        let reader = {
            let agg = Arc::clone(&agg);
            thread::spawn(move || {
                for _ in 0..200 {
                    let values = agg.snapshot();
                    assert!(values.light.is_finite());
                }
            })
        };
        for handle in writers {
            handle.join().unwrap();
        }
        reader.join().unwrap();
        for channel in TelemetryChannel::ALL {
            assert_eq!(agg.applied_count(channel), 200);
        }
    }

    #[test]
    fn test_ema_alpha() {
        assert_eq!(ema_alpha(0.0, 2.0), 0.0);
        assert_eq!(ema_alpha(-1.0, 2.0), 0.0);
        assert!((ema_alpha(2.0, 2.0) - 0.5).abs() < 1e-12);
        assert!(ema_alpha(100.0, 0.5) > 0.999);
    }
}
