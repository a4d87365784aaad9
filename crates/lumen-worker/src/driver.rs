//! Per-stream pipeline driver.
//!
//! A [`PipelineDriver`] ties one stream to a shared telemetry aggregator. It
//! decides when parameters are re-evaluated, owns the stream's smoother state
//! and pushes frames through the enhancement engine on a rayon pool.

use std::sync::Arc;

use rayon::ThreadPool;
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use lumen_media::metrics;
use lumen_media::{
    AdaptiveHdrConfig, EnhanceStats, EnhancementEngine, MediaError, MediaResult,
    ParameterGenerator, SmootherState, TelemetryAggregator, TemporalSmoother,
};
use lumen_models::{Frame, HdrParameterSet, StreamId};

use crate::cadence::EvaluationCadence;
use crate::error::{WorkerError, WorkerResult};
use crate::io::{FrameSink, FrameSource};
use crate::logging::{SkipReason, StreamLogger};
use crate::replay::TelemetryReplay;

/// Frames between progress log lines.
const PROGRESS_INTERVAL: u64 = 300;

/// Summary of one [`PipelineDriver::run`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub stream_id: String,
    /// Frames pulled from the source
    pub frames_in: u64,
    /// Frames handed to the sink
    pub frames_out: u64,
    /// Frames dropped as undecodable or malformed
    pub frames_skipped: u64,
    /// Parameter evaluations during the run
    pub evaluations: u64,
    /// Mean enhancement time per emitted frame
    pub avg_process_ms: f64,
    /// Whether the run stopped on a cancel signal
    pub cancelled: bool,
}

/// Drives one stream.
pub struct PipelineDriver {
    stream_id: StreamId,
    aggregator: Arc<TelemetryAggregator>,
    generator: ParameterGenerator,
    smoother: TemporalSmoother,
    engine: Arc<EnhancementEngine>,
    cadence: EvaluationCadence,
    batch_size: usize,
    pool: Option<Arc<ThreadPool>>,
    state: SmootherState,
    current: Option<HdrParameterSet>,
    last_eval: Option<(u64, f64)>,
    frames_seen: u64,
    evaluations: u64,
    resume_gap_secs: f64,
    resume_pending: bool,
    replay: Option<TelemetryReplay>,
    logger: StreamLogger,
}

impl PipelineDriver {
    /// Create a driver for a fresh stream. The config is validated first.
    pub fn new(
        config: &AdaptiveHdrConfig,
        aggregator: Arc<TelemetryAggregator>,
        cadence: EvaluationCadence,
    ) -> WorkerResult<Self> {
        config.validate()?;
        cadence.validate()?;
        let stream_id = StreamId::new();
        Ok(Self {
            logger: StreamLogger::new(&stream_id),
            stream_id,
            aggregator,
            generator: ParameterGenerator::new(config.generator.clone()),
            smoother: TemporalSmoother::new(config.smoother.clone()),
            engine: Arc::new(EnhancementEngine::new(config.enhancement.clone())),
            cadence,
            batch_size: 8,
            pool: None,
            state: SmootherState::default(),
            current: None,
            last_eval: None,
            frames_seen: 0,
            evaluations: 0,
            resume_gap_secs: config.smoother.resume_gap_secs,
            resume_pending: false,
            replay: None,
        })
    }

    /// Continue a stream from saved smoother state.
    ///
    /// The first evaluation is rate limited against `state` unless the idle
    /// gap exceeds the configured resume gap.
    pub fn resume(
        config: &AdaptiveHdrConfig,
        aggregator: Arc<TelemetryAggregator>,
        cadence: EvaluationCadence,
        state: SmootherState,
    ) -> WorkerResult<Self> {
        let mut driver = Self::new(config, aggregator, cadence)?;
        driver.state = state;
        driver.resume_pending = !state.is_fresh();
        Ok(driver)
    }

    pub fn with_stream_id(mut self, stream_id: StreamId) -> Self {
        self.logger = StreamLogger::new(&stream_id);
        self.stream_id = stream_id;
        self
    }

    /// Frames enhanced per parallel batch (at least 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Dedicated enhancement pool with `workers` threads; 0 keeps the global pool.
    pub fn with_workers(mut self, workers: usize) -> WorkerResult<Self> {
        if workers == 0 {
            self.pool = None;
            return Ok(self);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("lumen-enhance-{}", i))
            .build()
            .map_err(|e| WorkerError::config_error(format!("cannot build worker pool: {}", e)))?;
        self.pool = Some(Arc::new(pool));
        Ok(self)
    }

    /// Feed a recording into the aggregator in step with frame time.
    pub fn with_replay(mut self, replay: TelemetryReplay) -> Self {
        self.replay = Some(replay);
        self
    }

    pub fn stream_id(&self) -> &StreamId {
        &self.stream_id
    }

    pub fn state(&self) -> &SmootherState {
        &self.state
    }

    /// Smoother state for a later [`PipelineDriver::resume`].
    pub fn into_state(self) -> SmootherState {
        self.state
    }

    /// Last emitted parameter set, if any.
    pub fn current_parameters(&self) -> Option<&HdrParameterSet> {
        self.current.as_ref()
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Parameters for the next frame, stamped `timestamp`.
    ///
    /// Each call counts as one frame for the cadence.
    pub fn parameters_for(&mut self, timestamp: f64) -> HdrParameterSet {
        let index = self.frames_seen;
        self.frames_seen += 1;

        if let Some(replay) = self.replay.as_mut() {
            let report = replay.advance_to(&self.aggregator, timestamp);
            if report.rejected() > 0 {
                self.logger.replay_rejected(timestamp, &report);
            }
        }

        if let Some(current) = self.current {
            if !self.cadence.is_due(self.last_eval, index, timestamp) {
                return current;
            }
        }

        if self.resume_pending {
            self.state = self.state.resume_at(timestamp, self.resume_gap_secs);
            self.resume_pending = false;
        }

        let values = self.aggregator.snapshot();
        let candidate = self.generator.generate_from(&values, timestamp);
        let (state, params) = self.smoother.step(self.state, &candidate);
        self.state = state;
        self.current = Some(params);
        self.last_eval = Some((index, timestamp));
        self.evaluations += 1;

        metrics::record_parameter_evaluation(params.exposure_gain);
        debug!(
            stream_id = %self.stream_id,
            timestamp,
            light = values.light,
            color_temp = values.color_temp,
            motion = values.motion,
            exposure_gain = params.exposure_gain,
            shadow_lift = params.shadow_lift,
            highlight_rolloff = params.highlight_rolloff,
            contrast = params.contrast,
            color_temp_correction_k = params.color_temp_correction_k,
            detail_strength = params.detail_strength,
            "Evaluated parameters"
        );
        params
    }

    /// Enhance a single frame on the calling thread.
    pub fn process_frame(&mut self, frame: &Frame) -> MediaResult<Frame> {
        let params = self.parameters_for(frame.timestamp);
        self.engine.enhance(frame, &params)
    }

    /// Pull frames from `source` until it ends or `cancel` turns true.
    ///
    /// Frames already read when the signal arrives are still enhanced and
    /// written. Frames the source cannot decode and malformed frames are
    /// skipped and counted.
    pub async fn run<S, K>(
        &mut self,
        source: &mut S,
        sink: &mut K,
        cancel: watch::Receiver<bool>,
    ) -> WorkerResult<RunReport>
    where
        S: FrameSource + ?Sized,
        K: FrameSink + ?Sized,
    {
        let mut report = RunReport {
            stream_id: self.stream_id.to_string(),
            ..RunReport::default()
        };
        let evaluations_before = self.evaluations;
        let mut total_ms = 0.0;

        self.logger
            .run_started(&self.cadence, self.batch_size, source.remaining_hint());

        loop {
            let mut batch = Vec::with_capacity(self.batch_size);
            let mut positions = Vec::with_capacity(self.batch_size);
            let mut exhausted = false;
            while batch.len() < self.batch_size {
                if *cancel.borrow() {
                    report.cancelled = true;
                    break;
                }
                match source.next_frame().await {
                    Ok(Some(frame)) => {
                        positions.push(report.frames_in);
                        report.frames_in += 1;
                        let params = self.parameters_for(frame.timestamp);
                        batch.push((frame, params));
                    }
                    Ok(None) => {
                        exhausted = true;
                        break;
                    }
                    Err(e @ WorkerError::Decode { .. }) => {
                        report.frames_in += 1;
                        report.frames_skipped += 1;
                        self.logger.frame_skipped(
                            SkipReason::DecodeFailed,
                            report.frames_in - 1,
                            &e.to_string(),
                        );
                    }
                    Err(e) => return Err(e),
                }
            }

            if !batch.is_empty() {
                let results = self.enhance_batch(batch).await?;
                for (result, position) in results.into_iter().zip(positions) {
                    match result {
                        Ok((frame, stats)) => {
                            total_ms += stats.process_time_ms;
                            if let Err(e) = sink.write_frame(frame).await {
                                self.logger.sink_failed(report.frames_out, &e);
                                return Err(e);
                            }
                            report.frames_out += 1;
                            if report.frames_out % PROGRESS_INTERVAL == 0 {
                                self.logger
                                    .progress(report.frames_out, self.current.as_ref());
                            }
                        }
                        Err(MediaError::InvalidFrame(reason)) => {
                            report.frames_skipped += 1;
                            self.logger.frame_skipped(
                                SkipReason::InvalidFrame,
                                position,
                                &reason,
                            );
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }

            if exhausted || report.cancelled {
                break;
            }
        }

        sink.finish().await?;

        report.evaluations = self.evaluations - evaluations_before;
        if report.frames_out > 0 {
            report.avg_process_ms = total_ms / report.frames_out as f64;
        }

        self.logger.run_finished(&report);
        Ok(report)
    }

    async fn enhance_batch(
        &self,
        batch: Vec<(Frame, HdrParameterSet)>,
    ) -> WorkerResult<Vec<MediaResult<(Frame, EnhanceStats)>>> {
        let engine = Arc::clone(&self.engine);
        let pool = self.pool.clone();
        let span = self.logger.span();
        let results = tokio::task::spawn_blocking(move || {
            let _guard = span.enter();
            match pool {
                Some(pool) => pool.install(|| engine.enhance_batch(&batch)),
                None => engine.enhance_batch(&batch),
            }
        })
        .await?;
        Ok(results)
    }
}
