//! End-to-end tests for the pipeline driver.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use lumen_media::{AdaptiveHdrConfig, ParameterGenerator, SmootherState, TelemetryAggregator};
use lumen_models::{
    Frame, PixelLayout, StreamId, TelemetryChannel, TelemetryProfile, TelemetryRecording,
    TelemetrySample,
};
use lumen_worker::{
    EvaluationCadence, FrameSink, FrameSource, ImageSequenceSink, ImageSequenceSource,
    MemorySink, MemorySource, PipelineDriver, TelemetryReplay, WorkerResult,
};

fn gradient_frame(timestamp: f64) -> Frame {
    let data: Vec<u8> = (0..16 * 16)
        .flat_map(|i: u32| {
            let v = (i % 256) as u8;
            [v, v / 2 + 40, 255 - v]
        })
        .collect();
    Frame::from_rgb8(16, 16, PixelLayout::Rgb, timestamp, data)
}

fn frames(count: usize, fps: f64) -> Vec<Frame> {
    (0..count).map(|i| gradient_frame(i as f64 / fps)).collect()
}

fn new_driver(cadence: EvaluationCadence) -> (Arc<TelemetryAggregator>, PipelineDriver) {
    let aggregator = Arc::new(TelemetryAggregator::default());
    let driver = PipelineDriver::new(
        &AdaptiveHdrConfig::default(),
        Arc::clone(&aggregator),
        cadence,
    )
    .unwrap();
    (aggregator, driver)
}

fn light(t: f64, lux: f64) -> TelemetrySample {
    TelemetrySample::new(TelemetryChannel::Light, t, lux, "lux").unwrap()
}

#[tokio::test]
async fn test_in_memory_run_preserves_order() {
    let profile = TelemetryProfile::builtin("daylight_ramp").unwrap();
    let (_, driver) = new_driver(EvaluationCadence::default());
    let mut driver = driver
        .with_stream_id(StreamId::from_string("cam-01"))
        .with_batch_size(4)
        .with_replay(TelemetryReplay::new(&profile.recording));

    let input = frames(100, 10.0);
    let mut source = MemorySource::new(input.clone());
    let mut sink = MemorySink::new();
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    let report = driver.run(&mut source, &mut sink, cancel_rx).await.unwrap();

    assert_eq!(report.stream_id, "cam-01");
    assert_eq!(report.frames_in, 100);
    assert_eq!(report.frames_out, 100);
    assert_eq!(report.frames_skipped, 0);
    assert_eq!(report.evaluations, 100);
    assert!(!report.cancelled);
    assert!(sink.is_finished());

    let output = sink.into_frames();
    for (out, inp) in output.iter().zip(&input) {
        assert_eq!(out.timestamp, inp.timestamp);
        assert_eq!(out.width, inp.width);
        assert_eq!(out.data.len(), inp.data.len());
    }
    // Night telemetry at the start means a strong exposure boost.
    assert_ne!(output[0], input[0]);
}

#[tokio::test]
async fn test_invalid_frame_is_skipped() {
    let (_, driver) = new_driver(EvaluationCadence::EveryFrame);
    let mut driver = driver.with_batch_size(2);

    let mut input = frames(5, 30.0);
    input[2] = Frame::from_rgb8(16, 16, PixelLayout::Rgb, 2.0 / 30.0, vec![0; 5]);
    let mut source = MemorySource::new(input);
    let mut sink = MemorySink::new();
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    let report = driver.run(&mut source, &mut sink, cancel_rx).await.unwrap();

    assert_eq!(report.frames_in, 5);
    assert_eq!(report.frames_out, 4);
    assert_eq!(report.frames_skipped, 1);
    let timestamps: Vec<f64> = sink.frames().iter().map(|f| f.timestamp).collect();
    assert_eq!(
        timestamps,
        vec![0.0, 1.0 / 30.0, 3.0 / 30.0, 4.0 / 30.0]
    );
}

#[tokio::test]
async fn test_rejected_replay_samples_do_not_stop_frames() {
    let (aggregator, driver) = new_driver(EvaluationCadence::EveryFrame);
    // A live reading far ahead makes every replayed color temperature stale.
    let live = TelemetrySample::reading(TelemetryChannel::ColorTemp, 50.0, 6500.0).unwrap();
    aggregator.ingest(&live).unwrap();

    let mut recording = TelemetryRecording::default();
    recording.push(TelemetryChannel::Light, 0.0, 100.0);
    recording.push(TelemetryChannel::Light, 0.5, -1.0);
    recording.push(TelemetryChannel::Light, 1.0, 2000.0);
    recording.push(TelemetryChannel::ColorTemp, 0.2, 3000.0);
    recording.push(TelemetryChannel::ColorTemp, 0.8, 4000.0);
    recording.push(TelemetryChannel::Motion, 0.3, 1.5);

    let mut driver = driver
        .with_batch_size(3)
        .with_replay(TelemetryReplay::new(&recording));
    let mut source = MemorySource::new(frames(20, 10.0));
    let mut sink = MemorySink::new();
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    let report = driver.run(&mut source, &mut sink, cancel_rx).await.unwrap();

    assert_eq!(report.frames_in, 20);
    assert_eq!(report.frames_out, 20);
    assert_eq!(report.frames_skipped, 0);
    assert_eq!(sink.frames().len(), 20);
    assert_eq!(aggregator.rejected_count(TelemetryChannel::Light), 1);
    assert_eq!(aggregator.rejected_count(TelemetryChannel::ColorTemp), 2);
    assert_eq!(aggregator.rejected_count(TelemetryChannel::Motion), 1);
    assert_eq!(aggregator.rejected_total(), 4);
    assert_eq!(aggregator.applied_count(TelemetryChannel::Light), 2);
    assert_eq!(aggregator.current_value(TelemetryChannel::ColorTemp), 6500.0);
}

#[tokio::test]
async fn test_cancel_before_start() {
    let (_, mut driver) = new_driver(EvaluationCadence::EveryFrame);
    let mut source = MemorySource::new(frames(10, 30.0));
    let mut sink = MemorySink::new();
    let (cancel_tx, cancel_rx) = watch::channel(false);
    cancel_tx.send(true).unwrap();

    let report = driver.run(&mut source, &mut sink, cancel_rx).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.frames_in, 0);
    assert_eq!(report.frames_out, 0);
    assert!(sink.is_finished());
    assert!(driver.state().is_fresh());
}

/// Source that raises the cancel signal after handing out `cancel_after` frames.
struct CancellingSource {
    inner: MemorySource,
    served: usize,
    cancel_after: usize,
    cancel: watch::Sender<bool>,
}

#[async_trait]
impl FrameSource for CancellingSource {
    async fn next_frame(&mut self) -> WorkerResult<Option<Frame>> {
        let frame = self.inner.next_frame().await?;
        self.served += 1;
        if self.served == self.cancel_after {
            self.cancel.send(true).ok();
        }
        Ok(frame)
    }
}

#[tokio::test]
async fn test_cancel_mid_stream_keeps_state() {
    let (aggregator, driver) = new_driver(EvaluationCadence::EveryFrame);
    let mut driver = driver.with_batch_size(4);
    aggregator.ingest(&light(0.0, 100.0)).unwrap();

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let mut source = CancellingSource {
        inner: MemorySource::new(frames(20, 30.0)),
        served: 0,
        cancel_after: 6,
        cancel: cancel_tx,
    };
    let mut sink = MemorySink::new();

    let report = driver.run(&mut source, &mut sink, cancel_rx).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.frames_in, 6);
    assert_eq!(report.frames_out, 6);
    assert!(sink.is_finished());

    let last = *driver.current_parameters().unwrap();
    let state = driver.into_state();
    assert_eq!(state.last(), Some(&last));
    assert_eq!(aggregator.applied_count(TelemetryChannel::Light), 1);
}

#[tokio::test]
async fn test_resume_within_gap_is_rate_limited() {
    let (aggregator, mut driver) = new_driver(EvaluationCadence::EveryFrame);
    aggregator.ingest(&light(0.0, 100.0)).unwrap();
    let first = driver.parameters_for(0.0);
    assert!((first.exposure_gain - 1.8).abs() < 1e-9);
    let state = driver.into_state();

    aggregator.ingest(&light(1.0, 2000.0)).unwrap();
    let mut resumed = PipelineDriver::resume(
        &AdaptiveHdrConfig::default(),
        Arc::clone(&aggregator),
        EvaluationCadence::EveryFrame,
        state,
    )
    .unwrap();

    // One second at 0.3/s allows a drop of 0.3 at most.
    let params = resumed.parameters_for(1.0);
    assert!((params.exposure_gain - 1.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_resume_after_idle_gap_jumps_once() {
    let (aggregator, mut driver) = new_driver(EvaluationCadence::EveryFrame);
    aggregator.ingest(&light(0.0, 100.0)).unwrap();
    driver.parameters_for(0.0);
    let state: SmootherState = driver.into_state();

    aggregator.ingest(&light(10.0, 2000.0)).unwrap();
    let mut resumed = PipelineDriver::resume(
        &AdaptiveHdrConfig::default(),
        Arc::clone(&aggregator),
        EvaluationCadence::EveryFrame,
        state,
    )
    .unwrap();

    let expected = ParameterGenerator::default().generate_from(&aggregator.snapshot(), 10.0);
    let jumped = resumed.parameters_for(10.0);
    assert_eq!(jumped, expected);

    // Back to rate limiting inside the live stream.
    aggregator.ingest(&light(10.1, 50.0)).unwrap();
    let next = resumed.parameters_for(10.1);
    assert!((next.exposure_gain - jumped.exposure_gain).abs() <= 0.3 * 0.1 + 1e-9);
}

#[tokio::test]
async fn test_image_sequence_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input_dir = dir.path().join("in");
    let output_dir = dir.path().join("out");
    std::fs::create_dir_all(&input_dir).unwrap();

    for i in 0..3 {
        let frame = gradient_frame(0.0);
        let lumen_models::PixelBuffer::U8(data) = frame.data else {
            unreachable!()
        };
        image::RgbImage::from_raw(16, 16, data)
            .unwrap()
            .save(input_dir.join(format!("in_{:03}.png", i)))
            .unwrap();
    }

    let (_, driver) = new_driver(EvaluationCadence::default());
    let mut driver = driver.with_workers(2).unwrap();
    let mut source = ImageSequenceSource::open(&input_dir, 24.0).await.unwrap();
    let mut sink = ImageSequenceSink::create(&output_dir).await.unwrap();
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    let report = driver.run(&mut source, &mut sink, cancel_rx).await.unwrap();
    assert_eq!(report.frames_out, 3);
    assert_eq!(sink.written(), 3);

    let written = std::fs::read_dir(&output_dir).unwrap().count();
    assert_eq!(written, 3);
    let first = image::open(output_dir.join("frame_000000.png")).unwrap();
    assert_eq!((first.width(), first.height()), (16, 16));
}

#[tokio::test]
async fn test_corrupt_image_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let input_dir = dir.path().join("in");
    let output_dir = dir.path().join("out");
    std::fs::create_dir_all(&input_dir).unwrap();

    for i in 0..4 {
        let path = input_dir.join(format!("f_{:03}.png", i));
        if i == 1 {
            std::fs::write(&path, [0x89, b'P', b'N', b'G', 0, 1, 2, 3]).unwrap();
        } else {
            lumen_worker::io::save_png(&gradient_frame(0.0), &path).unwrap();
        }
    }

    let (_, driver) = new_driver(EvaluationCadence::EveryFrame);
    let mut driver = driver.with_batch_size(1);
    let mut source = ImageSequenceSource::open(&input_dir, 10.0).await.unwrap();
    let mut sink = ImageSequenceSink::create(&output_dir).await.unwrap();
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    let report = driver.run(&mut source, &mut sink, cancel_rx).await.unwrap();

    assert_eq!(report.frames_in, 4);
    assert_eq!(report.frames_out, 3);
    assert_eq!(report.frames_skipped, 1);
    assert_eq!(report.evaluations, 3);
    assert_eq!(sink.written(), 3);
    assert_eq!(std::fs::read_dir(&output_dir).unwrap().count(), 3);
}
