//! Adaptive HDR worker binary.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lumen_media::telemetry::{builtin_profile, load_recording};
use lumen_media::{SimulatedSensors, TelemetryAggregator};
use lumen_models::TelemetryRecording;
use lumen_worker::{
    ImageSequenceSink, ImageSequenceSource, PipelineDriver, TelemetryReplay, WorkerConfig,
};

/// Seed for simulated telemetry when no recording or profile is configured.
const SIMULATION_SEED: u64 = 42;
/// Sampling rate of simulated telemetry.
const SIMULATION_RATE_HZ: f64 = 10.0;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("lumen=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting lumen-worker");

    let config = WorkerConfig::from_env().context("invalid worker configuration")?;
    info!("Worker config: {:?}", config);

    if config.metrics_enabled {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .install()
            .context("failed to install Prometheus exporter")?;
        info!("Prometheus exporter installed");
    }

    // Configuration errors are fatal before any frame is read
    let hdr_config = config.load_hdr_config()?;
    let aggregator = Arc::new(TelemetryAggregator::new(hdr_config.telemetry.clone()));

    let mut source = ImageSequenceSource::open(&config.input_dir, config.fps).await?;
    let mut sink = ImageSequenceSink::create(&config.output_dir).await?;
    if source.is_empty() {
        warn!(dir = %config.input_dir.display(), "No input frames found");
    }

    let recording = telemetry_for(&config, source.duration_secs())?;
    info!(samples = recording.len(), "Telemetry ready");

    let mut driver = PipelineDriver::new(&hdr_config, aggregator, config.cadence)?
        .with_batch_size(config.batch_size)
        .with_workers(config.workers)?
        .with_replay(TelemetryReplay::new(&recording));

    // Stop frame submission on Ctrl-C; frames in flight still complete
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        cancel_tx.send(true).ok();
    });

    let report = driver.run(&mut source, &mut sink, cancel_rx).await?;
    info!(
        report = %serde_json::to_string(&report)?,
        "Worker shutdown complete"
    );
    Ok(())
}

/// Telemetry from a recording file, a built-in profile, or simulated sensors.
fn telemetry_for(config: &WorkerConfig, duration_secs: f64) -> anyhow::Result<TelemetryRecording> {
    if let Some(path) = &config.telemetry_path {
        return load_recording(path)
            .with_context(|| format!("failed to load telemetry from {}", path.display()));
    }
    if let Some(name) = &config.profile {
        return Ok(builtin_profile(name)?.recording);
    }
    info!(seed = SIMULATION_SEED, "Using simulated telemetry");
    Ok(SimulatedSensors::new(SIMULATION_SEED).record(duration_secs, SIMULATION_RATE_HZ))
}
