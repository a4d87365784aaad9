//! Loading recorded telemetry from disk.

use std::path::Path;

use tracing::info;

use lumen_models::{TelemetryProfile, TelemetryRecording};

use crate::error::{MediaError, MediaResult};

/// Read a recording in the collector JSON schema.
pub fn load_recording(path: impl AsRef<Path>) -> MediaResult<TelemetryRecording> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let recording = TelemetryRecording::from_json_str(&json)?;
    info!(
        path = %path.display(),
        points = recording.len(),
        end_time = recording.end_time().unwrap_or(0.0),
        "Loaded telemetry recording"
    );
    Ok(recording)
}

/// Look up a built-in profile by name.
pub fn builtin_profile(name: &str) -> MediaResult<TelemetryProfile> {
    TelemetryProfile::builtin(name).ok_or_else(|| {
        MediaError::configuration(format!(
            "unknown telemetry profile '{}', expected one of {:?}",
            name,
            TelemetryProfile::BUILTIN
        ))
    })
}
