//! Worker configuration.

use std::path::PathBuf;
use std::str::FromStr;

use lumen_media::AdaptiveHdrConfig;
use lumen_models::EnhancementPreset;

use crate::cadence::EvaluationCadence;
use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Optional JSON file with the full adaptive HDR config
    pub config_path: Option<PathBuf>,
    /// Enhancement preset used when no config file is given
    pub preset: EnhancementPreset,
    /// Recorded telemetry in the collector JSON schema
    pub telemetry_path: Option<PathBuf>,
    /// Built-in telemetry profile, used when no recording is given
    pub profile: Option<String>,
    /// Directory of input frames
    pub input_dir: PathBuf,
    /// Directory for enhanced frames
    pub output_dir: PathBuf,
    /// Frame rate used to timestamp image sequences
    pub fps: f64,
    /// Parameter evaluation cadence
    pub cadence: EvaluationCadence,
    /// Frames enhanced per parallel batch
    pub batch_size: usize,
    /// Enhancement worker threads (0 = one per core)
    pub workers: usize,
    /// Install the Prometheus exporter
    pub metrics_enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            preset: EnhancementPreset::Balanced,
            telemetry_path: None,
            profile: None,
            input_dir: PathBuf::from("./frames"),
            output_dir: PathBuf::from("./enhanced"),
            fps: 30.0,
            cadence: EvaluationCadence::default(),
            batch_size: 8,
            workers: 0,
            metrics_enabled: false,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> WorkerResult<Self> {
        let defaults = Self::default();

        let preset = match lookup("LUMEN_PRESET") {
            Some(s) => s
                .parse::<EnhancementPreset>()
                .map_err(|e| WorkerError::config_error(e.to_string()))?,
            None => defaults.preset,
        };
        let cadence = match lookup("LUMEN_CADENCE") {
            Some(s) => s.parse()?,
            None => defaults.cadence,
        };

        let config = Self {
            config_path: lookup("LUMEN_CONFIG_PATH").map(PathBuf::from),
            preset,
            telemetry_path: lookup("LUMEN_TELEMETRY_PATH").map(PathBuf::from),
            profile: lookup("LUMEN_PROFILE"),
            input_dir: lookup("LUMEN_INPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.input_dir),
            output_dir: lookup("LUMEN_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            fps: parse_var(&lookup, "LUMEN_FPS")?.unwrap_or(defaults.fps),
            cadence,
            batch_size: parse_var(&lookup, "LUMEN_BATCH_SIZE")?.unwrap_or(defaults.batch_size),
            workers: parse_var(&lookup, "LUMEN_WORKERS")?.unwrap_or(defaults.workers),
            metrics_enabled: lookup("LUMEN_METRICS")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.metrics_enabled),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> WorkerResult<()> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(WorkerError::config_error(format!(
                "frame rate must be positive, got {}",
                self.fps
            )));
        }
        if self.batch_size == 0 {
            return Err(WorkerError::config_error("batch size must be at least 1"));
        }
        self.cadence.validate()
    }

    /// Adaptive HDR config from the config file, or the preset defaults.
    ///
    /// Validated before it is returned.
    pub fn load_hdr_config(&self) -> WorkerResult<AdaptiveHdrConfig> {
        let config = match &self.config_path {
            Some(path) => AdaptiveHdrConfig::from_path(path)?,
            None => AdaptiveHdrConfig::for_preset(self.preset),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Parse an optional variable; a value that is set but unparseable is an error.
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> WorkerResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| {
                WorkerError::config_error(format!("{} has invalid value {:?}: {}", key, raw, e))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.fps, 30.0);
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.cadence, EvaluationCadence::EverySeconds(0.1));
        assert_eq!(config.preset, EnhancementPreset::Balanced);
        assert!(!config.metrics_enabled);
    }

    #[test]
    fn test_overrides() {
        let config = WorkerConfig::from_lookup(lookup(&[
            ("LUMEN_PRESET", "quality"),
            ("LUMEN_CADENCE", "frames:4"),
            ("LUMEN_FPS", "24"),
            ("LUMEN_METRICS", "true"),
            ("LUMEN_PROFILE", "light"),
        ]))
        .unwrap();
        assert_eq!(config.preset, EnhancementPreset::Quality);
        assert_eq!(config.cadence, EvaluationCadence::EveryNFrames(4));
        assert_eq!(config.fps, 24.0);
        assert!(config.metrics_enabled);
        assert_eq!(config.profile.as_deref(), Some("light"));

        let hdr = config.load_hdr_config().unwrap();
        assert_eq!(hdr.enhancement.clahe_tile_grid, 16);
    }

    #[test]
    fn test_invalid_values_fail_fast() {
        assert!(WorkerConfig::from_lookup(lookup(&[("LUMEN_PRESET", "ultra")])).is_err());
        assert!(WorkerConfig::from_lookup(lookup(&[("LUMEN_CADENCE", "secs:0")])).is_err());
        assert!(WorkerConfig::from_lookup(lookup(&[("LUMEN_BATCH_SIZE", "0")])).is_err());
    }

    #[test]
    fn test_unparseable_numbers_are_config_errors() {
        for (key, value) in [
            ("LUMEN_FPS", "thirty"),
            ("LUMEN_BATCH_SIZE", "-4"),
            ("LUMEN_WORKERS", "many"),
        ] {
            let err = WorkerConfig::from_lookup(lookup(&[(key, value)])).unwrap_err();
            assert!(matches!(err, WorkerError::Config(_)), "{}", key);
            assert!(err.to_string().contains(key));
        }
        let config = WorkerConfig::from_lookup(lookup(&[("LUMEN_WORKERS", " 3 ")])).unwrap();
        assert_eq!(config.workers, 3);
    }

    #[test]
    fn test_missing_config_file() {
        let config = WorkerConfig {
            config_path: Some(PathBuf::from("/nonexistent/lumen.json")),
            ..WorkerConfig::default()
        };
        assert!(matches!(config.load_hdr_config(), Err(WorkerError::Media(_))));
    }
}
