//! Parameter evaluation cadence.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WorkerError;

/// Slack for frame timestamps that land a hair before an interval boundary.
const TIME_EPSILON: f64 = 1e-9;

/// How often the driver re-evaluates parameters.
///
/// Frames between evaluations reuse the last parameter set. The default,
/// every 0.1 s, does not depend on the frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationCadence {
    EveryFrame,
    EveryNFrames(u32),
    EverySeconds(f64),
}

impl Default for EvaluationCadence {
    fn default() -> Self {
        EvaluationCadence::EverySeconds(0.1)
    }
}

impl EvaluationCadence {
    /// Whether frame `index` at `timestamp` needs a fresh evaluation, given
    /// the frame index and timestamp of the last one.
    pub fn is_due(&self, last: Option<(u64, f64)>, index: u64, timestamp: f64) -> bool {
        let Some((last_index, last_time)) = last else {
            return true;
        };
        match *self {
            EvaluationCadence::EveryFrame => true,
            EvaluationCadence::EveryNFrames(n) => index.saturating_sub(last_index) >= n as u64,
            EvaluationCadence::EverySeconds(interval) => {
                timestamp < last_time || timestamp - last_time + TIME_EPSILON >= interval
            }
        }
    }

    pub fn validate(&self) -> Result<(), WorkerError> {
        match *self {
            EvaluationCadence::EveryNFrames(0) => Err(WorkerError::config_error(
                "evaluation cadence needs at least one frame per evaluation",
            )),
            EvaluationCadence::EverySeconds(t) if !(t.is_finite() && t > 0.0) => Err(
                WorkerError::config_error(format!("evaluation interval must be positive, got {}", t)),
            ),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for EvaluationCadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationCadence::EveryFrame => write!(f, "frame"),
            EvaluationCadence::EveryNFrames(n) => write!(f, "frames:{}", n),
            EvaluationCadence::EverySeconds(t) => write!(f, "secs:{}", t),
        }
    }
}

impl FromStr for EvaluationCadence {
    type Err = WorkerError;

    /// Parses `frame`, `frames:N` or `secs:T`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let invalid = || {
            WorkerError::config_error(format!(
                "invalid evaluation cadence '{}', expected frame, frames:N or secs:T",
                s
            ))
        };
        let cadence = match s.split_once(':') {
            None if s == "frame" => EvaluationCadence::EveryFrame,
            Some(("frames", n)) => {
                EvaluationCadence::EveryNFrames(n.trim().parse().map_err(|_| invalid())?)
            }
            Some(("secs", t)) => {
                EvaluationCadence::EverySeconds(t.trim().parse().map_err(|_| invalid())?)
            }
            _ => return Err(invalid()),
        };
        cadence.validate()?;
        Ok(cadence)
    }
}
