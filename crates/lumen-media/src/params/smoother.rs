//! Rate limiting of parameter changes between evaluations.
//!
//! The smoother itself is stateless. A stream carries its own
//! [`SmootherState`] through [`TemporalSmoother::step`], so any number of
//! streams can share one smoother.

use serde::{Deserialize, Serialize};

use lumen_models::HdrParameterSet;

use crate::config::SmootherConfig;

/// Per-stream smoother state: the last emitted parameter set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SmootherState {
    last: Option<HdrParameterSet>,
}

impl SmootherState {
    /// State continuing from a previously emitted set.
    pub fn from_last(last: HdrParameterSet) -> Self {
        Self { last: Some(last) }
    }

    pub fn last(&self) -> Option<&HdrParameterSet> {
        self.last.as_ref()
    }

    pub fn is_fresh(&self) -> bool {
        self.last.is_none()
    }

    /// State for a stream resuming at time `t`.
    ///
    /// After an idle gap longer than `resume_gap_secs` the next candidate
    /// passes through unlimited. Shorter gaps keep the last set, so the
    /// resumed stream stays rate limited.
    pub fn resume_at(self, t: f64, resume_gap_secs: f64) -> Self {
        match self.last {
            Some(last) if t - last.generated_at > resume_gap_secs => Self::default(),
            _ => self,
        }
    }
}

/// Clamps per-second parameter changes to configured limits.
#[derive(Debug, Clone, Default)]
pub struct TemporalSmoother {
    config: SmootherConfig,
}

impl TemporalSmoother {
    pub fn new(config: SmootherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SmootherConfig {
        &self.config
    }

    /// Move from `previous` toward `candidate` by at most `rate * dt` per field.
    ///
    /// Without a previous set the candidate is returned unchanged. Negative
    /// or non-finite `dt` allows no change at all.
    pub fn smooth(
        &self,
        previous: Option<&HdrParameterSet>,
        candidate: &HdrParameterSet,
        dt_secs: f64,
    ) -> HdrParameterSet {
        let Some(prev) = previous else {
            return *candidate;
        };
        let dt = if dt_secs.is_finite() && dt_secs > 0.0 {
            dt_secs
        } else {
            0.0
        };
        let c = &self.config;
        HdrParameterSet {
            exposure_gain: limit(prev.exposure_gain, candidate.exposure_gain, c.max_exposure_rate * dt),
            shadow_lift: limit(prev.shadow_lift, candidate.shadow_lift, c.max_shadow_rate * dt),
            highlight_rolloff: limit(
                prev.highlight_rolloff,
                candidate.highlight_rolloff,
                c.max_rolloff_rate * dt,
            ),
            contrast: limit(prev.contrast, candidate.contrast, c.max_contrast_rate * dt),
            color_temp_correction_k: limit(
                prev.color_temp_correction_k,
                candidate.color_temp_correction_k,
                c.max_color_temp_rate * dt,
            ),
            detail_strength: limit(
                prev.detail_strength,
                candidate.detail_strength,
                c.max_detail_rate * dt,
            ),
            generated_at: candidate.generated_at,
        }
    }

    /// Advance a stream by one evaluation.
    ///
    /// `dt` is the difference of the `generated_at` stamps.
    pub fn step(
        &self,
        state: SmootherState,
        candidate: &HdrParameterSet,
    ) -> (SmootherState, HdrParameterSet) {
        let dt = state
            .last
            .map(|last| candidate.generated_at - last.generated_at)
            .unwrap_or(0.0);
        let output = self.smooth(state.last.as_ref(), candidate, dt);
        (SmootherState::from_last(output), output)
    }
}

fn limit(previous: f64, target: f64, max_step: f64) -> f64 {
    previous + (target - previous).clamp(-max_step, max_step)
}
