//! Piecewise-linear response curves.

use serde::{Deserialize, Serialize};

use crate::error::{MediaError, MediaResult};

/// One `(input, output)` control point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub input: f64,
    pub output: f64,
}

impl ControlPoint {
    pub const fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }
}

/// Curve through control points, held constant outside the end points.
///
/// Inputs must be strictly increasing; [`PiecewiseLinear::validate`] checks
/// this at configuration time so evaluation never fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PiecewiseLinear {
    points: Vec<ControlPoint>,
}

impl PiecewiseLinear {
    pub fn new(points: Vec<ControlPoint>) -> Self {
        Self { points }
    }

    /// Build from `(input, output)` pairs.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|&(input, output)| ControlPoint::new(input, output))
                .collect(),
        )
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Evaluate the curve at `x`.
    ///
    /// NaN inputs evaluate to the first control point.
    pub fn eval(&self, x: f64) -> f64 {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if x.is_nan() || x <= first.input {
            return first.output;
        }
        if x >= last.input {
            return last.output;
        }
        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if x == b.input {
                return b.output;
            }
            if x < b.input {
                let t = (x - a.input) / (b.input - a.input);
                return a.output + t * (b.output - a.output);
            }
        }
        last.output
    }

    /// Smallest and largest output.
    pub fn output_range(&self) -> (f64, f64) {
        self.points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.output), hi.max(p.output))
            })
    }

    /// True if outputs never increase with the input.
    pub fn is_non_increasing(&self) -> bool {
        self.points.windows(2).all(|w| w[1].output <= w[0].output)
    }

    /// Check the curve is usable.
    pub fn validate(&self, name: &str) -> MediaResult<()> {
        if self.points.len() < 2 {
            return Err(MediaError::configuration(format!(
                "{} curve needs at least 2 control points, got {}",
                name,
                self.points.len()
            )));
        }
        if let Some(p) = self
            .points
            .iter()
            .find(|p| !p.input.is_finite() || !p.output.is_finite())
        {
            return Err(MediaError::configuration(format!(
                "{} curve has non-finite control point ({}, {})",
                name, p.input, p.output
            )));
        }
        if self.points.windows(2).any(|w| w[1].input <= w[0].input) {
            return Err(MediaError::configuration(format!(
                "{} curve inputs must be strictly increasing",
                name
            )));
        }
        Ok(())
    }
}
