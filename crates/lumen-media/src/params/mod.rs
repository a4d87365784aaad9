//! Parameter generation and temporal smoothing.

mod curve;
mod generator;
mod smoother;

pub use curve::{ControlPoint, PiecewiseLinear};
pub use generator::ParameterGenerator;
pub use smoother::{SmootherState, TemporalSmoother};
