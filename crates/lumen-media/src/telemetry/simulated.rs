//! Simulated sensors for demos and soak tests.
//!
//! Light follows a day/night cycle, color temperature tracks the time of day
//! (warm mornings and evenings, neutral midday) and motion drifts toward a
//! randomly chosen activity level. Each reading carries uniform noise.
//! Seeded generators make recordings reproducible.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use lumen_models::{TelemetryChannel, TelemetryRecording, TelemetrySample};

const MOTION_TARGETS: [f64; 5] = [0.1, 0.3, 0.5, 0.7, 0.9];

/// Three simulated sensors sharing one clock.
#[derive(Debug, Clone)]
pub struct SimulatedSensors {
    rng: StdRng,
    cycle_secs: f64,
    motion_level: f64,
    motion_target: f64,
    next_motion_change: f64,
}

impl SimulatedSensors {
    /// Default day/night cycle length in seconds.
    pub const DEFAULT_CYCLE_SECS: f64 = 120.0;

    pub fn new(seed: u64) -> Self {
        Self::with_cycle(seed, Self::DEFAULT_CYCLE_SECS)
    }

    pub fn with_cycle(seed: u64, cycle_secs: f64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let next_motion_change = rng.random_range(10.0..20.0);
        Self {
            rng,
            cycle_secs: cycle_secs.max(f64::EPSILON),
            motion_level: 0.3,
            motion_target: 0.3,
            next_motion_change,
        }
    }

    fn cycle_position(&self, t: f64) -> f64 {
        t.rem_euclid(self.cycle_secs) / self.cycle_secs
    }

    /// Ambient light in lux at time `t`.
    pub fn read_light(&mut self, t: f64) -> TelemetrySample {
        let p = self.cycle_position(t);
        let lux = if p < 0.25 {
            100.0 + 900.0 * (p * 4.0)
        } else if p < 0.5 {
            1000.0 + 4000.0 * ((p - 0.25) * 4.0)
        } else if p < 0.75 {
            5000.0 - 4000.0 * ((p - 0.5) * 4.0)
        } else {
            1000.0 - 900.0 * ((p - 0.75) * 4.0)
        };
        let lux = (lux + self.rng.random_range(-50.0..50.0)).clamp(50.0, 5000.0);
        TelemetrySample::unchecked(TelemetryChannel::Light, t, lux, "lux")
    }

    /// Color temperature in kelvin at time `t`.
    pub fn read_color_temp(&mut self, t: f64) -> TelemetrySample {
        let p = self.cycle_position(t);
        let kelvin = if p < 0.3 {
            3000.0 + 2000.0 * (p / 0.3)
        } else if p < 0.7 {
            5000.0 + 1000.0 * ((p - 0.3) * 2.5 * PI).sin()
        } else {
            5000.0 - 2000.0 * ((p - 0.7) / 0.3)
        };
        let kelvin = (kelvin + self.rng.random_range(-100.0..100.0)).clamp(2700.0, 6500.0);
        TelemetrySample::unchecked(TelemetryChannel::ColorTemp, t, kelvin, "kelvin")
    }

    /// Motion intensity at time `t`. Calls must use non-decreasing `t`.
    pub fn read_motion(&mut self, t: f64) -> TelemetrySample {
        if t >= self.next_motion_change {
            let index = self.rng.random_range(0..MOTION_TARGETS.len());
            self.motion_target = MOTION_TARGETS[index];
            self.next_motion_change = t + self.rng.random_range(10.0..20.0);
        }
        self.motion_level += (self.motion_target - self.motion_level) * 0.1;
        let motion = (self.motion_level + self.rng.random_range(-0.05..0.05)).clamp(0.0, 1.0);
        TelemetrySample::unchecked(TelemetryChannel::Motion, t, motion, "normalized")
    }

    /// All three channels at time `t`.
    pub fn read_all(&mut self, t: f64) -> [TelemetrySample; 3] {
        [self.read_light(t), self.read_color_temp(t), self.read_motion(t)]
    }

    /// Sample every channel at `rate_hz` for `duration_secs`.
    pub fn record(&mut self, duration_secs: f64, rate_hz: f64) -> TelemetryRecording {
        let mut recording = TelemetryRecording::default();
        if !(duration_secs >= 0.0 && rate_hz > 0.0) {
            return recording;
        }
        let ticks = (duration_secs * rate_hz).floor() as u64;
        for tick in 0..=ticks {
            let t = tick as f64 / rate_hz;
            for sample in self.read_all(t) {
                recording.push(sample.channel(), sample.timestamp(), sample.value());
            }
        }
        recording
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readings_within_bounds() {
        let mut sensors = SimulatedSensors::new(7);
        for i in 0..600 {
            for sample in sensors.read_all(i as f64 * 0.5) {
                assert!(sample.check_bounds().is_ok(), "{:?}", sample);
            }
        }
    }

    #[test]
    fn test_seeded_recordings_are_reproducible() {
        let a = SimulatedSensors::new(42).record(30.0, 10.0);
        let b = SimulatedSensors::new(42).record(30.0, 10.0);
        assert_eq!(a, b);
        assert_eq!(a.ambient_light_sequence.len(), 301);
        assert_eq!(a.end_time(), Some(30.0));

        let c = SimulatedSensors::new(43).record(30.0, 10.0);
        assert_ne!(a, c);
    }

    #[test]
    fn test_day_cycle_shape() {
        let mut sensors = SimulatedSensors::new(1);
        let dawn = sensors.read_light(0.0).value();
        let noon = sensors.read_light(60.0).value();
        assert!(noon > dawn + 1000.0);
    }

    #[test]
    fn test_invalid_record_arguments() {
        let mut sensors = SimulatedSensors::new(1);
        assert!(sensors.record(10.0, 0.0).is_empty());
        assert!(sensors.record(f64::NAN, 10.0).is_empty());
    }
}
