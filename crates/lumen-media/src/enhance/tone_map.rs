//! Highlight rolloff with a Reinhard shoulder.
//!
//! Below the knee luminance is untouched. Above it:
//!
//! ```text
//! y = knee + (x - knee) / (1 + (x - knee))
//! knee = 1 - rolloff * (1 - min_knee)
//! ```

use super::buffer::LinearFrame;

/// Knee position for a rolloff strength.
pub(crate) fn knee(rolloff: f32, min_knee: f32) -> f32 {
    1.0 - rolloff.clamp(0.0, 1.0) * (1.0 - min_knee)
}

/// Shoulder curve applied to one luminance value.
pub(crate) fn shoulder(x: f32, knee: f32) -> f32 {
    if x <= knee {
        return x;
    }
    let over = x - knee;
    knee + over / (1.0 + over)
}

pub(crate) fn apply(img: &mut LinearFrame, rolloff: f32, min_knee: f32) {
    let k = knee(rolloff, min_knee);
    let luminance = img.luminance();
    let mapped: Vec<f32> = luminance.iter().map(|&y| shoulder(y, k)).collect();
    img.apply_luminance(&luminance, &mapped);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knee_range() {
        assert_eq!(knee(0.0, 0.5), 1.0);
        assert_eq!(knee(1.0, 0.5), 0.5);
        assert!((knee(0.4, 0.5) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_shoulder_compresses_monotonically() {
        let k = 0.5;
        let mut last = 0.0;
        for i in 0..=100 {
            let x = i as f32 / 100.0;
            let y = shoulder(x, k);
            assert!(y <= x + 1e-7);
            assert!(y >= last);
            last = y;
        }
        assert_eq!(shoulder(0.3, k), 0.3);
        assert!((shoulder(1.0, k) - (0.5 + 0.5 / 1.5)).abs() < 1e-6);
    }
}
