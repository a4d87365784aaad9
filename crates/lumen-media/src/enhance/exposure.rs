//! Exposure scaling in linear light.

use super::buffer::LinearFrame;

pub(crate) fn apply(img: &mut LinearFrame, gain: f32) {
    for px in img.rgb.iter_mut() {
        for c in px.iter_mut() {
            *c = (*c * gain).clamp(0.0, 1.0);
        }
    }
}
