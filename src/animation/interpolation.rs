use std::f64::consts::PI;

use crate::traits::Lerp;

/// Sine ease-in-out over normalized time, clamped to `[0, 1]`
pub fn ease_in_out_sine(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    -(((PI * t).cos() - 1.0) / 2.0)
}

/// Interpolate from `start` to `end` along the sine ease-in-out curve
pub fn ease<T: Lerp>(start: &T, end: &T, t: f64) -> T {
    start.lerp(end, ease_in_out_sine(t))
}
