//! Explicit per-property animation records and smoothing helpers.
//!
//! Route transitions and the drag settle are driven by [`Tween`] records that
//! the engine samples against its own frame clock. There is no separate
//! animation scheduler: starting a new tween on a property replaces the old
//! record, which makes the cancel-and-replace rule a plain `Option` assignment
//! and keeps the whole thing testable without a real clock.

use cgmath::{Vector2, Vector3};

/// Easing curves used by the engine.
///
/// Route transitions use [`Easing::InOutCubic`]; the settle-back-to-rest tween
/// after a drag uses [`Easing::OutCubic`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Easing {
    Linear,
    InOutCubic,
    OutCubic,
}

impl Easing {
    /// Map linear progress `t` in [0, 1] onto the eased curve.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - u * u * u / 2.0
                }
            }
            Easing::OutCubic => {
                let u = 1.0 - t;
                1.0 - u * u * u
            }
        }
    }
}

/// Values a [`Tween`] can interpolate.
pub trait Lerp: Copy {
    fn lerp(a: Self, b: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Vector2<f32> {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Vector3<f32> {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }
}

/// A time-bounded interpolation of one property.
///
/// `start_time` and `duration` are in seconds on the engine's frame clock.
#[derive(Clone, Copy, Debug)]
pub struct Tween<T: Lerp> {
    pub start: T,
    pub end: T,
    pub start_time: f32,
    pub duration: f32,
    pub easing: Easing,
}

impl<T: Lerp> Tween<T> {
    pub fn new(start: T, end: T, start_time: f32, duration: f32, easing: Easing) -> Self {
        Self {
            start,
            end,
            start_time,
            duration,
            easing,
        }
    }

    /// Sample the tween at time `now`. Clamps before the start and after the end.
    pub fn sample(&self, now: f32) -> T {
        if self.duration <= 0.0 {
            return self.end;
        }
        let t = ((now - self.start_time) / self.duration).clamp(0.0, 1.0);
        T::lerp(self.start, self.end, self.easing.apply(t))
    }

    pub fn finished(&self, now: f32) -> bool {
        now - self.start_time >= self.duration
    }
}

/// Frame-rate-independent exponential approach of `current` toward `target`.
///
/// `remainder_per_second` is the fraction of the offset still left after one
/// second; the per-frame factor `1 - k^dt` yields the same wall-clock
/// convergence at any refresh rate, unlike a fixed fraction per frame.
pub fn exp_approach(current: f32, target: f32, remainder_per_second: f32, dt: f32) -> f32 {
    current + (target - current) * (1.0 - remainder_per_second.powf(dt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints_are_exact() {
        for easing in [Easing::Linear, Easing::InOutCubic, Easing::OutCubic] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
        }
    }

    #[test]
    fn in_out_cubic_is_symmetric_around_midpoint() {
        let e = Easing::InOutCubic;
        assert!((e.apply(0.5) - 0.5).abs() < 1e-6);
        assert!((e.apply(0.25) - (1.0 - e.apply(0.75))).abs() < 1e-6);
    }

    #[test]
    fn tween_clamps_outside_its_window() {
        let tween = Tween::new(1.0f32, 3.0, 10.0, 2.0, Easing::Linear);
        assert_eq!(tween.sample(9.0), 1.0);
        assert_eq!(tween.sample(11.0), 2.0);
        assert_eq!(tween.sample(20.0), 3.0);
        assert!(!tween.finished(11.9));
        assert!(tween.finished(12.0));
    }

    #[test]
    fn zero_duration_tween_jumps_to_end() {
        let tween = Tween::new(0.0f32, 5.0, 0.0, 0.0, Easing::InOutCubic);
        assert_eq!(tween.sample(0.0), 5.0);
        assert!(tween.finished(0.0));
    }

    #[test]
    fn exp_approach_is_framerate_independent() {
        // One second of simulated time at 30 fps vs 120 fps must land on the
        // same value, because the decay is expressed per wall-clock second.
        let mut coarse = 1.0f32;
        for _ in 0..30 {
            coarse = exp_approach(coarse, 0.0, 0.05, 1.0 / 30.0);
        }
        let mut fine = 1.0f32;
        for _ in 0..120 {
            fine = exp_approach(fine, 0.0, 0.05, 1.0 / 120.0);
        }
        assert!((coarse - fine).abs() < 1e-4);
        // After one second only ~5% of the offset remains.
        assert!((coarse - 0.05).abs() < 1e-3);
    }
}
