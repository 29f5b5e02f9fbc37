//! Time-based interpolation primitives.
//!
//! Every animated value in the tour is described as a pure function of elapsed
//! time rather than as per-frame state that accumulates. A [`Tween`] answers
//! "what is the value at time `t`", a [`Pulse`] describes an additive
//! overshoot-then-settle offset, and a [`Timer`] is a one-shot debounced timeout.
//!
//! All times are seconds on the same monotonic clock the render loop drives.

use glam::Vec3;

/// Easing functions for smooth transitions.
///
/// These control the acceleration curve of transition animations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    /// Constant speed throughout.
    #[default]
    Linear,
    /// Start slow, accelerate.
    EaseIn,
    /// Start fast, decelerate.
    EaseOut,
    /// Start slow, speed up, then slow down.
    EaseInOut,
}

impl Easing {
    /// Apply the easing function to a linear progress value (0.0 to 1.0).
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// Values that can be linearly interpolated.
pub trait Lerp: Copy {
    fn lerp_to(self, to: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp_to(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Lerp for Vec3 {
    fn lerp_to(self, to: Self, t: f32) -> Self {
        self.lerp(to, t)
    }
}

/// Normalized progress of a window `[start, start + duration]` at time `now`.
///
/// Zero-length windows are complete as soon as they start.
pub fn progress(start: f32, duration: f32, now: f32) -> f32 {
    if duration <= 0.0 {
        return if now >= start { 1.0 } else { 0.0 };
    }
    ((now - start) / duration).clamp(0.0, 1.0)
}

/// An interpolation from one value to another over a fixed time window.
///
/// # Example
///
/// ```
/// use stellar::tween::{Easing, Tween};
///
/// let fade = Tween::new(0.0_f32, 1.0, 2.0, 0.5).easing(Easing::Linear);
/// assert_eq!(fade.value_at(2.25), 0.5);
/// assert!(fade.is_finished(2.5));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Tween<T: Lerp> {
    pub from: T,
    pub to: T,
    pub start: f32,
    pub duration: f32,
    pub easing: Easing,
}

impl<T: Lerp> Tween<T> {
    /// Create an ease-in-out tween starting at `start` seconds.
    pub fn new(from: T, to: T, start: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            start,
            duration: duration.max(0.0),
            easing: Easing::EaseInOut,
        }
    }

    /// A tween that already sits at its final value.
    pub fn settled(value: T) -> Self {
        Self::new(value, value, 0.0, 0.0)
    }

    /// Set the easing function for this tween.
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Value of the tween at time `now`.
    /// Once the window has elapsed the result is exactly `to`.
    pub fn value_at(&self, now: f32) -> T {
        let p = progress(self.start, self.duration, now);
        if p >= 1.0 {
            return self.to;
        }
        self.from.lerp_to(self.to, self.easing.apply(p))
    }

    /// Time at which the tween reaches its final value.
    pub fn end(&self) -> f32 {
        self.start + self.duration
    }

    pub fn is_finished(&self, now: f32) -> bool {
        now >= self.end()
    }
}

/// An additive overshoot-then-settle envelope.
///
/// The offset is zero at `start`, rises with an ease-out curve to `peak` at
/// `start + peak_at * duration`, and decays back to exactly zero at
/// `start + duration` with an ease-in-out curve. Pulses are layered on top of a
/// base value, so a steady-state sweep and a transient boost on the same
/// parameter compose deterministically instead of fighting over it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pulse {
    pub peak: f32,
    /// Fraction of `duration` at which the peak is reached, in (0, 1).
    pub peak_at: f32,
    pub start: f32,
    pub duration: f32,
}

impl Pulse {
    pub fn new(peak: f32, peak_at: f32, start: f32, duration: f32) -> Self {
        Self {
            peak,
            peak_at: peak_at.clamp(0.01, 0.99),
            start,
            duration: duration.max(0.0),
        }
    }

    /// Offset contributed at time `now`.
    pub fn value_at(&self, now: f32) -> f32 {
        if self.duration <= 0.0 || now <= self.start || now >= self.end() {
            return 0.0;
        }
        let t = (now - self.start) / self.duration;
        if t <= self.peak_at {
            self.peak * Easing::EaseOut.apply(t / self.peak_at)
        } else {
            let decay = (t - self.peak_at) / (1.0 - self.peak_at);
            self.peak * (1.0 - Easing::EaseInOut.apply(decay))
        }
    }

    /// Absolute time of the peak.
    pub fn peak_time(&self) -> f32 {
        self.start + self.peak_at * self.duration
    }

    pub fn end(&self) -> f32 {
        self.start + self.duration
    }

    pub fn is_finished(&self, now: f32) -> bool {
        now >= self.end()
    }
}

/// Sum of all live pulses at `now`, dropping the ones that have ended.
pub fn sum_pulses(pulses: &mut Vec<Pulse>, now: f32) -> f32 {
    pulses.retain(|p| !p.is_finished(now));
    pulses.iter().map(|p| p.value_at(now)).sum()
}

/// A one-shot, debounced timeout.
///
/// Scheduling a timer that is already pending replaces the old deadline
/// (cancel-and-reschedule). [`Timer::poll`] returns `true` exactly once per
/// scheduled deadline.
#[derive(Clone, Copy, Debug, Default)]
pub struct Timer {
    deadline: Option<f32>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer to fire `delay` seconds after `now`, replacing any pending deadline.
    pub fn schedule(&mut self, now: f32, delay: f32) {
        self.deadline = Some(now + delay.max(0.0));
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<f32> {
        self.deadline
    }

    /// Returns `true` once when the deadline has passed, disarming the timer.
    pub fn poll(&mut self, now: f32) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn easing_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
        ] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
            assert_eq!(easing.apply(-3.0), 0.0);
            assert_eq!(easing.apply(7.0), 1.0);
        }
        assert_abs_diff_eq!(Easing::EaseInOut.apply(0.5), 0.5);
    }

    #[test]
    fn tween_is_a_function_of_time() {
        let tween = Tween::new(2.0_f32, 4.0, 1.0, 2.0);
        assert_eq!(tween.value_at(0.0), 2.0);
        assert_eq!(tween.value_at(1.0), 2.0);
        assert_abs_diff_eq!(tween.value_at(2.0), 3.0);
        assert_eq!(tween.value_at(3.0), 4.0);
        assert_eq!(tween.value_at(10.0), 4.0);
        // Querying out of order gives the same answers.
        assert_abs_diff_eq!(tween.value_at(2.0), 3.0);
    }

    #[test]
    fn zero_duration_tween_jumps() {
        let tween = Tween::new(Vec3::ZERO, Vec3::ONE, 5.0, 0.0);
        assert_eq!(tween.value_at(4.9), Vec3::ZERO);
        assert_eq!(tween.value_at(5.0), Vec3::ONE);
    }

    #[test]
    fn pulse_rises_peaks_and_settles_to_zero() {
        let pulse = Pulse::new(1.6, 0.2, 10.0, 3.0);
        assert_eq!(pulse.value_at(10.0), 0.0);
        assert_abs_diff_eq!(pulse.value_at(pulse.peak_time()), 1.6, epsilon = 1e-5);
        assert!(pulse.value_at(10.3) > 0.0);
        assert!(pulse.value_at(11.0) < 1.6);
        assert_eq!(pulse.value_at(13.0), 0.0);
        assert_eq!(pulse.value_at(20.0), 0.0);
    }

    #[test]
    fn finished_pulses_are_dropped() {
        let mut pulses = vec![Pulse::new(1.0, 0.5, 0.0, 1.0), Pulse::new(0.5, 0.5, 0.0, 4.0)];
        let total = sum_pulses(&mut pulses, 3.0);
        assert_eq!(pulses.len(), 1);
        assert_abs_diff_eq!(total, 0.25, epsilon = 1e-5);
    }

    #[test]
    fn timer_reschedule_replaces_deadline() {
        let mut timer = Timer::new();
        timer.schedule(0.0, 5.0);
        timer.schedule(3.0, 5.0);
        assert!(!timer.poll(5.0));
        assert!(timer.poll(8.0));
        assert!(!timer.poll(9.0), "fires once per schedule");
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timer = Timer::new();
        timer.schedule(0.0, 1.0);
        timer.cancel();
        assert!(!timer.is_pending());
        assert!(!timer.poll(100.0));
    }
}
