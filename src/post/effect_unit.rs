//! A single screen-space effect with a bounded intensity.

use crate::tween::{Pulse, Tween, sum_pulses};

/// The effects that have their own intensity range and animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    ChromaticAberration,
    LensDistortion,
}

impl EffectKind {
    /// Closed intensity range for this effect.
    pub const fn range(self) -> (f32, f32) {
        match self {
            EffectKind::ChromaticAberration => (0.0, 0.1),
            EffectKind::LensDistortion => (0.0, 0.5),
        }
    }

    pub fn clamp(self, value: f32) -> f32 {
        let (min, max) = self.range();
        if value.is_nan() {
            return min;
        }
        value.clamp(min, max)
    }

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::ChromaticAberration => "chromatic aberration",
            EffectKind::LensDistortion => "lens distortion",
        }
    }
}

type Callback = Box<dyn FnOnce()>;

struct Animation {
    tween: Tween<f32>,
    on_complete: Option<Callback>,
}

/// Intensity, enable flag and animation state of one effect.
///
/// The stored ("base") intensity and the animated value are always inside
/// [`EffectKind::range`]. Additive boosts from [`EffectUnit::add_pulse`] are
/// layered on top of the base and the sum is clamped again, so the value the
/// shader sees never leaves the range either.
///
/// The unit is GPU-free; the render layer owns the pass resources and drops
/// them once [`EffectUnit::is_disposed`] reports `true`.
pub struct EffectUnit {
    kind: EffectKind,
    intensity: f32,
    enabled: bool,
    pending_enabled: Option<bool>,
    animation: Option<Animation>,
    pulses: Vec<Pulse>,
    now: f32,
    output: f32,
    resolution: (u32, u32),
    disposed: bool,
}

impl EffectUnit {
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            intensity: 0.0,
            enabled: true,
            pending_enabled: None,
            animation: None,
            pulses: Vec::new(),
            now: 0.0,
            output: 0.0,
            resolution: (1, 1),
            disposed: false,
        }
    }

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    /// Set the intensity immediately, clamped to the effect's range.
    ///
    /// A running animation is superseded; its completion callback still runs, once.
    pub fn set_intensity(&mut self, value: f32) {
        self.finish_animation();
        self.intensity = self.kind.clamp(value);
        self.refresh();
    }

    /// Ease the intensity to `target` (clamped) over `duration` seconds and
    /// call `on_complete` exactly once when it gets there.
    pub fn animate_to(&mut self, target: f32, duration: f32, on_complete: impl FnOnce() + 'static) {
        self.finish_animation();
        let target = self.kind.clamp(target);

        if duration <= 0.0 {
            self.intensity = target;
            self.apply_pending_enabled();
            self.refresh();
            on_complete();
            return;
        }

        self.animation = Some(Animation {
            tween: Tween::new(self.intensity, target, self.now, duration),
            on_complete: Some(Box::new(on_complete)),
        });
        self.refresh();
    }

    /// Ease to a preset value and enable state.
    ///
    /// Enabling takes effect at once so the ramp is visible; disabling waits
    /// until the ramp has finished.
    pub fn animate_preset(&mut self, target: f32, enabled: bool, duration: f32) {
        if enabled {
            self.set_enabled(true);
        }
        self.animate_to(target, duration, || {});
        if !enabled {
            if self.animation.is_some() {
                self.pending_enabled = Some(false);
            } else {
                self.enabled = false;
            }
        }
    }

    /// Toggle the effect without touching the stored intensity.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.pending_enabled = None;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Layer an additive boost on top of the base intensity.
    pub fn add_pulse(&mut self, pulse: Pulse) {
        self.pulses.push(pulse);
        self.refresh();
    }

    /// Advance to `now`, finishing the animation and running its callback when due.
    pub fn update(&mut self, now: f32) {
        self.now = now;
        let done = self
            .animation
            .as_ref()
            .is_some_and(|a| a.tween.is_finished(now));
        if done {
            self.finish_animation();
        }
        self.refresh();
    }

    /// Stored intensity at the current time, without boosts.
    pub fn base_intensity(&self) -> f32 {
        match &self.animation {
            Some(animation) => self.kind.clamp(animation.tween.value_at(self.now)),
            None => self.intensity,
        }
    }

    /// Intensity the shader sees: base plus boosts, clamped.
    pub fn intensity(&self) -> f32 {
        self.output
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.resolution = (width.max(1), height.max(1));
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    /// Size of one pixel in UV units.
    pub fn texel_size(&self) -> [f32; 2] {
        [1.0 / self.resolution.0 as f32, 1.0 / self.resolution.1 as f32]
    }

    /// Drop all animation state and mark the unit for resource release.
    ///
    /// A pending completion callback is not run.
    pub fn dispose(&mut self) {
        self.animation = None;
        self.pulses.clear();
        self.pending_enabled = None;
        self.enabled = false;
        self.disposed = true;
        self.output = 0.0;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn finish_animation(&mut self) {
        if let Some(mut animation) = self.animation.take() {
            self.intensity = self.kind.clamp(animation.tween.value_at(self.now));
            self.apply_pending_enabled();
            if let Some(callback) = animation.on_complete.take() {
                callback();
            }
        }
    }

    fn apply_pending_enabled(&mut self) {
        if let Some(enabled) = self.pending_enabled.take() {
            self.enabled = enabled;
        }
    }

    fn refresh(&mut self) {
        if self.disposed {
            return;
        }
        let boost = sum_pulses(&mut self.pulses, self.now);
        self.output = self.kind.clamp(self.base_intensity() + boost);
    }
}

impl std::fmt::Debug for EffectUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectUnit")
            .field("kind", &self.kind)
            .field("intensity", &self.intensity)
            .field("output", &self.output)
            .field("enabled", &self.enabled)
            .field("animating", &self.animation.is_some())
            .field("disposed", &self.disposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn set_intensity_clamps_to_range() {
        let mut ca = EffectUnit::new(EffectKind::ChromaticAberration);
        ca.set_intensity(3.0);
        assert_eq!(ca.intensity(), 0.1);
        ca.set_intensity(-1.0);
        assert_eq!(ca.intensity(), 0.0);
        ca.set_intensity(f32::NAN);
        assert_eq!(ca.intensity(), 0.0);

        let mut ld = EffectUnit::new(EffectKind::LensDistortion);
        ld.set_intensity(0.7);
        assert_eq!(ld.intensity(), 0.5);
    }

    #[test]
    fn animate_to_clamps_target_and_calls_back_once() {
        let calls = Rc::new(Cell::new(0));
        let mut ld = EffectUnit::new(EffectKind::LensDistortion);
        let counter = calls.clone();
        ld.animate_to(9.0, 2.0, move || counter.set(counter.get() + 1));

        for step in 0..=40 {
            ld.update(step as f32 * 0.1);
            assert!((0.0..=0.5).contains(&ld.intensity()));
        }
        assert_eq!(ld.intensity(), 0.5);
        assert_eq!(calls.get(), 1);

        ld.update(10.0);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn superseded_animation_still_completes_once() {
        let calls = Rc::new(Cell::new(0));
        let mut ca = EffectUnit::new(EffectKind::ChromaticAberration);
        let counter = calls.clone();
        ca.animate_to(0.05, 1.0, move || counter.set(counter.get() + 1));
        ca.update(0.5);
        ca.set_intensity(0.01);
        assert_eq!(calls.get(), 1);
        assert_eq!(ca.intensity(), 0.01);
        ca.update(2.0);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn enable_toggle_keeps_intensity() {
        let mut ca = EffectUnit::new(EffectKind::ChromaticAberration);
        ca.set_intensity(0.04);
        ca.set_enabled(false);
        assert!(!ca.is_enabled());
        ca.set_enabled(true);
        assert_eq!(ca.intensity(), 0.04);
    }

    #[test]
    fn preset_disable_waits_for_ramp() {
        let mut ld = EffectUnit::new(EffectKind::LensDistortion);
        ld.set_intensity(0.2);
        ld.animate_preset(0.0, false, 1.0);
        ld.update(0.5);
        assert!(ld.is_enabled());
        ld.update(1.0);
        assert!(!ld.is_enabled());
        assert_eq!(ld.intensity(), 0.0);
    }

    #[test]
    fn pulses_add_on_top_and_clamp() {
        let mut ca = EffectUnit::new(EffectKind::ChromaticAberration);
        ca.set_intensity(0.05);
        ca.add_pulse(Pulse::new(0.08, 0.5, 0.0, 2.0));
        ca.update(1.0);
        assert_eq!(ca.intensity(), 0.1);
        assert_abs_diff_eq!(ca.base_intensity(), 0.05);
        ca.update(2.0);
        assert_abs_diff_eq!(ca.intensity(), 0.05);
    }

    #[test]
    fn disposed_unit_goes_dark() {
        let mut ca = EffectUnit::new(EffectKind::ChromaticAberration);
        ca.set_intensity(0.05);
        ca.dispose();
        assert!(ca.is_disposed());
        assert!(!ca.is_enabled());
        assert_eq!(ca.intensity(), 0.0);
    }
}
