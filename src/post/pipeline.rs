use log::{debug, info};

use super::chain::{ChainRenderer, PassKind, PassStep, PassTarget, TransientPass};
use super::effect_unit::{EffectKind, EffectUnit};
use super::presets::{
    BloomSettings, BoostProfile, FLASH_PEAK_AT, NOISE_SPIKE_SPAN, OverlayProfile, ScenePreset,
};
use crate::quality::QualityTier;
use crate::scene::SceneIndex;
use crate::transition::TransitionCharacter;
use crate::tween::{Pulse, Tween, sum_pulses};

/// Film-grain state as the shader sees it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilmState {
    pub noise: f32,
    pub scanline: f32,
    pub flash: f32,
}

/// The ordered post-processing chain and every parameter that drives it.
///
/// Each animated parameter is a base tween (the steady-state preset sweep)
/// plus a list of additive [`Pulse`] boosts. Values are pure functions of the
/// pipeline clock, which [`PostPipeline::update`] advances once per frame.
///
/// The chain always runs in the order of [`PassKind::STANDARD`], minus passes
/// the quality tier disables, followed by any transient passes. The last pass
/// of a frame writes to the screen.
pub struct PostPipeline {
    now: f32,
    tier: QualityTier,
    width: u32,
    height: u32,

    bloom_strength: Tween<f32>,
    bloom_radius: Tween<f32>,
    bloom_threshold: Tween<f32>,
    noise: Tween<f32>,
    scanline: Tween<f32>,

    bloom_boost: Vec<Pulse>,
    noise_boost: Vec<Pulse>,
    scanline_boost: Vec<Pulse>,
    flash: Vec<Pulse>,

    chromatic: EffectUnit,
    lens: EffectUnit,

    transients: Vec<TransientPass>,
}

impl PostPipeline {
    /// A pipeline already settled on `scene`'s preset.
    pub fn new(scene: SceneIndex, width: u32, height: u32, tier: QualityTier) -> Self {
        let preset = ScenePreset::for_scene(scene);
        let mut pipeline = Self {
            now: 0.0,
            tier,
            width: width.max(1),
            height: height.max(1),
            bloom_strength: Tween::settled(preset.bloom.strength),
            bloom_radius: Tween::settled(preset.bloom.radius),
            bloom_threshold: Tween::settled(preset.bloom.threshold),
            noise: Tween::settled(preset.film.noise),
            scanline: Tween::settled(preset.film.scanline),
            bloom_boost: Vec::new(),
            noise_boost: Vec::new(),
            scanline_boost: Vec::new(),
            flash: Vec::new(),
            chromatic: EffectUnit::new(EffectKind::ChromaticAberration),
            lens: EffectUnit::new(EffectKind::LensDistortion),
            transients: Vec::new(),
        };
        pipeline.chromatic.set_intensity(preset.chromatic.intensity);
        pipeline.chromatic.set_enabled(preset.chromatic.enabled);
        pipeline.lens.set_intensity(preset.lens.intensity);
        pipeline.lens.set_enabled(preset.lens.enabled);
        pipeline.resize(width, height);
        pipeline
    }

    /// Current pipeline clock.
    pub fn now(&self) -> f32 {
        self.now
    }

    /// Ease every preset-driven parameter to `scene`'s values over `duration`
    /// seconds, starting now.
    ///
    /// Only the base values move; boosts already in flight keep running on
    /// top. The end state depends on `scene` alone.
    pub fn apply_scene_preset(&mut self, scene: SceneIndex, duration: f32) {
        let preset = ScenePreset::for_scene(scene);
        let now = self.now;
        let retarget = |tween: &Tween<f32>, to: f32| Tween::new(tween.value_at(now), to, now, duration);

        self.bloom_strength = retarget(&self.bloom_strength, preset.bloom.strength);
        self.bloom_radius = retarget(&self.bloom_radius, preset.bloom.radius);
        self.bloom_threshold = retarget(&self.bloom_threshold, preset.bloom.threshold);
        self.noise = retarget(&self.noise, preset.film.noise);
        self.scanline = retarget(&self.scanline, preset.film.scanline);

        self.chromatic
            .animate_preset(preset.chromatic.intensity, preset.chromatic.enabled, duration);
        self.lens
            .animate_preset(preset.lens.intensity, preset.lens.enabled, duration);

        debug!(target: "stellar::post", "preset {scene} over {duration:.2}s");
    }

    /// Layer the overshoot-then-settle boost for a `from` to `to` hand-off.
    pub fn boost_for_transition(&mut self, from: SceneIndex, to: SceneIndex, duration: f32) {
        let character = TransitionCharacter::classify(from, to);
        let profile = BoostProfile::for_character(character);
        let now = self.now;

        self.bloom_boost
            .push(Pulse::new(profile.bloom, profile.peak_at, now, duration));
        self.chromatic
            .add_pulse(Pulse::new(profile.chromatic, profile.peak_at, now, duration));
        self.lens
            .add_pulse(Pulse::new(profile.lens, profile.peak_at, now, duration));

        if let Some(spike) = profile.noise_spike {
            self.noise_boost
                .push(Pulse::new(spike, 0.3, now, duration * NOISE_SPIKE_SPAN));
        }
        if let Some((flash, scanline)) = profile.flash {
            self.flash
                .push(Pulse::new(flash, FLASH_PEAK_AT, now, duration));
            self.scanline_boost
                .push(Pulse::new(scanline, FLASH_PEAK_AT, now, duration));
        }

        debug!(target: "stellar::post", "{character:?} boost {from} -> {to}");
    }

    /// Append the character's overlay (and radial blur, if it has one) after
    /// the standard chain.
    pub fn add_overlay(&mut self, character: TransitionCharacter, duration: f32) {
        let profile = OverlayProfile::for_character(character);
        let now = self.now;
        self.transients.push(TransientPass::overlay(
            profile.color,
            Pulse::new(profile.peak_alpha, profile.fade_in, now, duration),
        ));
        if let Some(strength) = profile.radial_blur {
            self.transients
                .push(TransientPass::radial_blur(Pulse::new(strength, 0.2, now, duration)));
        }
    }

    /// Drop every transient pass, restoring the standard chain.
    pub fn clear_transients(&mut self) {
        self.transients.clear();
    }

    pub fn transients(&self) -> &[TransientPass] {
        &self.transients
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.chromatic.resize(self.width, self.height);
        self.lens.resize(self.width, self.height);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Size of the bloom buffer for the current tier.
    pub fn bloom_resolution(&self) -> (u32, u32) {
        let scale = self.tier.bloom_resolution_scale();
        (
            ((self.width as f32 * scale) as u32).max(1),
            ((self.height as f32 * scale) as u32).max(1),
        )
    }

    pub fn set_quality_tier(&mut self, tier: QualityTier) {
        if tier != self.tier {
            info!(target: "stellar::post", "quality tier {} -> {tier}", self.tier);
        }
        self.tier = tier;
    }

    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    /// Advance the pipeline clock, finishing animations and expiring boosts.
    pub fn update(&mut self, now: f32) {
        self.now = now;
        self.chromatic.update(now);
        self.lens.update(now);
        sum_pulses(&mut self.bloom_boost, now);
        sum_pulses(&mut self.noise_boost, now);
        sum_pulses(&mut self.scanline_boost, now);
        sum_pulses(&mut self.flash, now);
        let before = self.transients.len();
        self.transients.retain(|t| !t.is_finished(now));
        if self.transients.len() != before {
            debug!(target: "stellar::post", "transient pass removed");
        }
    }

    /// Bloom parameters at the current time, boosts included.
    pub fn bloom(&self) -> BloomSettings {
        BloomSettings {
            strength: (self.bloom_strength.value_at(self.now) + boost(&self.bloom_boost, self.now))
                .max(0.0),
            radius: self.bloom_radius.value_at(self.now),
            threshold: self.bloom_threshold.value_at(self.now),
        }
    }

    pub fn film(&self) -> FilmState {
        let now = self.now;
        FilmState {
            noise: (self.noise.value_at(now) + boost(&self.noise_boost, now)).clamp(0.0, 1.0),
            scanline: (self.scanline.value_at(now) + boost(&self.scanline_boost, now)).clamp(0.0, 1.0),
            flash: boost(&self.flash, now).clamp(0.0, 1.0),
        }
    }

    pub fn chromatic(&self) -> &EffectUnit {
        &self.chromatic
    }

    pub fn lens(&self) -> &EffectUnit {
        &self.lens
    }

    /// Release both effect units.
    pub fn dispose(&mut self) {
        self.chromatic.dispose();
        self.lens.dispose();
    }

    /// The passes to run this frame, in order, with tier gates applied.
    pub fn frame_plan(&self) -> Vec<PassStep> {
        let now = self.now;
        let tier = self.tier;
        let (w, h) = (self.width as f32, self.height as f32);
        let mut steps = Vec::with_capacity(8);
        let mut push = |kind, params| {
            steps.push(PassStep {
                kind,
                params,
                target: PassTarget::Intermediate,
            })
        };

        push(PassKind::Render, [now, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

        if tier.bloom() {
            let bloom = self.bloom();
            let (bw, bh) = self.bloom_resolution();
            push(
                PassKind::Bloom,
                [
                    bloom.strength * tier.bloom_strength_scale(),
                    bloom.radius,
                    bloom.threshold,
                    1.0 / bw as f32,
                    1.0 / bh as f32,
                    0.0,
                    0.0,
                    0.0,
                ],
            );
        }

        if tier.anti_alias() {
            push(PassKind::AntiAlias, [1.0 / w, 1.0 / h, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        }

        if tier.film_grain() {
            let film = self.film();
            push(
                PassKind::FilmGrain,
                [film.noise, film.scanline, film.flash, now, h, 0.0, 0.0, 0.0],
            );
        }

        if tier.effect_units() {
            for (kind, unit) in [
                (PassKind::ChromaticAberration, &self.chromatic),
                (PassKind::LensDistortion, &self.lens),
            ] {
                if unit.is_enabled() && !unit.is_disposed() {
                    let [tx, ty] = unit.texel_size();
                    push(kind, [unit.intensity(), tx, ty, 0.0, 0.0, 0.0, 0.0, 0.0]);
                }
            }
        }

        for transient in &self.transients {
            push(transient.kind, transient.params(now));
        }

        if let Some(last) = steps.last_mut() {
            last.target = PassTarget::Screen;
        }
        steps
    }

    /// Run the full chain for the current frame.
    pub fn render<R: ChainRenderer>(&self, renderer: &mut R) {
        for step in self.frame_plan() {
            renderer.draw(&step);
        }
    }
}

fn boost(pulses: &[Pulse], now: f32) -> f32 {
    pulses.iter().map(|p| p.value_at(now)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::chain::RecordingRenderer;
    use approx::assert_abs_diff_eq;

    fn pipeline(scene: SceneIndex) -> PostPipeline {
        PostPipeline::new(scene, 1280, 720, QualityTier::High)
    }

    #[test]
    fn standard_chain_runs_in_declared_order() {
        let p = pipeline(SceneIndex::BlackHole);
        let mut recorder = RecordingRenderer::default();
        p.render(&mut recorder);

        assert_eq!(recorder.kinds(), PassKind::STANDARD.to_vec());
        let (last, rest) = recorder.steps.split_last().expect("passes");
        assert_eq!(last.target, PassTarget::Screen);
        assert!(rest.iter().all(|s| s.target == PassTarget::Intermediate));
    }

    #[test]
    fn disabled_lens_is_skipped_at_earth() {
        let p = pipeline(SceneIndex::Earth);
        let kinds: Vec<_> = p.frame_plan().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PassKind::Render,
                PassKind::Bloom,
                PassKind::AntiAlias,
                PassKind::FilmGrain,
                PassKind::ChromaticAberration,
            ]
        );
        assert_eq!(p.frame_plan().last().map(|s| s.target), Some(PassTarget::Screen));
    }

    #[test]
    fn tiers_gate_passes() {
        let mut p = pipeline(SceneIndex::Galaxy);
        p.set_quality_tier(QualityTier::Medium);
        let kinds: Vec<_> = p.frame_plan().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![PassKind::Render, PassKind::Bloom, PassKind::AntiAlias, PassKind::FilmGrain]
        );

        p.set_quality_tier(QualityTier::Low);
        let plan = p.frame_plan();
        let kinds: Vec<_> = plan.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![PassKind::Render, PassKind::Bloom, PassKind::AntiAlias]);
        assert_abs_diff_eq!(plan[1].params[0], 1.2 * 0.6, epsilon = 1e-6);
        // Logical parameters are untouched by the gate.
        assert_eq!(p.bloom().strength, 1.2);
    }

    #[test]
    fn transient_passes_append_and_then_leave() {
        let mut p = pipeline(SceneIndex::Galaxy);
        p.update(10.0);
        p.add_overlay(TransitionCharacter::EnterBlackHole, 3.0);
        p.update(11.0);

        let kinds: Vec<_> = p.frame_plan().iter().map(|s| s.kind).collect();
        assert_eq!(&kinds[..6], &PassKind::STANDARD);
        assert_eq!(&kinds[6..], &[PassKind::Overlay, PassKind::RadialBlur]);
        assert_eq!(p.frame_plan()[7].target, PassTarget::Screen);
        assert_eq!(p.frame_plan()[5].target, PassTarget::Intermediate);

        p.update(13.0);
        assert!(p.transients().is_empty());
        let kinds: Vec<_> = p.frame_plan().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, PassKind::STANDARD.to_vec());
    }

    #[test]
    fn earth_to_black_hole_overshoots_then_settles() {
        let mut p = pipeline(SceneIndex::Earth);
        assert_eq!(p.bloom().strength, 0.3);

        p.update(5.0);
        p.apply_scene_preset(SceneIndex::BlackHole, 3.0);
        p.boost_for_transition(SceneIndex::Earth, SceneIndex::BlackHole, 3.0);

        let mut peak = 0.0_f32;
        for step in 0..=9 {
            p.update(5.0 + step as f32 * 0.1);
            peak = peak.max(p.bloom().strength);
        }
        assert!(peak > 1.5, "peak bloom {peak}");

        p.update(8.0);
        assert_eq!(p.bloom().strength, 0.9);
        assert_eq!(p.chromatic().intensity(), 0.01);
        assert_eq!(p.lens().intensity(), 0.15);
        assert_eq!(p.film().noise, 0.35);
    }

    #[test]
    fn black_hole_entry_spikes_film_grain_early() {
        let mut p = pipeline(SceneIndex::Earth);
        p.update(5.0);
        p.apply_scene_preset(SceneIndex::BlackHole, 3.0);
        p.boost_for_transition(SceneIndex::Earth, SceneIndex::BlackHole, 3.0);

        // First 15% of a 3 s boost.
        let mut peak = 0.0_f32;
        for step in 0..=10 {
            p.update(5.0 + step as f32 * 0.045);
            peak = peak.max(p.film().noise);
        }
        assert!(peak > 0.35, "peak noise {peak}");

        p.update(5.5);
        assert!(p.film().noise < 0.35);
    }

    /// Time and value of the largest chromatic and lens intensities over a
    /// boost of `duration` seconds starting at zero.
    fn distortion_peaks(from: SceneIndex, to: SceneIndex, duration: f32) -> [(f32, f32); 2] {
        let mut p = pipeline(SceneIndex::BlackHole);
        p.boost_for_transition(from, to, duration);
        let mut peaks = [(0.0_f32, 0.0_f32); 2];
        let steps = (duration / 0.02) as usize;
        for step in 0..=steps {
            let t = step as f32 * 0.02;
            p.update(t);
            for (peak, value) in peaks.iter_mut().zip([p.chromatic().intensity(), p.lens().intensity()]) {
                if value > peak.1 {
                    *peak = (t, value);
                }
            }
        }
        peaks
    }

    #[test]
    fn black_hole_entry_distorts_harder_and_sooner() {
        let duration = 2.0;
        let standard = distortion_peaks(SceneIndex::Earth, SceneIndex::Uranus, duration);
        let entry = distortion_peaks(SceneIndex::Earth, SceneIndex::BlackHole, duration);

        for (standard, entry) in standard.into_iter().zip(entry) {
            assert!(entry.1 > standard.1, "entry {entry:?} vs standard {standard:?}");
            assert!(entry.0 < standard.0, "entry {entry:?} vs standard {standard:?}");
            assert!(entry.0 <= 0.3 * duration);
        }
    }

    #[test]
    fn preset_application_converges() {
        let mut a = pipeline(SceneIndex::Earth);
        let mut b = pipeline(SceneIndex::Galaxy);
        b.boost_for_transition(SceneIndex::Uranus, SceneIndex::Galaxy, 10.0);

        for p in [&mut a, &mut b] {
            p.update(1.0);
            p.apply_scene_preset(SceneIndex::Uranus, 2.0);
            p.update(1.5);
            p.apply_scene_preset(SceneIndex::Uranus, 2.0);
            p.update(20.0);
        }

        assert_eq!(a.bloom(), b.bloom());
        assert_eq!(a.film(), b.film());
        assert_eq!(a.chromatic().intensity(), b.chromatic().intensity());
        assert_eq!(a.lens().intensity(), b.lens().intensity());
        assert_eq!(a.lens().is_enabled(), b.lens().is_enabled());
        assert_eq!(a.bloom().strength, 0.5);
    }

    #[test]
    fn effect_output_stays_in_range_under_boost() {
        let mut p = pipeline(SceneIndex::BlackHole);
        p.boost_for_transition(SceneIndex::Galaxy, SceneIndex::BlackHole, 1.0);
        p.boost_for_transition(SceneIndex::Galaxy, SceneIndex::BlackHole, 1.0);
        for step in 0..=20 {
            p.update(step as f32 * 0.05);
            assert!((0.0..=0.1).contains(&p.chromatic().intensity()));
            assert!((0.0..=0.5).contains(&p.lens().intensity()));
        }
    }

    #[test]
    fn exit_flash_peaks_early() {
        let mut p = pipeline(SceneIndex::BlackHole);
        p.boost_for_transition(SceneIndex::BlackHole, SceneIndex::Galaxy, 2.0);
        p.update(0.2);
        assert_abs_diff_eq!(p.film().flash, 0.8, epsilon = 1e-5);
        p.update(2.0);
        assert_eq!(p.film().flash, 0.0);
    }

    #[test]
    fn resize_reaches_resolution_dependent_passes() {
        let mut p = pipeline(SceneIndex::Uranus);
        p.set_quality_tier(QualityTier::Medium);
        p.resize(1920, 1080);
        assert_eq!(p.chromatic().resolution(), (1920, 1080));
        assert_eq!(p.lens().resolution(), (1920, 1080));
        assert_eq!(p.bloom_resolution(), (960, 540));
        let aa = p
            .frame_plan()
            .into_iter()
            .find(|s| s.kind == PassKind::AntiAlias)
            .expect("anti-alias pass");
        assert_abs_diff_eq!(aa.params[0], 1.0 / 1920.0);
    }

    #[test]
    fn disposed_units_leave_the_chain() {
        let mut p = pipeline(SceneIndex::BlackHole);
        p.dispose();
        let kinds: Vec<_> = p.frame_plan().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, PassKind::STANDARD[..4].to_vec());
    }
}
