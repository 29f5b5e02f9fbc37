//! The application state shared by the render loop, the input layer and the orchestrator.

use glam::Vec3;
use log::{debug, info};

use crate::audio::AudioCue;
use crate::camera::{Camera, CameraPath};
use crate::config::TourConfig;
use crate::label::SceneLabel;
use crate::lights::LightRig;
use crate::post::PostPipeline;
use crate::quality::{QualityAdapter, QualityTier};
use crate::scene::{InteractionEvent, Ray, SceneIndex, SceneSet};
use crate::transition::{
    TransitionConfig, TransitionOrchestrator, TransitionStart, TransitionState, TransitionTargets,
    TransitionUpdate,
};
use crate::tween::Timer;

/// Everything the tour mutates, owned in one place.
///
/// Every navigation path goes through [`ApplicationState::request_transition`],
/// which checks the transition flag before anything else. Outside a
/// transition the render loop is the only writer of the camera, the lights
/// and the pipeline.
pub struct ApplicationState {
    pub config: TourConfig,
    pub scenes: SceneSet,
    pub camera: Camera,
    pub lights: LightRig,
    pub pipeline: PostPipeline,
    pub label: SceneLabel,
    pub quality: QualityAdapter,
    audio: Box<dyn AudioCue>,
    transition: TransitionState,
    orchestrator: TransitionOrchestrator,
    auto_advance: bool,
    auto_timer: Timer,
    idle_timer: Timer,
    now: f32,
}

impl ApplicationState {
    pub fn new(
        config: TourConfig,
        quality: QualityAdapter,
        width: u32,
        height: u32,
        mut audio: Box<dyn AudioCue>,
    ) -> Self {
        let start = SceneIndex::Earth;
        let tier = quality.tier();

        let mut scenes = SceneSet::new(config.seed);
        scenes.show_only(start);
        scenes.update_particle_count(tier.particle_multiplier());

        let camera = Camera::new().at(
            CameraPath::for_scene(start)
                .destination()
                .unwrap_or(Vec3::new(0.0, 0.0, 6.0)),
        );

        let mut label = SceneLabel::new();
        label.show(start.display_name(), 0.0, 1.0);
        audio.play_ambient(start);

        let orchestrator = TransitionOrchestrator::new(
            TransitionConfig {
                duration: config.transition_duration,
                ..TransitionConfig::default()
            },
            config.seed,
        );

        let mut idle_timer = Timer::new();
        idle_timer.schedule(0.0, config.idle_reset_after);
        let mut auto_timer = Timer::new();
        if config.auto_advance {
            auto_timer.schedule(0.0, config.auto_advance_delay);
        }

        Self {
            auto_advance: config.auto_advance,
            scenes,
            camera,
            lights: LightRig::for_scene(start),
            pipeline: PostPipeline::new(start, width, height, tier),
            label,
            quality,
            audio,
            transition: TransitionState::new(start),
            orchestrator,
            auto_timer,
            idle_timer,
            now: 0.0,
            config,
        }
    }

    pub fn active(&self) -> SceneIndex {
        self.transition.active()
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_transitioning()
    }

    pub fn now(&self) -> f32 {
        self.now
    }

    pub fn auto_advance(&self) -> bool {
        self.auto_advance
    }

    /// Ask for a transition to `to`. Ignored while a transition is in flight.
    pub fn request_transition(&mut self, to: SceneIndex) -> TransitionStart {
        if self.transition.is_transitioning() {
            debug!(target: "stellar::state", "navigation to {to} ignored during transition");
            return TransitionStart::Busy;
        }
        let from = self.transition.active();
        let result = self.with_targets(from, to, |orchestrator, state, now, targets| {
            orchestrator.begin_transition(state, from, to, now, targets, None)
        });
        if result.is_started() {
            self.auto_timer.cancel();
        }
        result
    }

    pub fn next(&mut self) -> TransitionStart {
        self.request_transition(self.active().next())
    }

    pub fn previous(&mut self) -> TransitionStart {
        self.request_transition(self.active().previous())
    }

    pub fn set_auto_advance(&mut self, enabled: bool) {
        self.auto_advance = enabled;
        if !enabled {
            self.auto_timer.cancel();
        } else if !self.is_transitioning() {
            self.auto_timer.schedule(self.now, self.config.auto_advance_delay);
        }
        info!(target: "stellar::state", "auto-advance {}", if enabled { "on" } else { "off" });
    }

    pub fn toggle_auto_advance(&mut self) {
        self.set_auto_advance(!self.auto_advance);
    }

    /// Any user input pushes the idle reset further out.
    pub fn note_input(&mut self) {
        self.idle_timer.schedule(self.now, self.config.idle_reset_after);
    }

    /// Forward a click to the active scene. Ignored during transitions.
    pub fn interact(&mut self, ray: Ray) -> bool {
        if self.is_transitioning() {
            return false;
        }
        let event = InteractionEvent::new(ray, self.now);
        self.scenes.get_mut(self.active()).handle_interaction(&event)
    }

    pub fn reset_active_scene(&mut self) {
        let active = self.active();
        self.scenes.get_mut(active).reset();
        info!(target: "stellar::state", "{active} reset");
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.pipeline.resize(width, height);
    }

    /// Picking ray through a cursor position in physical pixels.
    pub fn picking_ray(&self, x: f32, y: f32) -> Ray {
        let (w, h) = self.pipeline.size();
        let aspect = w as f32 / h as f32;
        Ray::from_screen(x, y, w as f32, h as f32, self.camera.view_projection(aspect))
    }

    /// Advance everything by one frame ending at `now`, `dt` seconds after the last.
    pub fn tick(&mut self, now: f32, dt: f32) {
        self.now = now;

        if let Some(tier) = self.quality.record_frame(dt) {
            self.apply_tier(tier);
        }

        self.pipeline.update(now);

        if let Some((from, to)) = self.orchestrator.endpoints() {
            let update = self.with_targets(from, to, |orchestrator, state, now, targets| {
                orchestrator.update(state, now, targets)
            });
            if let TransitionUpdate::Completed { .. } = update {
                if self.auto_advance {
                    self.auto_timer.schedule(now, self.config.auto_advance_delay);
                }
                self.idle_timer.schedule(now, self.config.idle_reset_after);
            }
        }

        self.scenes.update_visible(now);

        if self.is_transitioning() {
            return;
        }
        if self.idle_timer.poll(now) {
            self.reset_active_scene();
        }
        if self.auto_advance && self.auto_timer.poll(now) {
            self.next();
        }
    }

    fn apply_tier(&mut self, tier: QualityTier) {
        self.pipeline.set_quality_tier(tier);
        self.scenes.update_particle_count(tier.particle_multiplier());
    }

    fn with_targets<R>(
        &mut self,
        from: SceneIndex,
        to: SceneIndex,
        f: impl FnOnce(
            &mut TransitionOrchestrator,
            &mut TransitionState,
            f32,
            TransitionTargets<'_>,
        ) -> R,
    ) -> R {
        let clearance = self.scenes.clearance(from, to);
        let (from_group, to_group) = match self.scenes.groups_mut(from, to) {
            Some((a, b)) => (Some(a), Some(b)),
            None => (None, None),
        };
        let targets = TransitionTargets {
            from_group,
            to_group,
            camera: &mut self.camera,
            lights: &mut self.lights,
            pipeline: &mut self.pipeline,
            label: &mut self.label,
            audio: self.audio.as_mut(),
            clearance,
        };
        f(&mut self.orchestrator, &mut self.transition, self.now, targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::LogAudio;

    const FRAME: f32 = 1.0 / 60.0;

    fn state(config: TourConfig) -> ApplicationState {
        ApplicationState::new(
            config,
            QualityAdapter::new(QualityTier::High),
            1280,
            720,
            Box::new(LogAudio::new()),
        )
    }

    fn run(state: &mut ApplicationState, until: f32) {
        let mut now = state.now();
        while now < until {
            now = (now + FRAME).min(until);
            state.tick(now, FRAME);
        }
    }

    #[test]
    fn starts_on_earth_with_only_earth_visible() {
        let state = state(TourConfig::default());
        assert_eq!(state.active(), SceneIndex::Earth);
        assert_eq!(state.scenes.visible().count(), 1);
        assert_eq!(state.label.window_title("Stellar"), "Stellar - Earth");
    }

    #[test]
    fn overlapping_request_is_dropped() {
        let mut state = state(TourConfig::default());
        assert!(state.request_transition(SceneIndex::Uranus).is_started());
        run(&mut state, 0.2);
        assert_eq!(state.request_transition(SceneIndex::Galaxy), TransitionStart::Busy);
        assert_eq!(state.next(), TransitionStart::Busy);

        run(&mut state, 3.1);
        assert_eq!(state.active(), SceneIndex::Uranus);
        assert!(!state.is_transitioning());
        let visible: Vec<_> = state.scenes.visible().map(|s| s.index()).collect();
        assert_eq!(visible, vec![SceneIndex::Uranus]);
    }

    #[test]
    fn navigation_wraps_around_the_tour() {
        let mut state = state(TourConfig::default());
        assert!(state.previous().is_started());
        run(&mut state, 3.1);
        assert_eq!(state.active(), SceneIndex::BlackHole);
        assert!(state.next().is_started());
        run(&mut state, 6.2);
        assert_eq!(state.active(), SceneIndex::Earth);
    }

    #[test]
    fn auto_advance_walks_the_tour() {
        let config = TourConfig::default()
            .auto_advance(true)
            .auto_advance_delay(1.0)
            .transition_duration(1.0);
        let mut state = state(config);
        run(&mut state, 1.5);
        assert!(state.is_transitioning());
        run(&mut state, 2.1);
        assert_eq!(state.active(), SceneIndex::Uranus);
        // One second of rest, one second of transition.
        run(&mut state, 4.1);
        assert_eq!(state.active(), SceneIndex::Galaxy);

        state.toggle_auto_advance();
        run(&mut state, 10.0);
        assert_eq!(state.active(), SceneIndex::Galaxy);
    }

    #[test]
    fn idle_timer_resets_the_active_scene() {
        let config = TourConfig::default().idle_reset_after(2.0);
        let mut state = state(config);
        run(&mut state, 1.5);
        state.note_input();
        run(&mut state, 3.0);
        let before = state.scenes.get(SceneIndex::Earth).shading().params[0];
        assert!(before > 0.0);
        run(&mut state, 3.6);
        let after = state.scenes.get(SceneIndex::Earth).shading().params[0];
        assert!(after < before, "spin should restart after idle reset");
    }

    #[test]
    fn clicks_are_ignored_mid_transition() {
        let mut state = state(TourConfig::default());
        let ray = state.picking_ray(640.0, 360.0);
        assert!(state.interact(ray));
        state.request_transition(SceneIndex::Galaxy);
        assert!(!state.interact(ray));
    }

    #[test]
    fn slow_frames_thin_out_particles() {
        let mut state = state(TourConfig::default());
        let before = state.scenes.get(SceneIndex::Galaxy).particle_systems()[1].count();
        let mut now = 0.0;
        for _ in 0..crate::quality::FPS_WINDOW {
            now += 0.1;
            state.tick(now, 0.1);
        }
        assert_eq!(state.quality.tier(), QualityTier::Medium);
        assert_eq!(state.pipeline.tier(), QualityTier::Medium);
        let after = state.scenes.get(SceneIndex::Galaxy).particle_systems()[1].count();
        assert!(after < before);
    }
}
